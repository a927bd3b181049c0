use chrono::{DateTime, Duration, Local, NaiveTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{Article, ArticleFilter, ArticleHeading, ArticlePatch, ArticleStats, ArticleSummary};

use super::client::{QueryParam, StoreClient};

/// Fixed page size; `page` in a filter selects rows
/// `(page-1)*PAGE_SIZE ..= (page-1)*PAGE_SIZE + PAGE_SIZE - 1`.
pub const PAGE_SIZE: u64 = 20;

const SUMMARY_COLUMNS: &str = "id,title,content,is_deleted,created_at,updated_at";
const HEADING_COLUMNS: &str = "id,title";

/// Query and shape contract for all article operations. Soft delete
/// only: rows are hidden by flipping `is_deleted`, never removed.
#[derive(Clone)]
pub struct ArticleRepository {
    client: StoreClient,
}

impl ArticleRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    /// List summaries for the background surface. A backend failure
    /// yields an empty list, logged but never propagated.
    pub async fn list(&self, filter: &ArticleFilter) -> Vec<ArticleSummary> {
        let params = list_query(SUMMARY_COLUMNS, filter, Utc::now());
        match self.client.select(&params, page_range(filter.page)).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("failed to list articles: {e}");
                Vec::new()
            }
        }
    }

    /// Lighter list for the popup surface: id and title only. Kept as
    /// its own query rather than a projection of `list`; the two
    /// surfaces intentionally fetch different field sets.
    pub async fn list_headings(&self, filter: &ArticleFilter) -> Vec<ArticleHeading> {
        let params = list_query(HEADING_COLUMNS, filter, Utc::now());
        match self.client.select(&params, page_range(filter.page)).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("failed to list article headings: {e}");
                Vec::new()
            }
        }
    }

    /// Fetch a full row. Rejects a non-positive id before any network
    /// call; a query that succeeds with zero rows is "article not
    /// found" rather than a null.
    pub async fn get_detail(&self, id: i64) -> Result<Article> {
        if id <= 0 {
            return Err(AppError::Validation("invalid id".to_string()));
        }
        let rows: Vec<Article> = self.client.select(&detail_query(id), None).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("article not found".to_string()))
    }

    /// Partial update keyed by id. The patch is always stamped with a
    /// fresh `updated_at`, even when the backend ends up rejecting it.
    pub async fn update(&self, id: i64, patch: &ArticlePatch) -> Result<Article> {
        if id <= 0 {
            return Err(AppError::Validation("invalid id".to_string()));
        }
        let payload = patch_payload(patch, Utc::now())?;
        let rows: Vec<Article> = self.client.patch_returning(id, &payload).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("article not found".to_string()))
    }

    /// Flip the soft-delete flag. The only delete path; returns whether
    /// the store accepted the change.
    pub async fn toggle_delete(&self, id: i64, currently_deleted: bool) -> bool {
        let payload = toggle_delete_payload(currently_deleted, Utc::now());
        match self.client.patch_minimal(id, &payload).await {
            Ok(()) => true,
            Err(e) => {
                let action = if currently_deleted { "restore" } else { "delete" };
                tracing::error!("failed to {action} article {id}: {e}");
                false
            }
        }
    }

    /// Total/today/week counts over non-deleted rows, fetched
    /// concurrently.
    pub async fn stats(&self) -> Result<ArticleStats> {
        let now = Utc::now();
        let all = base_predicate();
        let today = count_predicate(start_of_today_local(now));
        let week = count_predicate(now - Duration::days(7));

        let (total, today, week) = futures::join!(
            self.client.count(&all),
            self.client.count(&today),
            self.client.count(&week),
        );
        Ok(ArticleStats {
            total: total?,
            today: today?,
            week: week?,
        })
    }
}

fn base_predicate() -> Vec<QueryParam> {
    vec![("is_deleted".to_string(), "eq.false".to_string())]
}

fn count_predicate(bound: DateTime<Utc>) -> Vec<QueryParam> {
    let mut params = base_predicate();
    params.push(("created_at".to_string(), format!("gte.{}", bound.to_rfc3339())));
    params
}

/// Midnight of the local calendar day containing `now`, as a UTC
/// instant. Falls back to UTC midnight on a nonexistent local time.
fn start_of_today_local(now: DateTime<Utc>) -> DateTime<Utc> {
    let midnight = now
        .with_timezone(&Local)
        .date_naive()
        .and_time(NaiveTime::MIN);
    midnight
        .and_local_timezone(Local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}

/// Lower time bound implied by a filter: the today bound if set, else
/// the week bound, else none.
fn time_bound(filter: &ArticleFilter, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if filter.today {
        Some(start_of_today_local(now))
    } else if filter.week {
        Some(now - Duration::days(7))
    } else {
        None
    }
}

fn list_query(columns: &str, filter: &ArticleFilter, now: DateTime<Utc>) -> Vec<QueryParam> {
    let mut params = vec![("select".to_string(), columns.to_string())];
    if !filter.include_deleted {
        params.push(("is_deleted".to_string(), "eq.false".to_string()));
    }
    if let Some(bound) = time_bound(filter, now) {
        params.push(("created_at".to_string(), format!("gte.{}", bound.to_rfc3339())));
    }
    params.push(("order".to_string(), "created_at.desc".to_string()));
    params
}

fn detail_query(id: i64) -> Vec<QueryParam> {
    vec![
        ("select".to_string(), "*".to_string()),
        ("id".to_string(), format!("eq.{id}")),
        ("limit".to_string(), "1".to_string()),
    ]
}

fn page_range(page: Option<u32>) -> Option<(u64, u64)> {
    page.map(|p| {
        let start = u64::from(p.max(1) - 1) * PAGE_SIZE;
        (start, start + PAGE_SIZE - 1)
    })
}

fn patch_payload(patch: &ArticlePatch, now: DateTime<Utc>) -> Result<serde_json::Value> {
    let mut payload = serde_json::to_value(patch)?;
    payload["updated_at"] = serde_json::Value::String(now.to_rfc3339());
    Ok(payload)
}

fn toggle_delete_payload(currently_deleted: bool, now: DateTime<Utc>) -> serde_json::Value {
    serde_json::json!({
        "is_deleted": !currently_deleted,
        "updated_at": now.to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn param<'a>(params: &'a [QueryParam], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn test_repository() -> ArticleRepository {
        // Points nowhere; used only for paths that return before any
        // network call.
        let config = Config {
            backend_url: "http://127.0.0.1:1".to_string(),
            api_key: "test".to_string(),
            ..Default::default()
        };
        ArticleRepository::new(StoreClient::new(&config).unwrap())
    }

    #[test]
    fn list_query_always_excludes_deleted_and_orders_descending() {
        let filter = ArticleFilter::default();
        let params = list_query(SUMMARY_COLUMNS, &filter, Utc::now());

        assert_eq!(param(&params, "is_deleted"), Some("eq.false"));
        assert_eq!(param(&params, "order"), Some("created_at.desc"));
        assert_eq!(param(&params, "created_at"), None);
    }

    #[test]
    fn list_query_show_deleted_drops_the_exclusion_only() {
        let filter = ArticleFilter {
            include_deleted: true,
            ..Default::default()
        };
        let params = list_query(SUMMARY_COLUMNS, &filter, Utc::now());

        assert_eq!(param(&params, "is_deleted"), None);
        assert_eq!(param(&params, "order"), Some("created_at.desc"));
    }

    #[test]
    fn week_filter_bounds_at_seven_days_before_now() {
        let now: DateTime<Utc> = "2026-08-07T12:00:00Z".parse().unwrap();
        let filter = ArticleFilter {
            week: true,
            ..Default::default()
        };
        let params = list_query(SUMMARY_COLUMNS, &filter, now);

        assert_eq!(
            param(&params, "created_at"),
            Some("gte.2026-07-31T12:00:00+00:00")
        );
    }

    #[test]
    fn today_filter_wins_over_week() {
        let now = Utc::now();
        let filter = ArticleFilter {
            today: true,
            week: true,
            ..Default::default()
        };
        let bound = time_bound(&filter, now).unwrap();

        // The today bound starts at local midnight: no later than now,
        // and always tighter than the week bound.
        assert!(bound <= now);
        assert!(bound > now - Duration::days(2));
        assert!(bound > now - Duration::days(7));
    }

    #[test]
    fn heading_query_fetches_the_lighter_field_set() {
        let params = list_query(HEADING_COLUMNS, &ArticleFilter::default(), Utc::now());
        assert_eq!(param(&params, "select"), Some("id,title"));
    }

    #[test]
    fn page_maps_to_fixed_size_inclusive_ranges() {
        assert_eq!(page_range(None), None);
        assert_eq!(page_range(Some(1)), Some((0, 19)));
        assert_eq!(page_range(Some(2)), Some((20, 39)));
        assert_eq!(page_range(Some(5)), Some((80, 99)));
        // Page 0 is treated as the first page rather than underflowing.
        assert_eq!(page_range(Some(0)), Some((0, 19)));
    }

    #[tokio::test]
    async fn get_detail_rejects_invalid_ids_before_any_network_call() {
        let repo = test_repository();

        for id in [0, -1] {
            match repo.get_detail(id).await {
                Err(AppError::Validation(message)) => assert_eq!(message, "invalid id"),
                other => panic!("expected validation error, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn update_rejects_invalid_ids_before_any_network_call() {
        let repo = test_repository();
        let result = repo.update(0, &ArticlePatch::default()).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn rows_decode_in_backend_order() {
        let rows: Vec<ArticleHeading> =
            serde_json::from_str(r#"[{"id":1,"title":"A"},{"id":2,"title":"B"}]"#).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[1].id, 2);
    }

    #[test]
    fn patch_payload_always_carries_updated_at() {
        let now: DateTime<Utc> = "2026-08-07T12:00:00Z".parse().unwrap();

        let payload = patch_payload(&ArticlePatch::default(), now).unwrap();
        assert_eq!(payload["updated_at"], "2026-08-07T12:00:00+00:00");

        let patch = ArticlePatch {
            title: Some("X".to_string()),
            ..Default::default()
        };
        let payload = patch_payload(&patch, now).unwrap();
        assert_eq!(payload["title"], "X");
        assert_eq!(payload["updated_at"], "2026-08-07T12:00:00+00:00");
        assert!(payload.get("content").is_none());
    }

    #[test]
    fn toggle_delete_is_idempotent_per_target_state() {
        let now = Utc::now();

        // Repeating the call with the same observed state targets the
        // same is_deleted value; only the timestamp moves.
        let first = toggle_delete_payload(false, now);
        let again = toggle_delete_payload(false, now + Duration::seconds(5));
        assert_eq!(first["is_deleted"], again["is_deleted"]);
        assert_ne!(first["updated_at"], again["updated_at"]);

        let restore = toggle_delete_payload(true, now);
        assert_eq!(restore["is_deleted"], serde_json::json!(false));
    }

    #[test]
    fn detail_query_filters_by_id() {
        let params = detail_query(7);
        assert_eq!(param(&params, "id"), Some("eq.7"));
        assert_eq!(param(&params, "select"), Some("*"));
    }
}
