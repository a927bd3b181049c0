use serde::{Deserialize, Serialize};

use crate::models::{Article, ArticleFilter, ArticlePatch, ArticleStats, ArticleSummary};

/// Requests from the popup surface to the background worker. Tagged by
/// `type` on the wire; the upper-case spellings some senders use are
/// accepted as aliases.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    #[serde(rename = "getArticles")]
    GetArticles {
        #[serde(default)]
        filter: ArticleFilter,
    },
    #[serde(rename = "getArticle")]
    GetArticle { id: i64 },
    #[serde(rename = "updateArticle")]
    UpdateArticle { id: i64, updates: ArticlePatch },
    #[serde(rename = "deleteArticle")]
    DeleteArticle { id: i64 },
    #[serde(rename = "getStats", alias = "GET_STATS")]
    GetStats,
    #[serde(rename = "getConnectionStatus", alias = "GET_CONNECTION_STATUS")]
    GetConnectionStatus,
}

/// One response per request variant. `Article`/`Updated` carry a null
/// article on failure; the error itself is logged worker-side.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Response {
    #[serde(rename = "articles")]
    Articles { articles: Vec<ArticleSummary> },
    #[serde(rename = "article")]
    Article { article: Option<Article> },
    #[serde(rename = "updated")]
    Updated { article: Option<Article> },
    #[serde(rename = "deleted")]
    Deleted { ok: bool },
    #[serde(rename = "stats")]
    Stats { stats: ArticleStats },
    #[serde(rename = "connectionStatus")]
    ConnectionStatus { connected: bool, message: String },
}

/// Fire-and-forget broadcasts from the worker. Delivery is best-effort;
/// the popup may not be open.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "connectionStatus", alias = "CONNECTION_STATUS")]
    ConnectionStatus { connected: bool, message: String },
    #[serde(rename = "statsUpdate", alias = "STATS_UPDATE")]
    StatsUpdate { stats: ArticleStats },
}

/// Decode a JSON request, ignoring anything with an unknown `type`.
pub fn decode_request(raw: &str) -> Option<Request> {
    match serde_json::from_str(raw) {
        Ok(request) => Some(request),
        Err(e) => {
            tracing::warn!("ignoring unrecognized message: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_round_trip_with_camel_case_tags() {
        let raw = serde_json::to_string(&Request::GetStats).unwrap();
        assert_eq!(raw, r#"{"type":"getStats"}"#);

        let decoded = decode_request(&raw).unwrap();
        assert!(matches!(decoded, Request::GetStats));
    }

    #[test]
    fn upper_case_aliases_are_accepted() {
        assert!(matches!(
            decode_request(r#"{"type":"GET_STATS"}"#),
            Some(Request::GetStats)
        ));
        assert!(matches!(
            decode_request(r#"{"type":"GET_CONNECTION_STATUS"}"#),
            Some(Request::GetConnectionStatus)
        ));
    }

    #[test]
    fn get_articles_defaults_an_omitted_filter() {
        let decoded = decode_request(r#"{"type":"getArticles"}"#).unwrap();
        match decoded {
            Request::GetArticles { filter } => {
                assert!(!filter.today);
                assert!(!filter.week);
                assert!(filter.page.is_none());
            }
            other => panic!("expected GetArticles, got {other:?}"),
        }
    }

    #[test]
    fn unknown_types_are_ignored() {
        assert!(decode_request(r#"{"type":"dropAllTables"}"#).is_none());
        assert!(decode_request("not json").is_none());
    }

    #[test]
    fn events_serialize_with_wire_names() {
        let event = Event::StatsUpdate {
            stats: ArticleStats::default(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "statsUpdate");

        let event = Event::ConnectionStatus {
            connected: true,
            message: "Connected".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "connectionStatus");
    }

    #[test]
    fn event_aliases_decode_like_the_primary_names() {
        let raw = r#"{"type":"STATS_UPDATE","stats":{"total":3,"today":1,"week":2}}"#;
        let event: Event = serde_json::from_str(raw).unwrap();
        match event {
            Event::StatsUpdate { stats } => assert_eq!(stats.total, 3),
            other => panic!("expected StatsUpdate, got {other:?}"),
        }
    }
}
