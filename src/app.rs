use std::time::{Duration, Instant};

use tokio::sync::broadcast;

use crate::error::Result;
use crate::models::{
    Article, ArticleFilter, ArticlePatch, ArticleStats, ArticleSummary, Priority, TimeFilter,
};
use crate::tui::AppAction;
use crate::worker::{Event, Request, Response, WorkerHandle};

/// How long a save/delete outcome stays on screen.
const BANNER_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    List,
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditField {
    #[default]
    Title,
    Url,
    Content,
    Priority,
}

impl EditField {
    pub fn next(self) -> Self {
        match self {
            EditField::Title => EditField::Url,
            EditField::Url => EditField::Content,
            EditField::Content => EditField::Priority,
            EditField::Priority => EditField::Title,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            EditField::Title => EditField::Priority,
            EditField::Url => EditField::Title,
            EditField::Content => EditField::Url,
            EditField::Priority => EditField::Content,
        }
    }
}

/// Buffers behind the edit view's input fields.
#[derive(Debug, Clone, Default)]
pub struct EditForm {
    pub title: String,
    pub url: String,
    pub content: String,
    pub priority: Priority,
    pub focus: EditField,
}

impl EditForm {
    fn from_article(article: &Article) -> Self {
        Self {
            title: article.title.clone().unwrap_or_default(),
            url: article.url.clone().unwrap_or_default(),
            content: article.content.clone().unwrap_or_default(),
            priority: article.priority,
            focus: EditField::Title,
        }
    }

    fn to_patch(&self) -> ArticlePatch {
        ArticlePatch {
            title: Some(self.title.clone()),
            url: Some(self.url.clone()),
            content: Some(self.content.clone()),
            priority: Some(self.priority),
        }
    }
}

pub struct StatusBanner {
    pub message: String,
    pub is_error: bool,
    shown_at: Instant,
}

pub struct App {
    // Data
    pub articles: Vec<ArticleSummary>,
    pub current: Option<Article>,
    pub stats: ArticleStats,

    // UI State
    pub view: View,
    pub selected_index: usize,
    pub filter: TimeFilter,
    pub page: u32,
    pub show_deleted: bool,
    pub form: EditForm,
    pub banner: Option<StatusBanner>,
    pub show_help: bool,

    // Connection indicator, fed by worker broadcasts
    pub connected: bool,
    pub connection_message: String,

    // Background worker
    worker: WorkerHandle,
    events: broadcast::Receiver<Event>,
}

impl App {
    pub fn new(worker: WorkerHandle) -> Self {
        let events = worker.subscribe();
        Self {
            articles: Vec::new(),
            current: None,
            stats: ArticleStats::default(),
            view: View::List,
            selected_index: 0,
            filter: TimeFilter::All,
            page: 1,
            show_deleted: false,
            form: EditForm::default(),
            banner: None,
            show_help: false,
            connected: false,
            connection_message: "Connecting...".to_string(),
            worker,
            events,
        }
    }

    /// First load: article list, stats for the badge, and the current
    /// connection state.
    pub async fn init(&mut self) {
        self.refresh().await;

        let stats = self.worker.request(Request::GetStats).await;
        if let Some(Response::Stats { stats }) = stats {
            self.stats = stats;
        }

        let status = self.worker.request(Request::GetConnectionStatus).await;
        if let Some(Response::ConnectionStatus { connected, message }) = status {
            self.connected = connected;
            self.connection_message = message;
        }
    }

    fn query_filter(&self) -> ArticleFilter {
        ArticleFilter {
            today: self.filter == TimeFilter::Today,
            week: self.filter == TimeFilter::Week,
            page: Some(self.page),
            include_deleted: self.show_deleted,
        }
    }

    pub fn selected_article(&self) -> Option<&ArticleSummary> {
        self.articles.get(self.selected_index)
    }

    pub async fn handle_action(&mut self, action: AppAction) -> Result<bool> {
        match action {
            AppAction::Quit => return Ok(true),

            AppAction::MoveUp => {
                if self.selected_index > 0 {
                    self.selected_index -= 1;
                }
            }

            AppAction::MoveDown => {
                if !self.articles.is_empty() && self.selected_index < self.articles.len() - 1 {
                    self.selected_index += 1;
                }
            }

            AppAction::Refresh => self.refresh().await,

            AppAction::CycleFilter => {
                self.filter = self.filter.cycle();
                self.page = 1;
                self.selected_index = 0;
                self.refresh().await;
            }

            AppAction::ToggleShowDeleted => {
                self.show_deleted = !self.show_deleted;
                self.page = 1;
                self.selected_index = 0;
                self.refresh().await;
            }

            AppAction::NextPage => {
                self.page += 1;
                self.selected_index = 0;
                self.refresh().await;
                // Stepped past the last page; go back.
                if self.articles.is_empty() && self.page > 1 {
                    self.page -= 1;
                    self.refresh().await;
                }
            }

            AppAction::PrevPage => {
                if self.page > 1 {
                    self.page -= 1;
                    self.selected_index = 0;
                    self.refresh().await;
                }
            }

            AppAction::OpenSelected => self.open_selected().await,

            AppAction::OpenInBrowser => {
                let id = self.selected_article().map(|a| a.id);
                if let Some(id) = id {
                    self.open_in_browser(id).await;
                }
            }

            AppAction::BackToList => {
                self.view = View::List;
                self.current = None;
            }

            AppAction::NextField => self.form.focus = self.form.focus.next(),
            AppAction::PrevField => self.form.focus = self.form.focus.prev(),

            AppAction::EditChar(c) => match self.form.focus {
                EditField::Title => self.form.title.push(c),
                EditField::Url => self.form.url.push(c),
                EditField::Content => self.form.content.push(c),
                // Space cycles the priority; other characters are
                // meaningless there.
                EditField::Priority => {
                    if c == ' ' {
                        self.form.priority = self.form.priority.cycle();
                    }
                }
            },

            AppAction::EditBackspace => {
                match self.form.focus {
                    EditField::Title => self.form.title.pop(),
                    EditField::Url => self.form.url.pop(),
                    EditField::Content => self.form.content.pop(),
                    EditField::Priority => None,
                };
            }

            AppAction::EditNewline => {
                if self.form.focus == EditField::Content {
                    self.form.content.push('\n');
                }
            }

            AppAction::Save => self.save().await,
            AppAction::ToggleDelete => self.toggle_delete().await,

            AppAction::ShowHelp => self.show_help = true,
            AppAction::HideHelp => self.show_help = false,
        }

        Ok(false)
    }

    pub async fn refresh(&mut self) {
        let filter = self.query_filter();
        let response = self.worker.request(Request::GetArticles { filter }).await;
        match response {
            Some(Response::Articles { articles }) => {
                self.articles = articles;
                if self.selected_index >= self.articles.len() {
                    self.selected_index = self.articles.len().saturating_sub(1);
                }
            }
            _ => self.flash("Error loading articles", true),
        }
    }

    async fn open_selected(&mut self) {
        let Some(id) = self.selected_article().map(|a| a.id) else {
            return;
        };

        let response = self.worker.request(Request::GetArticle { id }).await;
        match response {
            Some(Response::Article {
                article: Some(article),
            }) => {
                self.form = EditForm::from_article(&article);
                self.current = Some(article);
                self.view = View::Edit;
            }
            _ => self.flash("Error loading article details", true),
        }
    }

    async fn open_in_browser(&mut self, id: i64) {
        let response = self.worker.request(Request::GetArticle { id }).await;
        match response {
            Some(Response::Article {
                article: Some(article),
            }) => match article.url.as_deref() {
                Some(url) if !url.is_empty() => {
                    let _ = open::that(url);
                }
                _ => self.flash("Article has no source URL", true),
            },
            _ => self.flash("Error loading article details", true),
        }
    }

    async fn save(&mut self) {
        let Some(id) = self.current.as_ref().map(|a| a.id) else {
            return;
        };

        let updates = self.form.to_patch();
        let response = self
            .worker
            .request(Request::UpdateArticle { id, updates })
            .await;
        match response {
            Some(Response::Updated {
                article: Some(_article),
            }) => {
                self.flash("Article saved successfully", false);
                self.view = View::List;
                self.current = None;
                self.refresh().await;
            }
            _ => self.flash("Error saving article", true),
        }
    }

    async fn toggle_delete(&mut self) {
        let Some(article) = self.current.as_ref() else {
            return;
        };
        let id = article.id;
        let was_deleted = article.is_deleted;

        let response = self.worker.request(Request::DeleteArticle { id }).await;
        match response {
            Some(Response::Deleted { ok: true }) => {
                let outcome = if was_deleted {
                    "Article restored successfully"
                } else {
                    "Article deleted successfully"
                };
                self.flash(outcome, false);
                self.view = View::List;
                self.current = None;
                self.refresh().await;
            }
            _ => {
                let outcome = if was_deleted {
                    "Error restoring article"
                } else {
                    "Error deleting article"
                };
                self.flash(outcome, true);
            }
        }
    }

    pub fn flash(&mut self, message: &str, is_error: bool) {
        self.banner = Some(StatusBanner {
            message: message.to_string(),
            is_error,
            shown_at: Instant::now(),
        });
    }

    /// Expire the transient banner.
    pub fn tick(&mut self) {
        if let Some(banner) = &self.banner {
            if banner.shown_at.elapsed() >= BANNER_DURATION {
                self.banner = None;
            }
        }
    }

    /// Drain pushed worker events (non-blocking, called every frame).
    pub fn poll_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(Event::ConnectionStatus { connected, message }) => {
                    self.connected = connected;
                    self.connection_message = message;
                }
                Ok(Event::StatsUpdate { stats }) => self.stats = stats,
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::debug!("dropped {skipped} worker events");
                }
                Err(_) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker;

    fn test_app() -> App {
        App::new(worker::test_handle())
    }

    #[test]
    fn banner_expires_after_three_seconds() {
        let mut app = test_app();
        app.flash("Article saved successfully", false);
        assert!(app.banner.is_some());

        app.tick();
        assert!(app.banner.is_some());

        app.banner.as_mut().unwrap().shown_at = Instant::now() - Duration::from_secs(4);
        app.tick();
        assert!(app.banner.is_none());
    }

    #[test]
    fn query_filter_reflects_ui_state() {
        let mut app = test_app();
        app.filter = TimeFilter::Today;
        app.page = 3;
        app.show_deleted = true;

        let filter = app.query_filter();
        assert!(filter.today);
        assert!(!filter.week);
        assert_eq!(filter.page, Some(3));
        assert!(filter.include_deleted);
    }

    #[tokio::test]
    async fn edit_form_routes_input_to_the_focused_field() {
        let mut app = test_app();
        app.view = View::Edit;

        app.handle_action(AppAction::EditChar('a')).await.unwrap();
        assert_eq!(app.form.title, "a");

        app.handle_action(AppAction::NextField).await.unwrap();
        app.handle_action(AppAction::EditChar('b')).await.unwrap();
        assert_eq!(app.form.url, "b");
        assert_eq!(app.form.title, "a");

        // Newlines only land in the content field.
        app.handle_action(AppAction::EditNewline).await.unwrap();
        assert_eq!(app.form.url, "b");
    }

    #[tokio::test]
    async fn space_cycles_priority_when_focused() {
        let mut app = test_app();
        app.form.focus = EditField::Priority;

        app.handle_action(AppAction::EditChar(' ')).await.unwrap();
        assert_eq!(app.form.priority, Priority::Medium);

        app.handle_action(AppAction::EditChar('x')).await.unwrap();
        assert_eq!(app.form.priority, Priority::Medium);
    }

    #[test]
    fn form_patch_carries_every_field() {
        let form = EditForm {
            title: "T".to_string(),
            url: "https://example.com".to_string(),
            content: "body".to_string(),
            priority: Priority::High,
            focus: EditField::Title,
        };
        let patch = form.to_patch();
        assert_eq!(patch.title.as_deref(), Some("T"));
        assert_eq!(patch.url.as_deref(), Some("https://example.com"));
        assert_eq!(patch.content.as_deref(), Some("body"));
        assert_eq!(patch.priority, Some(Priority::High));
    }
}
