mod monitor;
mod protocol;
mod watcher;

pub use monitor::{ConnectionMonitor, ConnectivityProbe, DEFAULT_MAX_RETRIES};
pub use protocol::{decode_request, Event, Request, Response};
pub use watcher::badge_text;

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::Duration;

use crate::config::Config;
use crate::error::AppError;
use crate::models::ConnectionStatus;
use crate::store::{ArticleRepository, StoreClient};

use watcher::ChangeWatcher;

struct WorkerRequest {
    request: Request,
    reply: oneshot::Sender<Response>,
}

/// The popup's side of the background worker: request/response over a
/// channel, plus a broadcast subscription for pushed events. Cheap to
/// clone; the popup never touches the store directly.
#[derive(Clone)]
pub struct WorkerHandle {
    requests: mpsc::Sender<WorkerRequest>,
    events: broadcast::Sender<Event>,
}

impl WorkerHandle {
    /// Send one request and wait for its reply. `None` means the worker
    /// is gone, which callers treat like any other failed operation.
    pub async fn request(&self, request: Request) -> Option<Response> {
        let (reply, rx) = oneshot::channel();
        self.requests
            .send(WorkerRequest { request, reply })
            .await
            .ok()?;
        rx.await.ok()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }
}

/// Start the background worker: bring up the connection, then serve
/// requests while the change watcher polls alongside.
pub fn spawn(store: StoreClient, config: &Config) -> WorkerHandle {
    let (req_tx, mut req_rx) = mpsc::channel::<WorkerRequest>(16);
    let (event_tx, _) = broadcast::channel(64);

    let monitor = Arc::new(ConnectionMonitor::new(store.clone(), event_tx.clone()));
    let repo = ArticleRepository::new(store.clone());

    {
        let monitor = Arc::clone(&monitor);
        let repo = repo.clone();
        tokio::spawn(async move {
            if monitor.check_connection().await != ConnectionStatus::Connected {
                monitor.retry_connection(DEFAULT_MAX_RETRIES).await;
            }

            while let Some(WorkerRequest { request, reply }) = req_rx.recv().await {
                let response = dispatch(request, &repo, &monitor).await;
                // The popup may have closed while we were working.
                let _ = reply.send(response);
            }
        });
    }

    let watcher = ChangeWatcher::new(
        store,
        repo,
        Arc::clone(&monitor),
        event_tx.clone(),
        Duration::from_secs(config.poll_interval_secs),
    );
    tokio::spawn(watcher.run());

    WorkerHandle {
        requests: req_tx,
        events: event_tx,
    }
}

async fn dispatch(
    request: Request,
    repo: &ArticleRepository,
    monitor: &Arc<ConnectionMonitor<StoreClient>>,
) -> Response {
    match request {
        Request::GetArticles { filter } => Response::Articles {
            articles: repo.list(&filter).await,
        },

        Request::GetArticle { id } => match repo.get_detail(id).await {
            Ok(article) => Response::Article {
                article: Some(article),
            },
            Err(e) => {
                tracing::warn!("getArticle({id}) failed: {e}");
                note_fault(monitor, &e);
                Response::Article { article: None }
            }
        },

        Request::UpdateArticle { id, updates } => match repo.update(id, &updates).await {
            Ok(article) => Response::Updated {
                article: Some(article),
            },
            Err(e) => {
                tracing::warn!("updateArticle({id}) failed: {e}");
                note_fault(monitor, &e);
                Response::Updated { article: None }
            }
        },

        Request::DeleteArticle { id } => match repo.get_detail(id).await {
            Ok(article) => Response::Deleted {
                ok: repo.toggle_delete(id, article.is_deleted).await,
            },
            Err(e) => {
                tracing::warn!("deleteArticle({id}) failed: {e}");
                note_fault(monitor, &e);
                Response::Deleted { ok: false }
            }
        },

        Request::GetStats => match repo.stats().await {
            Ok(stats) => Response::Stats { stats },
            Err(e) => {
                tracing::warn!("stats query failed: {e}");
                note_fault(monitor, &e);
                Response::Stats {
                    stats: Default::default(),
                }
            }
        },

        Request::GetConnectionStatus => {
            let state = monitor.state();
            Response::ConnectionStatus {
                connected: state.is_connected(),
                message: state.message(),
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn test_handle() -> WorkerHandle {
    let (requests, _) = mpsc::channel(1);
    let (events, _) = broadcast::channel(1);
    WorkerHandle { requests, events }
}

/// A transport-level failure during a live operation knocks the monitor
/// out of Connected and kicks off a fresh retry cycle. Validation and
/// not-found errors say nothing about connectivity.
fn note_fault(monitor: &Arc<ConnectionMonitor<StoreClient>>, error: &AppError) {
    if error.is_transport() {
        monitor.mark_fault(error.to_string());
        Arc::clone(monitor).schedule_retry(DEFAULT_MAX_RETRIES);
    }
}
