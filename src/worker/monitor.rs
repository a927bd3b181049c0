use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

use crate::error::Result;
use crate::models::{ConnectionState, ConnectionStatus};
use crate::store::StoreClient;

use super::protocol::Event;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Lightweight reachability check against the store. The monitor only
/// needs this one operation, so the state machine can be driven by a
/// scripted probe in tests.
pub trait ConnectivityProbe: Send + Sync + 'static {
    fn probe(&self) -> impl Future<Output = Result<u64>> + Send;
}

impl ConnectivityProbe for StoreClient {
    fn probe(&self) -> impl Future<Output = Result<u64>> + Send {
        StoreClient::probe(self)
    }
}

/// Establishes and re-verifies backend connectivity, broadcasting every
/// state transition. Listeners may come and go; delivery is
/// best-effort and never fails the monitor.
///
/// States: Disconnected -> Connecting -> {Connected, Failed};
/// Failed -> Connecting on retry; Connected -> Connecting when a live
/// operation or the change subscription faults. There is no terminal
/// state.
pub struct ConnectionMonitor<P> {
    probe: P,
    state: Mutex<ConnectionState>,
    events: broadcast::Sender<Event>,
    retry_task: Mutex<Option<JoinHandle<()>>>,
}

impl<P: ConnectivityProbe> ConnectionMonitor<P> {
    pub fn new(probe: P, events: broadcast::Sender<Event>) -> Self {
        Self {
            probe,
            state: Mutex::new(ConnectionState::default()),
            events,
            retry_task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state.lock().unwrap().clone()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.state.lock().unwrap().status
    }

    /// One connectivity check: Connected on success (retry counter
    /// resets), Failed with the error recorded otherwise.
    pub async fn check_connection(&self) -> ConnectionStatus {
        self.transition(|state| state.status = ConnectionStatus::Connecting);

        match self.probe.probe().await {
            Ok(total) => {
                tracing::debug!("connection check ok ({total} articles)");
                self.transition(|state| {
                    state.status = ConnectionStatus::Connected;
                    state.last_error = None;
                    state.retry_count = 0;
                });
            }
            Err(e) => {
                tracing::warn!("connection check failed: {e}");
                self.transition(|state| {
                    state.status = ConnectionStatus::Failed;
                    state.last_error = Some(e.to_string());
                });
            }
        }
        self.status()
    }

    /// Bounded reconnect loop with linear backoff: attempt n runs after
    /// an n-second delay (1s, 2s, 3s, ...). Stops on the first success.
    /// After `max_retries` failures the state stays Failed until
    /// something re-invokes `check_connection`; the loop never
    /// reschedules itself.
    pub async fn retry_connection(&self, max_retries: u32) -> bool {
        for attempt in 1..=max_retries {
            sleep(RETRY_BASE_DELAY * attempt).await;
            self.transition(|state| {
                state.status = ConnectionStatus::Connecting;
                state.retry_count = attempt;
            });
            tracing::info!("reconnect attempt {attempt}/{max_retries}");

            match self.probe.probe().await {
                Ok(_) => {
                    tracing::info!("reconnected on attempt {attempt}");
                    self.transition(|state| {
                        state.status = ConnectionStatus::Connected;
                        state.last_error = None;
                        state.retry_count = 0;
                    });
                    return true;
                }
                Err(e) => {
                    tracing::warn!("reconnect attempt {attempt} failed: {e}");
                    self.state.lock().unwrap().last_error = Some(e.to_string());
                }
            }
        }

        tracing::error!("giving up after {max_retries} reconnect attempts");
        self.transition(|state| state.status = ConnectionStatus::Failed);
        false
    }

    /// A live operation or the change subscription hit a backend error:
    /// leave Connected and record the fault. The caller picks the retry
    /// policy from here.
    pub fn mark_fault(&self, error: impl Into<String>) {
        self.transition(|state| {
            state.status = ConnectionStatus::Connecting;
            state.last_error = Some(error.into());
        });
    }

    /// Run `retry_connection` as a background task, replacing (and
    /// aborting) any retry cycle still in flight.
    pub fn schedule_retry(self: Arc<Self>, max_retries: u32) {
        let monitor = Arc::clone(&self);
        let handle = tokio::spawn(async move {
            monitor.retry_connection(max_retries).await;
        });
        if let Some(previous) = self.retry_task.lock().unwrap().replace(handle) {
            previous.abort();
        }
    }

    fn transition(&self, apply: impl FnOnce(&mut ConnectionState)) {
        let snapshot = {
            let mut state = self.state.lock().unwrap();
            apply(&mut state);
            state.clone()
        };
        // Best-effort broadcast: a send error only means nobody is
        // listening right now.
        let _ = self.events.send(Event::ConnectionStatus {
            connected: snapshot.is_connected(),
            message: snapshot.message(),
        });
    }
}
