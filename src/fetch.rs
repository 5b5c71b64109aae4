use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::client::MarketSource;
use crate::errors::AppError;
use crate::model::{AppEvent, FetchTicket};

/// Runs data requests off the UI loop and reports back through the event channel.
///
/// Only one materia request is kept in flight: issuing a new one aborts the
/// previous task so a superseded world can never deliver its result.
pub struct FetchCoordinator {
    source: Arc<dyn MarketSource>,
    events: mpsc::UnboundedSender<AppEvent>,
    inflight: Option<JoinHandle<()>>,
}

impl FetchCoordinator {
    pub fn new(source: Arc<dyn MarketSource>, events: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            source,
            events,
            inflight: None,
        }
    }

    pub fn fetch_materia(&mut self, ticket: FetchTicket) {
        if let Some(previous) = self.inflight.take() {
            if !previous.is_finished() {
                debug!(
                    request_id = ticket.request_id,
                    "Aborting superseded materia request"
                );
                previous.abort();
            }
        }

        let source = Arc::clone(&self.source);
        let tx = self.events.clone();
        self.inflight = Some(tokio::spawn(async move {
            let FetchTicket { request_id, world } = ticket;
            let event = match source.fetch_materia(&world).await {
                Ok(entries) => AppEvent::MateriaLoaded {
                    request_id,
                    world,
                    entries,
                },
                Err(err) => {
                    warn!(world = %world, error = %err, "Materia request failed");
                    AppEvent::MateriaFailed {
                        request_id,
                        world,
                        error: AppError::from(&err),
                    }
                }
            };
            let _ = tx.send(event);
        }));
    }

    /// Diagnostics are requested on demand only, never on a timer.
    pub fn fetch_timings(&self) {
        let source = Arc::clone(&self.source);
        let tx = self.events.clone();
        tokio::spawn(async move {
            let event = match source.fetch_timings().await {
                Ok(report) => AppEvent::TimingsLoaded { report },
                Err(err) => AppEvent::TimingsFailed {
                    error: AppError::from(&err),
                },
            };
            let _ = tx.send(event);
        });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::client::{ClientError, Result, TimingReport, TimingStat};
    use crate::model::{AppSettings, AppState, MateriaEntry};

    use super::*;

    struct FakeSource {
        delays: HashMap<String, Duration>,
    }

    #[async_trait]
    impl MarketSource for FakeSource {
        async fn fetch_materia(&self, world: &str) -> Result<Vec<MateriaEntry>> {
            let delay = self.delays.get(world).copied().unwrap_or_default();
            tokio::time::sleep(delay).await;
            if world == "Nowhere" {
                return Err(ClientError::Status {
                    status: 404,
                    body: "unknown world".into(),
                });
            }
            Ok(vec![MateriaEntry {
                id: 1,
                name: format!("{world} materia"),
                stat: "CP".into(),
                average_gil: Some(100),
                ..Default::default()
            }])
        }

        async fn fetch_timings(&self) -> Result<TimingReport> {
            let mut report = TimingReport::new();
            report.insert(
                "Universalis".into(),
                TimingStat {
                    calls: 1,
                    avg_time: 0.4,
                    total_time: 0.4,
                },
            );
            Ok(report)
        }
    }

    fn coordinator() -> (FetchCoordinator, mpsc::UnboundedReceiver<AppEvent>) {
        let mut delays = HashMap::new();
        delays.insert("Aether".to_string(), Duration::from_millis(200));
        delays.insert("Primal".to_string(), Duration::from_millis(10));
        let (tx, rx) = mpsc::unbounded_channel();
        (FetchCoordinator::new(Arc::new(FakeSource { delays }), tx), rx)
    }

    #[tokio::test]
    async fn superseded_world_never_reaches_the_view() {
        let (mut coordinator, mut rx) = coordinator();
        let mut state = AppState::new(&AppSettings::default());

        let aether = state.begin_fetch("Aether");
        coordinator.fetch_materia(aether);
        let primal = state.begin_fetch("Primal");
        coordinator.fetch_materia(primal);

        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("event within timeout")
            .expect("channel open");
        state.apply(event);
        assert_eq!(state.entries[0].name, "Primal materia");

        tokio::time::sleep(Duration::from_millis(400)).await;
        while let Ok(event) = rx.try_recv() {
            state.apply(event);
        }
        assert_eq!(state.world, "Primal");
        assert_eq!(state.entries[0].name, "Primal materia");
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn failures_are_reported_as_events() {
        let (mut coordinator, mut rx) = coordinator();
        let mut state = AppState::new(&AppSettings::default());
        let ticket = state.begin_fetch("Nowhere");
        coordinator.fetch_materia(ticket);
        let event = rx.recv().await.expect("event");
        state.apply(event);
        assert!(!state.loading);
        let error = state.last_error.expect("error recorded");
        assert!(error.message.contains("404"));
    }

    #[tokio::test]
    async fn timings_are_fetched_on_demand() {
        let (coordinator, mut rx) = coordinator();
        let mut state = AppState::new(&AppSettings::default());
        assert!(state.timing.open());
        coordinator.fetch_timings();
        let event = rx.recv().await.expect("event");
        state.apply(event);
        assert!(!state.timing.loading);
        assert_eq!(state.timing.report["Universalis"].calls, 1);
    }
}
