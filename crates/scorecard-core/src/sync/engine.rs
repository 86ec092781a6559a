//! Reconciliation engine
//!
//! One run pushes every local round and the settings singleton to the remote,
//! then records what was accepted. The remote decides conflicts by
//! last-writer-wins; the client never pulls.
//!
//! Failures are collected per record into the `SyncReport` and never abort the
//! batch. Successes are kept even when other records fail.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::message::{RemoteRound, RemoteSettings, UpsertOutcome};
use super::remote::{RemoteError, RemoteStore};
use super::state::{Connectivity, SyncState};
use crate::store::{Store, SyncWriteback};

/// What a failure was about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SyncTarget {
    #[serde(rename_all = "camelCase")]
    Round { client_id: String },
    Settings,
    /// Recording the outcome in the local store
    LocalStore,
}

/// One record that did not make it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncFailure {
    pub target: SyncTarget,
    pub error: String,
}

/// Outcome of one run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failures: Vec<SyncFailure>,
    /// Rounds attempted
    pub total: usize,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    fn new(total: usize) -> Self {
        Self {
            created: 0,
            updated: 0,
            skipped: 0,
            failed: 0,
            failures: Vec::new(),
            total,
            finished_at: Utc::now(),
        }
    }

    fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created => self.created += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Skipped => self.skipped += 1,
        }
    }

    fn fail(&mut self, target: SyncTarget, error: impl ToString) {
        self.failed += 1;
        self.failures.push(SyncFailure {
            target,
            error: error.to_string(),
        });
    }

    /// Rounds the remote accepted, including skips
    pub fn succeeded(&self) -> usize {
        self.created + self.updated + self.skipped
    }

    pub fn has_errors(&self) -> bool {
        self.failed > 0
    }

    /// "synced N of M; K errors"
    pub fn summary(&self) -> String {
        format!(
            "synced {} of {}; {} errors",
            self.succeeded(),
            self.total,
            self.failed
        )
    }
}

/// Pushes local state to a remote
pub struct Reconciler {
    remote: Arc<dyn RemoteStore>,
    timeout: Duration,
    state: watch::Sender<SyncState>,
    state_rx: watch::Receiver<SyncState>,
}

impl Reconciler {
    pub fn new(remote: Arc<dyn RemoteStore>, timeout: Duration) -> Self {
        let (state, state_rx) = watch::channel(SyncState::Idle);
        Self {
            remote,
            timeout,
            state,
            state_rx,
        }
    }

    /// Get the current state
    pub fn state(&self) -> SyncState {
        *self.state_rx.borrow()
    }

    /// Subscribe to state changes
    pub fn subscribe_state(&self) -> watch::Receiver<SyncState> {
        self.state_rx.clone()
    }

    fn set_state(&self, state: SyncState) {
        let _ = self.state.send(state);
    }

    /// Run a request under the per-request timeout
    async fn bounded<T>(
        &self,
        request: impl Future<Output = Result<T, RemoteError>>,
    ) -> Result<T, RemoteError> {
        tokio::time::timeout(self.timeout, request)
            .await
            .unwrap_or(Err(RemoteError::Timeout(self.timeout)))
    }

    /// Whether the remote is reachable; touches nothing
    pub async fn probe(&self) -> Connectivity {
        match self.bounded(self.remote.status()).await {
            Ok(status) if status.is_online() => Connectivity::Online {
                last_synced: status.last_synced,
            },
            Ok(status) => Connectivity::Offline {
                reason: format!("remote reported status '{}'", status.status),
            },
            Err(e) => {
                debug!("Connectivity probe failed: {}", e);
                Connectivity::Offline {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Push every local round and the settings, then record the outcome
    ///
    /// Taking the store mutably means only one run can touch it at a time.
    /// A round edited while its upsert is in flight stays pending.
    pub async fn run(&self, store: &mut Store) -> SyncReport {
        self.set_state(SyncState::Running);

        let snapshot = store.snapshot();
        let mut report = SyncReport::new(snapshot.rounds.len());
        info!("Starting sync of {} round(s)", report.total);

        let uploads = snapshot.rounds.iter().map(|round| {
            let payload = RemoteRound::from(round);
            async move {
                let result = self.bounded(self.remote.upsert_round(payload)).await;
                (round, result)
            }
        });

        let mut synced = Vec::new();
        for (round, result) in join_all(uploads).await {
            match result {
                Ok(response) => {
                    debug!("Round {} {:?}", round.id, response.outcome);
                    report.record(response.outcome);
                    synced.push((round.id.clone(), round.updated_at));
                }
                Err(e) => {
                    warn!("Failed to sync round {}: {}", round.id, e);
                    report.fail(
                        SyncTarget::Round {
                            client_id: round.id.clone(),
                        },
                        e,
                    );
                }
            }
        }

        let settings = RemoteSettings::from(&snapshot.settings);
        match self.bounded(self.remote.upsert_settings(settings)).await {
            Ok(response) => debug!("Settings {:?}", response.outcome),
            Err(e) => {
                warn!("Failed to sync settings: {}", e);
                report.fail(SyncTarget::Settings, e);
            }
        }

        report.finished_at = Utc::now();
        let writeback = SyncWriteback {
            synced,
            finished_at: report.finished_at,
            pending_changes: report.has_errors(),
        };
        if let Err(e) = store.record_sync(&writeback) {
            warn!("Failed to record sync outcome: {}", e);
            report.fail(SyncTarget::LocalStore, e);
        }

        self.set_state(if report.has_errors() {
            SyncState::CompletedWithErrors
        } else {
            SyncState::Completed
        });
        info!("Sync finished: {}", report.summary());
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HolePatch, NewRound};
    use crate::sync::memory::MemoryRemote;
    use chrono::TimeZone;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn reconciler(remote: &Arc<MemoryRemote>) -> Reconciler {
        Reconciler::new(remote.clone(), TIMEOUT)
    }

    fn store_with_abc() -> Store {
        let mut store = Store::in_memory();
        store
            .import_snapshot(
                r#"{"rounds": [{
                    "id": "abc",
                    "date": "2024-01-01T00:00:00Z",
                    "courseName": "Home",
                    "holeCount": 18,
                    "updatedAt": "2024-01-01T00:00:00Z",
                    "holes": [{"number": 1, "par": 4, "score": 5}]
                }]}"#,
            )
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_new_round_is_created_and_marked_synced() {
        let remote = Arc::new(MemoryRemote::new());
        let reconciler = reconciler(&remote);
        let mut store = store_with_abc();

        assert_eq!(reconciler.state(), SyncState::Idle);
        let report = reconciler.run(&mut store).await;

        assert_eq!(report.created, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(report.summary(), "synced 1 of 1; 0 errors");
        assert_eq!(reconciler.state(), SyncState::Completed);

        let remote_round = remote.round("abc").unwrap();
        assert_eq!(remote_round.holes[0].score, Some(5));

        let local = store.get("abc").unwrap();
        assert!(local.synced_to_server);
        assert_eq!(local.last_synced, Some(report.finished_at));

        let status = store.sync_status();
        assert_eq!(status.last_synced, Some(report.finished_at));
        assert!(!status.pending_changes);
        assert!(remote.settings().is_some());
    }

    #[tokio::test]
    async fn test_newer_remote_record_is_kept() {
        let remote = Arc::new(MemoryRemote::new());
        let mut newer = RemoteRound::from(&store_with_abc().get("abc").unwrap());
        newer.updated_at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        newer.course_name = "Edited elsewhere".to_string();
        remote.insert_round(newer);

        let mut store = store_with_abc();
        let report = reconciler(&remote).run(&mut store).await;

        assert_eq!(report.skipped, 1);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(remote.round("abc").unwrap().course_name, "Edited elsewhere");
        // Skipped is still an accepted request
        assert!(store.get("abc").unwrap().synced_to_server);
    }

    #[tokio::test]
    async fn test_older_remote_record_is_replaced() {
        let remote = Arc::new(MemoryRemote::new());
        let mut older = RemoteRound::from(&store_with_abc().get("abc").unwrap());
        older.updated_at = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();
        older.course_name = "Old name".to_string();
        remote.insert_round(older);

        let mut store = store_with_abc();
        let report = reconciler(&remote).run(&mut store).await;

        assert_eq!(report.updated, 1);
        assert_eq!(remote.round("abc").unwrap().course_name, "Home");
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_successes() {
        let remote = Arc::new(MemoryRemote::new());
        let mut store = Store::in_memory();
        let good = store.create(NewRound::new("Good")).unwrap();
        let bad = store.create(NewRound::new("Bad")).unwrap();
        store
            .upsert_hole(
                &bad.id,
                1,
                &HolePatch {
                    score: Some(4),
                    ..HolePatch::default()
                },
            )
            .unwrap();
        remote.fail_round(bad.id.clone());

        let reconciler = reconciler(&remote);
        let report = reconciler.run(&mut store).await;

        assert_eq!(report.created, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.summary(), "synced 1 of 2; 1 errors");
        assert_eq!(
            report.failures[0].target,
            SyncTarget::Round {
                client_id: bad.id.clone()
            }
        );
        assert_eq!(reconciler.state(), SyncState::CompletedWithErrors);

        assert!(store.get(&good.id).unwrap().synced_to_server);
        assert!(!store.get(&bad.id).unwrap().synced_to_server);
        assert!(store.sync_status().pending_changes);
        assert_eq!(store.pending().len(), 1);
    }

    #[tokio::test]
    async fn test_settings_failure_is_reported() {
        let remote = Arc::new(MemoryRemote::new());
        remote.fail_settings();
        let mut store = store_with_abc();

        let report = reconciler(&remote).run(&mut store).await;

        assert_eq!(report.created, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failures[0].target, SyncTarget::Settings);
        assert!(store.get("abc").unwrap().synced_to_server);
        assert!(store.sync_status().pending_changes);
    }

    #[tokio::test]
    async fn test_offline_remote_fails_every_record() {
        let remote = Arc::new(MemoryRemote::new());
        remote.set_offline(true);
        let mut store = store_with_abc();

        let report = reconciler(&remote).run(&mut store).await;

        assert_eq!(report.succeeded(), 0);
        assert_eq!(report.failed, 2);
        assert!(!store.get("abc").unwrap().synced_to_server);
    }

    #[tokio::test]
    async fn test_slow_remote_times_out() {
        let remote = Arc::new(MemoryRemote::new().with_delay(Duration::from_millis(500)));
        let reconciler = Reconciler::new(remote.clone(), Duration::from_millis(50));
        let mut store = store_with_abc();

        let report = reconciler.run(&mut store).await;
        assert_eq!(report.failed, 2);
        assert!(report.failures[0].error.contains("timed out"));

        assert!(!reconciler.probe().await.is_online());
    }

    #[tokio::test]
    async fn test_empty_store_still_syncs_settings() {
        let remote = Arc::new(MemoryRemote::new());
        let mut store = Store::in_memory();

        let report = reconciler(&remote).run(&mut store).await;
        assert_eq!(report.total, 0);
        assert!(!report.has_errors());
        assert!(remote.settings().is_some());
        assert!(store.sync_status().last_synced.is_some());
    }

    #[tokio::test]
    async fn test_state_is_observable() {
        let remote = Arc::new(MemoryRemote::new());
        let reconciler = reconciler(&remote);
        let mut rx = reconciler.subscribe_state();
        let mut store = store_with_abc();

        reconciler.run(&mut store).await;

        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), SyncState::Completed);
    }

    #[tokio::test]
    async fn test_probe_has_no_side_effects() {
        let remote = Arc::new(MemoryRemote::new());
        let reconciler = reconciler(&remote);
        let store = store_with_abc();

        assert!(reconciler.probe().await.is_online());
        assert_eq!(remote.round_count(), 0);
        assert!(!store.get("abc").unwrap().synced_to_server);
        assert_eq!(reconciler.state(), SyncState::Idle);

        remote.set_offline(true);
        assert!(matches!(
            reconciler.probe().await,
            Connectivity::Offline { .. }
        ));
    }
}
