//! Sync command handler

use std::sync::Arc;

use anyhow::{bail, Context, Result};

use scorecard_core::sync::{HttpRemote, Reconciler, SyncReport};
use scorecard_core::Store;

use crate::output::Output;

/// Push local rounds and settings to the remote
///
/// Fails when the remote is offline or nothing at all could be synced.
/// Rounds that did not make it stay pending on this device.
pub async fn sync(store: &mut Store, output: &Output) -> Result<()> {
    let config = store.config().clone();

    if !config.sync_enabled {
        bail!(
            "Sync is not enabled. Enable it with:\n  \
             scorecard config set sync_enabled true\n  \
             scorecard config set sync_url http://your-server:5000/api"
        );
    }

    let remote = match HttpRemote::from_config(&config) {
        Some(remote) => remote.context("Cannot create sync client")?,
        None => bail!(
            "Sync URL not configured. Set it with:\n  \
             scorecard config set sync_url http://your-server:5000/api"
        ),
    };

    output.message(&format!("Connecting to {}...", remote.base_url()));
    let reconciler = Reconciler::new(Arc::new(remote), config.request_timeout());

    let connectivity = reconciler.probe().await;
    if !connectivity.is_online() {
        bail!("Remote is {}. Your rounds are safe on this device.", connectivity);
    }

    let report = reconciler.run(store).await;
    output.print_sync_report(&report);

    if let Some(message) = failure_message(&report) {
        bail!(message);
    }

    Ok(())
}

/// Why the run counts as failed, if it does
fn failure_message(report: &SyncReport) -> Option<String> {
    if !report.has_errors() || report.succeeded() > 0 {
        return None;
    }

    if report.total == 0 {
        Some("Settings could not be synced; they stay saved on this device".to_string())
    } else {
        Some(format!(
            "None of {} round(s) could be synced; they stay pending on this device",
            report.total
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use scorecard_core::sync::{SyncFailure, SyncTarget};

    fn report(total: usize, created: usize, failures: Vec<SyncTarget>) -> SyncReport {
        SyncReport {
            created,
            updated: 0,
            skipped: 0,
            failed: failures.len(),
            failures: failures
                .into_iter()
                .map(|target| SyncFailure {
                    target,
                    error: "request failed with status 500".to_string(),
                })
                .collect(),
            total,
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn test_settings_only_failure_does_not_mention_rounds() {
        let message = failure_message(&report(0, 0, vec![SyncTarget::Settings])).unwrap();
        assert!(message.starts_with("Settings could not be synced"));
        assert!(!message.contains("round"));
    }

    #[test]
    fn test_all_rounds_failed() {
        let failures = vec![
            SyncTarget::Round {
                client_id: "a".to_string(),
            },
            SyncTarget::Round {
                client_id: "b".to_string(),
            },
        ];
        let message = failure_message(&report(2, 0, failures)).unwrap();
        assert!(message.contains("None of 2 round(s)"));
    }

    #[test]
    fn test_partial_or_clean_run_succeeds() {
        assert!(failure_message(&report(2, 1, vec![SyncTarget::Settings])).is_none());
        assert!(failure_message(&report(0, 0, Vec::new())).is_none());
        assert!(failure_message(&report(3, 3, Vec::new())).is_none());
    }
}
