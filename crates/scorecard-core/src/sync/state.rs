//! Reconciliation run state and connectivity

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Where a reconciliation run is
///
/// `Idle -> Running -> {Completed, CompletedWithErrors}`, and back to
/// `Running` on the next run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncState {
    /// No run has started yet
    Idle,
    /// A run is in progress
    Running,
    /// Last run had no failures
    Completed,
    /// Last run finished but some records failed
    CompletedWithErrors,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SyncState::Idle => "idle",
            SyncState::Running => "running",
            SyncState::Completed => "completed",
            SyncState::CompletedWithErrors => "completed with errors",
        };
        f.write_str(label)
    }
}

/// Result of a connectivity probe
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Connectivity {
    /// Remote answered and reported itself online
    #[serde(rename_all = "camelCase")]
    Online { last_synced: Option<DateTime<Utc>> },
    /// Anything else
    Offline { reason: String },
}

impl Connectivity {
    /// Whether "sync now" should be offered
    pub fn is_online(&self) -> bool {
        matches!(self, Connectivity::Online { .. })
    }
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connectivity::Online {
                last_synced: Some(at),
            } => write!(f, "online (remote last synced {})", at.format("%Y-%m-%d %H:%M")),
            Connectivity::Online { last_synced: None } => f.write_str("online"),
            Connectivity::Offline { reason } => write!(f, "offline ({})", reason),
        }
    }
}
