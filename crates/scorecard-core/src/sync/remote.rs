//! The remote collaborator seam
//!
//! The reconciliation engine talks to any `RemoteStore`: the HTTP service in
//! production and an in-memory remote in tests.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::message::{RemoteRound, RemoteSettings, RemoteStatus, UpsertResponse};

/// Errors talking to the remote
///
/// Always recorded per record by the engine, never fatal to a run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    /// Network or connection failure
    #[error("Remote unavailable: {0}")]
    Unavailable(String),

    /// No answer within the request timeout
    #[error("Request timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),

    /// Remote answered with a non-success status
    #[error("Request failed with status {status}: {message}")]
    RequestFailed { status: u16, message: String },

    /// Remote answered with a body we could not understand
    #[error("Invalid response from remote: {0}")]
    InvalidResponse(String),

    /// Sync URL is unusable
    #[error("Invalid sync URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// A remote store of rounds and settings
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Create or conditionally replace the round keyed by `client_id`
    async fn upsert_round(&self, round: RemoteRound) -> Result<UpsertResponse, RemoteError>;

    /// Create or conditionally replace the settings singleton
    async fn upsert_settings(
        &self,
        settings: RemoteSettings,
    ) -> Result<UpsertResponse, RemoteError>;

    /// Side-effect-free reachability check
    async fn status(&self) -> Result<RemoteStatus, RemoteError>;
}

/// Last-writer-wins decision for an existing remote record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertDecision {
    /// Incoming data replaces the stored record
    Replace,
    /// Stored record stays as it is
    Keep,
}

/// Replace only when the incoming record is strictly newer
///
/// Equal timestamps keep the stored record.
pub fn resolve_upsert(incoming: DateTime<Utc>, existing: DateTime<Utc>) -> UpsertDecision {
    if incoming > existing {
        UpsertDecision::Replace
    } else {
        UpsertDecision::Keep
    }
}
