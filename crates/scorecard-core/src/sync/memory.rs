//! In-process remote
//!
//! Applies the same last-writer-wins rule as the real service. Useful for
//! tests and for exercising the engine without a network. Failures can be
//! injected per round, for settings, or for the whole remote.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::message::{
    RemoteRound, RemoteSettings, RemoteStatus, UpsertOutcome, UpsertResponse, SKIPPED_REASON,
};
use super::remote::{resolve_upsert, RemoteError, RemoteStore, UpsertDecision};

#[derive(Debug, Default)]
struct Inner {
    rounds: HashMap<String, RemoteRound>,
    settings: Option<RemoteSettings>,
    last_synced: Option<DateTime<Utc>>,
    failing_rounds: HashSet<String>,
    fail_settings: bool,
    offline: bool,
}

/// Remote kept in memory
#[derive(Debug, Default)]
pub struct MemoryRemote {
    inner: Mutex<Inner>,
    delay: Option<Duration>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every request, to exercise timeouts
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Seed a record as if another device had uploaded it
    pub fn insert_round(&self, round: RemoteRound) {
        self.lock().rounds.insert(round.client_id.clone(), round);
    }

    /// Make upserts for `client_id` fail with a server error
    pub fn fail_round(&self, client_id: impl Into<String>) {
        self.lock().failing_rounds.insert(client_id.into());
    }

    /// Make settings upserts fail with a server error
    pub fn fail_settings(&self) {
        self.lock().fail_settings = true;
    }

    /// Refuse every request as unreachable
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    pub fn round(&self, client_id: &str) -> Option<RemoteRound> {
        self.lock().rounds.get(client_id).cloned()
    }

    pub fn round_count(&self) -> usize {
        self.lock().rounds.len()
    }

    pub fn settings(&self) -> Option<RemoteSettings> {
        self.lock().settings.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn enter(&self) -> Result<(), RemoteError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.lock().offline {
            return Err(RemoteError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

fn server_error() -> RemoteError {
    RemoteError::RequestFailed {
        status: 500,
        message: "Internal server error".to_string(),
    }
}

fn response(outcome: UpsertOutcome, now: DateTime<Utc>) -> UpsertResponse {
    UpsertResponse {
        outcome,
        last_synced: Some(now),
        reason: (outcome == UpsertOutcome::Skipped).then(|| SKIPPED_REASON.to_string()),
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn upsert_round(&self, round: RemoteRound) -> Result<UpsertResponse, RemoteError> {
        self.enter().await?;

        let mut inner = self.lock();
        if inner.failing_rounds.contains(&round.client_id) {
            return Err(server_error());
        }

        let now = Utc::now();
        let outcome = match inner.rounds.get(&round.client_id) {
            None => UpsertOutcome::Created,
            Some(existing) => match resolve_upsert(round.updated_at, existing.updated_at) {
                UpsertDecision::Replace => UpsertOutcome::Updated,
                UpsertDecision::Keep => UpsertOutcome::Skipped,
            },
        };

        if outcome != UpsertOutcome::Skipped {
            inner.rounds.insert(round.client_id.clone(), round);
        }
        inner.last_synced = Some(now);
        Ok(response(outcome, now))
    }

    async fn upsert_settings(
        &self,
        settings: RemoteSettings,
    ) -> Result<UpsertResponse, RemoteError> {
        self.enter().await?;

        let mut inner = self.lock();
        if inner.fail_settings {
            return Err(server_error());
        }

        let now = Utc::now();
        let outcome = match &inner.settings {
            None => UpsertOutcome::Created,
            Some(existing) => match resolve_upsert(settings.updated_at, existing.updated_at) {
                UpsertDecision::Replace => UpsertOutcome::Updated,
                UpsertDecision::Keep => UpsertOutcome::Skipped,
            },
        };

        if outcome != UpsertOutcome::Skipped {
            inner.settings = Some(settings);
        }
        inner.last_synced = Some(now);
        Ok(response(outcome, now))
    }

    async fn status(&self) -> Result<RemoteStatus, RemoteError> {
        self.enter().await?;
        Ok(RemoteStatus::online(self.lock().last_synced))
    }
}
