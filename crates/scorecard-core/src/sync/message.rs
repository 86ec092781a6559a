//! Wire types exchanged with the remote round service
//!
//! JSON, camelCase. A round travels with its local `id` as `clientId`, the key
//! the remote upserts by; local sync flags never leave the device.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::envelope::{Settings, Units};
use crate::models::{Hole, HoleCount, Round};

/// Status string the remote reports when it is accepting requests
pub const STATUS_ONLINE: &str = "online";

/// A round as sent to the remote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRound {
    pub client_id: String,
    pub date: DateTime<Utc>,
    pub course_name: String,
    pub hole_count: HoleCount,
    pub holes: Vec<Hole>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Round> for RemoteRound {
    fn from(round: &Round) -> Self {
        Self {
            client_id: round.id.clone(),
            date: round.date,
            course_name: round.course_name.clone(),
            hole_count: round.hole_count,
            holes: round.holes.clone(),
            updated_at: round.updated_at,
        }
    }
}

/// The settings singleton as sent to the remote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSettings {
    pub units: Units,
    pub updated_at: DateTime<Utc>,
}

impl From<&Settings> for RemoteSettings {
    fn from(settings: &Settings) -> Self {
        Self {
            units: settings.units,
            updated_at: settings.updated_at,
        }
    }
}

/// What the remote did with an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    /// No record existed for the key
    Created,
    /// Incoming data was newer and replaced the record
    Updated,
    /// The remote record was as new or newer and was left alone
    Skipped,
}

/// What an upsert did, as reported to the reconciler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertResponse {
    pub outcome: UpsertOutcome,
    #[serde(default)]
    pub last_synced: Option<DateTime<Utc>>,
    /// Explanation for a skip, e.g. "Server data newer"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Upsert reply body as the remote sends it
///
/// The remote answers with the record it now stores (`_id`, `clientId`, the
/// round fields, `updatedAt`, `lastSynced`). Only the fields needed to tell
/// what happened are decoded; an explicit `outcome` wins when present.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertReply {
    #[serde(default)]
    pub outcome: Option<UpsertOutcome>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_synced: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl UpsertReply {
    /// Work out the outcome of an upsert that sent `sent_updated_at`
    ///
    /// `created` is whether the remote answered 201. Otherwise a stored
    /// `updatedAt` newer than the one sent means the remote kept its own copy.
    pub fn into_response(self, created: bool, sent_updated_at: DateTime<Utc>) -> UpsertResponse {
        let outcome = match (self.outcome, self.updated_at) {
            (Some(outcome), _) => outcome,
            _ if created => UpsertOutcome::Created,
            (None, Some(stored)) if stored > sent_updated_at => UpsertOutcome::Skipped,
            (None, _) => UpsertOutcome::Updated,
        };

        let reason = self.reason.or_else(|| {
            (outcome == UpsertOutcome::Skipped).then(|| SKIPPED_REASON.to_string())
        });

        UpsertResponse {
            outcome,
            last_synced: self.last_synced,
            reason,
        }
    }
}

/// Reason given when the remote keeps a newer record
pub const SKIPPED_REASON: &str = "Server data newer";

/// Remote reply to a status check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStatus {
    pub status: String,
    #[serde(default)]
    pub last_synced: Option<DateTime<Utc>>,
}

impl RemoteStatus {
    pub fn online(last_synced: Option<DateTime<Utc>>) -> Self {
        Self {
            status: STATUS_ONLINE.to_string(),
            last_synced,
        }
    }

    pub fn is_online(&self) -> bool {
        self.status == STATUS_ONLINE
    }
}
