//! The persisted envelope
//!
//! One JSON document holds everything the device knows:
//!
//! ```text
//! {
//!   "rounds": [ Round... ],
//!   "settings": { "units": "meters" | "yards" },
//!   "syncStatus": { "lastSynced": timestamp | null, "pendingChanges": bool }
//! }
//! ```
//!
//! Every mutation rewrites the whole envelope; there is no partial write.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{epoch, Round};

/// Distance units shown to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Meters,
    Yards,
}

impl Units {
    pub fn as_str(self) -> &'static str {
        match self {
            Units::Meters => "meters",
            Units::Yards => "yards",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "meters" | "metres" | "m" => Ok(Units::Meters),
            "yards" | "yd" => Ok(Units::Yards),
            other => Err(format!("unknown units '{}', expected meters or yards", other)),
        }
    }
}

/// Device-wide preferences; there is exactly one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub units: Units,
    #[serde(default = "epoch")]
    pub updated_at: DateTime<Utc>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            units: Units::default(),
            updated_at: epoch(),
        }
    }
}

/// Partial settings update, new values win
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default)]
    pub units: Option<Units>,
}

impl Settings {
    /// Shallow merge; returns whether anything changed
    pub fn merge(&mut self, patch: &SettingsPatch, now: DateTime<Utc>) -> bool {
        let mut changed = false;
        if let Some(units) = patch.units {
            changed |= self.units != units;
            self.units = units;
        }
        if changed {
            self.updated_at = now;
        }
        changed
    }
}

/// Outcome of the most recent reconciliation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetadata {
    #[serde(default)]
    pub last_synced: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pending_changes: bool,
}

/// Counts from an additive import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Rounds that were new to this device
    pub added: usize,
    /// Rounds whose id already existed locally and were left alone
    pub skipped: usize,
}

/// The whole on-device document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub rounds: Vec<Round>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub sync_status: SyncMetadata,
}

impl Envelope {
    /// Parse a serialized envelope
    ///
    /// Hole lists are normalized on the way in (see `Round::normalize_holes`),
    /// so envelopes edited by hand or written by older versions cannot carry
    /// duplicate or out-of-range hole numbers into the store.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        let mut envelope: Envelope = serde_json::from_str(raw)?;
        for round in &mut envelope.rounds {
            let dropped = round.normalize_holes();
            if dropped > 0 {
                warn!(
                    "Round {}: dropped {} duplicate or out-of-range hole entries",
                    round.id, dropped
                );
            }
        }
        Ok(envelope)
    }

    /// Serialize compactly, as stored on disk
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Serialize for humans (exports)
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn round(&self, id: &str) -> Option<&Round> {
        self.rounds.iter().find(|r| r.id == id)
    }

    pub fn round_mut(&mut self, id: &str) -> Option<&mut Round> {
        self.rounds.iter_mut().find(|r| r.id == id)
    }

    /// Add rounds whose id is not present yet; never touch existing ones
    pub fn merge_additive(&mut self, incoming: Vec<Round>) -> ImportSummary {
        let mut known: HashSet<String> = self.rounds.iter().map(|r| r.id.clone()).collect();
        let mut summary = ImportSummary::default();

        for round in incoming {
            if known.insert(round.id.clone()) {
                self.rounds.push(round);
                summary.added += 1;
            } else {
                summary.skipped += 1;
            }
        }

        summary
    }

    /// Drop every round except `keep_id`; returns how many were removed
    pub fn retain_only(&mut self, keep_id: &str) -> usize {
        let before = self.rounds.len();
        let kept = self
            .rounds
            .iter()
            .position(|r| r.id == keep_id)
            .map(|i| self.rounds.swap_remove(i));
        self.rounds = kept.into_iter().collect();
        before - self.rounds.len()
    }

    /// Remove a round; returns whether it existed
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.rounds.len();
        self.rounds.retain(|r| r.id != id);
        before != self.rounds.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewRound;

    fn round(course: &str) -> Round {
        Round::new(NewRound::new(course), Utc::now())
    }

    #[test]
    fn test_default_envelope_shape() {
        let json = Envelope::default().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["rounds"], serde_json::json!([]));
        assert_eq!(value["settings"]["units"], "meters");
        assert_eq!(value["syncStatus"]["lastSynced"], serde_json::Value::Null);
        assert_eq!(value["syncStatus"]["pendingChanges"], false);
    }

    #[test]
    fn test_rounds_field_is_required() {
        assert!(Envelope::from_json("{}").is_err());
        assert!(Envelope::from_json("[]").is_err());
        assert!(Envelope::from_json("not json").is_err());
        assert!(Envelope::from_json(r#"{"rounds": []}"#).is_ok());
    }

    #[test]
    fn test_legacy_envelope_without_sync_status() {
        let env = Envelope::from_json(r#"{"rounds": [], "settings": {"units": "yards"}}"#).unwrap();
        assert_eq!(env.settings.units, Units::Yards);
        assert_eq!(env.sync_status, SyncMetadata::default());
    }

    #[test]
    fn test_merge_additive_keeps_existing() {
        let mut local = Envelope::default();
        let mut mine = round("Home");
        mine.course_name = "Local name".to_string();
        local.rounds.push(mine.clone());

        let mut theirs = mine.clone();
        theirs.course_name = "Imported name".to_string();
        let fresh = round("Away");

        let summary = local.merge_additive(vec![theirs, fresh.clone(), fresh.clone()]);
        assert_eq!(summary, ImportSummary { added: 1, skipped: 2 });
        assert_eq!(local.rounds.len(), 2);
        assert_eq!(local.round(&mine.id).unwrap().course_name, "Local name");
        assert!(local.round(&fresh.id).is_some());
    }

    #[test]
    fn test_from_json_normalizes_holes() {
        let env = Envelope::from_json(
            r#"{"rounds": [{
                "id": "x",
                "date": "2024-04-01T08:00:00Z",
                "holeCount": 9,
                "holes": [
                    {"number": 3, "par": 4},
                    {"number": 1, "par": 4},
                    {"number": 1, "par": 5},
                    {"number": 14, "par": 3}
                ]
            }]}"#,
        )
        .unwrap();

        let holes = &env.rounds[0].holes;
        assert_eq!(holes.iter().map(|h| h.number).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(holes[0].par, Some(5));
    }

    #[test]
    fn test_retain_only() {
        let mut env = Envelope::default();
        let a = round("A");
        let b = round("B");
        env.rounds.extend([a.clone(), b.clone(), round("C")]);

        assert_eq!(env.retain_only(&b.id), 2);
        assert_eq!(env.rounds.len(), 1);
        assert_eq!(env.rounds[0].id, b.id);

        assert_eq!(env.retain_only("missing"), 1);
        assert!(env.rounds.is_empty());
    }

    #[test]
    fn test_settings_merge() {
        let mut settings = Settings::default();
        let now = Utc::now();
        assert!(!settings.merge(&SettingsPatch::default(), now));
        assert_eq!(settings.updated_at, epoch());

        assert!(settings.merge(&SettingsPatch { units: Some(Units::Yards) }, now));
        assert_eq!(settings.units, Units::Yards);
        assert_eq!(settings.updated_at, now);
    }

    #[test]
    fn test_units_parse() {
        assert_eq!("Yards".parse::<Units>().unwrap(), Units::Yards);
        assert_eq!("m".parse::<Units>().unwrap(), Units::Meters);
        assert!("furlongs".parse::<Units>().is_err());
    }
}
