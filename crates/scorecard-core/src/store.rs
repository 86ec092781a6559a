//! Unified storage interface
//!
//! The `Store` owns the on-device envelope and is the only way to read or
//! change it. Every mutation is a whole-envelope read-modify-write through the
//! injected `EnvelopeBackend`.
//!
//! ## Failure policy
//!
//! - Reads never fail. A missing envelope is created; an unparsable one is
//!   backed up and replaced with a fresh empty envelope; an unreadable medium
//!   yields an empty view.
//! - Writes return `StoreError` so the caller can tell the user.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = Store::open()?;
//!
//! let round = store.create(NewRound::new("Augusta National"))?;
//! store.upsert_hole(&round.id, 1, &HolePatch { par: Some(4), score: Some(5), ..Default::default() })?;
//!
//! let rounds = store.get_all();
//! ```

use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::envelope::{Envelope, ImportSummary, Settings, SettingsPatch, SyncMetadata};
use crate::models::{HoleCount, HolePatch, NewRound, Round};
use crate::storage::{EnvelopeBackend, FileBackend, StorageError, StorageStats};

/// Errors surfaced by store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Referenced round does not exist
    #[error("Round not found: {id}")]
    NotFound { id: String },

    /// Hole number outside `1..=hole_count`
    #[error("Hole {number} is not part of a {hole_count}-hole round")]
    InvalidHole { number: u8, hole_count: HoleCount },

    /// Import text is not an envelope
    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    /// Id prefix matches more than one round
    #[error("Ambiguous round id '{prefix}' matches {} rounds", .matches.len())]
    AmbiguousId { prefix: String, matches: Vec<String> },

    /// Underlying medium failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl StoreError {
    /// Something the user can do about a storage failure
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StoreError::Storage(e) => e.recovery_suggestion(),
            _ => None,
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// What a reconciliation run asks the store to record
#[derive(Debug, Clone, PartialEq)]
pub struct SyncWriteback {
    /// Rounds accepted by the remote, with the `updated_at` that was sent
    pub synced: Vec<(String, DateTime<Utc>)>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
    /// Whether anything failed and still needs sending
    pub pending_changes: bool,
}

/// Local-first round store
pub struct Store {
    backend: Box<dyn EnvelopeBackend>,
    config: Config,
}

impl Store {
    /// Open the store at the configured location
    pub fn open() -> anyhow::Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Ok(Self::open_with_config(config))
    }

    /// Open the file-backed store for a specific configuration
    pub fn open_with_config(config: Config) -> Self {
        let backend = FileBackend::from_config(&config);
        Self::with_backend(Box::new(backend), config)
    }

    /// Use any persistence backend
    pub fn with_backend(backend: Box<dyn EnvelopeBackend>, config: Config) -> Self {
        Self { backend, config }
    }

    /// In-memory store, nothing touches disk
    pub fn in_memory() -> Self {
        Self::with_backend(
            Box::new(crate::storage::MemoryBackend::new()),
            Config::default(),
        )
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Where the envelope is kept
    pub fn location(&self) -> String {
        self.backend.describe()
    }

    /// Presence and size of the stored envelope
    pub fn storage_stats(&self) -> StorageStats {
        self.backend.stats()
    }

    // ==================== Envelope I/O ====================

    /// Read for display: never fails
    fn read_envelope(&self) -> Envelope {
        match self.backend.load() {
            Ok(Some(envelope)) => envelope,
            Ok(None) => self.initialize(),
            Err(StorageError::InvalidFormat { location, details }) => {
                warn!("Envelope at {} is unreadable ({}), resetting", location, details);
                self.preserve_corrupt();
                self.initialize()
            }
            Err(e) => {
                warn!("Failed to read envelope, showing empty store: {}", e);
                Envelope::default()
            }
        }
    }

    /// Read before a write: corruption self-heals, medium errors propagate
    ///
    /// An unreadable medium must not be treated as empty here, or the write
    /// that follows would replace data we simply could not see.
    fn load_for_write(&self) -> StoreResult<Envelope> {
        match self.backend.load() {
            Ok(Some(envelope)) => Ok(envelope),
            Ok(None) => Ok(Envelope::default()),
            Err(StorageError::InvalidFormat { location, details }) => {
                warn!("Envelope at {} is unreadable ({}), resetting", location, details);
                self.preserve_corrupt();
                Ok(Envelope::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write_envelope(&self, envelope: &Envelope) -> StoreResult<()> {
        self.backend.save(envelope)?;
        Ok(())
    }

    /// Write a fresh envelope; failure only degrades to an in-memory default
    fn initialize(&self) -> Envelope {
        let envelope = Envelope::default();
        match self.backend.save(&envelope) {
            Ok(()) => debug!("Initialized empty envelope at {}", self.backend.describe()),
            Err(e) => warn!("Could not initialize envelope: {}", e),
        }
        envelope
    }

    fn preserve_corrupt(&self) {
        if let Ok(Some(raw)) = self.backend.read() {
            if let Err(e) = self.backend.preserve_corrupt(&raw) {
                warn!("Could not back up unreadable envelope: {}", e);
            }
        }
    }

    // ==================== Round Operations ====================

    /// All rounds; empty on any failure
    pub fn get_all(&self) -> Vec<Round> {
        self.read_envelope().rounds
    }

    /// One round by exact id
    pub fn get(&self, id: &str) -> Option<Round> {
        self.read_envelope().rounds.into_iter().find(|r| r.id == id)
    }

    /// Whole envelope, for reconciliation and status
    pub fn snapshot(&self) -> Envelope {
        self.read_envelope()
    }

    /// Rounds not yet accepted by the remote
    pub fn pending(&self) -> Vec<Round> {
        self.get_all()
            .into_iter()
            .filter(|r| !r.synced_to_server)
            .collect()
    }

    /// Create a round with a fresh id and defaults for missing fields
    pub fn create(&mut self, input: NewRound) -> StoreResult<Round> {
        let mut envelope = self.load_for_write()?;
        let mut round = Round::new(input, Utc::now());

        // A v4 collision is practically impossible, but the id must be unique
        while envelope.round(&round.id).is_some() {
            round.id = crate::models::new_round_id();
        }

        envelope.rounds.push(round.clone());
        self.write_envelope(&envelope)?;

        info!("Created round {} at {}", round.id, round.course_name);
        Ok(round)
    }

    /// Append or shallow-merge one hole of a round
    ///
    /// Holes stay sorted by number; the round is stamped `updated_at = now`
    /// and marked as not synced.
    pub fn upsert_hole(
        &mut self,
        round_id: &str,
        number: u8,
        patch: &HolePatch,
    ) -> StoreResult<Round> {
        let mut envelope = self.load_for_write()?;

        let round = envelope
            .round_mut(round_id)
            .ok_or_else(|| StoreError::NotFound {
                id: round_id.to_string(),
            })?;

        if !round.hole_count.contains(number) {
            return Err(StoreError::InvalidHole {
                number,
                hole_count: round.hole_count,
            });
        }

        round.upsert_hole(number, patch, Utc::now());
        let updated = round.clone();

        self.write_envelope(&envelope)?;
        debug!("Saved hole {} of round {}", number, round_id);
        Ok(updated)
    }

    /// Remove a round; absent ids are not an error
    ///
    /// Returns whether a round was removed.
    pub fn delete(&mut self, id: &str) -> StoreResult<bool> {
        let mut envelope = self.load_for_write()?;
        if !envelope.remove(id) {
            return Ok(false);
        }
        self.write_envelope(&envelope)?;
        info!("Deleted round {}", id);
        Ok(true)
    }

    /// Keep only `keep_id` (or nothing if it is unknown)
    ///
    /// Irreversible; callers confirm with the user first. Returns the number
    /// of rounds removed.
    pub fn clear_except(&mut self, keep_id: &str) -> StoreResult<usize> {
        let mut envelope = self.load_for_write()?;
        let removed = envelope.retain_only(keep_id);
        self.write_envelope(&envelope)?;
        info!("Cleared {} round(s), keeping {}", removed, keep_id);
        Ok(removed)
    }

    /// Resolve a full id or a unique prefix of one
    pub fn resolve_id(&self, prefix: &str) -> StoreResult<String> {
        let rounds = self.get_all();

        if rounds.iter().any(|r| r.id == prefix) {
            return Ok(prefix.to_string());
        }

        let mut matches: Vec<String> = rounds
            .into_iter()
            .filter(|r| r.id.starts_with(prefix))
            .map(|r| r.id)
            .collect();

        match matches.len() {
            0 => Err(StoreError::NotFound {
                id: prefix.to_string(),
            }),
            1 => Ok(matches.remove(0)),
            _ => Err(StoreError::AmbiguousId {
                prefix: prefix.to_string(),
                matches,
            }),
        }
    }

    // ==================== Export / Import ====================

    /// Serialize the whole envelope for backup
    pub fn export_snapshot(&self) -> StoreResult<String> {
        let envelope = self.read_envelope();
        envelope
            .to_json_pretty()
            .map_err(|e| StoreError::Storage(e.into()))
    }

    /// Write an export to a file
    pub fn export_to_path(&self, path: &Path) -> StoreResult<()> {
        let json = self.export_snapshot()?;
        std::fs::write(path, json)
            .map_err(|e| StorageError::from_io(e, path.to_path_buf()))?;
        info!("Exported envelope to {:?}", path);
        Ok(())
    }

    /// Merge an exported envelope into this one
    ///
    /// Additive only: rounds whose id is already known are left untouched,
    /// the rest are appended. Settings in the file are ignored.
    pub fn import_snapshot(&mut self, serialized: &str) -> StoreResult<ImportSummary> {
        let incoming =
            Envelope::from_json(serialized).map_err(|e| StoreError::InvalidFormat(e.to_string()))?;

        let mut envelope = self.load_for_write()?;
        let summary = envelope.merge_additive(incoming.rounds);

        if summary.added > 0 {
            self.write_envelope(&envelope)?;
        }

        info!(
            "Imported {} round(s), skipped {} already present",
            summary.added, summary.skipped
        );
        Ok(summary)
    }

    /// Read a file and import it
    pub fn import_from_path(&mut self, path: &Path) -> StoreResult<ImportSummary> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StorageError::from_read(e, path.to_path_buf()))?;
        self.import_snapshot(&raw)
    }

    // ==================== Settings ====================

    /// Current settings; defaults on any failure
    pub fn settings(&self) -> Settings {
        self.read_envelope().settings
    }

    /// Shallow-merge new settings over the stored ones
    pub fn update_settings(&mut self, patch: &SettingsPatch) -> StoreResult<Settings> {
        let mut envelope = self.load_for_write()?;
        if envelope.settings.merge(patch, Utc::now()) {
            self.write_envelope(&envelope)?;
        }
        Ok(envelope.settings)
    }

    // ==================== Sync Metadata ====================

    /// Outcome of the last reconciliation run
    pub fn sync_status(&self) -> SyncMetadata {
        self.read_envelope().sync_status
    }

    /// Record the result of a reconciliation run
    ///
    /// A round is only marked synced if it has not changed since it was sent.
    /// Returns the number of rounds marked.
    pub fn record_sync(&mut self, writeback: &SyncWriteback) -> StoreResult<usize> {
        let mut envelope = self.load_for_write()?;
        let mut marked = 0;

        for (id, sent_updated_at) in &writeback.synced {
            match envelope.round_mut(id) {
                Some(round) if round.updated_at == *sent_updated_at => {
                    round.synced_to_server = true;
                    round.last_synced = Some(writeback.finished_at);
                    marked += 1;
                }
                Some(_) => debug!("Round {} changed during sync, leaving it pending", id),
                None => debug!("Round {} was removed during sync", id),
            }
        }

        envelope.sync_status = SyncMetadata {
            last_synced: Some(writeback.finished_at),
            pending_changes: writeback.pending_changes,
        };

        self.write_envelope(&envelope)?;
        Ok(marked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Units;
    use crate::models::{Fairway, GreenPosition};
    use crate::storage::MemoryBackend;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Backend shared between the store and the test, so the test can look
    /// at (and tamper with) what the store wrote
    #[derive(Clone, Default)]
    struct SharedBackend(Arc<MemoryBackend>);

    impl EnvelopeBackend for SharedBackend {
        fn read(&self) -> crate::storage::StorageResult<Option<String>> {
            self.0.read()
        }
        fn write(&self, contents: &str) -> crate::storage::StorageResult<()> {
            self.0.write(contents)
        }
        fn describe(&self) -> String {
            "shared".to_string()
        }
    }

    /// Backend whose medium is broken
    struct BrokenBackend;

    impl EnvelopeBackend for BrokenBackend {
        fn read(&self) -> crate::storage::StorageResult<Option<String>> {
            Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "device unplugged",
            )))
        }
        fn write(&self, _contents: &str) -> crate::storage::StorageResult<()> {
            Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "device unplugged",
            )))
        }
        fn describe(&self) -> String {
            "broken".to_string()
        }
    }

    fn store_with(raw: &str) -> Store {
        Store::with_backend(
            Box::new(MemoryBackend::with_contents(raw)),
            Config::default(),
        )
    }

    fn test_config(temp_dir: &TempDir) -> Config {
        Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        }
    }

    fn scored(par: u8, score: u8) -> HolePatch {
        HolePatch {
            par: Some(par),
            score: Some(score),
            ..HolePatch::default()
        }
    }

    #[test]
    fn test_get_all_on_garbage_returns_empty() {
        let store = store_with("not json");
        assert!(store.get_all().is_empty());
        // Self-healed: the next read sees a valid envelope
        assert!(store.get_all().is_empty());
        assert_eq!(store.snapshot(), Envelope::default());
    }

    #[test]
    fn test_corrupt_envelope_is_rewritten() {
        let backend = SharedBackend::default();
        backend.write("{\"rounds\": [").unwrap();
        let store = Store::with_backend(Box::new(backend.clone()), Config::default());

        assert!(store.get_all().is_empty());
        let healed = backend.read().unwrap().unwrap();
        assert!(Envelope::from_json(&healed).is_ok());
    }

    #[test]
    fn test_first_access_creates_envelope() {
        let backend = SharedBackend::default();
        let store = Store::with_backend(Box::new(backend.clone()), Config::default());

        assert!(backend.read().unwrap().is_none());
        assert!(store.get_all().is_empty());
        assert!(backend.read().unwrap().is_some());
    }

    #[test]
    fn test_broken_medium_degrades_reads_and_fails_writes() {
        let mut store = Store::with_backend(Box::new(BrokenBackend), Config::default());

        assert!(store.get_all().is_empty());
        assert!(store.get("anything").is_none());
        assert_eq!(store.settings(), Settings::default());

        let err = store.create(NewRound::new("Nowhere")).unwrap_err();
        assert!(matches!(err, StoreError::Storage(_)));
    }

    #[test]
    fn test_create_fills_defaults() {
        let mut store = Store::in_memory();
        let round = store.create(NewRound::new("Pinehurst No. 2")).unwrap();

        assert!(!round.id.is_empty());
        assert_eq!(round.hole_count, HoleCount::Eighteen);
        assert!(round.holes.is_empty());
        assert!(!round.synced_to_server);

        assert_eq!(store.get(&round.id), Some(round.clone()));
        assert_eq!(store.get_all().len(), 1);
    }

    #[test]
    fn test_create_many_unique_ids() {
        let mut store = Store::in_memory();
        let ids: std::collections::HashSet<String> = (0..20)
            .map(|_| store.create(NewRound::default()).unwrap().id)
            .collect();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn test_upsert_hole_unknown_round() {
        let mut store = Store::in_memory();
        let err = store.upsert_hole("nope", 1, &scored(4, 4)).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { ref id } if id == "nope"));
    }

    #[test]
    fn test_upsert_hole_out_of_range() {
        let mut store = Store::in_memory();
        let round = store
            .create(NewRound::new("Nine").with_hole_count(HoleCount::Nine))
            .unwrap();

        let err = store.upsert_hole(&round.id, 10, &scored(4, 4)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidHole { number: 10, .. }));
        let err = store.upsert_hole(&round.id, 0, &scored(4, 4)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidHole { number: 0, .. }));
        assert!(store.get(&round.id).unwrap().holes.is_empty());
    }

    #[test]
    fn test_upsert_hole_merge_law() {
        let mut store = Store::in_memory();
        let round = store.create(NewRound::new("Links")).unwrap();

        store
            .upsert_hole(
                &round.id,
                5,
                &HolePatch {
                    par: Some(4),
                    score: Some(5),
                    fairway_hit: Some(Some(Fairway::Right)),
                    green_position: Some(Some(GreenPosition::Long)),
                    putts: Some(2),
                    ..HolePatch::default()
                },
            )
            .unwrap();
        store.upsert_hole(&round.id, 2, &scored(3, 3)).unwrap();
        store
            .upsert_hole(
                &round.id,
                5,
                &HolePatch {
                    putts: Some(3),
                    ..HolePatch::default()
                },
            )
            .unwrap();

        let stored = store.get(&round.id).unwrap();
        let numbers: Vec<u8> = stored.holes.iter().map(|h| h.number).collect();
        assert_eq!(numbers, vec![2, 5]);

        let fifth = stored.hole(5).unwrap();
        assert_eq!(fifth.putts, Some(3));
        assert_eq!(fifth.par, Some(4));
        assert_eq!(fifth.score, Some(5));
        assert_eq!(fifth.fairway_hit, Some(Fairway::Right));
        assert_eq!(fifth.green_position, Some(GreenPosition::Long));
        assert_eq!(fifth.gir_hit, Some(false));
    }

    #[test]
    fn test_upsert_same_hole_twice_single_entry() {
        let mut store = Store::in_memory();
        let round = store.create(NewRound::new("Links")).unwrap();

        store.upsert_hole(&round.id, 1, &scored(4, 6)).unwrap();
        let updated = store.upsert_hole(&round.id, 1, &scored(4, 4)).unwrap();

        assert_eq!(updated.holes.len(), 1);
        assert_eq!(updated.hole(1).unwrap().score, Some(4));
    }

    #[test]
    fn test_upsert_marks_unsynced_and_bumps_updated_at() {
        let mut store = Store::in_memory();
        let round = store.create(NewRound::new("Links")).unwrap();

        store
            .record_sync(&SyncWriteback {
                synced: vec![(round.id.clone(), round.updated_at)],
                finished_at: Utc::now(),
                pending_changes: false,
            })
            .unwrap();
        assert!(store.get(&round.id).unwrap().synced_to_server);

        std::thread::sleep(std::time::Duration::from_millis(10));
        let updated = store.upsert_hole(&round.id, 1, &scored(4, 4)).unwrap();
        assert!(!updated.synced_to_server);
        assert!(updated.updated_at > round.updated_at);
        assert_eq!(store.pending().len(), 1);
    }

    #[test]
    fn test_delete() {
        let mut store = Store::in_memory();
        let a = store.create(NewRound::new("A")).unwrap();
        let b = store.create(NewRound::new("B")).unwrap();

        assert!(store.delete(&a.id).unwrap());
        assert!(store.get(&a.id).is_none());
        assert!(store.get(&b.id).is_some());

        // Absent id is a no-op
        assert!(!store.delete(&a.id).unwrap());
        assert_eq!(store.get_all().len(), 1);
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut source = Store::in_memory();
        let round = source.create(NewRound::new("Carnoustie")).unwrap();
        source.upsert_hole(&round.id, 1, &scored(4, 5)).unwrap();
        source.create(NewRound::new("Troon")).unwrap();

        let exported = source.export_snapshot().unwrap();

        let mut target = Store::in_memory();
        let summary = target.import_snapshot(&exported).unwrap();
        assert_eq!(summary, ImportSummary { added: 2, skipped: 0 });
        assert_eq!(target.get_all(), source.get_all());
    }

    #[test]
    fn test_import_is_additive() {
        let mut local = Store::in_memory();
        let mine = local.create(NewRound::new("Local")).unwrap();
        local.upsert_hole(&mine.id, 1, &scored(4, 4)).unwrap();
        let before = local.get(&mine.id).unwrap();

        let mut conflicting = before.clone();
        conflicting.course_name = "Overwritten?".to_string();
        conflicting.holes.clear();
        let fresh = Round::new(NewRound::new("Imported"), Utc::now());

        let incoming = Envelope {
            rounds: vec![conflicting, fresh.clone()],
            settings: Settings {
                units: Units::Yards,
                ..Settings::default()
            },
            ..Envelope::default()
        };

        let summary = local
            .import_snapshot(&incoming.to_json().unwrap())
            .unwrap();
        assert_eq!(summary, ImportSummary { added: 1, skipped: 1 });
        assert_eq!(local.get(&mine.id).unwrap(), before);
        assert_eq!(local.get(&fresh.id).unwrap(), fresh);
        // Settings are not imported
        assert_eq!(local.settings().units, Units::Meters);
    }

    #[test]
    fn test_import_rejects_garbage() {
        let mut store = Store::in_memory();
        store.create(NewRound::new("Keep me")).unwrap();

        for bad in ["not json", "[]", "{}", r#"{"rounds": [{"id": 1}]}"#] {
            let err = store.import_snapshot(bad).unwrap_err();
            assert!(matches!(err, StoreError::InvalidFormat(_)), "{}", bad);
        }
        assert_eq!(store.get_all().len(), 1);
    }

    #[test]
    fn test_import_duplicate_holes_then_upsert() {
        let mut store = Store::in_memory();
        let summary = store
            .import_snapshot(
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
        assert_eq!(summary.added, 1);

        let round = store
            .upsert_hole(
                "x",
                1,
                &HolePatch {
                    putts: Some(2),
                    ..HolePatch::default()
                },
            )
            .unwrap();

        let numbers: Vec<u8> = round.holes.iter().map(|h| h.number).collect();
        assert_eq!(numbers, vec![1, 3]);
        let first = round.hole(1).unwrap();
        assert_eq!(first.par, Some(5));
        assert_eq!(first.putts, Some(2));
        assert_eq!(store.get("x").unwrap().holes.len(), 2);
    }

    #[test]
    fn test_recovery_suggestion_only_for_storage() {
        let denied = StoreError::from(StorageError::from_io(
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            "/data/golf-tracker-data.json".into(),
        ));
        assert!(denied.recovery_suggestion().is_some());

        let missing = StoreError::NotFound { id: "x".to_string() };
        assert!(missing.recovery_suggestion().is_none());
    }

    #[test]
    fn test_clear_except() {
        let mut store = Store::in_memory();
        let a = store.create(NewRound::new("A")).unwrap();
        store.create(NewRound::new("B")).unwrap();
        store.create(NewRound::new("C")).unwrap();

        assert_eq!(store.clear_except(&a.id).unwrap(), 2);
        let remaining = store.get_all();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, a.id);

        assert_eq!(store.clear_except("missing").unwrap(), 1);
        assert!(store.get_all().is_empty());
    }

    #[test]
    fn test_resolve_id() {
        let mut store = Store::in_memory();
        let a = store.create(NewRound::new("A")).unwrap();

        assert_eq!(store.resolve_id(&a.id).unwrap(), a.id);
        assert_eq!(store.resolve_id(&a.id[..8]).unwrap(), a.id);
        assert!(matches!(
            store.resolve_id("zzzz"),
            Err(StoreError::NotFound { .. })
        ));

        store.create(NewRound::new("B")).unwrap();
        assert!(matches!(
            store.resolve_id(""),
            Err(StoreError::AmbiguousId { ref matches, .. }) if matches.len() == 2
        ));
    }

    #[test]
    fn test_update_settings() {
        let mut store = Store::in_memory();
        assert_eq!(store.settings().units, Units::Meters);

        let settings = store
            .update_settings(&SettingsPatch {
                units: Some(Units::Yards),
            })
            .unwrap();
        assert_eq!(settings.units, Units::Yards);
        assert_eq!(store.settings().units, Units::Yards);
    }

    #[test]
    fn test_record_sync_skips_changed_rounds() {
        let mut store = Store::in_memory();
        let a = store.create(NewRound::new("A")).unwrap();
        let b = store.create(NewRound::new("B")).unwrap();
        let stale = b.updated_at - chrono::Duration::seconds(5);
        let finished_at = Utc::now();

        let marked = store
            .record_sync(&SyncWriteback {
                synced: vec![
                    (a.id.clone(), a.updated_at),
                    (b.id.clone(), stale),
                    ("gone".to_string(), a.updated_at),
                ],
                finished_at,
                pending_changes: true,
            })
            .unwrap();

        assert_eq!(marked, 1);
        let a = store.get(&a.id).unwrap();
        assert!(a.synced_to_server);
        assert_eq!(a.last_synced, Some(finished_at));
        assert!(!store.get(&b.id).unwrap().synced_to_server);

        let status = store.sync_status();
        assert_eq!(status.last_synced, Some(finished_at));
        assert!(status.pending_changes);
    }

    #[test]
    fn test_file_store_persists_across_reopens() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let id = {
            let mut store = Store::open_with_config(config.clone());
            let round = store.create(NewRound::new("Persistent")).unwrap();
            store.upsert_hole(&round.id, 1, &scored(5, 4)).unwrap();
            round.id
        };

        let store = Store::open_with_config(config.clone());
        let round = store.get(&id).unwrap();
        assert_eq!(round.to_par(), -1);
        assert!(store.storage_stats().exists);
        assert!(store.location().ends_with("golf-tracker-data.json"));
    }

    #[test]
    fn test_file_store_backs_up_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        std::fs::write(config.envelope_path(), "not json").unwrap();

        let store = Store::open_with_config(config.clone());
        assert!(store.get_all().is_empty());

        let backup = FileBackend::from_config(&config).backup_path();
        assert_eq!(std::fs::read_to_string(backup).unwrap(), "not json");
        let healed = std::fs::read_to_string(config.envelope_path()).unwrap();
        assert!(Envelope::from_json(&healed).is_ok());
    }

    #[test]
    fn test_export_and_import_files() {
        let temp_dir = TempDir::new().unwrap();
        let export_path = temp_dir.path().join("golf-stats.json");

        let mut source = Store::in_memory();
        source.create(NewRound::new("Bandon Dunes")).unwrap();
        source.export_to_path(&export_path).unwrap();

        let mut target = Store::in_memory();
        let summary = target.import_from_path(&export_path).unwrap();
        assert_eq!(summary.added, 1);

        let missing = target.import_from_path(&temp_dir.path().join("nope.json"));
        assert!(matches!(missing, Err(StoreError::Storage(_))));
    }
}
