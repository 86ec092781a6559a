//! Scorecard Core Library
//!
//! This crate provides the core functionality for Scorecard, a local-first
//! golf round tracker: rounds are recorded hole by hole on the device and
//! pushed to a remote service when one is reachable.
//!
//! # Architecture
//!
//! - **Envelope**: one JSON document holding all rounds, settings and sync
//!   metadata; the on-device source of truth
//! - **Store**: the only way to read or change the envelope
//! - **Reconciler**: pushes the envelope to a remote that resolves conflicts
//!   by last-writer-wins
//!
//! # Quick Start
//!
//! ```text
//! let mut store = Store::open()?;
//!
//! // Record a round
//! let round = store.create(NewRound::new("Augusta National"))?;
//! store.upsert_hole(&round.id, 1, &HolePatch { par: Some(4), score: Some(4), ..Default::default() })?;
//!
//! // Query rounds
//! let rounds = store.get_all();
//! ```
//!
//! # Modules
//!
//! - `store`: Unified storage interface (main entry point)
//! - `models`: Rounds, holes and partial hole updates
//! - `envelope`: The persisted document and settings
//! - `stats`: Derived per-round and overall statistics
//! - `storage`: Envelope persistence backends
//! - `sync`: Remote collaborators and the reconciliation engine
//! - `config`: Application configuration

pub mod config;
pub mod envelope;
pub mod models;
pub mod stats;
pub mod storage;
pub mod store;
pub mod sync;

pub use config::Config;
pub use envelope::{Envelope, ImportSummary, Settings, SettingsPatch, SyncMetadata, Units};
pub use models::{Fairway, GreenPosition, Hole, HoleCount, HolePatch, NewRound, Round};
pub use stats::{OverallStats, RoundStats};
pub use storage::{StorageError, StorageStats};
pub use store::{Store, StoreError, StoreResult, SyncWriteback};
