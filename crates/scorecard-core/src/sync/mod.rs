//! Opportunistic sync with a remote round service
//!
//! The device is the source of truth. When a remote is configured and
//! reachable, a reconciliation run pushes local rounds and settings to it and
//! the remote keeps whichever copy of a record is newer (last-writer-wins).
//!
//! ## Pieces
//!
//! - `RemoteStore`: the remote seam, with `HttpRemote` and `MemoryRemote`
//! - `Reconciler`: runs a sync pass and probes connectivity
//! - `message`: wire types
//!
//! ## Usage
//!
//! ```ignore
//! let remote = Arc::new(HttpRemote::new("http://localhost:5000/api", timeout)?);
//! let reconciler = Reconciler::new(remote, timeout);
//!
//! if reconciler.probe().await.is_online() {
//!     let report = reconciler.run(&mut store).await;
//!     println!("{}", report.summary());
//! }
//! ```

mod client;
mod engine;
mod memory;
pub mod message;
mod remote;
mod state;

pub use client::HttpRemote;
pub use engine::{Reconciler, SyncFailure, SyncReport, SyncTarget};
pub use memory::MemoryRemote;
pub use message::{
    RemoteRound, RemoteSettings, RemoteStatus, UpsertOutcome, UpsertReply, UpsertResponse,
};
pub use remote::{resolve_upsert, RemoteError, RemoteStore, UpsertDecision};
pub use state::{Connectivity, SyncState};
