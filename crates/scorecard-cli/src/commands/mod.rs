//! Command handlers, one module per top-level command group

pub mod config;
pub mod data;
pub mod hole;
pub mod round;
pub mod settings;
pub mod stats;
pub mod status;
pub mod sync;
