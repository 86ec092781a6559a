//! Status command handler

use std::sync::Arc;

use anyhow::Result;

use scorecard_core::sync::{Connectivity, HttpRemote, Reconciler};
use scorecard_core::Store;

use crate::output::{Output, OutputFormat};

/// Show status information
pub async fn show(store: &Store, output: &Output) -> Result<()> {
    let stats = store.storage_stats();
    let config = store.config();
    let rounds = store.get_all();
    let pending = rounds.iter().filter(|r| !r.synced_to_server).count();
    let sync_status = store.sync_status();

    let connectivity = match HttpRemote::from_config(config) {
        Some(Ok(remote)) => {
            let timeout = config.request_timeout();
            Some(Reconciler::new(Arc::new(remote), timeout).probe().await)
        }
        Some(Err(e)) => Some(Connectivity::Offline {
            reason: e.to_string(),
        }),
        None => None,
    };

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "sync_enabled": config.sync_enabled,
                    "sync_url": config.sync_url,
                    "remote": connectivity,
                    "storage": {
                        "location": store.location(),
                        "exists": stats.exists,
                        "size": stats.size
                    },
                    "counts": {
                        "rounds": rounds.len(),
                        "pending": pending
                    },
                    "last_synced": sync_status.last_synced,
                    "pending_changes": sync_status.pending_changes
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", pending);
        }
        OutputFormat::Human => {
            println!("Scorecard Status");
            println!("================");
            println!();
            println!("Storage:");
            println!("  Location: {}", store.location());
            println!("  Size:     {}", stats.size_human());
            println!();
            println!("Rounds:");
            println!("  Total:    {}", rounds.len());
            println!("  Pending:  {}", pending);
            println!();
            println!("Sync:");
            println!(
                "  Status:      {}",
                if config.sync_enabled {
                    "enabled"
                } else {
                    "disabled"
                }
            );
            if let Some(ref url) = config.sync_url {
                println!("  Server:      {}", url);
            }
            if let Some(ref connectivity) = connectivity {
                println!("  Remote:      {}", connectivity);
            }
            println!(
                "  Last synced: {}",
                sync_status
                    .last_synced
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "never".to_string())
            );
            if sync_status.pending_changes {
                println!("  Last sync had errors; run `scorecard sync` to retry");
            }
        }
    }

    Ok(())
}
