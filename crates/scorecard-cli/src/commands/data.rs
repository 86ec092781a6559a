//! Export, import and cleanup handlers

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};

use scorecard_core::Store;

use crate::output::{short_id, Output, OutputFormat};
use crate::prompt::confirm;

/// Default export file name for a given day
pub fn default_export_name(day: NaiveDate) -> PathBuf {
    PathBuf::from(format!("golf-stats-{}.json", day.format("%Y-%m-%d")))
}

/// Write the whole envelope to a file, or to stdout with `-`
pub fn export(store: &Store, path: Option<PathBuf>, output: &Output) -> Result<()> {
    if path.as_deref() == Some(Path::new("-")) {
        println!("{}", store.export_snapshot().context("Failed to export data")?);
        return Ok(());
    }

    let path = path.unwrap_or_else(|| default_export_name(Local::now().date_naive()));
    store
        .export_to_path(&path)
        .with_context(|| format!("Failed to export data to {}", path.display()))?;

    match output.format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "path": path,
                "rounds": store.get_all().len()
            })
        ),
        OutputFormat::Quiet => println!("{}", path.display()),
        OutputFormat::Human => output.success(&format!(
            "Exported {} round(s) to {}",
            store.get_all().len(),
            path.display()
        )),
    }

    Ok(())
}

/// Merge an exported file into the local store
pub fn import(store: &mut Store, path: PathBuf, output: &Output) -> Result<()> {
    let summary = store
        .import_from_path(&path)
        .with_context(|| format!("Failed to import {}", path.display()))?;

    match output.format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "added": summary.added,
                "skipped": summary.skipped
            })
        ),
        OutputFormat::Quiet => println!("{}", summary.added),
        OutputFormat::Human => {
            output.success(&format!("Imported {} round(s)", summary.added));
            if summary.skipped > 0 {
                println!(
                    "  {} round(s) already on this device were left unchanged",
                    summary.skipped
                );
            }
        }
    }

    Ok(())
}

/// Delete every round except one
pub fn clear_old(store: &mut Store, keep_id: String, yes: bool, output: &Output) -> Result<()> {
    let keep_id = store.resolve_id(&keep_id)?;
    let doomed = store.get_all().len().saturating_sub(1);

    if doomed == 0 {
        output.message("Nothing to clear.");
        return Ok(());
    }

    if !yes {
        if !output.should_prompt() {
            anyhow::bail!("Refusing to delete {} round(s) without --yes", doomed);
        }
        println!(
            "This permanently deletes {} round(s), keeping only {}.",
            doomed,
            short_id(&keep_id)
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let removed = store
        .clear_except(&keep_id)
        .context("Failed to clear rounds")?;

    output.success(&format!("Deleted {} round(s)", removed));
    Ok(())
}
