//! Settings command handler

use anyhow::{Context, Result};

use scorecard_core::{SettingsPatch, Store, Units};

use crate::output::Output;

/// Show settings, or change them when a value is given
pub fn settings(store: &mut Store, units: Option<Units>, output: &Output) -> Result<()> {
    if units.is_none() {
        output.print_settings(&store.settings());
        return Ok(());
    }

    let settings = store
        .update_settings(&SettingsPatch { units })
        .context("Failed to save settings")?;

    if !output.is_json() {
        output.success(&format!("Units set to {}", settings.units));
    }
    output.print_settings(&settings);
    Ok(())
}
