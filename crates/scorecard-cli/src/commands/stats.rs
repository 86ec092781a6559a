//! Stats command handler

use anyhow::Result;

use scorecard_core::{OverallStats, RoundStats, Store};

use crate::output::Output;

/// Show statistics for one round, or across all rounds
pub fn show(store: &Store, round_id: Option<String>, output: &Output) -> Result<()> {
    match round_id {
        Some(id) => {
            let id = store.resolve_id(&id)?;
            let round = store
                .get(&id)
                .ok_or_else(|| anyhow::anyhow!("Round not found: {}", id))?;
            output.print_round_stats(&round, &RoundStats::from_round(&round));
        }
        None => {
            let rounds = store.get_all();
            output.print_overall_stats(&OverallStats::from_rounds(&rounds));
        }
    }
    Ok(())
}
