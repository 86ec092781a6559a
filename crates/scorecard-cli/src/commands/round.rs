//! Round command handlers

use anyhow::{Context, Result};

use scorecard_core::{HoleCount, NewRound, Store};

use crate::output::{short_id, Output};
use crate::prompt::{ask, confirm};

/// Parse `--holes`
pub fn parse_hole_count(s: &str) -> Result<HoleCount, String> {
    let n: u8 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", s))?;
    HoleCount::try_from(n)
}

/// Start a new round
pub fn create(
    store: &mut Store,
    course: Option<String>,
    holes: Option<HoleCount>,
    output: &Output,
) -> Result<()> {
    let course = match course {
        Some(course) => course,
        None if output.should_prompt() => ask("Course name")?.unwrap_or_default(),
        None => String::new(),
    };

    let mut input = NewRound::new(course);
    if let Some(holes) = holes {
        input = input.with_hole_count(holes);
    }

    let round = store.create(input).context("Failed to create round")?;

    if !output.is_json() {
        output.success(&format!("Created round: {}", round.id));
    }
    output.print_round(&round);

    Ok(())
}

/// List all rounds, newest first
pub fn list(store: &Store, output: &Output) -> Result<()> {
    let mut rounds = store.get_all();
    rounds.sort_by(|a, b| b.date.cmp(&a.date));

    output.print_rounds(&rounds);
    Ok(())
}

/// Show a single round
pub fn show(store: &Store, id: String, output: &Output) -> Result<()> {
    let id = store.resolve_id(&id)?;
    let round = store
        .get(&id)
        .ok_or_else(|| anyhow::anyhow!("Round not found: {}", id))?;

    output.print_round(&round);
    Ok(())
}

/// Delete a round
pub fn delete(store: &mut Store, id: String, yes: bool, output: &Output) -> Result<()> {
    let id = store.resolve_id(&id)?;
    let round = store
        .get(&id)
        .ok_or_else(|| anyhow::anyhow!("Round not found: {}", id))?;

    // Confirm deletion
    if !yes && output.should_prompt() {
        println!(
            "Delete round: {} - {} ({})",
            short_id(&round.id),
            round.course_name,
            round.date.format("%Y-%m-%d")
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store.delete(&id).context("Failed to delete round")?;

    output.success(&format!("Deleted round: {}", id));

    Ok(())
}
