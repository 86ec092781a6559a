//! Hole command handlers

use anyhow::{Context, Result};
use clap::Args;

use scorecard_core::{Fairway, GreenPosition, HolePatch, Store};

use crate::output::Output;

/// Fields to record for one hole; omitted flags leave stored values alone
#[derive(Args, Debug, Default)]
pub struct HoleSetArgs {
    /// Par for the hole
    #[arg(long)]
    pub par: Option<u8>,

    /// Strokes taken
    #[arg(long)]
    pub score: Option<u8>,

    /// Number of putts
    #[arg(long)]
    pub putts: Option<u8>,

    /// Tee shot result: hit, left, right, or none to clear
    #[arg(long, value_name = "RESULT")]
    pub fairway: Option<String>,

    /// Where the approach finished (long-left ... short-right), or none to clear
    #[arg(long, value_name = "CELL")]
    pub green: Option<String>,

    /// Club used off the tee
    #[arg(long)]
    pub tee_club: Option<String>,

    /// Club used for the approach
    #[arg(long)]
    pub approach_club: Option<String>,

    /// Approach distance
    #[arg(long)]
    pub approach_distance: Option<f64>,

    /// Distance of the first putt
    #[arg(long)]
    pub first_putt: Option<f64>,

    /// Distance left after the first putt
    #[arg(long)]
    pub first_putt_remaining: Option<f64>,

    /// An up-and-down was attempted
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub up_and_down: Option<bool>,

    /// The up-and-down was made
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub up_and_down_made: Option<bool>,

    /// The up-and-down was played from a bunker
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub sand: Option<bool>,
}

/// `none` (or an empty value) clears a nullable field
fn clearable<T>(value: Option<&str>, parse: impl Fn(&str) -> Result<T, String>) -> Result<Option<Option<T>>> {
    match value.map(str::trim) {
        None => Ok(None),
        Some("") | Some("none") => Ok(Some(None)),
        Some(raw) => parse(raw).map(|v| Some(Some(v))).map_err(anyhow::Error::msg),
    }
}

impl HoleSetArgs {
    pub fn into_patch(self) -> Result<HolePatch> {
        Ok(HolePatch {
            par: self.par,
            score: self.score,
            fairway_hit: clearable(self.fairway.as_deref(), |s| s.parse::<Fairway>())?,
            tee_club: self.tee_club,
            gir_hit: None,
            green_position: clearable(self.green.as_deref(), |s| s.parse::<GreenPosition>())?,
            approach_distance: self.approach_distance,
            approach_club: self.approach_club,
            first_putt_distance: self.first_putt,
            first_putt_remaining: self.first_putt_remaining,
            putts: self.putts,
            up_and_down_attempt: self.up_and_down,
            up_and_down_success: self.up_and_down_made,
            from_sand: self.sand,
        })
    }
}

/// Record one hole of a round
pub fn set(
    store: &mut Store,
    round_id: String,
    number: u8,
    args: HoleSetArgs,
    output: &Output,
) -> Result<()> {
    let id = store.resolve_id(&round_id)?;
    let patch = args.into_patch()?;

    if patch.is_empty() {
        anyhow::bail!("Nothing to record. Pass at least one field, e.g. --score 4");
    }

    let round = store
        .upsert_hole(&id, number, &patch)
        .with_context(|| format!("Failed to record hole {}", number))?;

    if !output.is_json() {
        output.success(&format!("Recorded hole {}", number));
    }
    output.print_round(&round);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_omitted_flags_are_absent() {
        let patch = HoleSetArgs {
            score: Some(5),
            ..HoleSetArgs::default()
        }
        .into_patch()
        .unwrap();

        assert_eq!(patch.score, Some(5));
        assert!(patch.par.is_none());
        assert!(patch.fairway_hit.is_none());
        assert!(patch.green_position.is_none());
    }

    #[test]
    fn test_nullable_fields() {
        let patch = HoleSetArgs {
            fairway: Some("none".to_string()),
            green: Some("near-left".to_string()),
            ..HoleSetArgs::default()
        }
        .into_patch()
        .unwrap();

        assert_eq!(patch.fairway_hit, Some(None));
        assert_eq!(patch.green_position, Some(Some(GreenPosition::ShortLeft)));
    }

    #[test]
    fn test_bad_values_are_rejected() {
        let result = HoleSetArgs {
            fairway: Some("bunker".to_string()),
            ..HoleSetArgs::default()
        }
        .into_patch();
        assert!(result.is_err());

        let result = HoleSetArgs {
            green: Some("middle".to_string()),
            ..HoleSetArgs::default()
        }
        .into_patch();
        assert!(result.is_err());
    }
}
