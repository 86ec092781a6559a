//! Derived statistics
//!
//! Rates are percentages in `0.0..=100.0`. A rate whose denominator is zero
//! is reported as `0.0`.

use serde::Serialize;

use crate::models::{Fairway, Hole, Round};

/// Running counts over a set of holes
#[derive(Debug, Default)]
struct Tally {
    holes: u32,
    fairways_played: u32,
    fairways_hit: u32,
    greens_in_regulation: u32,
    putts: u32,
    up_and_down_attempts: u32,
    up_and_downs_made: u32,
    sand_attempts: u32,
    sand_saves: u32,
}

impl Tally {
    fn add(&mut self, hole: &Hole) {
        self.holes += 1;

        // Par 3s have no fairway to hit
        if hole.par.map_or(true, |par| par > 3) {
            if let Some(fairway) = hole.fairway_hit {
                self.fairways_played += 1;
                if fairway == Fairway::Hit {
                    self.fairways_hit += 1;
                }
            }
        }

        if hole.gir_hit == Some(true) {
            self.greens_in_regulation += 1;
        }

        self.putts += u32::from(hole.putts.unwrap_or(0));

        let made = hole.up_and_down_success == Some(true);
        if hole.up_and_down_attempt == Some(true) {
            self.up_and_down_attempts += 1;
            if made {
                self.up_and_downs_made += 1;
            }
        }
        if hole.from_sand == Some(true) {
            self.sand_attempts += 1;
            if made {
                self.sand_saves += 1;
            }
        }
    }

    fn add_round(&mut self, round: &Round) {
        round.holes.iter().for_each(|h| self.add(h));
    }

    fn rates(&self) -> Rates {
        Rates {
            fairway_hit_percentage: percentage(self.fairways_hit, self.fairways_played),
            gir_percentage: percentage(self.greens_in_regulation, self.holes),
            average_putts: ratio(self.putts, self.holes),
            up_and_down_percentage: percentage(self.up_and_downs_made, self.up_and_down_attempts),
            sand_save_percentage: percentage(self.sand_saves, self.sand_attempts),
        }
    }
}

fn ratio(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        f64::from(numerator) / f64::from(denominator)
    }
}

fn percentage(numerator: u32, denominator: u32) -> f64 {
    ratio(numerator, denominator) * 100.0
}

/// Rates shared by per-round and overall statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rates {
    pub fairway_hit_percentage: f64,
    pub gir_percentage: f64,
    pub average_putts: f64,
    pub up_and_down_percentage: f64,
    pub sand_save_percentage: f64,
}

/// Statistics for one round
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundStats {
    #[serde(flatten)]
    pub rates: Rates,
    pub total_score: i32,
    pub to_par: i32,
    pub holes_played: usize,
}

impl RoundStats {
    pub fn from_round(round: &Round) -> Self {
        let mut tally = Tally::default();
        tally.add_round(round);

        Self {
            rates: tally.rates(),
            total_score: round.total_score(),
            to_par: round.to_par(),
            holes_played: round.holes_played(),
        }
    }
}

/// Statistics across many rounds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStats {
    #[serde(flatten)]
    pub rates: Rates,
    pub round_count: usize,
    /// Mean of each round's score relative to par
    pub average_score_to_par: f64,
}

impl OverallStats {
    pub fn from_rounds(rounds: &[Round]) -> Self {
        if rounds.is_empty() {
            return Self::default();
        }

        let mut tally = Tally::default();
        let mut to_par_sum = 0i64;
        for round in rounds {
            tally.add_round(round);
            to_par_sum += i64::from(round.to_par());
        }

        Self {
            rates: tally.rates(),
            round_count: rounds.len(),
            average_score_to_par: to_par_sum as f64 / rounds.len() as f64,
        }
    }
}
