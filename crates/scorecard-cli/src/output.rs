//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use scorecard_core::sync::SyncReport;
use scorecard_core::{Hole, OverallStats, Round, RoundStats, Settings};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single round with its holes
    pub fn print_round(&self, round: &Round) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", round.id);
                println!("Course:   {}", display_course(&round.course_name));
                println!("Date:     {}", round.date.format("%Y-%m-%d %H:%M"));
                println!(
                    "Holes:    {}/{}{}",
                    round.holes_played(),
                    round.hole_count,
                    if round.is_complete() { " (complete)" } else { "" }
                );
                println!(
                    "Score:    {} ({})",
                    round.total_score(),
                    format_to_par(round.to_par())
                );
                println!("Synced:   {}", sync_label(round));
                println!("Updated:  {}", round.updated_at.format("%Y-%m-%d %H:%M"));

                if !round.holes.is_empty() {
                    println!();
                    println!("  #  Par  Score  Putts  FW     GIR  Green");
                    for hole in &round.holes {
                        println!("{}", hole_row(hole));
                    }
                }
            }
            OutputFormat::Json => print_json(round),
            OutputFormat::Quiet => println!("{}", round.id),
        }
    }

    /// Print a list of rounds
    pub fn print_rounds(&self, rounds: &[Round]) {
        match self.format {
            OutputFormat::Human => {
                if rounds.is_empty() {
                    println!("No rounds found.");
                    return;
                }
                for round in rounds {
                    println!(
                        "{} | {} | {:<30} | {:>2}/{} | {:>3} | {}",
                        short_id(&round.id),
                        round.date.format("%Y-%m-%d"),
                        truncate(display_course(&round.course_name), 30),
                        round.holes_played(),
                        round.hole_count,
                        format_to_par(round.to_par()),
                        sync_label(round)
                    );
                }
                println!("\n{} round(s)", rounds.len());
            }
            OutputFormat::Json => print_json(&rounds),
            OutputFormat::Quiet => {
                for round in rounds {
                    println!("{}", round.id);
                }
            }
        }
    }

    /// Print statistics for one round
    pub fn print_round_stats(&self, round: &Round, stats: &RoundStats) {
        match self.format {
            OutputFormat::Human => {
                println!(
                    "{} ({})",
                    display_course(&round.course_name),
                    round.date.format("%Y-%m-%d")
                );
                println!(
                    "Score:        {} ({}) over {} hole(s)",
                    stats.total_score,
                    format_to_par(stats.to_par),
                    stats.holes_played
                );
                print_rates(&stats.rates);
            }
            OutputFormat::Json => print_json(stats),
            OutputFormat::Quiet => println!("{}", stats.to_par),
        }
    }

    /// Print statistics across all rounds
    pub fn print_overall_stats(&self, stats: &OverallStats) {
        match self.format {
            OutputFormat::Human => {
                if stats.round_count == 0 {
                    println!("No rounds recorded yet.");
                    return;
                }
                println!("Rounds:       {}", stats.round_count);
                println!("Avg to par:   {:+.1}", stats.average_score_to_par);
                print_rates(&stats.rates);
            }
            OutputFormat::Json => print_json(stats),
            OutputFormat::Quiet => println!("{:.1}", stats.average_score_to_par),
        }
    }

    pub fn print_settings(&self, settings: &Settings) {
        match self.format {
            OutputFormat::Human => println!("Units: {}", settings.units),
            OutputFormat::Json => print_json(settings),
            OutputFormat::Quiet => println!("{}", settings.units),
        }
    }

    /// Print the outcome of a sync run
    pub fn print_sync_report(&self, report: &SyncReport) {
        match self.format {
            OutputFormat::Human => {
                let line = report.summary();
                if report.has_errors() {
                    println!("⚠ {}", line);
                } else {
                    println!("✓ {}", line);
                }
                println!(
                    "  created: {}, updated: {}, skipped: {}",
                    report.created, report.updated, report.skipped
                );
                for failure in &report.failures {
                    println!("  ✗ {:?}: {}", failure.target, failure.error);
                }
            }
            OutputFormat::Json => print_json(report),
            OutputFormat::Quiet => println!("{}", report.summary()),
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

fn print_rates(rates: &scorecard_core::stats::Rates) {
    println!("Fairways:     {:.1}%", rates.fairway_hit_percentage);
    println!("GIR:          {:.1}%", rates.gir_percentage);
    println!("Putts/hole:   {:.2}", rates.average_putts);
    println!("Up & down:    {:.1}%", rates.up_and_down_percentage);
    println!("Sand saves:   {:.1}%", rates.sand_save_percentage);
}

fn hole_row(hole: &Hole) -> String {
    format!(
        " {:>2}  {:>3}  {:>5}  {:>5}  {:<5}  {:<3}  {}",
        hole.number,
        opt(hole.par),
        opt(hole.score),
        opt(hole.putts),
        hole.fairway_hit.map(|f| f.as_str()).unwrap_or("-"),
        match hole.gir_hit {
            Some(true) => "yes",
            Some(false) => "no",
            None => "-",
        },
        hole.green_position.map(|g| g.as_str()).unwrap_or("-")
    )
}

fn opt(value: Option<u8>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn sync_label(round: &Round) -> &'static str {
    if round.synced_to_server {
        "synced"
    } else {
        "pending"
    }
}

fn display_course(name: &str) -> &str {
    if name.is_empty() {
        "(unnamed course)"
    } else {
        name
    }
}

/// First eight characters of an id, enough to pass back as a prefix
pub fn short_id(id: &str) -> &str {
    id.char_indices().nth(8).map_or(id, |(i, _)| &id[..i])
}

/// Score relative to par the way golfers write it: E, +3, -2
pub fn format_to_par(to_par: i32) -> String {
    match to_par {
        0 => "E".to_string(),
        n if n > 0 => format!("+{}", n),
        n => n.to_string(),
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
