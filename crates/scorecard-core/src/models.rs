//! Data models for Scorecard
//!
//! Defines the round aggregate and its hole entries. Field names on the wire
//! are camelCase so envelopes written by earlier versions of the tracker load
//! unchanged.
//!
//! Totals and score-to-par are never stored; they are computed from `holes`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Target length of a round, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum HoleCount {
    Nine,
    #[default]
    Eighteen,
}

impl HoleCount {
    /// Number of holes as an integer
    pub fn get(self) -> u8 {
        match self {
            HoleCount::Nine => 9,
            HoleCount::Eighteen => 18,
        }
    }

    /// Whether `number` is a valid hole for a round of this length
    pub fn contains(self, number: u8) -> bool {
        (1..=self.get()).contains(&number)
    }
}

impl TryFrom<u8> for HoleCount {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            9 => Ok(HoleCount::Nine),
            18 => Ok(HoleCount::Eighteen),
            other => Err(format!("hole count must be 9 or 18, got {}", other)),
        }
    }
}

impl From<HoleCount> for u8 {
    fn from(count: HoleCount) -> Self {
        count.get()
    }
}

impl fmt::Display for HoleCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Tee shot result on a par 4 or 5
///
/// An unset outcome (par 3, or not recorded) is `None` on the hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fairway {
    Hit,
    #[serde(alias = "miss-left")]
    Left,
    #[serde(alias = "miss-right")]
    Right,
}

impl Fairway {
    pub fn as_str(self) -> &'static str {
        match self {
            Fairway::Hit => "hit",
            Fairway::Left => "left",
            Fairway::Right => "right",
        }
    }
}

impl FromStr for Fairway {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hit" => Ok(Fairway::Hit),
            "left" | "miss-left" => Ok(Fairway::Left),
            "right" | "miss-right" => Ok(Fairway::Right),
            other => Err(format!("unknown fairway result '{}'", other)),
        }
    }
}

/// Where the approach finished relative to the green
///
/// A 3x3 grid seen from the fairway: `long` is past the green, `short` is in
/// front of it. `Center` means the green was hit in regulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GreenPosition {
    #[serde(rename = "long-left", alias = "far-left")]
    LongLeft,
    #[serde(rename = "long", alias = "far-center")]
    Long,
    #[serde(rename = "long-right", alias = "far-right")]
    LongRight,
    #[serde(rename = "left")]
    Left,
    #[serde(rename = "center")]
    Center,
    #[serde(rename = "right")]
    Right,
    #[serde(rename = "short-left", alias = "near-left")]
    ShortLeft,
    #[serde(rename = "short", alias = "near-center")]
    Short,
    #[serde(rename = "short-right", alias = "near-right")]
    ShortRight,
}

impl GreenPosition {
    /// All cells, row by row from long to short
    pub const ALL: [GreenPosition; 9] = [
        GreenPosition::LongLeft,
        GreenPosition::Long,
        GreenPosition::LongRight,
        GreenPosition::Left,
        GreenPosition::Center,
        GreenPosition::Right,
        GreenPosition::ShortLeft,
        GreenPosition::Short,
        GreenPosition::ShortRight,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GreenPosition::LongLeft => "long-left",
            GreenPosition::Long => "long",
            GreenPosition::LongRight => "long-right",
            GreenPosition::Left => "left",
            GreenPosition::Center => "center",
            GreenPosition::Right => "right",
            GreenPosition::ShortLeft => "short-left",
            GreenPosition::Short => "short",
            GreenPosition::ShortRight => "short-right",
        }
    }

    /// Green in regulation iff the ball finished on the center cell
    pub fn is_gir(self) -> bool {
        self == GreenPosition::Center
    }
}

impl FromStr for GreenPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        let alias = match wanted.as_str() {
            "far-left" => "long-left",
            "far-center" => "long",
            "far-right" => "long-right",
            "near-left" => "short-left",
            "near-center" => "short",
            "near-right" => "short-right",
            other => other,
        };
        GreenPosition::ALL
            .into_iter()
            .find(|p| p.as_str() == alias)
            .ok_or_else(|| format!("unknown green position '{}'", s))
    }
}

/// One hole's recorded performance
///
/// Everything except `number` may be missing while a hole is being filled in.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hole {
    pub number: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub par: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fairway_hit: Option<Fairway>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tee_club: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gir_hit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub green_position: Option<GreenPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approach_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approach_club: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_putt_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_putt_remaining: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub putts: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_and_down_attempt: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_and_down_success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_sand: Option<bool>,
}

/// A partial hole update
///
/// Absent fields leave the stored value alone. `fairway_hit` and
/// `green_position` are nullable: `Some(None)` (JSON `null`) clears them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub par: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub fairway_hit: Option<Option<Fairway>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tee_club: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gir_hit: Option<bool>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub green_position: Option<Option<GreenPosition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approach_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approach_club: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_putt_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_putt_remaining: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub putts: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_and_down_attempt: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_and_down_success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_sand: Option<bool>,
}

/// Present-but-null becomes `Some(None)`; an absent key stays `None` via `default`
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Overwrite `target` only when the patch carries a value
fn overwrite<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
    if let Some(v) = value {
        *target = Some(v.clone());
    }
}

impl HolePatch {
    /// True when the patch would not change anything
    pub fn is_empty(&self) -> bool {
        *self == HolePatch::default()
    }
}

impl Hole {
    /// Create an empty entry for a hole number
    pub fn new(number: u8) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }

    /// Shallow field merge: every field present in `patch` replaces the
    /// stored one, everything else is kept verbatim.
    ///
    /// Setting `green_position` also sets `gir_hit`, overriding a `gir_hit`
    /// supplied in the same patch.
    pub fn merge(&mut self, patch: &HolePatch) {
        overwrite(&mut self.par, &patch.par);
        overwrite(&mut self.score, &patch.score);
        if let Some(fairway) = patch.fairway_hit {
            self.fairway_hit = fairway;
        }
        overwrite(&mut self.tee_club, &patch.tee_club);
        overwrite(&mut self.gir_hit, &patch.gir_hit);
        if let Some(position) = patch.green_position {
            self.green_position = position;
            self.gir_hit = Some(position.is_some_and(GreenPosition::is_gir));
        }
        overwrite(&mut self.approach_distance, &patch.approach_distance);
        overwrite(&mut self.approach_club, &patch.approach_club);
        overwrite(&mut self.first_putt_distance, &patch.first_putt_distance);
        overwrite(&mut self.first_putt_remaining, &patch.first_putt_remaining);
        overwrite(&mut self.putts, &patch.putts);
        overwrite(&mut self.up_and_down_attempt, &patch.up_and_down_attempt);
        overwrite(&mut self.up_and_down_success, &patch.up_and_down_success);
        overwrite(&mut self.from_sand, &patch.from_sand);
    }

    /// Score relative to par, when both are recorded
    pub fn to_par(&self) -> Option<i32> {
        match (self.score, self.par) {
            (Some(score), Some(par)) => Some(i32::from(score) - i32::from(par)),
            _ => None,
        }
    }
}

/// Input for creating a round; everything not given gets a default
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRound {
    #[serde(default)]
    pub course_name: String,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub hole_count: Option<HoleCount>,
}

impl NewRound {
    pub fn new(course_name: impl Into<String>) -> Self {
        Self {
            course_name: course_name.into(),
            ..Self::default()
        }
    }

    pub fn with_hole_count(mut self, hole_count: HoleCount) -> Self {
        self.hole_count = Some(hole_count);
        self
    }
}

/// One played round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    /// Client-generated identifier, never reassigned
    pub id: String,
    /// When the round started
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub course_name: String,
    #[serde(default)]
    pub hole_count: HoleCount,
    /// Sorted ascending by `number`, at most one entry per number
    #[serde(default)]
    pub holes: Vec<Hole>,
    /// Last local mutation; rounds written without one compare as the epoch
    #[serde(default = "epoch")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub synced_to_server: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced: Option<DateTime<Utc>>,
}

/// The Unix epoch, the oldest possible mutation time
pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

/// Generate a fresh round identifier
pub fn new_round_id() -> String {
    Uuid::new_v4().to_string()
}

impl Round {
    /// Build a round from creation input, stamped at `now`
    pub fn new(input: NewRound, now: DateTime<Utc>) -> Self {
        Self {
            id: new_round_id(),
            date: input.date.unwrap_or(now),
            course_name: input.course_name,
            hole_count: input.hole_count.unwrap_or_default(),
            holes: Vec::new(),
            updated_at: now,
            synced_to_server: false,
            last_synced: None,
        }
    }

    /// Get the entry for a hole number
    pub fn hole(&self, number: u8) -> Option<&Hole> {
        self.holes.iter().find(|h| h.number == number)
    }

    /// Append or shallow-merge the entry for `number`, keep holes sorted and
    /// mark the round dirty.
    ///
    /// The caller is responsible for checking `number` against `hole_count`.
    pub fn upsert_hole(&mut self, number: u8, patch: &HolePatch, now: DateTime<Utc>) {
        match self.holes.iter_mut().find(|h| h.number == number) {
            Some(existing) => existing.merge(patch),
            None => {
                let mut hole = Hole::new(number);
                hole.merge(patch);
                self.holes.push(hole);
            }
        }
        self.holes.sort_by_key(|h| h.number);
        self.touch(now);
    }

    /// Restore the hole invariants on data written elsewhere
    ///
    /// Drops numbers outside `1..=hole_count`, keeps the last entry for a
    /// repeated number and sorts ascending. Returns how many entries were
    /// dropped. `updated_at` is left alone.
    pub fn normalize_holes(&mut self) -> usize {
        let before = self.holes.len();
        let hole_count = self.hole_count;

        let mut by_number = BTreeMap::new();
        for hole in self.holes.drain(..) {
            if hole_count.contains(hole.number) {
                by_number.insert(hole.number, hole);
            }
        }
        self.holes = by_number.into_values().collect();

        before - self.holes.len()
    }

    /// Record a local mutation
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
        self.synced_to_server = false;
    }

    /// Sum of recorded scores
    pub fn total_score(&self) -> i32 {
        self.holes
            .iter()
            .filter_map(|h| h.score)
            .map(i32::from)
            .sum()
    }

    /// Sum of recorded pars
    pub fn total_par(&self) -> i32 {
        self.holes.iter().filter_map(|h| h.par).map(i32::from).sum()
    }

    /// Total score relative to par; negative when under par
    pub fn to_par(&self) -> i32 {
        self.total_score() - self.total_par()
    }

    /// Number of holes with an entry
    pub fn holes_played(&self) -> usize {
        self.holes.len()
    }

    /// Every hole of the round has an entry
    pub fn is_complete(&self) -> bool {
        (1..=self.hole_count.get()).all(|n| self.hole(n).is_some())
    }
}
