//! Row Ranker
//!
//! Orders candidate rows so the resolution engine tries them in a
//! deterministic sequence: priority first, then the configured tie-breaks.

use super::matrix::IndexedRow;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

// =============================================================================
// Tie-Break Rules
// =============================================================================

/// Secondary ordering applied between rows of equal priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// Prefer the smallest `(max_size - min_size)` window
    NarrowestSizeWindow,
    /// Prefer the lowest minimum drives per instance
    FewestMinDrives,
    /// Prefer the row delivering the most IOPS
    HighestIops,
    /// Prefer the row delivering the fewest IOPS that still qualifies
    LowestIops,
}

impl TieBreak {
    fn compare(&self, a: &IndexedRow<'_>, b: &IndexedRow<'_>) -> Ordering {
        match self {
            TieBreak::NarrowestSizeWindow => {
                a.row.size_window_gib().cmp(&b.row.size_window_gib())
            }
            TieBreak::FewestMinDrives => a
                .row
                .min_drives_per_instance
                .cmp(&b.row.min_drives_per_instance),
            TieBreak::HighestIops => b.row.iops.cmp(&a.row.iops),
            TieBreak::LowestIops => a.row.iops.cmp(&b.row.iops),
        }
    }
}

impl std::fmt::Display for TieBreak {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TieBreak::NarrowestSizeWindow => write!(f, "narrowest-size-window"),
            TieBreak::FewestMinDrives => write!(f, "fewest-min-drives"),
            TieBreak::HighestIops => write!(f, "highest-iops"),
            TieBreak::LowestIops => write!(f, "lowest-iops"),
        }
    }
}

impl std::str::FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "narrowest-size-window" => Ok(TieBreak::NarrowestSizeWindow),
            "fewest-min-drives" => Ok(TieBreak::FewestMinDrives),
            "highest-iops" => Ok(TieBreak::HighestIops),
            "lowest-iops" => Ok(TieBreak::LowestIops),
            other => Err(format!("unknown tie-break rule: {}", other)),
        }
    }
}

// =============================================================================
// Rank Policy
// =============================================================================

/// Ordered tie-break rules applied after the priority comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankPolicy {
    pub tie_breaks: Vec<TieBreak>,
}

impl Default for RankPolicy {
    fn default() -> Self {
        Self {
            tie_breaks: vec![TieBreak::NarrowestSizeWindow, TieBreak::FewestMinDrives],
        }
    }
}

impl RankPolicy {
    pub fn new(tie_breaks: Vec<TieBreak>) -> Self {
        Self { tie_breaks }
    }

    fn compare(&self, a: &IndexedRow<'_>, b: &IndexedRow<'_>) -> Ordering {
        self.tie_breaks.iter().fold(
            b.row.priority.cmp(&a.row.priority),
            |ordering, rule| ordering.then_with(|| rule.compare(a, b)),
        )
    }

    /// Sort candidates best first. Rows equal under every rule keep matrix order.
    pub fn rank<'m>(&self, mut candidates: Vec<IndexedRow<'m>>) -> Vec<IndexedRow<'m>> {
        candidates.sort_by(|a, b| self.compare(a, b));
        candidates
    }
}
