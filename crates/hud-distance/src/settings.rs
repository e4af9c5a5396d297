//! Tuning parameters for the distance engine.

use serde::{Deserialize, Serialize};

/// Edit penalties and the acceptance cutoff for the distance engine.
///
/// A process-wide read-mostly snapshot: long-running computations continue
/// against the snapshot they started with even if a settings refresh swaps
/// a new one into place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Penalties {
    /// Upper bound on acceptable match distance.
    pub max_distance: u32,
    /// Per-code-point penalty for a letter the user typed but the label lacks.
    pub add_penalty: u32,
    /// Per-code-point penalty for a letter the label has but the user lacks, in the middle.
    pub drop_penalty: u32,
    /// As `drop_penalty`, at the tail of the label.
    pub end_drop_penalty: u32,
    /// Per-code-point substitution penalty.
    pub swap_penalty: u32,
    /// Substitution penalty where only case differs.
    pub swap_penalty_case: u32,
    /// Adjacent-pair transposition penalty.
    pub transpose_penalty: u32,
}

impl Default for Penalties {
    fn default() -> Self {
        Self {
            max_distance: 30,
            add_penalty: 10,
            drop_penalty: 10,
            end_drop_penalty: 1,
            swap_penalty: 15,
            swap_penalty_case: 1,
            transpose_penalty: 10,
        }
    }
}
