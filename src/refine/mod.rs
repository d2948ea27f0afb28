//! # Group Size Refinement
//!
//! Reshapes an unconstrained partition until every group's occupancy falls
//! inside the requested range, or the iteration budget runs out.
//!
//! ## Algorithm
//! 1. If a maximum is set, split oversized groups ([`split`])
//! 2. If a minimum is set, merge undersized groups into neighbours ([`merge`])
//! 3. Recount occupancy; stop as soon as every group is in range
//! 4. After `max_iters` rounds give up and return the best-effort labeling
//!
//! Running out of iterations is not an error: the caller receives the
//! labeling together with [`RefinementState::Exhausted`] and a warning is
//! logged naming how many groups are still out of range.

mod merge;
mod split;

pub use merge::{MERGE_CANDIDATES, apply_merges, merge, merge_plan};
pub use split::split;

use std::collections::BTreeMap;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::partition::CapacitatedPartitioner;
use crate::{Label, Labeling, Result};

/// Iteration budget used when none is configured.
pub const DEFAULT_MAX_ITERS: usize = 10;

/// Occupancy targets for refinement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementConfig {
    /// Minimum group occupancy to aim for (None = no lower bound)
    pub min_occupancy: Option<usize>,
    /// Maximum group occupancy to aim for (None = no upper bound)
    pub max_occupancy: Option<usize>,
    /// Split/merge rounds before giving up (None = [`DEFAULT_MAX_ITERS`])
    pub max_iters: Option<usize>,
}

impl RefinementConfig {
    pub fn with_min_occupancy(mut self, min_occupancy: usize) -> Self {
        self.min_occupancy = Some(min_occupancy);
        self
    }

    pub fn with_max_occupancy(mut self, max_occupancy: usize) -> Self {
        self.max_occupancy = Some(max_occupancy);
        self
    }

    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = Some(max_iters);
        self
    }

    /// Effective iteration budget.
    pub fn iterations(&self) -> usize {
        self.max_iters.unwrap_or(DEFAULT_MAX_ITERS)
    }

    /// True if at least one occupancy bound is set.
    pub fn is_bounded(&self) -> bool {
        self.min_occupancy.is_some() || self.max_occupancy.is_some()
    }
}

/// How refinement ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefinementState {
    /// Every group is inside the requested range
    Converged,
    /// The iteration budget ran out first
    Exhausted,
}

/// Result of [`improve`].
#[derive(Debug, Clone)]
pub struct RefinementOutcome {
    pub labeling: Labeling,
    pub state: RefinementState,
    /// Split/merge rounds actually run
    pub iterations: usize,
    /// Groups still below the minimum
    pub undersized: usize,
    /// Groups still above the maximum
    pub oversized: usize,
}

impl RefinementOutcome {
    pub fn is_converged(&self) -> bool {
        self.state == RefinementState::Converged
    }
}

/// Alternate split and merge until all groups are within bounds.
///
/// Split always runs before merge within a round. Convergence is checked
/// after every round; the loop never runs more than `config.iterations()`
/// rounds.
pub fn improve(
    labeling: Labeling,
    config: &RefinementConfig,
    partitioner: &dyn CapacitatedPartitioner,
) -> Result<RefinementOutcome> {
    let max_iters = config.iterations();
    let mut current = labeling;
    let (mut undersized, mut oversized) = count_out_of_range(&current.occupancy(), config);

    for iteration in 0..max_iters {
        if let Some(max_occupancy) = config.max_occupancy {
            current = split(current, max_occupancy, partitioner)?;
        }
        if let Some(min_occupancy) = config.min_occupancy {
            current = merge(current, min_occupancy);
        }

        (undersized, oversized) = count_out_of_range(&current.occupancy(), config);

        info!(
            "[Refine] After {} iterations, we have {} groups smaller than min and {} larger than max",
            iteration + 1,
            undersized,
            oversized
        );

        if undersized == 0 && oversized == 0 {
            info!("[Refine] All groups are within the requested range");
            return Ok(RefinementOutcome {
                labeling: current,
                state: RefinementState::Converged,
                iterations: iteration + 1,
                undersized,
                oversized,
            });
        }
    }

    warn!(
        "[Refine] After {} tries, {} groups are still outside the requested range. Either increase the number of iterations or relax the occupancy bounds",
        max_iters,
        undersized + oversized
    );

    Ok(RefinementOutcome {
        labeling: current,
        state: RefinementState::Exhausted,
        iterations: max_iters,
        undersized,
        oversized,
    })
}

/// Number of groups below the minimum and above the maximum.
fn count_out_of_range(
    occupancy: &BTreeMap<Label, usize>,
    config: &RefinementConfig,
) -> (usize, usize) {
    let undersized = config
        .min_occupancy
        .map_or(0, |min| occupancy.values().filter(|&&c| c < min).count());
    let oversized = config
        .max_occupancy
        .map_or(0, |max| occupancy.values().filter(|&&c| c > max).count());
    (undersized, oversized)
}
