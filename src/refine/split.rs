//! Splitting oversized groups.

use log::{debug, info};

use crate::labeling::compact_labels;
use crate::partition::CapacitatedPartitioner;
use crate::{Label, Labeling, MeetupError, Result};

/// Re-partition every group larger than `max_occupancy`.
///
/// A group of `occupancy` points is divided into
/// `ceil(occupancy / max_occupancy)` sub-groups by `partitioner`. Sub-group
/// labels start one above the current maximum label so they never collide
/// with existing groups. Groups at or below the limit keep their members.
/// Finally all labels are compacted to `0..K-1` in ascending order.
///
/// Fails with [`MeetupError::LabelCountMismatch`] if the partitioner does
/// not return one label per member of the group being split.
pub fn split(
    labeling: Labeling,
    max_occupancy: usize,
    partitioner: &dyn CapacitatedPartitioner,
) -> Result<Labeling> {
    let max_occupancy = max_occupancy.max(1);
    let oversized: Vec<(Label, usize)> = labeling
        .occupancy()
        .into_iter()
        .filter(|&(_, count)| count > max_occupancy)
        .collect();

    let mut labels = labeling.labels();

    for (label, occupancy) in &oversized {
        let target_splits = occupancy.div_ceil(max_occupancy);
        if target_splits <= 1 {
            continue;
        }

        let members = labeling.member_indices(*label);
        let positions: Vec<_> = members
            .iter()
            .map(|&i| labeling.points()[i].position)
            .collect();
        let sub_labels = partitioner.partition(&positions, target_splits)?;
        if sub_labels.len() != members.len() {
            return Err(MeetupError::LabelCountMismatch {
                expected: members.len(),
                actual: sub_labels.len(),
            });
        }

        let next_label = labels.iter().copied().max().map_or(0, |max| max + 1);
        for (&i, sub) in members.iter().zip(sub_labels) {
            labels[i] = next_label + sub;
        }

        debug!(
            "[Split] Group {} ({} members) split into {} sub-groups starting at label {}",
            label, occupancy, target_splits, next_label
        );
    }

    if !oversized.is_empty() {
        info!(
            "[Split] Split {} groups above the maximum occupancy of {}",
            oversized.len(),
            max_occupancy
        );
    }

    let compacted = compact_labels(&labels);
    Ok(labeling.with_labels(compacted))
}
