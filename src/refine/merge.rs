//! Merging undersized groups into nearby groups.

use std::collections::{BTreeMap, BTreeSet};

use geo::Coord;
use log::{debug, info};

use crate::spatial_index::{CentroidIndex, NearestNeighborIndex};
use crate::{Label, Labeling};

/// Number of nearest centroids considered as merge targets (including the donor itself).
pub const MERGE_CANDIDATES: usize = 4;

/// Absorb every group smaller than `min_occupancy` into a neighbouring group.
///
/// This is a single greedy pass; see [`merge_plan`] for how targets are
/// chosen. Donors with no eligible neighbour are left as they are.
pub fn merge(labeling: Labeling, min_occupancy: usize) -> Labeling {
    let plan = merge_plan::<CentroidIndex>(&labeling, min_occupancy);
    apply_merges(labeling, &plan)
}

/// Decide donor -> target mappings for one merge pass.
///
/// Donors (groups below `min_occupancy`) are visited in ascending label
/// order. For each donor the [`MERGE_CANDIDATES`] nearest centroids are
/// looked up; the donor itself and every label already used as a donor or
/// target in this pass are discarded, and the smallest remaining group wins
/// (nearest first on ties). Both donor and target are then consumed, so a
/// target never receives two donors and never donates itself.
pub fn merge_plan<I: NearestNeighborIndex>(
    labeling: &Labeling,
    min_occupancy: usize,
) -> BTreeMap<Label, Label> {
    let occupancy = labeling.occupancy();
    let donors: Vec<Label> = occupancy
        .iter()
        .filter(|&(_, &count)| count < min_occupancy)
        .map(|(&label, _)| label)
        .collect();

    let mut plan = BTreeMap::new();
    if donors.is_empty() {
        return plan;
    }

    let centroids: Vec<(Label, Coord<f64>)> = labeling.centroids().into_iter().collect();
    let centroid_of: BTreeMap<Label, Coord<f64>> = centroids.iter().copied().collect();
    let index = I::build(&centroids);
    let k = MERGE_CANDIDATES.min(index.len());

    let mut consumed: BTreeSet<Label> = BTreeSet::new();

    for donor in donors {
        if consumed.contains(&donor) {
            continue;
        }
        let Some(&centroid) = centroid_of.get(&donor) else {
            continue;
        };

        let candidates: Vec<Label> = index
            .query(centroid, k)
            .into_iter()
            .filter(|label| *label != donor && !consumed.contains(label))
            .collect();

        // min_by_key keeps the first (nearest) candidate among equal sizes
        let Some(target) = candidates
            .into_iter()
            .min_by_key(|label| occupancy.get(label).copied().unwrap_or(0))
        else {
            debug!("[Merge] No merge target available for group {}", donor);
            continue;
        };

        plan.insert(donor, target);
        consumed.insert(donor);
        consumed.insert(target);
    }

    if !plan.is_empty() {
        info!(
            "[Merge] Merging {} groups below the minimum occupancy of {}",
            plan.len(),
            min_occupancy
        );
    }

    plan
}

/// Relabel every donor's points to its target in one pass.
pub fn apply_merges(labeling: Labeling, plan: &BTreeMap<Label, Label>) -> Labeling {
    if plan.is_empty() {
        return labeling;
    }
    labeling.relabel(|label| plan.get(&label).copied().unwrap_or(label))
}
