//! Clustering entry point: initial partition (cached per run) followed by
//! size refinement.

use log::info;

use crate::cache::{INITIAL_CLUSTERS_KEY, RunCache};
use crate::partition::{CapacitatedPartitioner, InitialPartitioner};
use crate::refine::{RefinementConfig, improve};
use crate::{Labeling, Result, UserSet};

/// Clustering pipeline over pluggable partitioners.
pub struct Pipeline<'a> {
    initial: &'a dyn InitialPartitioner,
    capacitated: &'a dyn CapacitatedPartitioner,
    cache: Option<&'a RunCache>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        initial: &'a dyn InitialPartitioner,
        capacitated: &'a dyn CapacitatedPartitioner,
    ) -> Self {
        Self {
            initial,
            capacitated,
            cache: None,
        }
    }

    /// Read and store the initial partition in `cache`.
    pub fn with_cache(mut self, cache: &'a RunCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Initial partition of `users`, loaded from the run cache when present.
    pub fn initial_labeling(&self, users: &UserSet) -> Result<Labeling> {
        if let Some(cache) = self.cache {
            if let Some(labeling) = cache.get_labeling(INITIAL_CLUSTERS_KEY)? {
                info!("[Cluster] Loaded initial groups from cache");
                return Ok(labeling);
            }
        }

        info!(
            "[Cluster] Generating initial groups for {} users. Depending on the number of users this might take a few minutes",
            users.len()
        );
        let labels = self.initial.partition(&users.positions())?;
        let labeling = Labeling::from_users(users, labels)?;

        if let Some(cache) = self.cache {
            cache.put_labeling(INITIAL_CLUSTERS_KEY, &labeling)?;
        }
        Ok(labeling)
    }

    /// Partition `users` and, if any occupancy bound is set, refine the
    /// groups towards it. Non-convergence still returns the labeling.
    pub fn run_clustering(&self, users: &UserSet, config: &RefinementConfig) -> Result<Labeling> {
        let initial = self.initial_labeling(users)?;
        info!("[Cluster] Got initial groups. We found {} of them", initial.group_count());

        if !config.is_bounded() {
            return Ok(initial);
        }

        info!(
            "[Cluster] Refining groups to try and get them within the specified range. Will run {} times",
            config.iterations()
        );
        let outcome = improve(initial, config, self.capacitated)?;
        Ok(outcome.labeling)
    }
}
