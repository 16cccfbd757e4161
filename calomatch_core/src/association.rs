//! Shared association-relation contract.
//!
//! Both strategies build an `AssociationPlan` in memory and hand it to
//! `commit`, which is the only place that adds edges to the event. A failed
//! add clears the relation again, so a failed pass never leaves a partially
//! rebuilt relation behind.

use crate::error::ResolveError;
use calomatch_env::{Association, ClusterId, EventContext, TrackId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Planned relation for one pass: each track maps to exactly one cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociationPlan {
    edges: BTreeMap<TrackId, ClusterId>,
}

impl AssociationPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plans a new edge.
    ///
    /// # Errors
    /// * `ResolveError::TrackAlreadyPlanned` - the track already has a cluster
    pub fn assign(&mut self, track: TrackId, cluster: ClusterId) -> Result<(), ResolveError> {
        if self.edges.contains_key(&track) {
            return Err(ResolveError::TrackAlreadyPlanned(track));
        }
        self.edges.insert(track, cluster);
        Ok(())
    }

    /// Moves an already planned track to another cluster.
    ///
    /// Returns the cluster it was planned for before, if any.
    pub fn reassign(&mut self, track: TrackId, cluster: ClusterId) -> Option<ClusterId> {
        self.edges.insert(track, cluster)
    }

    /// Planned cluster of a track.
    pub fn cluster_of(&self, track: TrackId) -> Option<ClusterId> {
        self.edges.get(&track).copied()
    }

    /// Edges in ascending track order.
    pub fn iter(&self) -> impl Iterator<Item = Association> + '_ {
        self.edges
            .iter()
            .map(|(&track, &cluster)| Association::new(track, cluster))
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Adds every planned edge to the event, in ascending track order.
///
/// The relation is expected to have been cleared by the caller. On the first
/// failed add the relation is cleared again and the add error is returned.
/// Returns the number of edges added.
pub fn commit<C: EventContext + ?Sized>(
    ctx: &mut C,
    plan: &AssociationPlan,
) -> Result<usize, ResolveError> {
    if plan.is_empty() {
        return Ok(0);
    }
    debug!("Committing {} planned edges", plan.len());

    let mut added = 0;
    for edge in plan.iter() {
        if let Err(err) = ctx.add_association(edge.track, edge.cluster) {
            warn!("Adding {} failed ({}); rolling back {} edges", edge, err, added);
            if let Err(clear_err) = ctx.remove_all_associations() {
                warn!("Rollback clear failed: {}", clear_err);
            }
            return Err(err.into());
        }
        debug!("Associated {}", edge);
        added += 1;
    }

    Ok(added)
}

/// Outcome counters of one resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassSummary {
    /// Tracks in the current list
    pub tracks_seen: usize,

    /// Clusters in the current list
    pub clusters_seen: usize,

    /// Tracks without a truth particle (truth matching only)
    pub tracks_without_truth: usize,

    /// Clusters without a truth particle (truth matching only)
    pub clusters_without_truth: usize,

    /// Truth particles that received associations
    pub truth_groups_matched: usize,

    /// Clusters whose track count exceeded the tolerance
    pub clusters_resolved: usize,

    /// Tracks moved to a different cluster
    pub tracks_reassigned: usize,

    /// Edges present in the relation after the pass
    pub associations_added: usize,
}

impl PassSummary {
    pub fn new(tracks_seen: usize, clusters_seen: usize) -> Self {
        Self {
            tracks_seen,
            clusters_seen,
            ..Default::default()
        }
    }
}
