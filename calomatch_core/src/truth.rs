//! The "TRUTH" Matcher - Reference Associations from Monte Carlo Truth
//!
//! Rebuilds the relation purely from truth-particle identity:
//! 1. Clear the relation
//! 2. Group tracks by truth particle (tracks without one are skipped)
//! 3. Group clusters by truth particle (clusters without one are skipped)
//! 4. Walk particles in ascending `ParticleId` order and link each of the
//!    particle's tracks to its single highest hadronic-energy cluster
//!
//! A particle split across several clusters is only linked to the most
//! energetic piece; the pieces should have been merged, and linking all of
//! them would double-count the track energy.

use crate::association::{commit, AssociationPlan, PassSummary};
use crate::config::{setting_keys, ConfigError};
use crate::error::ResolveError;
use calomatch_env::{ClusterId, EventContext, ParticleId, TrackId};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Truth-based track-to-cluster matcher. Has no tunable parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TruthMatcher;

impl TruthMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Builds the matcher from its settings block.
    ///
    /// The matcher has no parameters, so any keys are ignored with a warning.
    pub fn from_settings(text: &str) -> Result<Self, ConfigError> {
        for key in setting_keys(text)? {
            warn!("Truth matcher ignores setting '{}'", key);
        }
        Ok(Self)
    }

    /// Replaces the event's relation with the truth-derived one.
    pub fn run<C: EventContext + ?Sized>(&self, ctx: &mut C) -> Result<PassSummary, ResolveError> {
        let tracks = ctx.current_tracks()?;
        let clusters = ctx.current_clusters()?;

        ctx.remove_all_associations()?;

        let mut summary = PassSummary::new(tracks.len(), clusters.len());

        let mut tracks_per_particle: BTreeMap<ParticleId, Vec<TrackId>> = BTreeMap::new();
        for &track in &tracks {
            match ctx.track_particle(track) {
                Some(particle) => tracks_per_particle.entry(particle).or_default().push(track),
                None => summary.tracks_without_truth += 1,
            }
        }

        let mut clusters_per_particle: BTreeMap<ParticleId, Vec<ClusterId>> = BTreeMap::new();
        for &cluster in &clusters {
            match ctx.cluster_particle(cluster) {
                Some(particle) => clusters_per_particle
                    .entry(particle)
                    .or_default()
                    .push(cluster),
                None => summary.clusters_without_truth += 1,
            }
        }

        let mut plan = AssociationPlan::new();

        for (&particle, particle_tracks) in &tracks_per_particle {
            let Some(particle_clusters) = clusters_per_particle.get(&particle) else {
                debug!("{}: {} tracks, no clusters", particle, particle_tracks.len());
                continue;
            };

            if particle_tracks.is_empty() || particle_clusters.is_empty() {
                continue;
            }

            let best = highest_energy_cluster(ctx, particle_clusters)?
                .ok_or(ResolveError::SelectionInvariant(particle))?;

            debug!(
                "{}: {} tracks -> {} (of {} clusters)",
                particle,
                particle_tracks.len(),
                best,
                particle_clusters.len()
            );

            for &track in particle_tracks {
                plan.assign(track, best)?;
            }
            summary.truth_groups_matched += 1;
        }

        summary.associations_added = commit(ctx, &plan)?;

        info!(
            "Truth matching complete: {} associations for {} particles ({} tracks, {} clusters without truth)",
            summary.associations_added,
            summary.truth_groups_matched,
            summary.tracks_without_truth,
            summary.clusters_without_truth
        );

        Ok(summary)
    }
}

/// Highest hadronic-energy cluster; ties keep the first encountered.
///
/// Returns `None` when no energy compares greater than `f64::MIN`
/// (every energy is NaN).
fn highest_energy_cluster<C: EventContext + ?Sized>(
    ctx: &C,
    clusters: &[ClusterId],
) -> Result<Option<ClusterId>, ResolveError> {
    let mut highest_energy = f64::MIN;
    let mut best = None;

    for &cluster in clusters {
        let energy = ctx.hadronic_energy(cluster)?;
        if energy > highest_energy {
            highest_energy = energy;
            best = Some(cluster);
        }
    }

    Ok(best)
}

// ============================================================================
// TESTS
// ============================================================================
