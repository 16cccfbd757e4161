//! The "FORCE-SPLIT" Resolver - Geometric Repair of Crowded Clusters
//!
//! Production counterpart of the Truth Matcher. It starts from the current
//! relation and only touches clusters that carry more tracks than the
//! configured tolerance:
//! 1. Read tracks, clusters and the current track -> cluster relation
//! 2. Group tracks by cluster (ascending `ClusterId`)
//! 3. Leave clusters with `count <= min_track_associations` untouched
//! 4. For each track on a crowded cluster, propagate its helix and move it
//!    to the cluster whose centroid it passes strictly closer to
//! 5. Clear the relation and commit the revised plan
//!
//! Compatibility metric: 3D closest approach between the forward helix and the
//! cluster centroid (`HelixDistance::total`). Equal distances resolve to the
//! lowest `ClusterId`; a track only moves on a strict improvement.

use crate::association::{commit, AssociationPlan, PassSummary};
use crate::config::{ConfigError, ForceSplitConfig};
use crate::error::ResolveError;
use crate::helix::Helix;
use calomatch_env::{ClusterId, EventContext, TrackId};
use nalgebra::Vector3;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Geometric resolver for many-tracks-to-one-cluster associations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForceSplitResolver {
    config: ForceSplitConfig,
}

impl ForceSplitResolver {
    /// Create a resolver with a validated configuration.
    pub fn new(config: ForceSplitConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create a resolver with default configuration.
    pub fn with_defaults() -> Self {
        Self {
            config: ForceSplitConfig::default(),
        }
    }

    /// Create a resolver from a TOML settings block.
    pub fn from_settings(text: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            config: ForceSplitConfig::from_settings(text)?,
        })
    }

    pub fn config(&self) -> &ForceSplitConfig {
        &self.config
    }

    /// Repairs crowded clusters in the event's relation.
    pub fn run<C: EventContext + ?Sized>(&self, ctx: &mut C) -> Result<PassSummary, ResolveError> {
        let tracks = ctx.current_tracks()?;
        let clusters = ctx.current_clusters()?;
        let current = ctx.associations()?;

        let mut summary = PassSummary::new(tracks.len(), clusters.len());

        // Current relation, one cluster per track
        let mut plan = AssociationPlan::new();
        for edge in &current {
            plan.assign(edge.track, edge.cluster)
                .map_err(|_| ResolveError::InconsistentRelation(edge.track))?;
        }

        let mut tracks_per_cluster: BTreeMap<ClusterId, Vec<TrackId>> = BTreeMap::new();
        for edge in plan.iter() {
            tracks_per_cluster
                .entry(edge.cluster)
                .or_default()
                .push(edge.track);
        }

        let threshold = self.config.min_track_associations as usize;
        let crowded: Vec<(ClusterId, Vec<TrackId>)> = tracks_per_cluster
            .into_iter()
            .filter(|(_, contenders)| contenders.len() > threshold)
            .collect();

        if !crowded.is_empty() {
            let mut centroids: BTreeMap<ClusterId, Vector3<f64>> = BTreeMap::new();
            for &cluster in &clusters {
                centroids.insert(cluster, ctx.cluster_centroid(cluster)?);
            }

            for (cluster, contenders) in &crowded {
                debug!(
                    "{} carries {} tracks (tolerance {}), resolving",
                    cluster,
                    contenders.len(),
                    threshold
                );
                summary.clusters_resolved += 1;

                let current_centroid = match centroids.get(cluster) {
                    Some(centroid) => *centroid,
                    None => ctx.cluster_centroid(*cluster)?,
                };

                for &track in contenders {
                    let state = ctx.track_state(track)?;
                    let Some(helix) = Helix::from_state(&state, self.config.b_field_tesla) else {
                        warn!("{} has no usable trajectory, keeping it on {}", track, cluster);
                        continue;
                    };

                    let current_distance = helix.distance_to_point(&current_centroid).total;
                    if let Some((better, distance)) =
                        self.most_compatible_cluster(&helix, *cluster, current_distance, &centroids)
                    {
                        debug!(
                            "{}: {} ({:.1} mm) -> {} ({:.1} mm)",
                            track, cluster, current_distance, better, distance
                        );
                        plan.reassign(track, better);
                        summary.tracks_reassigned += 1;
                    }
                }
            }
        }

        ctx.remove_all_associations()?;
        summary.associations_added = commit(ctx, &plan)?;

        info!(
            "Force split complete: {} crowded clusters, {} tracks reassigned, {} associations",
            summary.clusters_resolved, summary.tracks_reassigned, summary.associations_added
        );

        Ok(summary)
    }

    /// Closest candidate cluster that beats `current_distance`.
    ///
    /// Candidates are walked in ascending id order and only replaced on a
    /// strictly smaller distance, so ties go to the lowest id.
    fn most_compatible_cluster(
        &self,
        helix: &Helix,
        current: ClusterId,
        current_distance: f64,
        centroids: &BTreeMap<ClusterId, Vector3<f64>>,
    ) -> Option<(ClusterId, f64)> {
        let limit = self
            .config
            .max_reassignment_distance
            .unwrap_or(f64::INFINITY);

        let mut best: Option<(ClusterId, f64)> = None;

        for (&candidate, centroid) in centroids {
            if candidate == current {
                continue;
            }

            let distance = helix.distance_to_point(centroid).total;
            let within_limit = distance <= limit;
            let improves = distance < current_distance;
            if !(within_limit && improves) {
                continue;
            }

            if best.map_or(true, |(_, best_distance)| distance < best_distance) {
                best = Some((candidate, distance));
            }
        }

        best
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use calomatch_env::{Association, EnvError, MemoryEvent, TrackState};
    use crate::testing::RecordingEvent;

    /// Straight tracks along +x at height `y`; with zero field, the distance
    /// to a centroid at (2000, y', 0) is |y - y'|.
    fn straight_resolver(threshold: u32) -> ForceSplitResolver {
        ForceSplitResolver::new(
            ForceSplitConfig::default()
                .with_min_track_associations(threshold)
                .with_b_field(0.0),
        )
        .unwrap()
    }

    fn track_at(event: &mut MemoryEvent, id: u64, y: f64) {
        let state = TrackState::new(
            Vector3::new(1800.0, y, 0.0),
            Vector3::new(10.0, 0.0, 0.0),
            1,
        );
        event.add_track(TrackId(id), state);
    }

    fn cluster_at(event: &mut MemoryEvent, id: u64, y: f64) {
        event.add_cluster(ClusterId(id), 5.0, Vector3::new(2000.0, y, 0.0));
    }

    fn associate(event: &mut MemoryEvent, track: u64, cluster: u64) {
        event
            .add_association(TrackId(track), ClusterId(cluster))
            .unwrap();
    }

    #[test]
    fn test_crowded_cluster_sheds_least_compatible_track() {
        let mut event = MemoryEvent::new();
        // C4 carries four tracks, T4 really points at C5
        cluster_at(&mut event, 4, 0.0);
        cluster_at(&mut event, 5, 100.0);
        for (id, y) in [(1, 0.0), (2, 5.0), (3, -5.0), (4, 95.0)] {
            track_at(&mut event, id, y);
            associate(&mut event, id, 4);
        }
        // C6 carries exactly three tracks, T7 would prefer C7
        cluster_at(&mut event, 6, 300.0);
        cluster_at(&mut event, 7, 200.0);
        for (id, y) in [(5, 300.0), (6, 305.0), (7, 205.0)] {
            track_at(&mut event, id, y);
            associate(&mut event, id, 6);
        }

        let summary = straight_resolver(3).run(&mut event).unwrap();

        assert_eq!(event.cluster_of(TrackId(4)), Some(ClusterId(5)));
        assert_eq!(
            event.tracks_of(ClusterId(4)),
            vec![TrackId(1), TrackId(2), TrackId(3)]
        );
        assert_eq!(
            event.tracks_of(ClusterId(6)),
            vec![TrackId(5), TrackId(6), TrackId(7)]
        );
        assert_eq!(summary.clusters_resolved, 1);
        assert_eq!(summary.tracks_reassigned, 1);
        assert_eq!(summary.associations_added, 7);
    }

    #[test]
    fn test_clusters_within_tolerance_untouched() {
        let mut event = MemoryEvent::new();
        cluster_at(&mut event, 0, 0.0);
        cluster_at(&mut event, 1, 50.0);
        track_at(&mut event, 0, 50.0);
        associate(&mut event, 0, 0);

        let before = event.relation();
        let summary = straight_resolver(1).run(&mut event).unwrap();

        assert_eq!(event.relation(), before);
        assert_eq!(summary.clusters_resolved, 0);
    }

    #[test]
    fn test_unassociated_tracks_stay_unassociated() {
        let mut event = MemoryEvent::new();
        cluster_at(&mut event, 0, 0.0);
        track_at(&mut event, 0, 0.0);
        track_at(&mut event, 1, 1.0);
        track_at(&mut event, 2, 2.0);
        associate(&mut event, 0, 0);
        associate(&mut event, 1, 0);

        straight_resolver(1).run(&mut event).unwrap();
        assert_eq!(event.cluster_of(TrackId(2)), None);
        assert_eq!(event.tracks_of(ClusterId(0)), vec![TrackId(0), TrackId(1)]);
    }

    #[test]
    fn test_equal_distance_keeps_current_cluster() {
        let mut event = MemoryEvent::new();
        cluster_at(&mut event, 0, 0.0);
        cluster_at(&mut event, 1, 100.0);
        track_at(&mut event, 0, 0.0);
        track_at(&mut event, 1, 50.0);
        associate(&mut event, 0, 0);
        associate(&mut event, 1, 0);

        let summary = straight_resolver(1).run(&mut event).unwrap();
        assert_eq!(event.cluster_of(TrackId(1)), Some(ClusterId(0)));
        assert_eq!(summary.tracks_reassigned, 0);
    }

    #[test]
    fn test_equidistant_alternatives_pick_lowest_id() {
        let mut event = MemoryEvent::new();
        cluster_at(&mut event, 0, -100.0);
        cluster_at(&mut event, 1, 100.0);
        cluster_at(&mut event, 2, 0.0);
        track_at(&mut event, 0, -100.0);
        track_at(&mut event, 1, 50.0);
        associate(&mut event, 0, 0);
        associate(&mut event, 1, 0);

        straight_resolver(1).run(&mut event).unwrap();
        assert_eq!(event.cluster_of(TrackId(1)), Some(ClusterId(1)));
    }

    #[test]
    fn test_reassignment_distance_limit() {
        let mut event = MemoryEvent::new();
        cluster_at(&mut event, 0, 0.0);
        cluster_at(&mut event, 1, 100.0);
        track_at(&mut event, 0, 0.0);
        track_at(&mut event, 1, 80.0);
        associate(&mut event, 0, 0);
        associate(&mut event, 1, 0);

        let resolver = ForceSplitResolver::new(
            ForceSplitConfig::default()
                .with_b_field(0.0)
                .with_max_reassignment_distance(10.0),
        )
        .unwrap();
        resolver.run(&mut event).unwrap();
        assert_eq!(event.cluster_of(TrackId(1)), Some(ClusterId(0)));

        let relaxed = ForceSplitResolver::new(
            ForceSplitConfig::default()
                .with_b_field(0.0)
                .with_max_reassignment_distance(50.0),
        )
        .unwrap();
        relaxed.run(&mut event).unwrap();
        assert_eq!(event.cluster_of(TrackId(1)), Some(ClusterId(1)));
    }

    #[test]
    fn test_curvature_decides_compatibility() {
        let resolver = ForceSplitResolver::with_defaults();
        let b_field = resolver.config().b_field_tesla;

        let positive = TrackState::new(
            Vector3::new(1800.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            1,
        );
        let negative = TrackState { charge: -1, ..positive };
        let landing = Helix::from_state(&positive, b_field).unwrap().position_at(200.0);

        let mut event = MemoryEvent::new();
        // C0 on the straight-line extrapolation, C1 where the positive track really lands
        event.add_cluster(ClusterId(0), 5.0, Vector3::new(2000.0, 0.0, 0.0));
        event.add_cluster(ClusterId(1), 5.0, landing);
        event.add_track(TrackId(0), positive);
        event.add_track(TrackId(1), negative);
        associate(&mut event, 0, 0);
        associate(&mut event, 1, 0);

        resolver.run(&mut event).unwrap();
        assert_eq!(event.cluster_of(TrackId(0)), Some(ClusterId(1)));
        assert_eq!(event.cluster_of(TrackId(1)), Some(ClusterId(0)));
    }

    #[test]
    fn test_degenerate_track_stays_put() {
        let mut event = MemoryEvent::new();
        cluster_at(&mut event, 0, 0.0);
        cluster_at(&mut event, 1, 10.0);
        track_at(&mut event, 0, 0.0);
        event.add_track(
            TrackId(1),
            TrackState::new(Vector3::new(1800.0, 10.0, 0.0), Vector3::zeros(), 1),
        );
        associate(&mut event, 0, 0);
        associate(&mut event, 1, 0);

        straight_resolver(1).run(&mut event).unwrap();
        assert_eq!(event.cluster_of(TrackId(1)), Some(ClusterId(0)));
    }

    #[test]
    fn test_track_on_two_clusters_is_inconsistent() {
        let mut event = MemoryEvent::new();
        cluster_at(&mut event, 0, 0.0);
        cluster_at(&mut event, 1, 10.0);
        track_at(&mut event, 0, 0.0);
        associate(&mut event, 0, 0);
        associate(&mut event, 0, 1);

        assert_eq!(
            straight_resolver(1).run(&mut event),
            Err(ResolveError::InconsistentRelation(TrackId(0)))
        );
        assert_eq!(event.relation().len(), 2, "relation untouched on early failure");
    }

    #[test]
    fn test_add_failure_leaves_empty_relation() {
        let mut event = MemoryEvent::new();
        cluster_at(&mut event, 0, 0.0);
        cluster_at(&mut event, 1, 100.0);
        track_at(&mut event, 0, 0.0);
        track_at(&mut event, 1, 100.0);
        associate(&mut event, 0, 0);
        associate(&mut event, 1, 0);
        event.fail_add_after(1);

        let err = straight_resolver(1).run(&mut event).unwrap_err();
        assert!(matches!(err, ResolveError::Env(EnvError::RelationMutation(_))));
        assert!(event.relation().is_empty());
    }

    #[test]
    fn test_missing_track_list_is_fatal() {
        let mut event = MemoryEvent::new();
        event.without_track_list();
        assert_eq!(
            straight_resolver(1).run(&mut event),
            Err(ResolveError::Env(EnvError::CollectionUnavailable("track")))
        );
    }

    #[test]
    fn test_repeated_runs_are_stable() {
        let mut event = MemoryEvent::new();
        for c in 0..4 {
            cluster_at(&mut event, c, c as f64 * 40.0);
        }
        for t in 0..8 {
            track_at(&mut event, t, t as f64 * 17.0);
            associate(&mut event, t, 0);
        }

        let resolver = straight_resolver(2);
        resolver.run(&mut event).unwrap();
        let first = event.relation();

        let mut replay = event.clone();
        resolver.run(&mut replay).unwrap();
        resolver.run(&mut event).unwrap();
        assert_eq!(event.relation(), replay.relation());
        assert!(first.iter().all(|a: &Association| a.cluster.0 < 4));
    }

    #[test]
    fn test_from_settings() {
        let resolver = ForceSplitResolver::from_settings("min_track_associations = 4").unwrap();
        assert_eq!(resolver.config().min_track_associations, 4);
        assert!(ForceSplitResolver::from_settings("min_track_associations = -1").is_err());
    }

    #[test]
    fn test_zero_threshold_reevaluates_single_track_clusters() {
        let mut event = MemoryEvent::new();
        cluster_at(&mut event, 0, 0.0);
        cluster_at(&mut event, 1, 100.0);
        track_at(&mut event, 0, 95.0);
        associate(&mut event, 0, 0);

        let settings = "min_track_associations = 0\nb_field_tesla = 0.0";
        let resolver = ForceSplitResolver::from_settings(settings).unwrap();
        let summary = resolver.run(&mut event).unwrap();

        assert_eq!(summary.clusters_resolved, 1);
        assert_eq!(event.cluster_of(TrackId(0)), Some(ClusterId(1)));
    }

    #[test]
    fn test_relation_is_empty_before_first_add() {
        let mut event = MemoryEvent::new();
        cluster_at(&mut event, 0, 0.0);
        cluster_at(&mut event, 1, 100.0);
        track_at(&mut event, 0, 0.0);
        track_at(&mut event, 1, 100.0);
        associate(&mut event, 0, 0);
        associate(&mut event, 1, 0);

        let mut recorder = RecordingEvent::new(event);
        straight_resolver(1).run(&mut recorder).unwrap();

        assert_eq!(recorder.clears, 1);
        assert_eq!(recorder.relation_at_first_add, Some(Vec::new()));
        assert_eq!(recorder.inner.cluster_of(TrackId(1)), Some(ClusterId(1)));
    }

    #[test]
    fn test_clusters_behind_entry_point_are_not_candidates() {
        let resolver = ForceSplitResolver::with_defaults();
        let charged = TrackState::new(
            Vector3::new(1800.0, 0.0, 0.0),
            Vector3::new(10.0, 0.0, 0.0),
            1,
        );
        let neutral = TrackState { charge: 0, ..charged };
        let helix = Helix::from_state(&charged, resolver.config().b_field_tesla).unwrap();

        let mut event = MemoryEvent::new();
        // C0 30 mm above the shower point, C1 and C2 on the backward extrapolations
        let shower = helix.position_at(150.0) + Vector3::new(0.0, 0.0, 30.0);
        event.add_cluster(ClusterId(0), 5.0, shower);
        event.add_cluster(ClusterId(1), 5.0, helix.position_at(-3600.0));
        event.add_cluster(ClusterId(2), 5.0, Vector3::new(-1900.0, 0.0, 0.0));
        event.add_track(TrackId(0), charged);
        event.add_track(TrackId(1), neutral);
        associate(&mut event, 0, 0);
        associate(&mut event, 1, 0);

        let summary = resolver.run(&mut event).unwrap();

        assert_eq!(summary.tracks_reassigned, 0);
        assert_eq!(event.cluster_of(TrackId(0)), Some(ClusterId(0)));
        assert_eq!(event.cluster_of(TrackId(1)), Some(ClusterId(0)));
    }
}
