//! In-memory implementation of `EventContext`.

use crate::context::EventContext;
use crate::error::EnvError;
use crate::types::{Association, ClusterId, ParticleId, TrackId, TrackState};
use nalgebra::Vector3;
use std::collections::{BTreeSet, HashMap};

/// A stored cluster.
#[derive(Debug, Clone)]
struct ClusterRecord {
    hadronic_energy: f64,
    centroid: Vector3<f64>,
}

/// Event store backed by plain collections.
///
/// Lists keep insertion order, the relation is a `BTreeSet` so reads come
/// back sorted. Fault switches let tests drive every failure branch of a
/// pass:
/// - `without_track_list()` / `without_cluster_list()` hide a current list
/// - `fail_clear()` makes `remove_all_associations()` fail
/// - `fail_add_after(n)` lets `n` adds succeed, then fails every later one
#[derive(Debug, Clone, Default)]
pub struct MemoryEvent {
    tracks: Vec<TrackId>,
    clusters: Vec<ClusterId>,
    track_states: HashMap<TrackId, TrackState>,
    cluster_records: HashMap<ClusterId, ClusterRecord>,
    track_truth: HashMap<TrackId, ParticleId>,
    cluster_truth: HashMap<ClusterId, ParticleId>,
    relation: BTreeSet<Association>,

    hide_tracks: bool,
    hide_clusters: bool,
    clear_fails: bool,
    adds_before_failure: Option<usize>,
    adds_performed: usize,
}

impl MemoryEvent {
    /// Creates an empty event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a track to the current track list.
    pub fn add_track(&mut self, id: TrackId, state: TrackState) -> &mut Self {
        if self.track_states.insert(id, state).is_none() {
            self.tracks.push(id);
        }
        self
    }

    /// Appends a cluster to the current cluster list.
    pub fn add_cluster(
        &mut self,
        id: ClusterId,
        hadronic_energy: f64,
        centroid: Vector3<f64>,
    ) -> &mut Self {
        let record = ClusterRecord {
            hadronic_energy,
            centroid,
        };
        if self.cluster_records.insert(id, record).is_none() {
            self.clusters.push(id);
        }
        self
    }

    /// Records the truth particle that produced a track.
    pub fn link_track_to_particle(&mut self, track: TrackId, particle: ParticleId) -> &mut Self {
        self.track_truth.insert(track, particle);
        self
    }

    /// Records the truth particle that produced a cluster.
    pub fn link_cluster_to_particle(
        &mut self,
        cluster: ClusterId,
        particle: ParticleId,
    ) -> &mut Self {
        self.cluster_truth.insert(cluster, particle);
        self
    }

    /// Hides the current track list.
    pub fn without_track_list(&mut self) -> &mut Self {
        self.hide_tracks = true;
        self
    }

    /// Hides the current cluster list.
    pub fn without_cluster_list(&mut self) -> &mut Self {
        self.hide_clusters = true;
        self
    }

    /// Makes every subsequent clear fail.
    pub fn fail_clear(&mut self) -> &mut Self {
        self.clear_fails = true;
        self
    }

    /// Allows `n` more successful adds, then fails.
    pub fn fail_add_after(&mut self, n: usize) -> &mut Self {
        self.adds_before_failure = Some(n);
        self.adds_performed = 0;
        self
    }

    /// Removes all fault switches.
    pub fn heal(&mut self) -> &mut Self {
        self.hide_tracks = false;
        self.hide_clusters = false;
        self.clear_fails = false;
        self.adds_before_failure = None;
        self.adds_performed = 0;
        self
    }

    /// Returns the relation in sorted order without going through the trait.
    pub fn relation(&self) -> Vec<Association> {
        self.relation.iter().copied().collect()
    }

    /// Returns the cluster a track is associated with, if exactly one.
    pub fn cluster_of(&self, track: TrackId) -> Option<ClusterId> {
        let mut hits = self.relation.iter().filter(|a| a.track == track);
        let first = hits.next()?;
        match hits.next() {
            Some(_) => None,
            None => Some(first.cluster),
        }
    }

    /// Returns the tracks associated with a cluster, sorted.
    pub fn tracks_of(&self, cluster: ClusterId) -> Vec<TrackId> {
        self.relation
            .iter()
            .filter(|a| a.cluster == cluster)
            .map(|a| a.track)
            .collect()
    }

    /// Truth particle of a track, bypassing the trait.
    pub fn truth_of_track(&self, track: TrackId) -> Option<ParticleId> {
        self.track_truth.get(&track).copied()
    }

    /// Truth particle of a cluster, bypassing the trait.
    pub fn truth_of_cluster(&self, cluster: ClusterId) -> Option<ParticleId> {
        self.cluster_truth.get(&cluster).copied()
    }

    /// Number of tracks in the event.
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Number of clusters in the event.
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }
}

impl EventContext for MemoryEvent {
    fn current_tracks(&self) -> Result<Vec<TrackId>, EnvError> {
        if self.hide_tracks {
            return Err(EnvError::CollectionUnavailable("track"));
        }
        Ok(self.tracks.clone())
    }

    fn current_clusters(&self) -> Result<Vec<ClusterId>, EnvError> {
        if self.hide_clusters {
            return Err(EnvError::CollectionUnavailable("cluster"));
        }
        Ok(self.clusters.clone())
    }

    fn associations(&self) -> Result<Vec<Association>, EnvError> {
        Ok(self.relation())
    }

    fn remove_all_associations(&mut self) -> Result<(), EnvError> {
        if self.clear_fails {
            return Err(EnvError::mutation("clear refused by store"));
        }
        self.relation.clear();
        Ok(())
    }

    fn add_association(&mut self, track: TrackId, cluster: ClusterId) -> Result<(), EnvError> {
        if !self.track_states.contains_key(&track) {
            return Err(EnvError::UnknownTrack(track));
        }
        if !self.cluster_records.contains_key(&cluster) {
            return Err(EnvError::UnknownCluster(cluster));
        }
        if let Some(limit) = self.adds_before_failure {
            if self.adds_performed >= limit {
                return Err(EnvError::mutation(format!(
                    "add {} -> {} refused by store",
                    track, cluster
                )));
            }
        }
        if !self.relation.insert(Association::new(track, cluster)) {
            return Err(EnvError::DuplicateAssociation { track, cluster });
        }
        self.adds_performed += 1;
        Ok(())
    }

    fn track_particle(&self, track: TrackId) -> Option<ParticleId> {
        self.track_truth.get(&track).copied()
    }

    fn cluster_particle(&self, cluster: ClusterId) -> Option<ParticleId> {
        self.cluster_truth.get(&cluster).copied()
    }

    fn hadronic_energy(&self, cluster: ClusterId) -> Result<f64, EnvError> {
        self.cluster_records
            .get(&cluster)
            .map(|c| c.hadronic_energy)
            .ok_or(EnvError::UnknownCluster(cluster))
    }

    fn track_state(&self, track: TrackId) -> Result<TrackState, EnvError> {
        self.track_states
            .get(&track)
            .copied()
            .ok_or(EnvError::UnknownTrack(track))
    }

    fn cluster_centroid(&self, cluster: ClusterId) -> Result<Vector3<f64>, EnvError> {
        self.cluster_records
            .get(&cluster)
            .map(|c| c.centroid)
            .ok_or(EnvError::UnknownCluster(cluster))
    }
}
