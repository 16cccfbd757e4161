//! Test doubles shared by the pass tests.

use calomatch_env::{
    Association, ClusterId, EnvError, EventContext, MemoryEvent, ParticleId, TrackId, TrackState,
};
use nalgebra::Vector3;

/// Wraps a `MemoryEvent` and snapshots the relation when the first edge is added.
pub(crate) struct RecordingEvent {
    pub inner: MemoryEvent,
    pub relation_at_first_add: Option<Vec<Association>>,
    pub clears: usize,
}

impl RecordingEvent {
    pub fn new(inner: MemoryEvent) -> Self {
        Self {
            inner,
            relation_at_first_add: None,
            clears: 0,
        }
    }
}

impl EventContext for RecordingEvent {
    fn current_tracks(&self) -> Result<Vec<TrackId>, EnvError> {
        self.inner.current_tracks()
    }
    fn current_clusters(&self) -> Result<Vec<ClusterId>, EnvError> {
        self.inner.current_clusters()
    }
    fn associations(&self) -> Result<Vec<Association>, EnvError> {
        self.inner.associations()
    }
    fn remove_all_associations(&mut self) -> Result<(), EnvError> {
        self.clears += 1;
        self.inner.remove_all_associations()
    }
    fn add_association(&mut self, t: TrackId, c: ClusterId) -> Result<(), EnvError> {
        if self.relation_at_first_add.is_none() {
            self.relation_at_first_add = Some(self.inner.associations()?);
        }
        self.inner.add_association(t, c)
    }
    fn track_particle(&self, t: TrackId) -> Option<ParticleId> {
        self.inner.track_particle(t)
    }
    fn cluster_particle(&self, c: ClusterId) -> Option<ParticleId> {
        self.inner.cluster_particle(c)
    }
    fn hadronic_energy(&self, c: ClusterId) -> Result<f64, EnvError> {
        self.inner.hadronic_energy(c)
    }
    fn track_state(&self, t: TrackId) -> Result<TrackState, EnvError> {
        self.inner.track_state(t)
    }
    fn cluster_centroid(&self, c: ClusterId) -> Result<Vector3<f64>, EnvError> {
        self.inner.cluster_centroid(c)
    }
}
