//! Core event context trait for calomatch resolvers.

use crate::error::EnvError;
use crate::types::{Association, ClusterId, ParticleId, TrackId, TrackState};
use nalgebra::Vector3;

/// The central interface between a resolution pass and its event.
///
/// This trait abstracts the reconstruction framework so that the resolvers
/// can run against a production event store or an in-memory event built by
/// tests and the simulator.
///
/// # Implementations
///
/// - **In-memory**: `MemoryEvent` - owned lists, truth links and relation,
///   with switchable faults
/// - **Host**: a framework adapter forwarding to its object lists
///
/// # Snapshot semantics
///
/// Lists are read once per pass and treated as immutable for its duration.
/// Only the association relation is mutated, and only by the pass that holds
/// the `&mut` borrow.
pub trait EventContext {
    /// Returns the current track list, in the order the event owner keeps it.
    ///
    /// # Errors
    /// * `EnvError::CollectionUnavailable` - no current track list exists
    fn current_tracks(&self) -> Result<Vec<TrackId>, EnvError>;

    /// Returns the current cluster list, in the order the event owner keeps it.
    ///
    /// # Errors
    /// * `EnvError::CollectionUnavailable` - no current cluster list exists
    fn current_clusters(&self) -> Result<Vec<ClusterId>, EnvError>;

    /// Returns every edge currently in the association relation.
    fn associations(&self) -> Result<Vec<Association>, EnvError>;

    /// Clears the entire association relation.
    ///
    /// Must succeed on an already empty relation.
    fn remove_all_associations(&mut self) -> Result<(), EnvError>;

    /// Adds one edge to the association relation.
    ///
    /// # Errors
    /// * `EnvError::DuplicateAssociation` - the pair is already present
    /// * `EnvError::UnknownTrack` / `EnvError::UnknownCluster` - handle is not current
    fn add_association(&mut self, track: TrackId, cluster: ClusterId) -> Result<(), EnvError>;

    /// Looks up the truth particle that produced a track.
    ///
    /// `None` is a normal outcome (no truth information, or no dominant
    /// contributor) and must not abort a pass.
    fn track_particle(&self, track: TrackId) -> Option<ParticleId>;

    /// Looks up the truth particle that produced a cluster.
    fn cluster_particle(&self, cluster: ClusterId) -> Option<ParticleId>;

    /// Hadronic energy of a cluster (GeV, non-negative).
    fn hadronic_energy(&self, cluster: ClusterId) -> Result<f64, EnvError>;

    /// Track state at the calorimeter entry point, used to build its helix.
    fn track_state(&self, track: TrackId) -> Result<TrackState, EnvError>;

    /// Energy-weighted centroid of a cluster (mm).
    fn cluster_centroid(&self, cluster: ClusterId) -> Result<Vector3<f64>, EnvError>;
}
