//! Error types for the calomatch event abstraction.

use crate::types::{ClusterId, TrackId};
use thiserror::Error;

/// Errors raised by an event store.
///
/// Every variant is fatal for the pass that hit it. Missing truth links are
/// not errors and never appear here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    /// The named current list (tracks or clusters) does not exist
    #[error("Current {0} list is unavailable")]
    CollectionUnavailable(&'static str),

    /// The pair is already present in the relation
    #[error("Association {track} -> {cluster} already exists")]
    DuplicateAssociation { track: TrackId, cluster: ClusterId },

    /// Track handle is not part of the current list
    #[error("Unknown track: {0}")]
    UnknownTrack(TrackId),

    /// Cluster handle is not part of the current list
    #[error("Unknown cluster: {0}")]
    UnknownCluster(ClusterId),

    /// The store refused to clear or extend the relation
    #[error("Relation mutation failed: {0}")]
    RelationMutation(String),
}

impl EnvError {
    /// Creates a relation mutation error.
    pub fn mutation(msg: impl Into<String>) -> Self {
        Self::RelationMutation(msg.into())
    }
}
