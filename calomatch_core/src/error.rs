//! Pass-level error type.

use crate::config::ConfigError;
use calomatch_env::{EnvError, ParticleId, TrackId};

/// Errors that abort a resolution pass.
///
/// A pass that returns one of these has left no partially rebuilt relation
/// behind; the host decides whether to retry the event.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    /// Snapshot read or relation mutation failed in the event store
    #[error("Event store error: {0}")]
    Env(#[from] EnvError),

    /// A truth group had clusters but none could be selected
    #[error("No highest-energy cluster selectable for {0}")]
    SelectionInvariant(ParticleId),

    /// The current relation links one track to several clusters
    #[error("Track {0} is associated with more than one cluster")]
    InconsistentRelation(TrackId),

    /// A track was planned twice in one pass
    #[error("Track {0} already has a planned association")]
    TrackAlreadyPlanned(TrackId),

    /// Settings could not be turned into a resolver
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
