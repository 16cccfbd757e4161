//! calomatch Core - Track-to-Cluster Association for Particle Flow
//!
//! This library decides which reconstructed tracks belong with which
//! calorimeter clusters. Two mutually exclusive strategies rebuild the
//! association relation of one event per pass:
//! 1. **Truth Matcher**: groups tracks and clusters by their originating
//!    truth particle and links every track to its particle's highest-energy
//!    cluster (validation and tuning runs)
//! 2. **Force-Split Resolver**: breaks up clusters that carry more tracks
//!    than the configured tolerance, moving each contending track to the
//!    cluster its helix passes closest to (production runs)
//!
//! Both read the event through `calomatch_env::EventContext` and either
//! commit a complete relation or fail the pass with a `ResolveError`.

pub mod association;
pub mod config;
pub mod error;
pub mod force_split;
pub mod helix;
pub mod strategy;
pub mod truth;

#[cfg(test)]
mod testing;

// Re-export key types for convenience
pub use association::{AssociationPlan, PassSummary};
pub use config::{ConfigError, ForceSplitConfig};
pub use error::ResolveError;
pub use force_split::ForceSplitResolver;
pub use helix::{Helix, HelixDistance};
pub use strategy::{Resolver, Strategy, StrategyKind};
pub use truth::TruthMatcher;
