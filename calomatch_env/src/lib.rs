//! calomatch Event Abstraction Layer
//!
//! This crate provides the boundary between the association algorithms in
//! `calomatch_core` and whatever owns the reconstructed event: the current
//! track and cluster lists, their truth links, and the track-cluster
//! association relation.
//!
//! # Core Concept: The Injected Event
//!
//! Every resolution pass receives its event as an explicit `&mut impl
//! EventContext`. Nothing is global, so independent events can be processed
//! side by side, each with its own store:
//! - Snapshots (`current_tracks()`, `current_clusters()`)
//! - Relation mutation (`remove_all_associations()`, `add_association()`)
//! - Truth lookups (`track_particle()`, `cluster_particle()`)
//! - Geometry (`track_state()`, `cluster_centroid()`)
//!
//! # Example
//!
//! ```ignore
//! use calomatch_env::{EventContext, MemoryEvent};
//!
//! fn rebuild<Ctx: EventContext>(ctx: &mut Ctx) -> Result<(), EnvError> {
//!     ctx.remove_all_associations()?;
//!     for track in ctx.current_tracks()? {
//!         // ...
//!     }
//!     Ok(())
//! }
//! ```

mod context;
mod error;
mod memory;
mod types;

pub use context::EventContext;
pub use error::EnvError;
pub use memory::MemoryEvent;
pub use types::{Association, ClusterId, ParticleId, TrackId, TrackState};
