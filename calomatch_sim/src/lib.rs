//! calomatch Simulation Harness
//!
//! This crate provides a controlled source of events for the association
//! resolvers, with the truth that real data never has:
//! - **Oracle**: generates truth particles, their tracks and (possibly
//!   split) clusters, all derived from a single 64-bit seed
//! - **Scenarios**: named event recipes stressing one aspect each
//! - **Runner**: runs a strategy on a generated event and scores the
//!   resulting relation against truth
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   MemoryEvent    ┌──────────────────────┐
//! │    Oracle    │ ───────────────► │ Strategy (core)      │
//! │ (seeded RNG) │                  │ truth | force_split  │
//! └──────┬───────┘                  └──────────┬───────────┘
//!        │ TruthRecord                         │ relation
//!        ▼                                     ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │ ScenarioRunner: efficiency / purity -> ScenarioResult   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use calomatch_core::{Strategy, StrategyKind};
//! use calomatch_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let strategy = Strategy::from_settings(StrategyKind::Truth, "")?;
//! let result = ScenarioRunner::new(42, strategy).run(ScenarioId::SplitShowers);
//! assert!(result.passed);
//! ```

mod error;
mod exporter;
mod oracle;
mod runner;
pub mod scenarios;

pub use error::SimError;
pub use exporter::{ClusterRecord, SimExport, TrackRecord};
pub use oracle::{EventSpec, Oracle, Preassociation, SimEvent, TruthRecord};
pub use runner::{AssociationMetrics, ScenarioResult, ScenarioRunner};
