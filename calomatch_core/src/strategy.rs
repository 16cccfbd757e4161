//! Strategy selection.
//!
//! Validation runs use the Truth Matcher, production runs the Force-Split
//! Resolver; a host picks one per run by name and hands it the settings
//! block.

use crate::association::PassSummary;
use crate::config::ConfigError;
use crate::error::ResolveError;
use crate::force_split::ForceSplitResolver;
use crate::truth::TruthMatcher;
use calomatch_env::EventContext;

/// One resolution pass over one event.
pub trait Resolver {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Rebuilds the event's association relation.
    fn resolve(&self, ctx: &mut dyn EventContext) -> Result<PassSummary, ResolveError>;
}

impl Resolver for TruthMatcher {
    fn name(&self) -> &'static str {
        StrategyKind::Truth.name()
    }

    fn resolve(&self, ctx: &mut dyn EventContext) -> Result<PassSummary, ResolveError> {
        self.run(ctx)
    }
}

impl Resolver for ForceSplitResolver {
    fn name(&self) -> &'static str {
        StrategyKind::ForceSplit.name()
    }

    fn resolve(&self, ctx: &mut dyn EventContext) -> Result<PassSummary, ResolveError> {
        self.run(ctx)
    }
}

/// Strategy identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Truth-particle grouping (validation)
    Truth,

    /// Geometric repair of crowded clusters (production)
    ForceSplit,
}

impl StrategyKind {
    /// Returns all strategies.
    pub fn all() -> Vec<StrategyKind> {
        vec![StrategyKind::Truth, StrategyKind::ForceSplit]
    }

    /// Returns the strategy name.
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Truth => "truth",
            StrategyKind::ForceSplit => "force_split",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "truth" | "cheating" => Ok(StrategyKind::Truth),
            "force_split" | "force-split" | "forcesplit" => Ok(StrategyKind::ForceSplit),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

/// A configured strategy, ready to run.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    Truth(TruthMatcher),
    ForceSplit(ForceSplitResolver),
}

impl Strategy {
    /// Builds a strategy from its kind and settings block.
    pub fn from_settings(kind: StrategyKind, settings: &str) -> Result<Self, ConfigError> {
        match kind {
            StrategyKind::Truth => Ok(Strategy::Truth(TruthMatcher::from_settings(settings)?)),
            StrategyKind::ForceSplit => Ok(Strategy::ForceSplit(
                ForceSplitResolver::from_settings(settings)?,
            )),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Truth(_) => StrategyKind::Truth,
            Strategy::ForceSplit(_) => StrategyKind::ForceSplit,
        }
    }

    /// Borrows the selected pass as a trait object.
    pub fn as_resolver(&self) -> &dyn Resolver {
        match self {
            Strategy::Truth(matcher) => matcher,
            Strategy::ForceSplit(resolver) => resolver,
        }
    }
}
