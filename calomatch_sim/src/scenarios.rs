//! Named event recipes for the scenario runner.

use crate::oracle::{EventSpec, Preassociation};

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// SIM-001: well separated particles, one cluster each
    Isolated,

    /// SIM-002: showers frequently split into two clusters
    SplitShowers,

    /// SIM-003: collimated jets with every jet track piled onto one cluster
    Crowded,

    /// SIM-004: a third of the tracks lose their truth link
    TruthLoss,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Isolated,
            ScenarioId::SplitShowers,
            ScenarioId::Crowded,
            ScenarioId::TruthLoss,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Isolated => "isolated",
            ScenarioId::SplitShowers => "split_showers",
            ScenarioId::Crowded => "crowded",
            ScenarioId::TruthLoss => "truth_loss",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Isolated => "6 jets of one charged and one neutral particle, no splitting",
            ScenarioId::SplitShowers => "60% of showers split into a main cluster and a fragment",
            ScenarioId::Crowded => "4 tight jets of 3 tracks sharing their leading cluster",
            ScenarioId::TruthLoss => "30% of tracks without truth link, 30% split showers",
        }
    }

    /// Returns the event recipe.
    pub fn spec(&self) -> EventSpec {
        match self {
            ScenarioId::Isolated => EventSpec {
                preassociation: Preassociation::Truth,
                ..Default::default()
            },
            ScenarioId::SplitShowers => EventSpec {
                split_probability: 0.6,
                preassociation: Preassociation::Truth,
                ..Default::default()
            },
            ScenarioId::Crowded => EventSpec {
                jets: 4,
                charged_per_jet: 3,
                neutral_per_jet: 1,
                jet_spread: 0.08,
                preassociation: Preassociation::JetPileup,
                ..Default::default()
            },
            ScenarioId::TruthLoss => EventSpec {
                split_probability: 0.3,
                truth_loss_probability: 0.3,
                preassociation: Preassociation::Truth,
                ..Default::default()
            },
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "isolated" | "sim-001" => Ok(ScenarioId::Isolated),
            "split_showers" | "splitshowers" | "sim-002" => Ok(ScenarioId::SplitShowers),
            "crowded" | "sim-003" => Ok(ScenarioId::Crowded),
            "truth_loss" | "truthloss" | "sim-004" => Ok(ScenarioId::TruthLoss),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
