//! Scenario runner - generates an event, runs a strategy, scores the result.

use crate::error::SimError;
use crate::oracle::{Oracle, SimEvent};
use crate::scenarios::ScenarioId;

use calomatch_core::{PassSummary, Strategy, StrategyKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Tolerance for comparing fractions
const FRACTION_EPSILON: f64 = 1e-12;

/// Association quality against truth.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssociationMetrics {
    /// Fraction of tracks sitting on a cluster of their own particle
    pub efficiency: f64,

    /// Fraction of associations whose track and cluster share a particle
    pub purity: f64,

    /// Purity of the relation before the pass
    pub purity_before: f64,

    /// Fraction of tracks that still carried a truth link
    pub truth_linked_fraction: f64,

    /// Edges in the relation after the pass
    pub associations: usize,
}

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Strategy that was run
    pub strategy: StrategyKind,

    /// Seed used
    pub seed: u64,

    /// Whether the relation met the strategy's quality bar
    pub passed: bool,

    /// Pass counters, if the pass completed
    pub summary: Option<PassSummary>,

    /// Quality metrics
    pub metrics: AssociationMetrics,

    /// Failure message if any
    pub failure_reason: Option<String>,
}

/// Runs scenarios with one configured strategy.
pub struct ScenarioRunner {
    /// Generation seed
    seed: u64,

    /// Strategy under test
    strategy: Strategy,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64, strategy: Strategy) -> Self {
        Self { seed, strategy }
    }

    /// Generates the event for a scenario.
    ///
    /// The generator bends tracks in the same field the resolver assumes.
    pub fn generate(&self, scenario: ScenarioId) -> Result<SimEvent, SimError> {
        let mut spec = scenario.spec();
        if let Strategy::ForceSplit(resolver) = &self.strategy {
            spec.b_field_tesla = resolver.config().b_field_tesla;
        }
        let mut oracle = Oracle::new(self.seed);
        debug!("Generating {} from seed {}", scenario.name(), oracle.seed());
        Ok(oracle.generate_event(&spec)?)
    }

    /// Runs a scenario and returns the result.
    ///
    /// A scenario whose event cannot be generated counts as failed.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        match self.run_detailed(scenario) {
            Ok((result, _)) => result,
            Err(err) => {
                warn!("Scenario {} could not be generated: {}", scenario.name(), err);
                ScenarioResult {
                    scenario,
                    strategy: self.strategy.kind(),
                    seed: self.seed,
                    passed: false,
                    summary: None,
                    metrics: AssociationMetrics::default(),
                    failure_reason: Some(format!("generation failed: {}", err)),
                }
            }
        }
    }

    /// Runs a scenario and also returns the event in its final state.
    pub fn run_detailed(
        &self,
        scenario: ScenarioId,
    ) -> Result<(ScenarioResult, SimEvent), SimError> {
        let resolver = self.strategy.as_resolver();
        info!(
            "Starting scenario: {} with {} (seed={})",
            scenario.name(),
            resolver.name(),
            self.seed
        );

        let mut sim = self.generate(scenario)?;
        let purity_before = purity(&sim);

        let outcome = resolver.resolve(&mut sim.event);

        let mut metrics = score(&sim);
        metrics.purity_before = purity_before;

        let (summary, failure_reason) = match outcome {
            Ok(summary) => (Some(summary), self.quality_failure(&metrics)),
            Err(err) => {
                warn!("Pass failed: {}", err);
                (None, Some(format!("pass failed: {}", err)))
            }
        };

        debug!(
            "  efficiency={:.3} purity={:.3} (before {:.3}) associations={}",
            metrics.efficiency, metrics.purity, metrics.purity_before, metrics.associations
        );

        let result = ScenarioResult {
            scenario,
            strategy: self.strategy.kind(),
            seed: self.seed,
            passed: failure_reason.is_none(),
            summary,
            metrics,
            failure_reason,
        };

        Ok((result, sim))
    }

    /// Quality bar per strategy.
    ///
    /// Truth matching must be fully pure and reach every truth-linked track.
    /// Force splitting must not lower purity.
    fn quality_failure(&self, metrics: &AssociationMetrics) -> Option<String> {
        match self.strategy.kind() {
            StrategyKind::Truth => {
                if metrics.purity < 1.0 - FRACTION_EPSILON {
                    Some(format!("truth purity {:.3} below 1", metrics.purity))
                } else if metrics.efficiency < metrics.truth_linked_fraction - FRACTION_EPSILON {
                    Some(format!(
                        "efficiency {:.3} below truth-linked fraction {:.3}",
                        metrics.efficiency, metrics.truth_linked_fraction
                    ))
                } else {
                    None
                }
            }
            StrategyKind::ForceSplit => {
                if metrics.purity < metrics.purity_before - FRACTION_EPSILON {
                    Some(format!(
                        "purity dropped from {:.3} to {:.3}",
                        metrics.purity_before, metrics.purity
                    ))
                } else {
                    None
                }
            }
        }
    }
}

/// Scores the event's current relation against truth.
pub fn score(sim: &SimEvent) -> AssociationMetrics {
    let relation = sim.event.relation();
    let tracks = &sim.truth.track_particle;

    let matched = tracks
        .iter()
        .filter(|(track, particle)| {
            sim.event
                .cluster_of(**track)
                .and_then(|cluster| sim.truth.cluster_particle.get(&cluster))
                == Some(*particle)
        })
        .count();

    let linked = tracks
        .keys()
        .filter(|track| sim.event.truth_of_track(**track).is_some())
        .count();

    AssociationMetrics {
        efficiency: fraction(matched, tracks.len()),
        purity: purity(sim),
        purity_before: 0.0,
        truth_linked_fraction: fraction(linked, tracks.len()),
        associations: relation.len(),
    }
}

fn purity(sim: &SimEvent) -> f64 {
    let relation = sim.event.relation();
    let correct = relation
        .iter()
        .filter(|edge| {
            let track_particle = sim.truth.track_particle.get(&edge.track);
            track_particle.is_some()
                && track_particle == sim.truth.cluster_particle.get(&edge.cluster)
        })
        .count();
    fraction(correct, relation.len())
}

/// Ratio with an empty denominator counting as perfect.
fn fraction(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        1.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calomatch_core::ForceSplitConfig;
    use calomatch_core::ForceSplitResolver;

    fn truth_runner(seed: u64) -> ScenarioRunner {
        ScenarioRunner::new(seed, Strategy::from_settings(StrategyKind::Truth, "").unwrap())
    }

    fn force_split_runner(seed: u64) -> ScenarioRunner {
        let resolver = ForceSplitResolver::new(ForceSplitConfig::default()).unwrap();
        ScenarioRunner::new(seed, Strategy::ForceSplit(resolver))
    }

    #[test]
    fn test_truth_matching_passes_every_scenario() {
        for scenario in ScenarioId::all() {
            let result = truth_runner(42).run(scenario);
            assert!(
                result.passed,
                "{} failed: {:?}",
                scenario,
                result.failure_reason
            );
            assert_eq!(result.metrics.purity, 1.0);
        }
    }

    #[test]
    fn test_truth_loss_lowers_efficiency_only() {
        let result = truth_runner(42).run(ScenarioId::TruthLoss);
        assert!(result.metrics.efficiency <= 1.0);
        assert_eq!(result.metrics.efficiency, result.metrics.truth_linked_fraction);
    }

    #[test]
    fn test_split_showers_use_main_cluster() {
        let (result, sim) = truth_runner(8).run_detailed(ScenarioId::SplitShowers).unwrap();
        assert!(result.passed);
        for edge in sim.event.relation() {
            let particle = sim.truth.track_particle[&edge.track];
            assert_eq!(sim.truth.main_cluster[&particle], edge.cluster);
        }
    }

    #[test]
    fn test_force_split_leaves_isolated_event_alone() {
        let runner = force_split_runner(5);
        let before = runner.generate(ScenarioId::Isolated).unwrap().event.relation();
        let (result, sim) = runner.run_detailed(ScenarioId::Isolated).unwrap();

        assert!(result.passed);
        assert_eq!(sim.event.relation(), before);
        assert_eq!(result.summary.unwrap().clusters_resolved, 0);
    }

    #[test]
    fn test_force_split_resolves_every_pileup() {
        let result = force_split_runner(21).run(ScenarioId::Crowded);
        let summary = result.summary.expect("pass should complete");
        assert_eq!(summary.clusters_resolved, ScenarioId::Crowded.spec().jets);
        assert_eq!(summary.associations_added, 12);
    }

    #[test]
    fn test_fraction_of_empty_is_one() {
        assert_eq!(fraction(0, 0), 1.0);
        assert_eq!(fraction(1, 4), 0.25);
    }
}
