//! JSON exporter for offline inspection of a resolved event.
//!
//! Writes the event content, its truth and the final relation as one JSON
//! document.

use crate::error::SimError;
use crate::oracle::SimEvent;
use crate::runner::{AssociationMetrics, ScenarioResult};

use calomatch_env::{Association, EventContext};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

/// A track as exported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackRecord {
    pub id: u64,
    pub charge: i32,
    pub position: [f64; 3],
    pub momentum: [f64; 3],

    /// Originating particle from the full truth record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub particle: Option<u64>,

    /// Whether the event itself still carried the truth link
    pub truth_linked: bool,
}

/// A cluster as exported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterRecord {
    pub id: u64,
    pub hadronic_energy: f64,
    pub centroid: [f64; 3],

    #[serde(skip_serializing_if = "Option::is_none")]
    pub particle: Option<u64>,
}

/// Complete export of one scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Strategy name
    pub strategy: String,

    /// Seed used
    pub seed: u64,

    pub tracks: Vec<TrackRecord>,
    pub clusters: Vec<ClusterRecord>,

    /// Final relation
    pub associations: Vec<Association>,

    pub metrics: AssociationMetrics,

    /// Final result
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

fn components(v: &Vector3<f64>) -> [f64; 3] {
    [v.x, v.y, v.z]
}

impl SimExport {
    /// Builds an export from a finished run.
    pub fn from_event(result: &ScenarioResult, sim: &SimEvent) -> Result<Self, SimError> {
        let event = &sim.event;

        let tracks = event
            .current_tracks()?
            .into_iter()
            .map(|id| -> Result<TrackRecord, SimError> {
                let state = event.track_state(id)?;
                Ok(TrackRecord {
                    id: id.0,
                    charge: state.charge,
                    position: components(&state.position),
                    momentum: components(&state.momentum),
                    particle: sim.truth.track_particle.get(&id).map(|p| p.0),
                    truth_linked: event.track_particle(id).is_some(),
                })
            })
            .collect::<Result<Vec<_>, SimError>>()?;

        let clusters = event
            .current_clusters()?
            .into_iter()
            .map(|id| -> Result<ClusterRecord, SimError> {
                Ok(ClusterRecord {
                    id: id.0,
                    hadronic_energy: event.hadronic_energy(id)?,
                    centroid: components(&event.cluster_centroid(id)?),
                    particle: sim.truth.cluster_particle.get(&id).map(|p| p.0),
                })
            })
            .collect::<Result<Vec<_>, SimError>>()?;

        Ok(Self {
            scenario: result.scenario.name().to_string(),
            strategy: result.strategy.name().to_string(),
            seed: result.seed,
            tracks,
            clusters,
            associations: event.associations()?,
            metrics: result.metrics.clone(),
            passed: result.passed,
            failure_reason: result.failure_reason.clone(),
        })
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> Result<(), SimError> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ScenarioRunner;
    use crate::scenarios::ScenarioId;
    use calomatch_core::{Strategy, StrategyKind};

    #[test]
    fn test_export_mirrors_event() {
        let strategy = Strategy::from_settings(StrategyKind::Truth, "").unwrap();
        let (result, sim) = ScenarioRunner::new(3, strategy)
            .run_detailed(ScenarioId::SplitShowers)
            .unwrap();
        let export = SimExport::from_event(&result, &sim).unwrap();

        assert_eq!(export.scenario, "split_showers");
        assert_eq!(export.strategy, "truth");
        assert_eq!(export.tracks.len(), sim.event.track_count());
        assert_eq!(export.clusters.len(), sim.event.cluster_count());
        assert_eq!(export.associations, sim.event.relation());
        assert!(export.tracks.iter().all(|t| t.particle.is_some() && t.truth_linked));
    }

    #[test]
    fn test_export_serializes_to_json() {
        let strategy = Strategy::from_settings(StrategyKind::Truth, "").unwrap();
        let (result, sim) = ScenarioRunner::new(1, strategy)
            .run_detailed(ScenarioId::Isolated)
            .unwrap();
        let export = SimExport::from_event(&result, &sim).unwrap();

        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["seed"], 1);
        assert_eq!(json["passed"], true);
        assert!(json.get("failure_reason").is_none());
        assert_eq!(
            json["associations"].as_array().unwrap().len(),
            export.associations.len()
        );
    }
}
