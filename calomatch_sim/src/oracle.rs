//! Ground truth oracle for simulation.
//!
//! The Oracle plays the upstream reconstruction chain:
//! - Truth particles grouped in jets (shared direction, configurable spread)
//! - One track per charged particle, stated at the calorimeter entry
//! - One cluster per particle, sometimes split into a second fragment
//! - Optional pre-existing relation for the Force-Split Resolver to repair
//!
//! Every number is drawn from a ChaCha8 stream seeded once, so the same seed
//! always yields the same event.

use calomatch_core::Helix;
use calomatch_env::{
    ClusterId, EnvError, EventContext, MemoryEvent, ParticleId, TrackId, TrackState,
};
use nalgebra::Vector3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use std::collections::BTreeMap;
use std::f64::consts::PI;

/// Inner radius of the calorimeter barrel (mm)
const CALORIMETER_RADIUS: f64 = 1800.0;

/// Path length from calorimeter entry to the shower centroid (mm)
const SHOWER_DEPTH: f64 = 150.0;

/// Extra depth of a split-off shower fragment (mm)
const FRAGMENT_DEPTH: f64 = 250.0;

/// Centroid smearing per coordinate (mm)
const CENTROID_SMEAR: f64 = 5.0;

/// Relative hadronic energy resolution
const ENERGY_RESOLUTION: f64 = 0.1;

/// How the relation of a generated event starts out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preassociation {
    /// Empty relation
    None,
    /// Every track on its own particle's main cluster
    Truth,
    /// All tracks of a jet piled onto the jet's most energetic track cluster
    JetPileup,
}

/// Recipe for one generated event.
#[derive(Debug, Clone)]
pub struct EventSpec {
    /// Number of jets
    pub jets: usize,

    /// Charged particles per jet (each yields a track)
    pub charged_per_jet: usize,

    /// Neutral particles per jet (clusters only)
    pub neutral_per_jet: usize,

    /// Angular spread of particles around the jet axis (rad)
    pub jet_spread: f64,

    /// Probability a shower is split into two clusters
    pub split_probability: f64,

    /// Probability a track loses its truth link
    pub truth_loss_probability: f64,

    /// Initial relation
    pub preassociation: Preassociation,

    /// Field used to bend charged particles (T)
    pub b_field_tesla: f64,
}

impl Default for EventSpec {
    fn default() -> Self {
        Self {
            jets: 6,
            charged_per_jet: 1,
            neutral_per_jet: 1,
            jet_spread: 0.0,
            split_probability: 0.0,
            truth_loss_probability: 0.0,
            preassociation: Preassociation::None,
            b_field_tesla: 3.5,
        }
    }
}

/// Complete truth of a generated event, independent of lost links.
#[derive(Debug, Clone, Default)]
pub struct TruthRecord {
    /// Originating particle of every track
    pub track_particle: BTreeMap<TrackId, ParticleId>,

    /// Originating particle of every cluster
    pub cluster_particle: BTreeMap<ClusterId, ParticleId>,

    /// Most energetic cluster of every particle
    pub main_cluster: BTreeMap<ParticleId, ClusterId>,
}

/// A generated event together with its truth.
#[derive(Debug, Clone)]
pub struct SimEvent {
    pub event: MemoryEvent,
    pub truth: TruthRecord,
}

/// The Oracle - generates events from a seed.
pub struct Oracle {
    /// Master seed (for logging/debugging)
    seed: u64,

    /// RNG for all generation
    rng: ChaCha8Rng,

    next_particle: u64,
    next_track: u64,
    next_cluster: u64,
}

impl Oracle {
    /// Creates a new Oracle with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            next_particle: 0,
            next_track: 0,
            next_cluster: 0,
        }
    }

    /// Returns the seed the oracle was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn gaussian(&mut self, sigma: f64) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        z * sigma
    }

    fn smear(&mut self, point: Vector3<f64>) -> Vector3<f64> {
        point
            + Vector3::new(
                self.gaussian(CENTROID_SMEAR),
                self.gaussian(CENTROID_SMEAR),
                self.gaussian(CENTROID_SMEAR),
            )
    }

    /// Generates one event.
    ///
    /// # Errors
    /// Propagates a refused pre-association edge from the event store.
    pub fn generate_event(&mut self, spec: &EventSpec) -> Result<SimEvent, EnvError> {
        let mut event = MemoryEvent::new();
        let mut truth = TruthRecord::default();

        let split_probability = spec.split_probability.clamp(0.0, 1.0);
        let loss_probability = spec.truth_loss_probability.clamp(0.0, 1.0);

        for _ in 0..spec.jets {
            let jet_phi = self.rng.gen_range(0.0..2.0 * PI);
            let jet_theta = self.rng.gen_range(-0.6f64..0.6).acos();

            let mut jet_tracks: Vec<(TrackId, ClusterId, f64)> = Vec::new();

            let charges = (0..spec.charged_per_jet)
                .map(|_| if self.rng.gen_bool(0.5) { 1 } else { -1 })
                .chain(std::iter::repeat(0).take(spec.neutral_per_jet))
                .collect::<Vec<i32>>();

            for charge in charges {
                let particle = ParticleId(self.next_particle);
                self.next_particle += 1;

                let phi = jet_phi + self.gaussian(spec.jet_spread);
                let theta = (jet_theta + self.gaussian(spec.jet_spread)).clamp(0.3, PI - 0.3);
                let p = self.rng.gen_range(2.0..20.0);

                let direction = Vector3::new(
                    theta.sin() * phi.cos(),
                    theta.sin() * phi.sin(),
                    theta.cos(),
                );
                let entry = Vector3::new(
                    CALORIMETER_RADIUS * phi.cos(),
                    CALORIMETER_RADIUS * phi.sin(),
                    CALORIMETER_RADIUS * theta.cos() / theta.sin(),
                );
                let state = TrackState::new(entry, direction * p, charge);

                let shower_point = |depth: f64| match Helix::from_state(&state, spec.b_field_tesla) {
                    Some(helix) => helix.position_at(depth),
                    None => entry + direction * depth,
                };

                let energy = (p * (1.0 + self.gaussian(ENERGY_RESOLUTION))).max(0.0);
                let split_fraction = if self.rng.gen_bool(split_probability) {
                    Some(self.rng.gen_range(0.1..0.4))
                } else {
                    None
                };

                let main_centroid = self.smear(shower_point(SHOWER_DEPTH));
                let main_cluster = ClusterId(self.next_cluster);
                self.next_cluster += 1;
                let main_energy = energy * (1.0 - split_fraction.unwrap_or(0.0));
                event
                    .add_cluster(main_cluster, main_energy, main_centroid)
                    .link_cluster_to_particle(main_cluster, particle);
                truth.cluster_particle.insert(main_cluster, particle);
                truth.main_cluster.insert(particle, main_cluster);

                if let Some(fraction) = split_fraction {
                    let fragment_centroid = self.smear(shower_point(SHOWER_DEPTH + FRAGMENT_DEPTH));
                    let fragment = ClusterId(self.next_cluster);
                    self.next_cluster += 1;
                    event
                        .add_cluster(fragment, energy * fraction, fragment_centroid)
                        .link_cluster_to_particle(fragment, particle);
                    truth.cluster_particle.insert(fragment, particle);
                }

                if charge != 0 {
                    let track = TrackId(self.next_track);
                    self.next_track += 1;
                    event.add_track(track, state);
                    truth.track_particle.insert(track, particle);
                    if !self.rng.gen_bool(loss_probability) {
                        event.link_track_to_particle(track, particle);
                    }
                    jet_tracks.push((track, main_cluster, main_energy));
                }
            }

            preassociate(&mut event, spec.preassociation, &jet_tracks)?;
        }

        Ok(SimEvent { event, truth })
    }
}

/// Seeds the relation of one jet.
fn preassociate(
    event: &mut MemoryEvent,
    mode: Preassociation,
    jet_tracks: &[(TrackId, ClusterId, f64)],
) -> Result<(), EnvError> {
    let mut edges: Vec<(TrackId, ClusterId)> = Vec::new();
    match mode {
        Preassociation::None => {}
        Preassociation::Truth => {
            edges.extend(jet_tracks.iter().map(|&(track, cluster, _)| (track, cluster)));
        }
        Preassociation::JetPileup => {
            let leading = jet_tracks
                .iter()
                .fold(None::<(ClusterId, f64)>, |best, &(_, cluster, energy)| match best {
                    Some((_, best_energy)) if best_energy >= energy => best,
                    _ => Some((cluster, energy)),
                });
            if let Some((cluster, _)) = leading {
                edges.extend(jet_tracks.iter().map(|&(track, _, _)| (track, cluster)));
            }
        }
    }

    for (track, cluster) in edges {
        event.add_association(track, cluster)?;
    }
    Ok(())
}
