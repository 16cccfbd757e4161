//! The "GEOMETRY" Engine - Helix Propagation in a Solenoidal Field
//!
//! A charged track in a uniform field along z follows a helix; a neutral
//! track (or any track when the field is off) follows a straight line.
//! The Force-Split Resolver uses `distance_to_point` as its compatibility
//! metric between a track and a cluster centroid.
//!
//! Units: mm, GeV/c, Tesla.

use calomatch_env::TrackState;
use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Converts GeV/c and Tesla into a radius of curvature in mm.
pub const FIELD_CONSTANT: f64 = 2.99792458e-4;

/// Transverse momentum below which a track is treated as a straight line (GeV/c)
const MIN_TRANSVERSE_MOMENTUM: f64 = 1e-9;

/// Largest turning angle a helix is followed past its reference state (rad)
const MAX_TURNING_ANGLE: f64 = PI;

// ============================================================================
// DISTANCE
// ============================================================================

/// Closest-approach distance between a trajectory and a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HelixDistance {
    /// Distance in the plane transverse to the field (mm)
    pub transverse: f64,

    /// Distance along the field axis at the chosen turn (mm)
    pub longitudinal: f64,

    /// Combined 3D distance (mm)
    pub total: f64,
}

impl HelixDistance {
    fn new(transverse: f64, longitudinal: f64) -> Self {
        Self {
            transverse,
            longitudinal,
            total: transverse.hypot(longitudinal),
        }
    }
}

// ============================================================================
// HELIX
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Shape {
    /// Charged track in a field
    Circular {
        centre: Vector2<f64>,
        radius: f64,
        /// Azimuth of the reference point seen from the centre
        phi0: f64,
        /// pz / pT
        tan_lambda: f64,
        /// pT / |p|
        cos_lambda: f64,
        /// +1 for clockwise rotation (positive charge, field along +z)
        sense: f64,
    },
    /// Neutral track, zero field, or negligible transverse momentum
    Straight { direction: Vector3<f64> },
}

/// Trajectory model of one track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Helix {
    reference: Vector3<f64>,
    shape: Shape,
}

impl Helix {
    /// Builds the trajectory through a track state.
    ///
    /// Returns `None` when the momentum is zero or not finite, since no
    /// direction can be derived.
    pub fn from_state(state: &TrackState, b_field_tesla: f64) -> Option<Self> {
        let p = state.momentum.norm();
        if !(p.is_finite() && p > 0.0) || !state.position.iter().all(|v| v.is_finite()) {
            return None;
        }

        let pt = state.transverse_momentum();
        let curved = state.charge != 0
            && b_field_tesla.is_finite()
            && b_field_tesla.abs() > 0.0
            && pt > MIN_TRANSVERSE_MOMENTUM;

        if !curved {
            return Some(Self {
                reference: state.position,
                shape: Shape::Straight {
                    direction: state.momentum / p,
                },
            });
        }

        let radius = pt / (FIELD_CONSTANT * b_field_tesla.abs());

        // Positive charge in +Bz bends clockwise; flipping either sign flips the sense.
        let sense = (state.charge.signum() as f64) * b_field_tesla.signum();

        // The force q v x B points towards the centre.
        let towards_centre = Vector2::new(state.momentum.y, -state.momentum.x) / pt * sense;
        let centre = state.position.xy() + towards_centre * radius;
        let offset = state.position.xy() - centre;

        Some(Self {
            reference: state.position,
            shape: Shape::Circular {
                centre,
                radius,
                phi0: offset.y.atan2(offset.x),
                tan_lambda: state.momentum.z / pt,
                cos_lambda: pt / p,
                sense,
            },
        })
    }

    /// Reference point the helix was built through.
    pub fn reference_point(&self) -> Vector3<f64> {
        self.reference
    }

    /// Radius of curvature in mm, or `None` for a straight line.
    pub fn radius(&self) -> Option<f64> {
        match self.shape {
            Shape::Circular { radius, .. } => Some(radius),
            Shape::Straight { .. } => None,
        }
    }

    /// Position after travelling `path_length` mm along the trajectory.
    ///
    /// Negative lengths extrapolate backwards.
    pub fn position_at(&self, path_length: f64) -> Vector3<f64> {
        match self.shape {
            Shape::Straight { direction } => self.reference + direction * path_length,
            Shape::Circular {
                centre,
                radius,
                phi0,
                tan_lambda,
                cos_lambda,
                sense,
            } => {
                let arc = path_length * cos_lambda;
                let phi = phi0 - sense * arc / radius;
                Vector3::new(
                    centre.x + radius * phi.cos(),
                    centre.y + radius * phi.sin(),
                    self.reference.z + arc * tan_lambda,
                )
            }
        }
    }

    /// Closest-approach distance from the trajectory to `point`.
    ///
    /// Only the forward part of the trajectory counts: a straight line from
    /// the reference point onwards, a helix for at most half a turn. A point
    /// whose nearest azimuth falls outside that window is measured against
    /// the angularly closer end of the window.
    pub fn distance_to_point(&self, point: &Vector3<f64>) -> HelixDistance {
        match self.shape {
            Shape::Straight { direction } => {
                let offset = point - self.reference;
                let along = offset.dot(&direction).max(0.0);
                let perpendicular = offset - direction * along;
                HelixDistance::new(perpendicular.xy().norm(), perpendicular.z.abs())
            }
            Shape::Circular {
                centre,
                radius,
                phi0,
                tan_lambda,
                sense,
                ..
            } => {
                let offset = point.xy() - centre;
                let phi_point = offset.y.atan2(offset.x);

                // Forward turning angle from the reference point to the point's azimuth
                let delta = (sense * (phi0 - phi_point)).rem_euclid(2.0 * PI);
                let turning = if delta <= MAX_TURNING_ANGLE {
                    delta
                } else if 2.0 * PI - delta <= delta - MAX_TURNING_ANGLE {
                    0.0
                } else {
                    MAX_TURNING_ANGLE
                };

                let phi = phi0 - sense * turning;
                let nearest = Vector3::new(
                    centre.x + radius * phi.cos(),
                    centre.y + radius * phi.sin(),
                    self.reference.z + radius * turning * tan_lambda,
                );

                HelixDistance::new(
                    (point.xy() - nearest.xy()).norm(),
                    (point.z - nearest.z).abs(),
                )
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
