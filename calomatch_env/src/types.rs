//! Common types for the calomatch event abstraction.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Stable identifier of a reconstructed track.
///
/// Assigned by the event owner and used for every ordering decision, so
/// association output never depends on memory layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackId(pub u64);

/// Stable identifier of a reconstructed cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClusterId(pub u64);

/// Stable identifier of a truth (Monte Carlo) particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticleId(pub u64);

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T{}", self.0)
    }
}

impl std::fmt::Display for ClusterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "C{}", self.0)
    }
}

impl std::fmt::Display for ParticleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Track state at the calorimeter entry point.
///
/// Units: position in mm, momentum in GeV/c. The field axis is z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackState {
    /// Reference point on the trajectory
    pub position: Vector3<f64>,

    /// Momentum at the reference point
    pub momentum: Vector3<f64>,

    /// Charge in units of e (sign selects the bending direction)
    pub charge: i32,
}

impl TrackState {
    /// Creates a new track state.
    pub fn new(position: Vector3<f64>, momentum: Vector3<f64>, charge: i32) -> Self {
        Self {
            position,
            momentum,
            charge,
        }
    }

    /// Transverse momentum (GeV/c).
    pub fn transverse_momentum(&self) -> f64 {
        self.momentum.x.hypot(self.momentum.y)
    }
}

/// One edge of the track-cluster association relation.
///
/// Ordering is by track first, then cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Association {
    pub track: TrackId,
    pub cluster: ClusterId,
}

impl Association {
    pub fn new(track: TrackId, cluster: ClusterId) -> Self {
        Self { track, cluster }
    }
}

impl std::fmt::Display for Association {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.track, self.cluster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_association_orders_by_track_then_cluster() {
        let a = Association::new(TrackId(1), ClusterId(9));
        let b = Association::new(TrackId(2), ClusterId(0));
        let c = Association::new(TrackId(2), ClusterId(3));

        let mut edges = vec![c, a, b];
        edges.sort();
        assert_eq!(edges, vec![a, b, c]);
    }

    #[test]
    fn test_display_prefixes() {
        assert_eq!(TrackId(4).to_string(), "T4");
        assert_eq!(ClusterId(7).to_string(), "C7");
        assert_eq!(ParticleId(2).to_string(), "P2");
        assert_eq!(
            Association::new(TrackId(1), ClusterId(2)).to_string(),
            "T1 -> C2"
        );
    }

    #[test]
    fn test_transverse_momentum() {
        let state = TrackState::new(Vector3::zeros(), Vector3::new(3.0, 4.0, 10.0), 1);
        assert!((state.transverse_momentum() - 5.0).abs() < 1e-12);
    }
}
