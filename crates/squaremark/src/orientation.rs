//! Nearest-neighbour orientation estimation.
//!
//! Each marker is oriented toward its nearest neighbour. The neighbour search
//! runs on positions scaled by `(1 / weights.x, 1 / weights.y)` so a grid with
//! unequal row and column pitch still picks the intended grid neighbour; the
//! reported angle is always measured in the unscaled frame.

use nalgebra::{DMatrix, Point2};

use crate::{Marker, Point};

const MIN_MARKERS: usize = 2;

/// Errors raised by orientation estimation.
#[derive(Debug, Clone, PartialEq)]
pub enum OrientationError {
    /// Nearest neighbour is undefined for fewer than two markers.
    TooFewMarkers { needed: usize, got: usize },
    /// Weights must be finite and strictly positive.
    InvalidWeights { x: f64, y: f64 },
}

impl std::fmt::Display for OrientationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewMarkers { needed, got } => write!(
                f,
                "too few markers: need at least {}, got {}",
                needed, got
            ),
            Self::InvalidWeights { x, y } => write!(
                f,
                "anisotropic weights must be finite and > 0, got ({}, {})",
                x, y
            ),
        }
    }
}

impl std::error::Error for OrientationError {}

/// Anisotropic weighting of the neighbour search.
///
/// A larger weight on an axis shrinks distances along it, so neighbours
/// along that axis are preferred.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OrientationWeights {
    pub x: f64,
    pub y: f64,
}

impl Default for OrientationWeights {
    fn default() -> Self {
        Self { x: 1.0, y: 1.0 }
    }
}

impl OrientationWeights {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn validate(&self) -> Result<(), OrientationError> {
        let ok = |w: f64| w.is_finite() && w > 0.0;
        if ok(self.x) && ok(self.y) {
            Ok(())
        } else {
            Err(OrientationError::InvalidWeights {
                x: self.x,
                y: self.y,
            })
        }
    }
}

fn weighted_distance_matrix(positions: &[Point], weights: &OrientationWeights) -> DMatrix<f64> {
    let scaled: Vec<Point2<f64>> = positions
        .iter()
        .map(|p| Point2::new(p.x / weights.x, p.y / weights.y))
        .collect();
    let n = scaled.len();
    let mut d = DMatrix::from_fn(n, n, |i, j| nalgebra::distance(&scaled[i], &scaled[j]));
    d.fill_diagonal(f64::INFINITY);
    d
}

/// Index of each marker's nearest neighbour under `weights`.
///
/// Exact ties resolve to the lowest index.
pub fn nearest_neighbors(
    positions: &[Point],
    weights: &OrientationWeights,
) -> Result<Vec<usize>, OrientationError> {
    if positions.len() < MIN_MARKERS {
        return Err(OrientationError::TooFewMarkers {
            needed: MIN_MARKERS,
            got: positions.len(),
        });
    }
    weights.validate()?;

    let d = weighted_distance_matrix(positions, weights);
    let nn = d
        .row_iter()
        .map(|row| {
            let mut best = 0usize;
            let mut best_d = f64::INFINITY;
            for (j, &v) in row.iter().enumerate() {
                if v < best_d {
                    best = j;
                    best_d = v;
                }
            }
            best
        })
        .collect();
    Ok(nn)
}

/// One orientation per marker, in input order: the direction from each marker
/// toward its nearest neighbour, in radians within (-pi, pi].
pub fn estimate_orientations(
    markers: &[Marker],
    weights: &OrientationWeights,
) -> Result<Vec<f64>, OrientationError> {
    let positions: Vec<Point> = markers.iter().map(|m| m.position).collect();
    let nn = nearest_neighbors(&positions, weights)?;
    let angles = positions
        .iter()
        .zip(&nn)
        .map(|(p, &j)| {
            let q = positions[j];
            (q.y - p.y).atan2(q.x - p.x)
        })
        .collect::<Vec<_>>();
    tracing::debug!(
        "estimated {} orientations (weights x={}, y={})",
        angles.len(),
        weights.x,
        weights.y
    );
    Ok(angles)
}

/// Estimate orientations and write them into `markers`. Position and radius
/// are left untouched; on error nothing is modified.
pub fn assign_orientations(
    markers: &mut [Marker],
    weights: &OrientationWeights,
) -> Result<(), OrientationError> {
    let angles = estimate_orientations(markers, weights)?;
    for (m, a) in markers.iter_mut().zip(angles) {
        m.set_orientation(a);
    }
    tracing::info!("assigned orientations to {} markers", markers.len());
    Ok(())
}
