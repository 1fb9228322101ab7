//! Data model shared by the agent, the generator and the solver.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// A point in the 2D world, used for both poses and landmarks.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Coordinate along axis `0` (x) or `1` (y).
    pub fn axis(&self, axis: usize) -> f64 {
        if axis == 0 {
            self.x
        } else {
            self.y
        }
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    /// Euclidean distance to another position.
    pub fn distance_to(&self, other: &Position) -> f64 {
        (self.to_vector() - other.to_vector()).norm()
    }

    /// True when both coordinates lie within `[0, world_size]`.
    pub fn is_inside(&self, world_size: f64) -> bool {
        (0.0..=world_size).contains(&self.x) && (0.0..=world_size).contains(&self.y)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:.3}, {:.3}]", self.x, self.y)
    }
}

/// A noisy offset from the agent to a landmark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Landmark id in `[0, num_landmarks)`
    pub landmark_id: usize,
    pub dx: f64,
    pub dy: f64,
}

impl Measurement {
    pub fn new(landmark_id: usize, dx: f64, dy: f64) -> Self {
        Self { landmark_id, dx, dy }
    }

    /// Offset along axis `0` (x) or `1` (y).
    pub fn axis(&self, axis: usize) -> f64 {
        if axis == 0 {
            self.dx
        } else {
            self.dy
        }
    }
}

/// Intended displacement commanded to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionDelta {
    pub dx: f64,
    pub dy: f64,
}

impl MotionDelta {
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// Builds a delta of length `distance` along `heading` (radians).
    pub fn from_heading(heading: f64, distance: f64) -> Self {
        Self {
            dx: heading.cos() * distance,
            dy: heading.sin() * distance,
        }
    }

    /// Component along axis `0` (x) or `1` (y).
    pub fn axis(&self, axis: usize) -> f64 {
        if axis == 0 {
            self.dx
        } else {
            self.dy
        }
    }
}

/// Everything recorded at one time step: what was sensed, then how the agent moved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub measurements: Vec<Measurement>,
    pub motion: MotionDelta,
}

impl Observation {
    pub fn new(measurements: Vec<Measurement>, motion: MotionDelta) -> Self {
        Self { measurements, motion }
    }
}

/// A generated observation sequence together with the ground truth behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    /// Solver input, `steps - 1` entries
    pub observations: Vec<Observation>,

    /// True landmark positions, indexed by landmark id
    pub landmarks: Vec<Position>,

    /// True agent positions, `steps` entries starting at the world center
    pub path: Vec<Position>,

    /// Number of episodes generated before every landmark was seen
    pub episodes: usize,
}
