//! Estimation configuration and noise model.

use crate::error::{SlamError, SlamResult};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

/// Step length of the random walk unless configured otherwise.
pub const DEFAULT_MOTION_DISTANCE: f64 = 20.0;

/// Shape of the per-axis noise added to moves and measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseModel {
    /// Uniform in `[-scale, scale)`
    #[default]
    Uniform,

    /// Zero-mean normal with standard deviation `scale`
    Gaussian,
}

impl NoiseModel {
    /// Draws one noise sample scaled by `scale`.
    pub fn sample<R: Rng + ?Sized>(&self, scale: f64, rng: &mut R) -> f64 {
        match self {
            NoiseModel::Uniform => (rng.gen::<f64>() * 2.0 - 1.0) * scale,
            NoiseModel::Gaussian => {
                let z: f64 = StandardNormal.sample(rng);
                z * scale
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NoiseModel::Uniform => "uniform",
            NoiseModel::Gaussian => "gaussian",
        }
    }
}

impl std::fmt::Display for NoiseModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for NoiseModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uniform" => Ok(NoiseModel::Uniform),
            "gaussian" | "normal" => Ok(NoiseModel::Gaussian),
            _ => Err(format!("Unknown noise model: {}", s)),
        }
    }
}

/// Configuration for one estimation run (generation and solve).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlamConfig {
    /// Number of poses in the trajectory
    pub steps: usize,

    /// Side length of the square world `[0, world_size]²`
    pub world_size: f64,

    /// Number of landmarks to place and estimate
    pub num_landmarks: usize,

    /// Max |dx| and |dy| at which a landmark is sensed
    pub measurement_range: f64,

    /// Measurement noise scale; measurement constraints weigh `1 / measurement_noise`
    pub measurement_noise: f64,

    /// Motion noise scale; motion constraints weigh `1 / motion_noise`
    pub motion_noise: f64,

    /// Length of each commanded move in the random walk; `None` uses
    /// [`DEFAULT_MOTION_DISTANCE`] clamped to half the world size
    pub motion_distance: Option<f64>,

    /// Noise distribution used by the simulated agent
    pub noise_model: NoiseModel,

    /// Upper bound on coverage retries before giving up
    pub max_episodes: usize,
}

impl Default for SlamConfig {
    fn default() -> Self {
        Self {
            steps: 20,
            world_size: 100.0,
            num_landmarks: 5,
            measurement_range: 50.0,
            measurement_noise: 2.0,
            motion_noise: 2.0,
            motion_distance: None,
            noise_model: NoiseModel::Uniform,
            max_episodes: 10_000,
        }
    }
}

impl SlamConfig {
    /// Creates the default configuration for the given problem size.
    pub fn new(steps: usize, num_landmarks: usize) -> Self {
        Self {
            steps,
            num_landmarks,
            ..Default::default()
        }
    }

    pub fn with_world_size(mut self, world_size: f64) -> Self {
        self.world_size = world_size;
        self
    }

    pub fn with_measurement_range(mut self, range: f64) -> Self {
        self.measurement_range = range;
        self
    }

    pub fn with_noise(mut self, measurement_noise: f64, motion_noise: f64) -> Self {
        self.measurement_noise = measurement_noise;
        self.motion_noise = motion_noise;
        self
    }

    pub fn with_motion_distance(mut self, distance: f64) -> Self {
        self.motion_distance = Some(distance);
        self
    }

    pub fn with_noise_model(mut self, model: NoiseModel) -> Self {
        self.noise_model = model;
        self
    }

    pub fn with_max_episodes(mut self, max_episodes: usize) -> Self {
        self.max_episodes = max_episodes;
        self
    }

    /// Dimension of the information system, `2 * (steps + num_landmarks)`.
    pub fn state_dim(&self) -> usize {
        2 * (self.steps + self.num_landmarks)
    }

    /// Step length the generator actually uses.
    pub fn effective_motion_distance(&self) -> f64 {
        self.motion_distance
            .unwrap_or_else(|| DEFAULT_MOTION_DISTANCE.min(self.world_size / 2.0))
    }

    /// Checks the fields shared by generation and solving.
    pub fn validate(&self) -> SlamResult<()> {
        if self.steps == 0 {
            return Err(SlamError::invalid("steps must be at least 1"));
        }
        ensure_positive("world_size", self.world_size)?;
        ensure_positive("measurement_range", self.measurement_range)?;
        ensure_positive("measurement_noise", self.measurement_noise)?;
        ensure_positive("motion_noise", self.motion_noise)?;
        Ok(())
    }

    /// Checks everything [`validate`](Self::validate) does, plus the
    /// conditions under which the generator's retry loops terminate.
    pub fn validate_for_generation(&self) -> SlamResult<()> {
        self.validate()?;
        if let Some(distance) = self.motion_distance {
            ensure_positive("motion_distance", distance)?;
            // From the center no point of the world is further than half its diagonal
            if distance >= self.world_size / std::f64::consts::SQRT_2 {
                return Err(SlamError::invalid(format!(
                    "motion_distance {} cannot be walked from the center of a world of size {}",
                    distance, self.world_size
                )));
            }
        }
        if self.num_landmarks > 0 && self.steps < 2 {
            return Err(SlamError::invalid(
                "landmarks can only be observed with at least 2 steps",
            ));
        }
        if self.max_episodes == 0 {
            return Err(SlamError::invalid("max_episodes must be at least 1"));
        }
        Ok(())
    }
}

fn ensure_positive(name: &str, value: f64) -> SlamResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SlamError::invalid(format!("{} must be positive, got {}", name, value)))
    }
}
