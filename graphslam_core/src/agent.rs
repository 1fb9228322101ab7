//! Simulated agent - a point robot with noisy motion and range-limited sensing.

use crate::config::{NoiseModel, SlamConfig};
use crate::types::{Measurement, Position};
use rand::Rng;

/// A point agent moving inside the square world `[0, world_size]²`.
///
/// The agent owns no random source; every noisy operation borrows the
/// caller's RNG so that a seeded generator yields a reproducible walk.
#[derive(Debug, Clone)]
pub struct Agent {
    /// Current true position
    position: Position,

    /// Side length of the world
    world_size: f64,

    /// Scale of the per-axis motion noise
    motion_noise: f64,

    /// Scale of the per-axis measurement noise
    measurement_noise: f64,

    /// Max |dx| and |dy| at which a landmark is sensed
    measurement_range: f64,

    /// Distribution shape for both noise sources
    noise_model: NoiseModel,
}

impl Agent {
    /// Creates an agent at the center of the world.
    pub fn new(
        world_size: f64,
        measurement_range: f64,
        motion_noise: f64,
        measurement_noise: f64,
    ) -> Self {
        Self {
            position: Position::new(world_size / 2.0, world_size / 2.0),
            world_size,
            motion_noise,
            measurement_noise,
            measurement_range,
            noise_model: NoiseModel::Uniform,
        }
    }

    /// Creates an agent from an estimation config.
    pub fn from_config(config: &SlamConfig) -> Self {
        Self::new(
            config.world_size,
            config.measurement_range,
            config.motion_noise,
            config.measurement_noise,
        )
        .with_noise_model(config.noise_model)
    }

    pub fn with_noise_model(mut self, model: NoiseModel) -> Self {
        self.noise_model = model;
        self
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Puts the agent back at the world center, where every walk starts.
    pub fn reset_to_center(&mut self) {
        self.position = Position::new(self.world_size / 2.0, self.world_size / 2.0);
    }

    /// Attempts a noisy move by `(dx, dy)`.
    ///
    /// Returns `false` and leaves the position untouched if the noisy
    /// candidate would fall outside the world.
    pub fn try_move<R: Rng + ?Sized>(&mut self, dx: f64, dy: f64, rng: &mut R) -> bool {
        let candidate = Position::new(
            self.position.x + dx + self.noise_model.sample(self.motion_noise, rng),
            self.position.y + dy + self.noise_model.sample(self.motion_noise, rng),
        );

        if !candidate.is_inside(self.world_size) {
            return false;
        }

        self.position = candidate;
        true
    }

    /// Measures noisy offsets to every landmark within range, in id order.
    pub fn sense<R: Rng + ?Sized>(&self, landmarks: &[Position], rng: &mut R) -> Vec<Measurement> {
        let range = self.measurement_range;

        landmarks
            .iter()
            .enumerate()
            .filter_map(|(id, landmark)| {
                let dx = landmark.x - self.position.x
                    + self.noise_model.sample(self.measurement_noise, rng);
                let dy = landmark.y - self.position.y
                    + self.noise_model.sample(self.measurement_noise, rng);

                (dx.abs() <= range && dy.abs() <= range).then(|| Measurement::new(id, dx, dy))
            })
            .collect()
    }
}

impl std::fmt::Display for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Agent location: [x = {:.3}, y = {:.3}]",
            self.position.x, self.position.y
        )
    }
}
