//! Synthetic dataset generation.
//!
//! The generator places landmarks, then drives an [`Agent`] through a
//! random walk, recording what it senses and how it was commanded to move.
//! A walk that leaves some landmark unobserved is thrown away and redone from
//! the world center, so the solver never receives an unconstrained landmark.

use crate::agent::Agent;
use crate::config::SlamConfig;
use crate::error::{SlamError, SlamResult};
use crate::types::{Dataset, MotionDelta, Observation, Position};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f64::consts::TAU;
use tracing::debug;

/// Heading redraws allowed for a single step before the world is declared
/// too small for the configured motion noise.
const MAX_MOVE_ATTEMPTS: usize = 100_000;

/// One complete walk of `steps - 1` moves.
#[derive(Debug, Clone)]
pub struct Episode {
    /// Sensed measurements and applied delta per step
    pub observations: Vec<Observation>,

    /// True agent positions, `steps` entries
    pub path: Vec<Position>,

    /// `seen[id]` is true if landmark `id` appears in any measurement
    pub seen: Vec<bool>,
}

impl Episode {
    /// True when every landmark was measured at least once.
    pub fn covers_all_landmarks(&self) -> bool {
        self.seen.iter().all(|&s| s)
    }
}

/// Produces landmark-covering observation sequences.
///
/// The random source is owned by the generator; pass `&mut rng` to keep
/// using a caller-held RNG afterwards.
pub struct DataGenerator<R: Rng> {
    config: SlamConfig,
    agent: Agent,
    rng: R,
    landmarks: Vec<Position>,
}

impl<R: Rng> DataGenerator<R> {
    /// Creates a generator after validating the configuration.
    pub fn new(config: SlamConfig, rng: R) -> SlamResult<Self> {
        config.validate_for_generation()?;
        let agent = Agent::from_config(&config);

        Ok(Self {
            config,
            agent,
            rng,
            landmarks: Vec::new(),
        })
    }

    /// Ground truth landmark positions (empty until generated).
    pub fn landmarks(&self) -> &[Position] {
        &self.landmarks
    }

    /// Places `num_landmarks` landmarks at random integer coordinates.
    pub fn generate_landmarks(&mut self) {
        let world_size = self.config.world_size;
        let rng = &mut self.rng;

        self.landmarks = (0..self.config.num_landmarks)
            .map(|_| {
                Position::new(
                    (rng.gen::<f64>() * world_size).round(),
                    (rng.gen::<f64>() * world_size).round(),
                )
            })
            .collect();
    }

    /// Runs one walk from the world center.
    ///
    /// Landmarks must have been placed with
    /// [`generate_landmarks`](Self::generate_landmarks) first.
    pub fn generate_episode(&mut self) -> SlamResult<Episode> {
        if self.landmarks.len() != self.config.num_landmarks {
            return Err(SlamError::illegal_state(
                "generate_episode",
                "landmarks not generated",
            ));
        }

        let steps = self.config.steps;
        let mut observations = Vec::with_capacity(steps.saturating_sub(1));
        let mut path = Vec::with_capacity(steps);
        let mut seen = vec![false; self.landmarks.len()];

        self.agent.reset_to_center();
        path.push(self.agent.position());

        let mut motion = self.random_motion();

        for _ in 1..steps {
            let measurements = self.agent.sense(&self.landmarks, &mut self.rng);
            for m in &measurements {
                seen[m.landmark_id] = true;
            }

            let mut attempts = 1;
            while !self.agent.try_move(motion.dx, motion.dy, &mut self.rng) {
                if attempts >= MAX_MOVE_ATTEMPTS {
                    return Err(SlamError::invalid(format!(
                        "no legal move found after {} attempts; motion noise {} is too large for world size {}",
                        attempts, self.config.motion_noise, self.config.world_size
                    )));
                }
                motion = self.random_motion();
                attempts += 1;
            }

            path.push(self.agent.position());
            observations.push(Observation::new(measurements, motion));
        }

        Ok(Episode {
            observations,
            path,
            seen,
        })
    }

    /// Generates landmarks and repeats walks until one observes them all.
    pub fn make_data(mut self) -> SlamResult<Dataset> {
        self.generate_landmarks();

        for episode_idx in 1..=self.config.max_episodes {
            let episode = self.generate_episode()?;

            if episode.covers_all_landmarks() {
                debug!(
                    "Coverage reached after {} episode(s), final position {}",
                    episode_idx,
                    self.agent.position()
                );
                return Ok(Dataset {
                    observations: episode.observations,
                    landmarks: self.landmarks,
                    path: episode.path,
                    episodes: episode_idx,
                });
            }

            debug!(
                "Episode {} saw {}/{} landmarks, regenerating",
                episode_idx,
                episode.seen.iter().filter(|&&s| s).count(),
                self.landmarks.len()
            );
        }

        Err(SlamError::invalid(format!(
            "landmark coverage not reached after {} episodes; measurement_range {} is too small for world size {}",
            self.config.max_episodes, self.config.measurement_range, self.config.world_size
        )))
    }

    fn random_motion(&mut self) -> MotionDelta {
        let heading = self.rng.gen::<f64>() * TAU;
        MotionDelta::from_heading(heading, self.config.effective_motion_distance())
    }
}

impl DataGenerator<ChaCha8Rng> {
    /// Creates a generator with its own seeded RNG.
    pub fn from_seed(config: SlamConfig, seed: u64) -> SlamResult<Self> {
        Self::new(config, ChaCha8Rng::seed_from_u64(seed))
    }
}

/// Generates a landmark-covering dataset using the caller's random source.
pub fn generate<R: Rng>(config: &SlamConfig, rng: R) -> SlamResult<Dataset> {
    DataGenerator::new(config.clone(), rng)?.make_data()
}

/// Generates a dataset from a fixed seed; same seed, same dataset.
pub fn generate_seeded(config: &SlamConfig, seed: u64) -> SlamResult<Dataset> {
    DataGenerator::from_seed(config.clone(), seed)?.make_data()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn small_config() -> SlamConfig {
        SlamConfig::new(20, 5)
    }

    #[test]
    fn test_landmarks_are_integer_and_inside_world() {
        let mut gen = DataGenerator::from_seed(small_config(), 42).unwrap();
        gen.generate_landmarks();

        assert_eq!(gen.landmarks().len(), 5);
        for lm in gen.landmarks() {
            assert_eq!(lm.x, lm.x.round());
            assert_eq!(lm.y, lm.y.round());
            assert!(lm.is_inside(100.0));
        }
    }

    #[test]
    fn test_episode_shape() {
        let mut gen = DataGenerator::from_seed(small_config(), 42).unwrap();
        gen.generate_landmarks();
        let episode = gen.generate_episode().unwrap();

        assert_eq!(episode.observations.len(), 19);
        assert_eq!(episode.path.len(), 20);
        assert_eq!(episode.path[0], Position::new(50.0, 50.0));
        for pos in &episode.path {
            assert!(pos.is_inside(100.0));
        }
        for obs in &episode.observations {
            let len = (obs.motion.dx.powi(2) + obs.motion.dy.powi(2)).sqrt();
            assert!((len - 20.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_episode_requires_landmarks() {
        let mut gen = DataGenerator::from_seed(SlamConfig::new(10, 3), 1).unwrap();

        assert!(matches!(
            gen.generate_episode(),
            Err(SlamError::IllegalState { operation: "generate_episode", .. })
        ));

        gen.generate_landmarks();
        assert_eq!(gen.generate_episode().unwrap().seen.len(), 3);

        // Nothing to place, so an episode can run right away
        let mut empty = DataGenerator::from_seed(SlamConfig::new(10, 0), 1).unwrap();
        assert!(empty.generate_episode().is_ok());
    }

    #[test]
    fn test_small_world_uses_shorter_moves() {
        for world_size in [30.0, 10.0] {
            let config = SlamConfig::new(10, 3)
                .with_world_size(world_size)
                .with_measurement_range(world_size / 2.0)
                .with_noise(0.2, 0.2);
            let dataset = generate_seeded(&config, 1).unwrap();

            assert_eq!(dataset.path.len(), 10);
            assert_eq!(dataset.path[0], Position::new(world_size / 2.0, world_size / 2.0));
            for pos in &dataset.path {
                assert!(pos.is_inside(world_size));
            }
            for obs in &dataset.observations {
                let len = (obs.motion.dx.powi(2) + obs.motion.dy.powi(2)).sqrt();
                assert!((len - world_size / 2.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_small_world_with_default_config() {
        let dataset = generate_seeded(&SlamConfig::new(10, 3).with_world_size(30.0), 1).unwrap();

        assert_eq!(dataset.landmarks.len(), 3);
        for lm in &dataset.landmarks {
            assert!(lm.is_inside(30.0));
        }
    }

    #[test]
    fn test_make_data_covers_every_landmark() {
        let dataset = generate_seeded(&SlamConfig::new(20, 8), 7).unwrap();

        let mut seen = vec![false; 8];
        for obs in &dataset.observations {
            for m in &obs.measurements {
                seen[m.landmark_id] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
        assert!(dataset.episodes >= 1);
    }

    #[test]
    fn test_same_seed_same_dataset() {
        let config = small_config();
        let a = generate_seeded(&config, 1234).unwrap();
        let b = generate_seeded(&config, 1234).unwrap();

        assert_eq!(a.observations, b.observations);
        assert_eq!(a.landmarks, b.landmarks);
        assert_eq!(a.path, b.path);

        let c = generate_seeded(&config, 4321).unwrap();
        assert_ne!(a.landmarks, c.landmarks);
    }

    #[test]
    fn test_caller_supplied_rng() {
        let config = small_config();
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let a = generate(&config, &mut rng).unwrap();
        let b = generate_seeded(&config, 99).unwrap();

        assert_eq!(a.observations, b.observations);
    }

    #[test]
    fn test_no_landmarks_needs_single_episode() {
        let dataset = generate_seeded(&SlamConfig::new(10, 0), 5).unwrap();

        assert_eq!(dataset.episodes, 1);
        assert!(dataset.landmarks.is_empty());
        assert!(dataset.observations.iter().all(|o| o.measurements.is_empty()));
    }

    #[test]
    fn test_unreachable_coverage_is_invalid_parameter() {
        // Landmarks are almost never within 0.01 of the agent on both axes
        let config = SlamConfig::new(3, 4)
            .with_measurement_range(0.01)
            .with_max_episodes(20);

        let err = generate_seeded(&config, 1).unwrap_err();
        assert!(matches!(err, SlamError::InvalidParameter(_)));
    }

    #[test]
    fn test_invalid_config_rejected_before_generation() {
        let config = SlamConfig::new(1, 3);
        assert!(matches!(
            DataGenerator::from_seed(config, 0),
            Err(SlamError::InvalidParameter(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_generated_data_always_covers(seed in any::<u64>(), steps in 5usize..30, landmarks in 0usize..6) {
            let config = SlamConfig::new(steps, landmarks);
            let dataset = generate_seeded(&config, seed).unwrap();

            prop_assert_eq!(dataset.observations.len(), steps - 1);
            prop_assert_eq!(dataset.path.len(), steps);

            let mut seen = vec![false; landmarks];
            for obs in &dataset.observations {
                for m in &obs.measurements {
                    prop_assert!(m.landmark_id < landmarks);
                    prop_assert!(m.dx.abs() <= config.measurement_range);
                    prop_assert!(m.dy.abs() <= config.measurement_range);
                    seen[m.landmark_id] = true;
                }
            }
            prop_assert!(seen.iter().all(|&s| s));
        }
    }
}
