//! GraphSLAM Core - batch 2D Graph SLAM with synthetic data generation
//!
//! This library estimates an agent's trajectory and a set of fixed landmark
//! positions from noisy relative measurements:
//! 1. **Generation**: a simulated [`Agent`] random-walks through a square
//!    world, sensing landmarks within range ([`generator`])
//! 2. **Accumulation**: every measurement and motion becomes a pairwise
//!    constraint in an information matrix Ω and vector ξ ([`information`])
//! 3. **Solve**: `Ω μ = ξ` is solved once; μ holds every pose and landmark
//!    ([`solver`])
//!
//! # Usage
//!
//! ```ignore
//! use graphslam_core::{generate_seeded, solve, SlamConfig};
//!
//! let config = SlamConfig::new(20, 5);
//! let dataset = generate_seeded(&config, 42)?;
//! let estimate = solve(&dataset.observations, &config)?;
//! println!("{}", estimate.summary());
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod generator;
pub mod information;
pub mod solver;
pub mod types;

// Re-export key types for convenience
pub use agent::Agent;
pub use config::{NoiseModel, SlamConfig};
pub use error::{SlamError, SlamResult};
pub use evaluation::{ErrorStats, EstimateReport};
pub use generator::{generate, generate_seeded, DataGenerator, Episode};
pub use information::InformationSystem;
pub use solver::{solve, Estimate, GraphSlamSolver};
pub use types::{Dataset, Measurement, MotionDelta, Observation, Position};
