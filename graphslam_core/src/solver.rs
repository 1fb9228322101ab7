//! Batch Graph SLAM solver.
//!
//! Solving runs through a fixed sequence of states:
//!
//! ```text
//! Uninitialized ──initialize──► Initialized ──accumulate──► Accumulated ──solve──► Solved
//!                                                                        └───────► Failed
//! ```
//!
//! Each state owns exactly the data that exists at that point, so Ω/ξ can
//! not be touched after solving and μ can not be read before it.

use crate::config::SlamConfig;
use crate::error::{SlamError, SlamResult};
use crate::information::InformationSystem;
use crate::types::{Observation, Position};
use nalgebra::DVector;
use serde::Serialize;
use tracing::debug;

/// Smallest accepted ratio between the smallest and largest squared
/// Cholesky pivot. Below this Ω is treated as numerically singular.
const MIN_PIVOT_RATIO: f64 = 1e-11;

/// Solved poses and landmarks.
#[derive(Debug, Clone, Serialize)]
pub struct Estimate {
    /// Estimated agent position per time step
    pub poses: Vec<Position>,

    /// Estimated landmark position per landmark id
    pub landmarks: Vec<Position>,

    /// The full solved state vector μ
    #[serde(skip)]
    state: DVector<f64>,
}

impl Estimate {
    /// Read-only view of μ.
    pub fn state_vector(&self) -> &DVector<f64> {
        &self.state
    }

    /// Human-readable listing of poses and landmarks.
    pub fn summary(&self) -> String {
        let mut out = String::from("Estimated Poses:\n");
        for pose in &self.poses {
            out.push_str(&format!("{}\n", pose));
        }
        out.push_str("\nEstimated Landmarks:\n");
        for landmark in &self.landmarks {
            out.push_str(&format!("{}\n", landmark));
        }
        out
    }
}

enum SolverState {
    Uninitialized,
    Initialized(InformationSystem),
    Accumulated(InformationSystem),
    Solved(DVector<f64>),
    Failed(SlamError),
}

impl SolverState {
    fn name(&self) -> &'static str {
        match self {
            SolverState::Uninitialized => "uninitialized",
            SolverState::Initialized(_) => "initialized",
            SolverState::Accumulated(_) => "accumulated",
            SolverState::Solved(_) => "solved",
            SolverState::Failed(_) => "failed",
        }
    }
}

/// Graph SLAM solver for one dataset. Not reusable: build a new one per run.
pub struct GraphSlamSolver {
    config: SlamConfig,
    state: SolverState,
}

impl GraphSlamSolver {
    /// Creates a solver after validating the configuration.
    pub fn new(config: SlamConfig) -> SlamResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: SolverState::Uninitialized,
        })
    }

    /// Name of the current state, for diagnostics.
    pub fn state_name(&self) -> &'static str {
        self.state.name()
    }

    /// The error that moved the solver to `failed`, if any.
    pub fn failure(&self) -> Option<&SlamError> {
        match &self.state {
            SolverState::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Ω and ξ while they exist (initialized or accumulated).
    pub fn information(&self) -> Option<&InformationSystem> {
        match &self.state {
            SolverState::Initialized(system) | SolverState::Accumulated(system) => Some(system),
            _ => None,
        }
    }

    /// Allocates Ω and ξ and anchors the first pose at the world center.
    pub fn initialize(&mut self) -> SlamResult<()> {
        if !matches!(self.state, SolverState::Uninitialized) {
            return Err(SlamError::illegal_state("initialize", self.state.name()));
        }

        let system = InformationSystem::new(
            self.config.steps,
            self.config.num_landmarks,
            self.config.world_size,
        );
        debug!("Initialized information system of dimension {}", system.dim());

        self.state = SolverState::Initialized(system);
        Ok(())
    }

    /// Adds one measurement constraint per sensed landmark and one motion
    /// constraint per step, on both axes.
    ///
    /// Observations are checked before Ω is touched; on error the solver
    /// stays initialized.
    pub fn accumulate(&mut self, observations: &[Observation]) -> SlamResult<()> {
        let system = match &mut self.state {
            SolverState::Initialized(system) => system,
            other => return Err(SlamError::illegal_state("accumulate", other.name())),
        };

        check_observations(observations, &self.config)?;

        let measurement_weight = 1.0 / self.config.measurement_noise;
        let motion_weight = 1.0 / self.config.motion_noise;
        let mut measurement_count = 0;

        for (t, observation) in observations.iter().enumerate() {
            for axis in 0..2 {
                let i = system.pose_index(t, axis);
                let next = i + 2;

                for m in &observation.measurements {
                    let j = system.landmark_index(m.landmark_id, axis);
                    system.add_constraint(i, j, m.axis(axis), measurement_weight);
                }

                system.add_constraint(i, next, observation.motion.axis(axis), motion_weight);
            }
            measurement_count += observation.measurements.len();
        }

        debug!(
            "Accumulated {} motion and {} measurement constraints",
            observations.len(),
            measurement_count
        );

        if let SolverState::Initialized(system) =
            std::mem::replace(&mut self.state, SolverState::Uninitialized)
        {
            self.state = SolverState::Accumulated(system);
        }
        Ok(())
    }

    /// Solves `Ω μ = ξ`.
    ///
    /// A singular or ill-conditioned Ω moves the solver to `failed` and the
    /// error is returned; no state vector is produced in that case.
    pub fn solve(&mut self) -> SlamResult<()> {
        let system = match std::mem::replace(&mut self.state, SolverState::Uninitialized) {
            SolverState::Accumulated(system) => system,
            other => {
                let name = other.name();
                self.state = other;
                return Err(SlamError::illegal_state("solve", name));
            }
        };

        match solve_system(system) {
            Ok(mu) => {
                debug!("Solved state vector of dimension {}", mu.len());
                self.state = SolverState::Solved(mu);
                Ok(())
            }
            Err(err) => {
                debug!("Solve failed: {}", err);
                self.state = SolverState::Failed(err.clone());
                Err(err)
            }
        }
    }

    /// μ after a successful solve.
    pub fn state_vector(&self) -> SlamResult<&DVector<f64>> {
        match &self.state {
            SolverState::Solved(mu) => Ok(mu),
            other => Err(SlamError::illegal_state("read state vector", other.name())),
        }
    }

    /// Splits μ into per-step poses and per-id landmarks.
    pub fn extract_results(&self) -> SlamResult<Estimate> {
        let mu = match &self.state {
            SolverState::Solved(mu) => mu,
            other => return Err(SlamError::illegal_state("extract results", other.name())),
        };

        let steps = self.config.steps;
        let poses = (0..steps)
            .map(|t| Position::new(mu[2 * t], mu[2 * t + 1]))
            .collect();
        let landmarks = (0..self.config.num_landmarks)
            .map(|l| Position::new(mu[2 * (steps + l)], mu[2 * (steps + l) + 1]))
            .collect();

        Ok(Estimate {
            poses,
            landmarks,
            state: mu.clone(),
        })
    }
}

/// Runs a complete batch estimate over `observations`.
///
/// Every call owns a fresh Ω, ξ and μ; concurrent calls share nothing.
pub fn solve(observations: &[Observation], config: &SlamConfig) -> SlamResult<Estimate> {
    let mut solver = GraphSlamSolver::new(config.clone())?;
    solver.initialize()?;
    solver.accumulate(observations)?;
    solver.solve()?;
    solver.extract_results()
}

fn check_observations(observations: &[Observation], config: &SlamConfig) -> SlamResult<()> {
    if observations.len() >= config.steps {
        return Err(SlamError::invalid(format!(
            "{} observations do not fit {} steps (at most {})",
            observations.len(),
            config.steps,
            config.steps - 1
        )));
    }

    for (t, observation) in observations.iter().enumerate() {
        if !(observation.motion.dx.is_finite() && observation.motion.dy.is_finite()) {
            return Err(SlamError::invalid(format!("non-finite motion at step {}", t)));
        }
        for m in &observation.measurements {
            if m.landmark_id >= config.num_landmarks {
                return Err(SlamError::invalid(format!(
                    "landmark id {} at step {} is outside [0, {})",
                    m.landmark_id, t, config.num_landmarks
                )));
            }
            if !(m.dx.is_finite() && m.dy.is_finite()) {
                return Err(SlamError::invalid(format!(
                    "non-finite measurement of landmark {} at step {}",
                    m.landmark_id, t
                )));
            }
        }
    }
    Ok(())
}

fn solve_system(system: InformationSystem) -> SlamResult<DVector<f64>> {
    let steps = system.steps();
    let unconstrained = system.unconstrained_indices();
    if !unconstrained.is_empty() {
        return Err(SlamError::solver(format!(
            "information matrix is singular, unconstrained: {}",
            describe_indices(&unconstrained, steps)
        )));
    }

    let (omega, xi) = system.into_parts();

    // Ω is symmetric positive definite exactly when every variable is tied,
    // through some chain of constraints, to the anchored first pose.
    let chol = omega.cholesky().ok_or_else(|| {
        SlamError::solver("information matrix is not positive definite")
    })?;

    let pivots = chol.l_dirty().diagonal();
    let max_pivot = pivots.max();
    let min_pivot = pivots.min();
    if !(min_pivot * min_pivot >= MIN_PIVOT_RATIO * max_pivot * max_pivot) {
        return Err(SlamError::solver(format!(
            "information matrix is ill-conditioned (pivot range {:e}..{:e})",
            min_pivot, max_pivot
        )));
    }

    let mu = chol.solve(&xi);
    if mu.iter().any(|v| !v.is_finite()) {
        return Err(SlamError::solver("solution contains non-finite values"));
    }
    Ok(mu)
}

fn describe_indices(indices: &[usize], steps: usize) -> String {
    let mut names: Vec<String> = indices
        .iter()
        .map(|&i| {
            if i < 2 * steps {
                format!("pose {}", i / 2)
            } else {
                format!("landmark {}", (i - 2 * steps) / 2)
            }
        })
        .collect();
    names.dedup();
    names.join(", ")
}
