//! Estimation service - request handling and batch runs around the core.
//!
//! The service never shares solver state: each request builds its own seeded
//! RNG, dataset and solver, so runs can execute concurrently.

use graphslam_core::{
    generate, solve, Dataset, Estimate, EstimateReport, SlamConfig, SlamResult,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tokio::task;
use tracing::{debug, info, warn};

/// World size used for service requests.
pub const SERVICE_WORLD_SIZE: f64 = 100.0;

/// Sensing range used for service requests.
pub const SERVICE_MEASUREMENT_RANGE: f64 = 50.0;

/// Measurement and motion noise used for service requests.
pub const SERVICE_NOISE: f64 = 2.0;

/// A request to estimate a freshly simulated world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimationRequest {
    pub steps: usize,
    pub num_landmarks: usize,
}

/// Reply to an [`EstimationRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimationResponse {
    pub success: bool,
}

impl EstimationRequest {
    pub fn new(steps: usize, num_landmarks: usize) -> Self {
        Self {
            steps,
            num_landmarks,
        }
    }

    /// The fixed service configuration for this request's problem size.
    pub fn config(&self) -> SlamConfig {
        SlamConfig::new(self.steps, self.num_landmarks)
            .with_world_size(SERVICE_WORLD_SIZE)
            .with_measurement_range(SERVICE_MEASUREMENT_RANGE)
            .with_noise(SERVICE_NOISE, SERVICE_NOISE)
    }
}

/// Everything produced by one successful estimation.
#[derive(Debug, Clone)]
pub struct EstimationRun {
    pub seed: u64,
    pub config: SlamConfig,
    pub dataset: Dataset,
    pub estimate: Estimate,
    pub report: EstimateReport,
}

/// Generates a dataset from `seed` and solves it.
pub fn run_estimation(config: &SlamConfig, seed: u64) -> SlamResult<EstimationRun> {
    let rng = ChaCha8Rng::seed_from_u64(seed);
    let dataset = generate(config, rng)?;
    debug!(
        "seed={} generated {} observations in {} episode(s)",
        seed,
        dataset.observations.len(),
        dataset.episodes
    );

    let estimate = solve(&dataset.observations, config)?;
    let report = EstimateReport::new(&estimate, &dataset);

    Ok(EstimationRun {
        seed,
        config: config.clone(),
        dataset,
        estimate,
        report,
    })
}

/// Logs ground truth and estimate of a run, line by line.
pub fn log_results(run: &EstimationRun) {
    info!("True landmarks:");
    for landmark in &run.dataset.landmarks {
        info!("{}", landmark);
    }
    if let Some(last) = run.dataset.path.last() {
        info!("True final position: {}", last);
    }
    for line in run.estimate.summary().lines() {
        info!("{}", line);
    }
    info!("{}", run.report);
}

/// Handles one service request: generate, solve, log, report success.
pub fn handle_request(request: EstimationRequest, seed: u64) -> EstimationResponse {
    info!(
        "Request: steps={} landmarks={} (seed={})",
        request.steps, request.num_landmarks, seed
    );

    match run_estimation(&request.config(), seed) {
        Ok(run) => {
            log_results(&run);
            EstimationResponse { success: true }
        }
        Err(e) => {
            warn!("Estimation failed: {}", e);
            EstimationResponse { success: false }
        }
    }
}

/// Outcome of one run inside a batch.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Seed used
    pub seed: u64,

    /// Whether generation and solve both succeeded
    pub passed: bool,

    /// Episodes needed to cover every landmark
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episodes: Option<usize>,

    /// Errors against ground truth
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<EstimateReport>,

    /// Failure message if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl RunOutcome {
    fn from_result(seed: u64, result: SlamResult<EstimationRun>) -> Self {
        match result {
            Ok(run) => Self {
                seed,
                passed: true,
                episodes: Some(run.dataset.episodes),
                report: Some(run.report),
                failure_reason: None,
            },
            Err(e) => Self::failed(seed, e.to_string()),
        }
    }

    fn failed(seed: u64, reason: String) -> Self {
        Self {
            seed,
            passed: false,
            episodes: None,
            report: None,
            failure_reason: Some(reason),
        }
    }
}

/// Runs one estimation per seed on the blocking pool, concurrently.
///
/// Outcomes are returned in the order of `seeds`.
pub async fn run_batch(config: &SlamConfig, seeds: &[u64]) -> Vec<RunOutcome> {
    let handles: Vec<_> = seeds
        .iter()
        .map(|&seed| {
            let config = config.clone();
            (
                seed,
                task::spawn_blocking(move || RunOutcome::from_result(seed, run_estimation(&config, seed))),
            )
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (seed, handle) in handles {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => RunOutcome::failed(seed, format!("run aborted: {}", e)),
        };
        outcomes.push(outcome);
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_uses_service_defaults() {
        let config = EstimationRequest::new(30, 4).config();

        assert_eq!(config.steps, 30);
        assert_eq!(config.num_landmarks, 4);
        assert_eq!(config.world_size, 100.0);
        assert_eq!(config.measurement_range, 50.0);
        assert_eq!(config.measurement_noise, 2.0);
        assert_eq!(config.motion_noise, 2.0);
    }

    #[test]
    fn test_handle_request_success() {
        let response = handle_request(EstimationRequest::new(20, 5), 42);
        assert!(response.success);
    }

    #[test]
    fn test_handle_request_reports_invalid_config() {
        let response = handle_request(EstimationRequest::new(0, 5), 42);
        assert!(!response.success);
    }

    #[test]
    fn test_run_estimation_is_reproducible() {
        let config = EstimationRequest::new(15, 3).config();
        let a = run_estimation(&config, 9).unwrap();
        let b = run_estimation(&config, 9).unwrap();

        assert_eq!(a.dataset.observations, b.dataset.observations);
        assert_eq!(a.estimate.state_vector(), b.estimate.state_vector());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_run_batch_keeps_seed_order() {
        let config = EstimationRequest::new(15, 3).config();
        let seeds = [5, 1, 3, 2];

        let outcomes = run_batch(&config, &seeds).await;

        assert_eq!(outcomes.len(), 4);
        for (outcome, seed) in outcomes.iter().zip(seeds) {
            assert_eq!(outcome.seed, seed);
            assert!(outcome.passed, "{:?}", outcome.failure_reason);
            assert!(outcome.report.is_some());
        }

        // Same seed in a batch and alone gives the same result
        let alone = run_estimation(&config, 3).unwrap();
        assert_eq!(outcomes[2].report.as_ref(), Some(&alone.report));
    }

    #[tokio::test]
    async fn test_run_batch_reports_failures() {
        let config = SlamConfig::new(1, 3);
        let outcomes = run_batch(&config, &[1, 2]).await;

        assert!(outcomes.iter().all(|o| !o.passed));
        assert!(outcomes[0].failure_reason.as_deref().unwrap().contains("Invalid parameter"));
    }
}
