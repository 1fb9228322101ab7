//! Estimate evaluation against ground truth.
//!
//! Only available for generated data, where the true path and landmark
//! positions are known.

use crate::solver::Estimate;
use crate::types::{Dataset, Position};
use serde::{Deserialize, Serialize};

/// Error statistics for one group of positions (poses or landmarks).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorStats {
    /// Number of compared positions
    pub count: usize,
    /// Sum of squared Euclidean errors (for RMSE calculation)
    pub error_sum_squared: f64,
    /// Largest Euclidean error observed
    pub max_error: f64,
}

impl ErrorStats {
    /// Compares two equally indexed position lists.
    pub fn from_pairs(estimated: &[Position], truth: &[Position]) -> Self {
        estimated
            .iter()
            .zip(truth)
            .fold(Self::default(), |mut stats, (est, gt)| {
                let error = est.distance_to(gt);
                stats.count += 1;
                stats.error_sum_squared += error * error;
                stats.max_error = stats.max_error.max(error);
                stats
            })
    }

    /// Root mean square error, 0 when nothing was compared.
    pub fn rmse(&self) -> f64 {
        if self.count > 0 {
            (self.error_sum_squared / self.count as f64).sqrt()
        } else {
            0.0
        }
    }
}

/// Pose and landmark errors of an estimate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstimateReport {
    pub poses: ErrorStats,
    pub landmarks: ErrorStats,
}

impl EstimateReport {
    pub fn new(estimate: &Estimate, dataset: &Dataset) -> Self {
        Self {
            poses: ErrorStats::from_pairs(&estimate.poses, &dataset.path),
            landmarks: ErrorStats::from_pairs(&estimate.landmarks, &dataset.landmarks),
        }
    }

    /// True if both RMSE values are at or below `threshold`.
    pub fn within(&self, threshold: f64) -> bool {
        self.poses.rmse() <= threshold && self.landmarks.rmse() <= threshold
    }
}

impl std::fmt::Display for EstimateReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "pose RMSE {:.3} (max {:.3}), landmark RMSE {:.3} (max {:.3})",
            self.poses.rmse(),
            self.poses.max_error,
            self.landmarks.rmse(),
            self.landmarks.max_error
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NoiseModel, SlamConfig};
    use crate::generator::generate_seeded;
    use crate::solver::solve;
    use approx::assert_relative_eq;

    #[test]
    fn test_error_stats() {
        let est = [Position::new(0.0, 0.0), Position::new(3.0, 4.0)];
        let truth = [Position::new(0.0, 0.0), Position::new(0.0, 0.0)];

        let stats = ErrorStats::from_pairs(&est, &truth);
        assert_eq!(stats.count, 2);
        assert_relative_eq!(stats.max_error, 5.0);
        assert_relative_eq!(stats.rmse(), (25.0f64 / 2.0).sqrt());
    }

    #[test]
    fn test_empty_stats() {
        let stats = ErrorStats::from_pairs(&[], &[]);
        assert_eq!(stats.rmse(), 0.0);
    }

    #[test]
    fn test_default_run_is_reasonably_accurate() {
        let config = SlamConfig::new(20, 5);
        let dataset = generate_seeded(&config, 2024).unwrap();
        let estimate = solve(&dataset.observations, &config).unwrap();

        let report = EstimateReport::new(&estimate, &dataset);
        assert_eq!(report.poses.count, 20);
        assert_eq!(report.landmarks.count, 5);
        // Noise scale is 2.0 per axis; errors stay within a few units
        assert!(report.within(15.0), "{}", report);
    }

    #[test]
    fn test_gaussian_run_is_reasonably_accurate() {
        let config = SlamConfig::new(20, 5)
            .with_noise(1.0, 1.0)
            .with_noise_model(NoiseModel::Gaussian);
        let dataset = generate_seeded(&config, 2024).unwrap();
        let estimate = solve(&dataset.observations, &config).unwrap();

        let uniform = generate_seeded(&config.clone().with_noise_model(NoiseModel::Uniform), 2024).unwrap();
        assert_ne!(dataset.path, uniform.path);

        let report = EstimateReport::new(&estimate, &dataset);
        assert_eq!(report.poses.count, 20);
        assert_eq!(report.landmarks.count, 5);
        assert!(report.within(15.0), "{}", report);
    }
}
