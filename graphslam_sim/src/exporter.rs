//! JSON exporter for external plotting.
//!
//! Exports ground truth and estimate of one run; a plotting script draws the
//! path as arrows and landmarks as markers from this file.

use crate::service::EstimationRun;
use graphslam_core::{EstimateReport, Position, SlamConfig};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

/// Complete export of one estimation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimationExport {
    /// Seed used
    pub seed: u64,

    /// Configuration of the run
    pub config: SlamConfig,

    /// Episodes generated before every landmark was seen
    pub episodes: usize,

    /// True landmark positions
    pub true_landmarks: Vec<Position>,

    /// True agent path
    pub true_path: Vec<Position>,

    /// Estimated agent path
    pub poses: Vec<Position>,

    /// Estimated landmark positions
    pub landmarks: Vec<Position>,

    /// Errors against ground truth
    pub report: EstimateReport,
}

impl EstimationExport {
    /// Copies the read-only results out of a run.
    pub fn from_run(run: &EstimationRun) -> Self {
        Self {
            seed: run.seed,
            config: run.config.clone(),
            episodes: run.dataset.episodes,
            true_landmarks: run.dataset.landmarks.clone(),
            true_path: run.dataset.path.clone(),
            poses: run.estimate.poses.clone(),
            landmarks: run.estimate.landmarks.clone(),
            report: run.report.clone(),
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = self.to_json()?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
