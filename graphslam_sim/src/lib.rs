//! GraphSLAM simulation harness
//!
//! Thin outer layer around `graphslam_core`:
//! - **Service**: request → success handling with fixed world parameters,
//!   and concurrent batch runs over many seeds
//! - **Export**: JSON dump of ground truth and estimate for external plotting
//!
//! Every run owns its RNG, dataset and solver; nothing is shared between runs.

mod exporter;
pub mod service;

pub use exporter::EstimationExport;
pub use service::{
    handle_request, log_results, run_batch, run_estimation, EstimationRequest,
    EstimationResponse, EstimationRun, RunOutcome,
};
