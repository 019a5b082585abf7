//! Segment results written by the processing server.
//!
//! Read by presentation code only. Classification and status never look at
//! file contents; only the presence of `_results.json` matters to them.

use serde::{Deserialize, Serialize};

/// Processing stage outcome as reported per fitting pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStatus {
    #[default]
    NotStarted,
    InProgress,
    Finished,
    Error,
}

/// Contents of `trials/<trial>/segment_<n>/_results.json`.
///
/// Field names follow the server's JSON (including its `dynanimcs` spelling).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentResults {
    #[serde(rename = "trialName")]
    pub trial_name: String,
    pub start_frame: u64,
    pub start: f64,
    pub end_frame: u64,
    pub end: f64,

    #[serde(rename = "kinematicsStatus")]
    pub kinematics_status: ProcessingStatus,
    #[serde(rename = "kinematicsAvgRMSE")]
    pub kinematics_avg_rmse: Option<f64>,
    #[serde(rename = "kinematicsAvgMax")]
    pub kinematics_avg_max: Option<f64>,
    #[serde(rename = "kinematicsPerMarkerRMSE")]
    pub kinematics_per_marker_rmse: Option<Vec<(String, f64)>>,

    #[serde(rename = "dynamicsStatus")]
    pub dynamics_status: ProcessingStatus,
    #[serde(rename = "dynanimcsAvgRMSE")]
    pub dynamics_avg_rmse: Option<f64>,
    #[serde(rename = "dynanimcsAvgMax")]
    pub dynamics_avg_max: Option<f64>,
    #[serde(rename = "dynanimcsPerMarkerRMSE")]
    pub dynamics_per_marker_rmse: Option<Vec<(String, f64)>>,

    #[serde(rename = "linearResiduals")]
    pub linear_residuals: Option<f64>,
    #[serde(rename = "angularResiduals")]
    pub angular_residuals: Option<f64>,
    #[serde(rename = "totalTimestepsWithGRF")]
    pub total_timesteps_with_grf: Option<u64>,
    #[serde(rename = "totalTimestepsMissingGRF")]
    pub total_timesteps_missing_grf: Option<u64>,

    #[serde(rename = "goldAvgRMSE")]
    pub gold_avg_rmse: Option<f64>,
    #[serde(rename = "goldAvgMax")]
    pub gold_avg_max: Option<f64>,
    #[serde(rename = "goldPerMarkerRMSE")]
    pub gold_per_marker_rmse: Option<Vec<(String, f64)>>,

    #[serde(rename = "hasMarkers")]
    pub has_markers: bool,
    #[serde(rename = "hasForces")]
    pub has_forces: bool,
    #[serde(rename = "hasError")]
    pub has_error: bool,
    #[serde(rename = "errorMsg")]
    pub error_msg: Option<String>,
    #[serde(rename = "hasMarkerWarnings")]
    pub has_marker_warnings: bool,
}

impl SegmentResults {
    pub fn parse(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Frames covered by the segment.
    pub fn frame_count(&self) -> u64 {
        self.end_frame.saturating_sub(self.start_frame)
    }

    pub fn duration_secs(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// Fraction of timesteps with ground reaction force data, if reported.
    pub fn grf_coverage(&self) -> Option<f64> {
        let with = self.total_timesteps_with_grf?;
        let missing = self.total_timesteps_missing_grf.unwrap_or(0);
        let total = with + missing;
        (total > 0).then(|| with as f64 / total as f64)
    }

    /// Marker with the largest kinematic RMSE.
    pub fn worst_marker(&self) -> Option<(&str, f64)> {
        self.kinematics_per_marker_rmse
            .as_ref()?
            .iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(name, rmse)| (name.as_str(), *rmse))
    }
}
