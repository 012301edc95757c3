//! Configuration management for the tracking pipeline.
//!
//! All values are fixed at session start and immutable during a session.

use crate::{
    constants::{
        DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_EXPONENTIAL_ALPHA, DEFAULT_FRAME_REPORT_PERIOD,
        DEFAULT_INTER_PUPIL_DISTANCE, DEFAULT_MEDIAN_WINDOW, DEFAULT_MOVING_AVERAGE_WINDOW,
        DEFAULT_TRACKER_ITERATIONS, NUM_LANDMARKS,
    },
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Face model configuration
    pub face: FaceConfig,

    /// External tracker configuration
    pub tracker: TrackerConfig,

    /// Translation smoothing configuration
    pub filter: FilterConfig,

    /// Diagnostics configuration
    pub report: ReportConfig,
}

/// Face model parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceConfig {
    /// Distance between the subject's pupils in meters; 0.063 is the human
    /// average
    pub inter_pupil_distance: f32,

    /// Number of landmarks returned by the face tracker
    pub landmark_count: usize,
}

/// External tracker parameters, handed to the tracker at session start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Refinement iterations per tracking pass
    pub iterations: u32,

    /// Confidence below which the tracker requests a fitter reset
    pub confidence_threshold: f32,
}

/// Translation smoothing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Filter type: none, exponential, moving_average, median
    pub kind: String,

    /// Exponential filter alpha value
    pub exponential_alpha: f64,

    /// Moving average window size
    pub moving_average_window: usize,

    /// Median filter window size
    pub median_window: usize,
}

/// Diagnostics parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Fully-drained frames between throughput log lines
    pub frame_report_period: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            face: FaceConfig::default(),
            tracker: TrackerConfig::default(),
            filter: FilterConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            inter_pupil_distance: DEFAULT_INTER_PUPIL_DISTANCE,
            landmark_count: NUM_LANDMARKS,
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_TRACKER_ITERATIONS,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            kind: "exponential".to_string(),
            exponential_alpha: DEFAULT_EXPONENTIAL_ALPHA,
            moving_average_window: DEFAULT_MOVING_AVERAGE_WINDOW,
            median_window: DEFAULT_MEDIAN_WINDOW,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            frame_report_period: DEFAULT_FRAME_REPORT_PERIOD,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.face.inter_pupil_distance <= 0.0 {
            return Err(Error::ConfigError(
                "Inter-pupil distance must be positive".to_string(),
            ));
        }
        if self.face.landmark_count == 0 {
            return Err(Error::ConfigError(
                "Landmark count must be greater than 0".to_string(),
            ));
        }

        if self.tracker.iterations == 0 {
            return Err(Error::ConfigError(
                "Tracker iterations must be greater than 0".to_string(),
            ));
        }
        if self.tracker.confidence_threshold <= 0.0 {
            return Err(Error::ConfigError(
                "Confidence threshold must be positive".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.filter.exponential_alpha)
            || self.filter.exponential_alpha == 0.0
        {
            return Err(Error::ConfigError(
                "Exponential alpha must be in (0, 1]".to_string(),
            ));
        }
        if self.filter.moving_average_window == 0 {
            return Err(Error::ConfigError(
                "Moving average window size must be greater than 0".to_string(),
            ));
        }
        if self.filter.median_window == 0 || self.filter.median_window % 2 == 0 {
            return Err(Error::ConfigError(
                "Median window size must be odd and greater than 0".to_string(),
            ));
        }

        if self.report.frame_report_period == 0 {
            return Err(Error::ConfigError(
                "Frame report period must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
