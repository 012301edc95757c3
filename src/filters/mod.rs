//! Smoothing filters for the fitted head position.
//!
//! Each filter smooths one scalar axis. A [`TranslationSmoother`] bundles
//! three independent filters, one per translation axis, so a jittery fit
//! does not shake the overlay anchored to the face.

/// Exponential filter for responsive smoothing
pub mod exponential;

/// Median filter for outlier rejection
pub mod median;

/// Moving average filter for simple smoothing
pub mod moving_average;

use crate::{
    config::FilterConfig,
    constants::{DEFAULT_EXPONENTIAL_ALPHA, DEFAULT_MEDIAN_WINDOW, DEFAULT_MOVING_AVERAGE_WINDOW},
    Result,
};
use nalgebra::Vector3;

/// Trait for per-axis position filters
pub trait PositionFilter: Send {
    /// Feed a new sample and return the smoothed value
    fn update(&mut self, value: f64) -> f64;

    /// Reset filter state
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes through values unchanged
pub struct NoFilter;

impl PositionFilter for NoFilter {
    fn update(&mut self, value: f64) -> f64 {
        value
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "NoFilter"
    }
}

/// Create a position filter by type name
pub fn create_filter(filter_type: &str) -> Result<Box<dyn PositionFilter>> {
    match filter_type.to_lowercase().as_str() {
        "none" | "nofilter" => Ok(Box::new(NoFilter)),
        "exponential" => Ok(Box::new(exponential::ExponentialFilter::new(
            DEFAULT_EXPONENTIAL_ALPHA,
        ))),
        "moving_average" | "movingaverage" => Ok(Box::new(
            moving_average::MovingAverageFilter::new(DEFAULT_MOVING_AVERAGE_WINDOW),
        )),
        "median" => Ok(Box::new(median::MedianFilter::new(DEFAULT_MEDIAN_WINDOW))),
        _ => Err(crate::Error::FilterError(format!(
            "Unknown filter type: {filter_type}"
        ))),
    }
}

/// One independent filter per translation axis
pub struct TranslationSmoother {
    x: Box<dyn PositionFilter>,
    y: Box<dyn PositionFilter>,
    z: Box<dyn PositionFilter>,
}

impl TranslationSmoother {
    /// Build a smoother with three filters of the named type
    pub fn new(filter_type: &str) -> Result<Self> {
        Ok(Self {
            x: create_filter(filter_type)?,
            y: create_filter(filter_type)?,
            z: create_filter(filter_type)?,
        })
    }

    /// Build a smoother from the filter section of the configuration
    pub fn from_config(config: &FilterConfig) -> Result<Self> {
        let make = || -> Result<Box<dyn PositionFilter>> {
            match config.kind.to_lowercase().as_str() {
                "none" | "nofilter" => Ok(Box::new(NoFilter)),
                "exponential" => Ok(Box::new(exponential::ExponentialFilter::new(
                    config.exponential_alpha,
                ))),
                "moving_average" | "movingaverage" => Ok(Box::new(
                    moving_average::MovingAverageFilter::new(config.moving_average_window),
                )),
                "median" => Ok(Box::new(median::MedianFilter::new(config.median_window))),
                other => Err(crate::Error::FilterError(format!(
                    "Unknown filter type: {other}"
                ))),
            }
        };
        Ok(Self {
            x: make()?,
            y: make()?,
            z: make()?,
        })
    }

    /// Smooth a fitted translation, one axis at a time
    pub fn update(&mut self, translation: &Vector3<f32>) -> Vector3<f32> {
        Vector3::new(
            self.x.update(f64::from(translation.x)) as f32,
            self.y.update(f64::from(translation.y)) as f32,
            self.z.update(f64::from(translation.z)) as f32,
        )
    }

    /// Reset all three axis filters
    pub fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
        self.z.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_filter() {
        let mut filter = NoFilter;
        assert_eq!(filter.update(10.0), 10.0);
        assert_eq!(filter.update(-3.5), -3.5);
    }

    #[test]
    fn test_create_filter() {
        assert!(create_filter("none").is_ok());
        assert!(create_filter("exponential").is_ok());
        assert!(create_filter("moving_average").is_ok());
        assert!(create_filter("median").is_ok());
        assert!(create_filter("unknown").is_err());
    }

    #[test]
    fn test_translation_smoother_axes_independent() {
        let mut smoother = TranslationSmoother::new("exponential").unwrap();
        // First sample passes through
        let first = smoother.update(&Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(first, Vector3::new(1.0, 2.0, 3.0));
        // Second sample is smoothed per axis
        let second = smoother.update(&Vector3::new(3.0, 2.0, 1.0));
        assert!((second.x - 2.0).abs() < 1e-6);
        assert!((second.y - 2.0).abs() < 1e-6);
        assert!((second.z - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_translation_smoother_reset() {
        let mut smoother = TranslationSmoother::new("exponential").unwrap();
        smoother.update(&Vector3::new(5.0, 5.0, 5.0));
        smoother.reset();
        // After reset the next sample passes through again
        let out = smoother.update(&Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(out, Vector3::new(1.0, 1.0, 1.0));
    }
}
