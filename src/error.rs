//! Error types for the face pose tracking library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Mesh asset loading or validation error
    #[error("Mesh error: {0}")]
    MeshError(String),

    /// Projective geometry error (singular transform, degenerate ray, etc.)
    #[error("Geometry error: {0}")]
    GeometryError(String),

    /// Filter initialization or processing error
    #[error("Filter error: {0}")]
    FilterError(String),

    /// Model fitter setup error
    #[error("Fitter error: {0}")]
    FitterError(String),

    /// Capture device error
    #[error("Capture error: {0}")]
    CaptureError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
