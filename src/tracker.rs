//! Boundary contract with the external 2D landmark tracker.

use std::sync::Arc;

/// A captured camera image, cheap to clone across threads.
///
/// The pixel layout is opaque to this crate; only the tracker interprets it.
#[derive(Debug, Clone)]
pub struct CameraImage {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
}

impl CameraImage {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data),
        }
    }
}

/// Result of one tracking pass
#[derive(Debug, Clone)]
pub struct TrackOutcome {
    /// Flattened `[x0,y0,x1,y1,...]` pixel landmarks, or `None` on a miss
    pub landmarks: Option<Vec<f32>>,
    /// Set when the tracker's internal confidence check wants the pose
    /// fitter re-initialized before the next fit
    pub reset_requested: bool,
}

impl TrackOutcome {
    pub fn miss() -> Self {
        Self {
            landmarks: None,
            reset_requested: false,
        }
    }

    pub fn found(landmarks: Vec<f32>) -> Self {
        Self {
            landmarks: Some(landmarks),
            reset_requested: false,
        }
    }
}

/// External 2D landmark tracker.
///
/// Invoked from a background worker, so implementations must be shareable
/// across threads; a pass is assumed to take multiple frame times.
pub trait FaceTracker: Send + Sync {
    /// Track landmarks in an image, optionally seeded with the previous
    /// frame's projected landmark positions.
    fn track(&self, image: &CameraImage, seed: Option<&[f32]>) -> TrackOutcome;
}
