//! Boundary contract with the camera capture subsystem.

use crate::tracker::CameraImage;
use nalgebra::Matrix4;

/// One frame delivered by the capture device
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub image: CameraImage,
    /// Camera-to-world transform at capture time
    pub camera_to_world: Matrix4<f32>,
}

/// Camera capture subsystem.
///
/// Polled at the start of each processing cycle; `next_frame` returning
/// `None` makes the cycle a no-op. Intrinsics-related accessors are valid
/// only once `initialized` reports true.
pub trait CaptureDevice {
    /// Whether the device handshake has completed
    fn initialized(&self) -> bool;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Normalized projection matrix describing the camera optics
    fn normalized_projection(&self) -> Matrix4<f32>;

    /// The newest frame, if one is available
    fn next_frame(&mut self) -> Option<CapturedFrame>;
}
