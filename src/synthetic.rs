//! Synthetic stand-ins for the external collaborators.
//!
//! The capture subsystem, the 2D tracker, and the fitting solver live
//! outside this crate. The types here implement their boundary traits with
//! deterministic synthetic data so the full pipeline can run in demos and
//! integration tests without camera hardware or a numerical solver.

use crate::{
    capture::{CaptureDevice, CapturedFrame},
    config::TrackerConfig,
    fitter::{FitResult, FitterSetup, ModelFitter, Pose},
    mesh::FaceMesh,
    tracker::{CameraImage, FaceTracker, TrackOutcome},
};
use nalgebra::{Matrix4, Point3, Vector3};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Capture device replaying a prepared frame sequence
pub struct SyntheticCapture {
    width: u32,
    height: u32,
    normalized_projection: Matrix4<f32>,
    frames: VecDeque<CapturedFrame>,
    initialized: bool,
}

impl SyntheticCapture {
    pub fn new(width: u32, height: u32, norm_focal: (f32, f32)) -> Self {
        let mut normalized_projection = Matrix4::identity();
        normalized_projection[(0, 0)] = norm_focal.0;
        normalized_projection[(1, 1)] = norm_focal.1;
        Self {
            width,
            height,
            normalized_projection,
            frames: VecDeque::new(),
            initialized: true,
        }
    }

    /// Emulate a capture device whose handshake has not completed yet
    pub fn set_initialized(&mut self, initialized: bool) {
        self.initialized = initialized;
    }

    /// Append a frame with the given camera pose and an empty image
    pub fn push_frame(&mut self, camera_to_world: Matrix4<f32>) {
        self.frames.push_back(CapturedFrame {
            image: CameraImage::new(self.width, self.height, Vec::new()),
            camera_to_world,
        });
    }

    /// Append `count` identity-pose frames
    pub fn push_frames(&mut self, count: usize) {
        for _ in 0..count {
            self.push_frame(Matrix4::identity());
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl CaptureDevice for SyntheticCapture {
    fn initialized(&self) -> bool {
        self.initialized
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn normalized_projection(&self) -> Matrix4<f32> {
        self.normalized_projection
    }

    fn next_frame(&mut self) -> Option<CapturedFrame> {
        self.frames.pop_front()
    }
}

/// Tracker replaying a prepared outcome sequence.
///
/// Stands in for the platform's local tracker, which takes its iteration
/// count and confidence threshold at construction. Records whether each
/// call carried a seed, so tests can verify the cold-start policy, and
/// applies the configured threshold to scripted per-pass confidences.
/// Returns a miss once the script runs out.
pub struct ScriptedTracker {
    outcomes: Mutex<VecDeque<TrackOutcome>>,
    confidences: Mutex<VecDeque<f32>>,
    seeded_calls: Mutex<Vec<bool>>,
    iterations: u32,
    confidence_threshold: f32,
}

impl ScriptedTracker {
    pub fn new(outcomes: Vec<TrackOutcome>) -> Self {
        Self::with_config(&TrackerConfig::default(), outcomes)
    }

    /// Build the tracker the way the platform tracker is built: iteration
    /// count and confidence threshold fixed at construction
    pub fn with_config(config: &TrackerConfig, outcomes: Vec<TrackOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            confidences: Mutex::new(VecDeque::new()),
            seeded_calls: Mutex::new(Vec::new()),
            iterations: config.iterations,
            confidence_threshold: config.confidence_threshold,
        }
    }

    /// Script one confidence value per upcoming pass; passes without a
    /// scripted value are treated as fully confident
    pub fn script_confidences(&self, confidences: Vec<f32>) {
        self.confidences
            .lock()
            .expect("tracker mutex poisoned")
            .extend(confidences);
    }

    /// Whether each tracking call so far was given a seed
    pub fn seeded_calls(&self) -> Vec<bool> {
        self.seeded_calls.lock().expect("tracker mutex poisoned").clone()
    }

    pub fn calls(&self) -> usize {
        self.seeded_calls.lock().expect("tracker mutex poisoned").len()
    }
}

impl FaceTracker for ScriptedTracker {
    fn track(&self, _image: &CameraImage, seed: Option<&[f32]>) -> TrackOutcome {
        self.seeded_calls
            .lock()
            .expect("tracker mutex poisoned")
            .push(seed.is_some());
        log::debug!("Scripted tracking pass, {} refinement iterations", self.iterations);
        let mut outcome = self
            .outcomes
            .lock()
            .expect("tracker mutex poisoned")
            .pop_front()
            .unwrap_or_else(TrackOutcome::miss);
        if let Some(confidence) = self
            .confidences
            .lock()
            .expect("tracker mutex poisoned")
            .pop_front()
        {
            if outcome.landmarks.is_some() && confidence < self.confidence_threshold {
                log::debug!(
                    "Confidence {confidence} below threshold {}, requesting fitter reset",
                    self.confidence_threshold
                );
                outcome.reset_requested = true;
            }
        }
        outcome
    }
}

/// Minimal fitting solver for demos.
///
/// Places the face along the ray through the landmark centroid at a nominal
/// distance, with zero rotation and zero blendshape weights. Keeps the
/// previous translation as a warm start and blends toward new estimates.
pub struct CentroidFitter {
    focal_x: f32,
    focal_y: f32,
    principal_x: f32,
    principal_y: f32,
    nominal_distance: f32,
    weight_count: usize,
    warm_translation: Option<Vector3<f32>>,
}

impl CentroidFitter {
    pub fn from_setup(setup: &FitterSetup, nominal_distance: f32) -> Self {
        let k = &setup.intrinsics;
        Self {
            focal_x: k[(0, 0)],
            focal_y: k[(1, 1)],
            principal_x: k[(0, 2)],
            principal_y: k[(1, 2)],
            nominal_distance,
            weight_count: setup.blendshapes.len(),
            warm_translation: None,
        }
    }
}

impl ModelFitter for CentroidFitter {
    fn fit(&mut self, observed: &[f32]) -> Option<FitResult> {
        if observed.is_empty() || observed.len() % 2 != 0 {
            return None;
        }
        let n = (observed.len() / 2) as f32;
        let (mut u, mut v) = (0.0f32, 0.0f32);
        for pair in observed.chunks_exact(2) {
            u += pair[0];
            v += pair[1];
        }
        u /= n;
        v /= n;

        let dir = Vector3::new(
            (u - self.principal_x) / self.focal_x,
            (v - self.principal_y) / self.focal_y,
            1.0,
        )
        .normalize();
        let estimate = self.nominal_distance * dir;

        let translation = match self.warm_translation {
            Some(warm) => 0.5 * (warm + estimate),
            None => estimate,
        };
        self.warm_translation = Some(translation);

        Some(FitResult {
            pose: Pose {
                rotation: Vector3::zeros(),
                translation,
            },
            weights: vec![0.0; self.weight_count],
        })
    }

    fn reset_pose(&mut self) {
        self.warm_translation = None;
    }
}

/// Deterministic face mesh with enough vertices for the correspondence
/// tables, laid out on a spiral
pub fn demo_mesh(vertex_count: usize) -> FaceMesh {
    let vertices = (0..vertex_count)
        .map(|i| {
            let theta = 0.6 * i as f32;
            let radius = 5.0 + 0.05 * i as f32;
            Point3::new(radius * theta.cos(), radius * theta.sin(), 0.1 * i as f32)
        })
        .collect();
    FaceMesh::new(vertices)
}

/// A blendshape for the demo mesh: the neutral mesh with a uniform offset
pub fn demo_blendshape(neutral: &FaceMesh, offset: f32) -> FaceMesh {
    FaceMesh::new(
        neutral
            .vertices()
            .iter()
            .map(|v| Point3::new(v.x + offset, v.y, v.z - offset))
            .collect(),
    )
}

/// A ring of landmark pixels around a center point, flattened
pub fn ring_landmarks(count: usize, center: (f32, f32), radius: f32) -> Vec<f32> {
    let mut landmarks = Vec::with_capacity(count * 2);
    for i in 0..count {
        let theta = 2.0 * std::f32::consts::PI * i as f32 / count as f32;
        landmarks.push(center.0 + radius * theta.cos());
        landmarks.push(center.1 + radius * theta.sin());
    }
    landmarks
}

/// Tracking outcomes for a face drifting slowly around the image center
pub fn orbiting_outcomes(frames: usize, landmark_count: usize, width: u32, height: u32) -> Vec<TrackOutcome> {
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    (0..frames)
        .map(|i| {
            let t = i as f32 * 0.2;
            let center = (cx + 40.0 * t.sin(), cy + 20.0 * t.cos());
            TrackOutcome::found(ring_landmarks(landmark_count, center, 60.0))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::CameraIntrinsics;

    #[test]
    fn test_scripted_tracker_replays_then_misses() {
        let tracker = ScriptedTracker::new(vec![TrackOutcome::found(vec![1.0, 2.0])]);
        let image = CameraImage::new(4, 4, Vec::new());

        let first = tracker.track(&image, None);
        assert!(first.landmarks.is_some());

        let second = tracker.track(&image, Some(&[1.0, 2.0]));
        assert!(second.landmarks.is_none());
        assert_eq!(tracker.seeded_calls(), vec![false, true]);
    }

    #[test]
    fn test_centroid_fitter_distance() {
        let mesh = demo_mesh(120);
        let intrinsics = CameraIntrinsics::from_normalized(&Matrix4::identity(), 640, 480);
        let setup = FitterSetup::new(&mesh, &[], 1.0, &intrinsics).unwrap();
        let mut fitter = CentroidFitter::from_setup(&setup, 0.6);

        let result = fitter.fit(&ring_landmarks(5, (320.0, 240.0), 30.0)).unwrap();
        assert!((result.pose.translation.norm() - 0.6).abs() < 1e-4);
    }

    #[test]
    fn test_centroid_fitter_warm_start() {
        let mesh = demo_mesh(120);
        let intrinsics = CameraIntrinsics::from_normalized(&Matrix4::identity(), 640, 480);
        let setup = FitterSetup::new(&mesh, &[], 1.0, &intrinsics).unwrap();
        let mut fitter = CentroidFitter::from_setup(&setup, 0.6);

        let a = fitter.fit(&ring_landmarks(5, (100.0, 100.0), 10.0)).unwrap();
        let b = fitter.fit(&ring_landmarks(5, (500.0, 400.0), 10.0)).unwrap();
        // Warm-started estimate is pulled toward the previous one
        assert!((b.pose.translation - a.pose.translation).norm() < 1.0);

        fitter.reset_pose();
        let c = fitter.fit(&ring_landmarks(5, (500.0, 400.0), 10.0)).unwrap();
        // After a reset the same observation lands elsewhere
        assert!((c.pose.translation - b.pose.translation).norm() > 1e-6);
    }

    #[test]
    fn test_demo_mesh_has_eye_vertices() {
        let mesh = demo_mesh(120);
        assert!(mesh.mesh_scale(0.063).is_ok());
    }

    #[test]
    fn test_low_confidence_requests_fitter_reset() {
        let config = TrackerConfig {
            iterations: 3,
            confidence_threshold: 900.0,
        };
        let tracker = ScriptedTracker::with_config(
            &config,
            vec![
                TrackOutcome::found(vec![1.0, 2.0]),
                TrackOutcome::found(vec![3.0, 4.0]),
                TrackOutcome::miss(),
            ],
        );
        tracker.script_confidences(vec![1200.0, 450.0, 450.0]);
        let image = CameraImage::new(4, 4, Vec::new());

        let confident = tracker.track(&image, None);
        assert!(!confident.reset_requested);

        let shaky = tracker.track(&image, None);
        assert!(shaky.landmarks.is_some());
        assert!(shaky.reset_requested);

        // A miss never turns into a soft reset
        let missed = tracker.track(&image, None);
        assert!(missed.landmarks.is_none());
        assert!(!missed.reset_requested);
    }

    #[test]
    fn test_unscripted_confidence_is_trusted() {
        let tracker = ScriptedTracker::new(vec![TrackOutcome::found(vec![1.0, 2.0])]);
        let outcome = tracker.track(&CameraImage::new(4, 4, Vec::new()), None);
        assert!(!outcome.reset_requested);
    }
}
