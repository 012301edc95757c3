//! Published tracking state for one capture session.
//!
//! `PoseSession` owns everything the consumer thread mutates: the fitter,
//! the translation smoother, the reconstructed landmark sets, and the
//! last-update timestamp. All mutation happens through `apply` and `reset`,
//! called only from the consumer thread while draining scheduler actions.

use crate::{
    filters::TranslationSmoother,
    fitter::{Pose, PoseFitter},
    reconstruction::LandmarkReconstructor,
};
use nalgebra::{Matrix4, Point2, Point3};
use std::time::Instant;

/// Top-level state holder for the tracking pipeline
pub struct PoseSession {
    fitter: PoseFitter,
    smoother: TranslationSmoother,
    reconstructor: LandmarkReconstructor,
    num_landmarks: usize,
    landmark_pixels: Vec<Point2<f32>>,
    landmark_world: Vec<Point3<f32>>,
    blendshape_weights: Vec<f32>,
    pose: Option<Pose>,
    last_update: Option<Instant>,
}

impl PoseSession {
    pub fn new(
        fitter: PoseFitter,
        smoother: TranslationSmoother,
        reconstructor: LandmarkReconstructor,
        num_landmarks: usize,
    ) -> Self {
        Self {
            fitter,
            smoother,
            reconstructor,
            num_landmarks,
            landmark_pixels: Vec::new(),
            landmark_world: Vec::new(),
            blendshape_weights: Vec::new(),
            pose: None,
            last_update: None,
        }
    }

    /// Apply one completed tracking pass.
    ///
    /// `landmarks` is the tracker's flattened pixel array for this frame and
    /// `camera_to_world` the camera transform captured with it. When the
    /// tracker requested a reset, the fitter and filters are re-initialized
    /// first and the pose is still updated from the new observation.
    ///
    /// Fit failures and geometry degeneracies degrade to a full reset; no
    /// error leaves this method.
    pub fn apply(&mut self, landmarks: &[f32], camera_to_world: &Matrix4<f32>, reset_requested: bool) {
        if reset_requested {
            log::debug!("Tracker requested fitter reset before update");
            self.reset();
        }

        if landmarks.len() != self.num_landmarks * 2 {
            log::warn!(
                "Dropping tracking result with {} coordinates, expected {}",
                landmarks.len(),
                self.num_landmarks * 2
            );
            self.reset();
            return;
        }

        let Some(result) = self.fitter.fit(landmarks) else {
            log::debug!("Fitter did not converge, resetting pose");
            self.reset();
            return;
        };

        let translation = self.smoother.update(&result.pose.translation);

        let distance = match self.reconstructor.face_distance(&translation, camera_to_world) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("Face distance computation failed: {e}");
                self.reset();
                return;
            }
        };

        let world = match self.reconstructor.reconstruct(landmarks, distance, camera_to_world) {
            Ok(w) => w,
            Err(e) => {
                log::warn!("Landmark reconstruction failed: {e}");
                self.reset();
                return;
            }
        };

        self.landmark_pixels = landmarks
            .chunks_exact(2)
            .map(|p| Point2::new(p[0], p[1]))
            .collect();
        self.landmark_world = world;
        self.blendshape_weights = result.weights;
        self.pose = Some(Pose {
            rotation: result.pose.rotation,
            translation,
        });
        self.last_update = Some(Instant::now());
    }

    /// Reset the fitter warm start, the filters, the pose, and the
    /// timestamp. Intrinsics and mesh scale are untouched; the next tracking
    /// pass starts cold.
    pub fn reset(&mut self) {
        self.fitter.reset_pose();
        self.smoother.reset();
        self.pose = None;
        self.last_update = None;
    }

    /// Projected landmark positions to seed the next tracking pass.
    ///
    /// Returns `None` after a reset so the tracker starts without a stale
    /// prior.
    pub fn seed(&self, camera_to_world: &Matrix4<f32>) -> Option<Vec<f32>> {
        self.last_update?;
        if self.landmark_world.is_empty() {
            return None;
        }
        match self
            .reconstructor
            .seed_projections(&self.landmark_world, camera_to_world)
        {
            Ok(seed) => Some(seed),
            Err(e) => {
                log::warn!("Seed projection failed: {e}");
                None
            }
        }
    }

    pub fn pose(&self) -> Option<&Pose> {
        self.pose.as_ref()
    }

    /// Observed pixel landmarks from the latest applied frame
    pub fn landmark_pixels(&self) -> &[Point2<f32>] {
        &self.landmark_pixels
    }

    /// Reconstructed world landmarks, index-parallel to `landmark_pixels`
    pub fn landmark_world(&self) -> &[Point3<f32>] {
        &self.landmark_world
    }

    pub fn blendshape_weights(&self) -> &[f32] {
        &self.blendshape_weights
    }

    /// Time of the last successful update; `None` after a reset
    pub fn last_update(&self) -> Option<Instant> {
        self.last_update
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fitter::{FitResult, ModelFitter},
        projection::{CameraIntrinsics, ProjectionModel},
    };
    use nalgebra::Vector3;

    /// Fitter that reports a fixed pose and counts resets
    struct StubFitter {
        converge: bool,
        resets: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    }

    impl ModelFitter for StubFitter {
        fn fit(&mut self, _observed: &[f32]) -> Option<FitResult> {
            self.converge.then(|| FitResult {
                pose: Pose {
                    rotation: Vector3::new(0.1, 0.0, 0.0),
                    translation: Vector3::new(0.0, 0.0, -0.6),
                },
                weights: vec![0.25, 0.75],
            })
        }

        fn reset_pose(&mut self) {
            self.resets
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    fn make_session(converge: bool) -> (PoseSession, std::sync::Arc<std::sync::atomic::AtomicUsize>) {
        let resets = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let fitter = PoseFitter::new(
            Box::new(StubFitter {
                converge,
                resets: resets.clone(),
            }),
            2,
        );
        let intrinsics = CameraIntrinsics::from_normalized(&Matrix4::identity(), 640, 480);
        let reconstructor = LandmarkReconstructor::new(ProjectionModel::new(intrinsics, 640));
        let session = PoseSession::new(
            fitter,
            TranslationSmoother::new("none").unwrap(),
            reconstructor,
            2,
        );
        (session, resets)
    }

    #[test]
    fn test_apply_publishes_state() {
        let (mut session, _) = make_session(true);
        let landmarks = [100.0, 120.0, 400.0, 300.0];
        session.apply(&landmarks, &Matrix4::identity(), false);

        assert!(session.pose().is_some());
        assert!(session.last_update().is_some());
        assert_eq!(session.landmark_pixels().len(), 2);
        assert_eq!(session.landmark_world().len(), 2);
        assert_eq!(session.blendshape_weights(), &[0.25, 0.75]);
        assert_eq!(session.landmark_pixels()[1], Point2::new(400.0, 300.0));
    }

    #[test]
    fn test_non_convergence_resets() {
        let (mut session, resets) = make_session(false);
        session.apply(&[1.0, 2.0, 3.0, 4.0], &Matrix4::identity(), false);

        assert!(session.pose().is_none());
        assert!(session.last_update().is_none());
        assert!(resets.load(std::sync::atomic::Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_wrong_arity_resets() {
        let (mut session, _) = make_session(true);
        session.apply(&[1.0, 2.0], &Matrix4::identity(), false);
        assert!(session.last_update().is_none());
    }

    #[test]
    fn test_soft_reset_still_updates() {
        let (mut session, resets) = make_session(true);
        session.apply(&[1.0, 2.0, 3.0, 4.0], &Matrix4::identity(), true);

        // Fitter was reset before the update, and the pose was still published
        assert!(resets.load(std::sync::atomic::Ordering::SeqCst) >= 1);
        assert!(session.pose().is_some());
        assert!(session.last_update().is_some());
    }

    #[test]
    fn test_seed_withheld_after_reset() {
        let (mut session, _) = make_session(true);
        assert!(session.seed(&Matrix4::identity()).is_none());

        session.apply(&[100.0, 120.0, 400.0, 300.0], &Matrix4::identity(), false);
        let seed = session.seed(&Matrix4::identity()).unwrap();
        assert_eq!(seed.len(), 4);

        session.reset();
        assert!(session.seed(&Matrix4::identity()).is_none());
    }

    #[test]
    fn test_seed_matches_observation() {
        let (mut session, _) = make_session(true);
        let landmarks = [100.0, 120.0, 400.0, 300.0];
        session.apply(&landmarks, &Matrix4::identity(), false);

        // With an unchanged camera the seed reprojects onto the observation
        let seed = session.seed(&Matrix4::identity()).unwrap();
        for (s, o) in seed.iter().zip(landmarks.iter()) {
            assert!((s - o).abs() < 0.1, "seed {s} diverged from observation {o}");
        }
    }
}
