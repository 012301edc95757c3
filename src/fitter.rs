//! Model-fitter capability boundary and adapter.
//!
//! The numerical solver that maps 2D landmark observations onto the 3D face
//! model is treated as a black box behind the [`ModelFitter`] trait: any
//! implementation that produces a rotation, translation, and blendshape
//! weights from observed landmarks can be plugged in.

use crate::{
    constants::{MESH_VERTEX_INDICES, TRACKED_LANDMARK_INDICES},
    error::{Error, Result},
    mesh::FaceMesh,
    projection::CameraIntrinsics,
};
use nalgebra::{Matrix3, Vector3};

/// Head pose produced by one successful fit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Rotation as Euler angles in radians
    pub rotation: Vector3<f32>,
    /// Translation in camera space, world units
    pub translation: Vector3<f32>,
}

/// Output of one successful fitting pass
#[derive(Debug, Clone)]
pub struct FitResult {
    pub pose: Pose,
    /// One weight per blendshape, solver-defined range
    pub weights: Vec<f32>,
}

/// Capability trait for the external fitting solver.
///
/// `fit` keeps the previous pose internally as an optimizer warm start;
/// `reset_pose` discards it so the next call starts from a neutral pose.
/// Returning `None` signals non-convergence and is treated by the caller
/// exactly like a tracking miss.
pub trait ModelFitter: Send {
    fn fit(&mut self, observed: &[f32]) -> Option<FitResult>;
    fn reset_pose(&mut self);
}

/// Everything the solver needs at construction time.
///
/// Built only after the capture-device handshake has completed, because the
/// intrinsics are derived from the device's projection matrix.
pub struct FitterSetup {
    /// Mean shape vertices, flattened and scaled to world units
    pub mean_shape: Vec<f32>,
    /// Per-blendshape vertex deltas, flattened and scaled to world units
    pub blendshapes: Vec<Vec<f32>>,
    /// Tracker landmark indices with a mesh counterpart
    pub landmark_indices: &'static [usize],
    /// Mesh vertex indices corresponding to `landmark_indices`
    pub vertex_indices: &'static [usize],
    /// 3x3 camera matrix in pixel units
    pub intrinsics: Matrix3<f32>,
}

impl FitterSetup {
    /// Assemble the solver inputs from the loaded meshes and camera intrinsics.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh is too small for the correspondence
    /// tables or a blendshape does not match the mean shape.
    pub fn new(
        neutral: &FaceMesh,
        blendshapes: &[FaceMesh],
        mesh_scale: f32,
        intrinsics: &CameraIntrinsics,
    ) -> Result<Self> {
        let max_vertex = MESH_VERTEX_INDICES
            .iter()
            .copied()
            .max()
            .unwrap_or(0);
        if neutral.len() <= max_vertex {
            return Err(Error::FitterError(format!(
                "Mean shape has {} vertices but correspondence table needs {}",
                neutral.len(),
                max_vertex + 1
            )));
        }

        let deltas = blendshapes
            .iter()
            .map(|b| b.delta_flat(neutral, mesh_scale))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            mean_shape: neutral.scaled_flat(mesh_scale),
            blendshapes: deltas,
            landmark_indices: &TRACKED_LANDMARK_INDICES,
            vertex_indices: &MESH_VERTEX_INDICES,
            intrinsics: intrinsics.as_matrix(),
        })
    }
}

/// Stateful wrapper around the external fitting solver
pub struct PoseFitter {
    inner: Box<dyn ModelFitter>,
    expected_landmarks: usize,
}

impl PoseFitter {
    pub fn new(inner: Box<dyn ModelFitter>, expected_landmarks: usize) -> Self {
        Self {
            inner,
            expected_landmarks,
        }
    }

    /// Fit the model to observed 2D landmarks, flattened `[x0,y0,x1,y1,...]`.
    ///
    /// Returns `None` if the input has the wrong arity or the solver does
    /// not converge.
    pub fn fit(&mut self, observed: &[f32]) -> Option<FitResult> {
        if observed.len() != self.expected_landmarks * 2 {
            log::warn!(
                "Fit skipped: expected {} landmark coordinates, got {}",
                self.expected_landmarks * 2,
                observed.len()
            );
            return None;
        }
        self.inner.fit(observed)
    }

    /// Discard the solver warm start
    pub fn reset_pose(&mut self) {
        self.inner.reset_pose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Matrix4, Point3};

    struct ConstantFitter;

    impl ModelFitter for ConstantFitter {
        fn fit(&mut self, _observed: &[f32]) -> Option<FitResult> {
            Some(FitResult {
                pose: Pose {
                    rotation: Vector3::zeros(),
                    translation: Vector3::new(0.0, 0.0, -0.6),
                },
                weights: vec![0.5],
            })
        }

        fn reset_pose(&mut self) {}
    }

    fn big_mesh() -> FaceMesh {
        FaceMesh::new(
            (0..120)
                .map(|i| Point3::new(i as f32, 0.5 * i as f32, -(i as f32)))
                .collect(),
        )
    }

    fn intrinsics() -> CameraIntrinsics {
        CameraIntrinsics::from_normalized(&Matrix4::identity(), 640, 480)
    }

    #[test]
    fn test_setup_scales_mean_shape() {
        let mesh = big_mesh();
        let setup = FitterSetup::new(&mesh, &[], 2.0, &intrinsics()).unwrap();
        assert_eq!(setup.mean_shape.len(), mesh.len() * 3);
        assert_eq!(setup.mean_shape[3], 2.0); // vertex 1 x, scaled
        assert_eq!(setup.landmark_indices.len(), setup.vertex_indices.len());
    }

    #[test]
    fn test_setup_rejects_small_mesh() {
        let mesh = FaceMesh::new(vec![Point3::origin(); 10]);
        assert!(FitterSetup::new(&mesh, &[], 1.0, &intrinsics()).is_err());
    }

    #[test]
    fn test_adapter_rejects_wrong_arity() {
        let mut fitter = PoseFitter::new(Box::new(ConstantFitter), 51);
        assert!(fitter.fit(&[1.0, 2.0]).is_none());
        assert!(fitter.fit(&vec![0.0; 102]).is_some());
    }
}
