//! World-space landmark reconstruction and seed projection.
//!
//! Observed 2D landmarks are lifted to world space by casting rays through
//! the projection model at a single shared face distance. All landmarks are
//! assumed equidistant from the camera; this flat-depth approximation is
//! deliberate and keeps the reconstruction closed-form.

use crate::{
    error::Result,
    projection::ProjectionModel,
};
use nalgebra::{Matrix4, Point2, Point3, Vector3};

/// Converts between tracked 2D landmarks and world-space 3D positions
#[derive(Debug, Clone, Copy)]
pub struct LandmarkReconstructor {
    projection: ProjectionModel,
}

impl LandmarkReconstructor {
    pub fn new(projection: ProjectionModel) -> Self {
        Self { projection }
    }

    pub fn projection(&self) -> &ProjectionModel {
        &self.projection
    }

    /// World position of the fitted face model.
    ///
    /// The fitter's translation is camera-space, so it is first projected to
    /// an anchor pixel through the plain K matrix, then the anchor ray is
    /// cast at the translation's own length.
    pub fn model_position(
        &self,
        translation: &Vector3<f32>,
        camera_to_world: &Matrix4<f32>,
    ) -> Result<Point3<f32>> {
        let anchor = self.projection.project_camera_space(translation)?;
        self.projection
            .unproject(&anchor, translation.norm(), camera_to_world)
    }

    /// Distance from the camera origin to the fitted face position
    pub fn face_distance(
        &self,
        translation: &Vector3<f32>,
        camera_to_world: &Matrix4<f32>,
    ) -> Result<f32> {
        let position = self.model_position(translation, camera_to_world)?;
        let origin = ProjectionModel::camera_origin(camera_to_world);
        Ok((position - origin).norm())
    }

    /// Lift observed 2D landmarks to world space at one shared distance.
    ///
    /// Index `i` of the output refers to the same physical landmark as pixel
    /// pair `i` of the input.
    pub fn reconstruct(
        &self,
        observed: &[f32],
        distance: f32,
        camera_to_world: &Matrix4<f32>,
    ) -> Result<Vec<Point3<f32>>> {
        let mut world = Vec::with_capacity(observed.len() / 2);
        for pair in observed.chunks_exact(2) {
            let pixel = Point2::new(pair[0], pair[1]);
            world.push(self.projection.unproject(&pixel, distance, camera_to_world)?);
        }
        Ok(world)
    }

    /// Project world landmarks back to a flattened pixel array, used to seed
    /// the next tracking pass.
    pub fn seed_projections(
        &self,
        world: &[Point3<f32>],
        camera_to_world: &Matrix4<f32>,
    ) -> Result<Vec<f32>> {
        let mut seed = Vec::with_capacity(world.len() * 2);
        for point in world {
            let pixel = self.projection.project(point, camera_to_world)?;
            seed.push(pixel.x);
            seed.push(pixel.y);
        }
        Ok(seed)
    }
}
