//! Pinhole camera model for pixel / camera-space / world-space conversions.
//!
//! The capture pipeline delivers mirrored images, so the horizontal pixel
//! coordinate is flipped around the image width in both directions of the
//! conversion. Dropping the flip produces laterally inverted output.

use crate::{
    constants::EPSILON,
    error::{Error, Result},
};
use nalgebra::{Matrix3, Matrix4, Point2, Point3, Vector3};

/// Camera focal lengths and principal point in pixel units.
///
/// Derived once from the capture device's normalized projection matrix and
/// image resolution; fixed for the lifetime of a capture session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraIntrinsics {
    pub focal_x: f32,
    pub focal_y: f32,
    pub principal_x: f32,
    pub principal_y: f32,
}

impl CameraIntrinsics {
    /// Derive pixel-unit intrinsics from a normalized projection matrix.
    pub fn from_normalized(norm: &Matrix4<f32>, width: u32, height: u32) -> Self {
        let w = width as f32;
        let h = height as f32;
        Self {
            focal_x: w * norm[(0, 0)] / 2.0,
            focal_y: h * norm[(1, 1)] / 2.0,
            principal_x: w * (norm[(0, 2)] + 1.0) / 2.0,
            principal_y: h * (norm[(1, 2)] + 1.0) / 2.0,
        }
    }

    /// The 3x3 K matrix, as handed to the model fitter.
    pub fn as_matrix(&self) -> Matrix3<f32> {
        Matrix3::new(
            self.focal_x, 0.0, self.principal_x,
            0.0, self.focal_y, self.principal_y,
            0.0, 0.0, 1.0,
        )
    }
}

/// Pinhole projection model bound to one capture resolution.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionModel {
    intrinsics: CameraIntrinsics,
    image_width: f32,
}

impl ProjectionModel {
    pub fn new(intrinsics: CameraIntrinsics, image_width: u32) -> Self {
        Self {
            intrinsics,
            image_width: image_width as f32,
        }
    }

    pub fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }

    /// World origin of the camera, taken from the camera-to-world transform.
    pub fn camera_origin(camera_to_world: &Matrix4<f32>) -> Point3<f32> {
        Point3::new(
            camera_to_world[(0, 3)],
            camera_to_world[(1, 3)],
            camera_to_world[(2, 3)],
        )
    }

    /// Project a world point to mirrored pixel coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if the camera transform is singular or the point has
    /// (near-)zero camera-space depth.
    pub fn project(&self, world: &Point3<f32>, camera_to_world: &Matrix4<f32>) -> Result<Point2<f32>> {
        let world_to_camera = camera_to_world
            .try_inverse()
            .ok_or_else(|| Error::GeometryError("singular camera-to-world transform".to_string()))?;
        let cam = world_to_camera.transform_point(world);
        if cam.z.abs() < EPSILON {
            return Err(Error::GeometryError(format!(
                "point at zero depth cannot be projected: {world:?}"
            )));
        }
        let k = &self.intrinsics;
        Ok(Point2::new(
            self.image_width - (k.focal_x * cam.x / cam.z + k.principal_x),
            k.focal_y * cam.y / cam.z + k.principal_y,
        ))
    }

    /// Project a camera-space vector through the plain (unflipped) K matrix.
    ///
    /// The model fitter reports its translation in unmirrored camera
    /// coordinates, so its anchor pixel is computed without the width flip.
    pub fn project_camera_space(&self, cam: &Vector3<f32>) -> Result<Point2<f32>> {
        if cam.z.abs() < EPSILON {
            return Err(Error::GeometryError(
                "camera-space vector at zero depth cannot be projected".to_string(),
            ));
        }
        let k = &self.intrinsics;
        Ok(Point2::new(
            k.focal_x * cam.x / cam.z + k.principal_x,
            k.focal_y * cam.y / cam.z + k.principal_y,
        ))
    }

    /// Camera-space ray direction through a mirrored pixel (not normalized).
    pub fn pixel_ray(&self, pixel: &Point2<f32>) -> Vector3<f32> {
        let k = &self.intrinsics;
        Vector3::new(
            ((self.image_width - pixel.x) - k.principal_x) / k.focal_x,
            (pixel.y - k.principal_y) / k.focal_y,
            1.0,
        ) * -1.0
    }

    /// Normalized world-space ray direction through a mirrored pixel.
    pub fn world_ray(&self, pixel: &Point2<f32>, camera_to_world: &Matrix4<f32>) -> Result<Vector3<f32>> {
        let dir = camera_to_world.transform_vector(&self.pixel_ray(pixel));
        let norm = dir.norm();
        if norm < EPSILON {
            return Err(Error::GeometryError(
                "degenerate world ray through pixel".to_string(),
            ));
        }
        Ok(dir / norm)
    }

    /// Cast a ray from the camera origin through a pixel and return the world
    /// point at the assumed distance.
    pub fn unproject(
        &self,
        pixel: &Point2<f32>,
        assumed_distance: f32,
        camera_to_world: &Matrix4<f32>,
    ) -> Result<Point3<f32>> {
        let origin = Self::camera_origin(camera_to_world);
        let dir = self.world_ray(pixel, camera_to_world)?;
        Ok(origin + assumed_distance * dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Isometry3, Vector3};

    fn test_intrinsics() -> CameraIntrinsics {
        let mut norm = Matrix4::identity();
        norm[(0, 0)] = 1.0;
        norm[(1, 1)] = 1.78;
        norm[(0, 2)] = 0.0;
        norm[(1, 2)] = 0.0;
        CameraIntrinsics::from_normalized(&norm, 896, 504)
    }

    #[test]
    fn test_intrinsics_derivation() {
        let k = test_intrinsics();
        assert_relative_eq!(k.focal_x, 448.0);
        assert_relative_eq!(k.focal_y, 448.56, epsilon = 1e-3);
        assert_relative_eq!(k.principal_x, 448.0);
        assert_relative_eq!(k.principal_y, 252.0);
    }

    #[test]
    fn test_project_image_center() {
        let model = ProjectionModel::new(test_intrinsics(), 896);
        let pixel = model
            .project(&Point3::new(0.0, 0.0, 1.0), &Matrix4::identity())
            .unwrap();
        // x=0 lands on the principal point after the width flip
        assert_relative_eq!(pixel.x, 448.0);
        assert_relative_eq!(pixel.y, 252.0);
    }

    #[test]
    fn test_project_rejects_zero_depth() {
        let model = ProjectionModel::new(test_intrinsics(), 896);
        assert!(model
            .project(&Point3::new(0.1, 0.2, 0.0), &Matrix4::identity())
            .is_err());
    }

    #[test]
    fn test_unproject_project_round_trip_identity_pose() {
        let model = ProjectionModel::new(test_intrinsics(), 896);
        let pose = Matrix4::identity();
        // Visible points sit at negative camera-space z under the mirrored
        // capture convention.
        let p = Point3::new(0.12, -0.05, -0.8);
        let pixel = model.project(&p, &pose).unwrap();
        let distance = (p - ProjectionModel::camera_origin(&pose)).norm();
        let back = model.unproject(&pixel, distance, &pose).unwrap();
        assert_relative_eq!(back.x, p.x, epsilon = 1e-4);
        assert_relative_eq!(back.y, p.y, epsilon = 1e-4);
        assert_relative_eq!(back.z, p.z, epsilon = 1e-4);
    }

    #[test]
    fn test_unproject_project_round_trip_moved_camera() {
        let model = ProjectionModel::new(test_intrinsics(), 896);
        let pose = Isometry3::new(
            Vector3::new(0.3, -0.1, 1.2),
            Vector3::new(0.1, 0.4, -0.05),
        )
        .to_homogeneous();
        let origin = ProjectionModel::camera_origin(&pose);

        for &point in &[
            Point3::new(0.0f32, 0.0, 0.4),
            Point3::new(0.25, -0.3, 0.9),
            Point3::new(-0.4, 0.15, 0.2),
        ] {
            // Place the point in front of the camera in camera space
            let cam = Vector3::new(point.x, point.y, -point.z.abs() - 0.3);
            let world = pose.transform_point(&Point3::from(cam));
            let pixel = model.project(&world, &pose).unwrap();
            let distance = (world - origin).norm();
            let back = model.unproject(&pixel, distance, &pose).unwrap();
            assert_relative_eq!(back.x, world.x, epsilon = 1e-3);
            assert_relative_eq!(back.y, world.y, epsilon = 1e-3);
            assert_relative_eq!(back.z, world.z, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_pixel_world_pixel_round_trip() {
        let model = ProjectionModel::new(test_intrinsics(), 896);
        let pose = Isometry3::new(Vector3::new(-0.2, 0.4, 0.1), Vector3::new(0.0, 0.3, 0.2))
            .to_homogeneous();
        let pixel = Point2::new(512.0, 301.5);
        let world = model.unproject(&pixel, 0.65, &pose).unwrap();
        let back = model.project(&world, &pose).unwrap();
        assert_relative_eq!(back.x, pixel.x, epsilon = 1e-2);
        assert_relative_eq!(back.y, pixel.y, epsilon = 1e-2);
    }

    #[test]
    fn test_k_matrix_layout() {
        let k = test_intrinsics().as_matrix();
        assert_relative_eq!(k[(0, 0)], 448.0);
        assert_relative_eq!(k[(1, 1)], 448.56, epsilon = 1e-3);
        assert_relative_eq!(k[(0, 2)], 448.0);
        assert_relative_eq!(k[(1, 2)], 252.0);
        assert_relative_eq!(k[(2, 2)], 1.0);
    }
}
