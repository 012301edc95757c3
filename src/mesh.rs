//! Mean-shape and blendshape mesh assets.
//!
//! The mean shape is the neutral face model the fitter deforms; each
//! blendshape is a displacement field from the mean shape representing one
//! expression delta. Assets are stored as plain text, one coordinate value
//! per line, three values per vertex.

use crate::{
    constants::{LEFT_EYE_CORNER_INDICES, RIGHT_EYE_CORNER_INDICES},
    error::{Error, Result},
};
use nalgebra::Point3;
use std::fs;
use std::path::Path;

/// A 3D face mesh in model units
#[derive(Debug, Clone)]
pub struct FaceMesh {
    vertices: Vec<Point3<f32>>,
}

impl FaceMesh {
    pub fn new(vertices: Vec<Point3<f32>>) -> Self {
        Self { vertices }
    }

    /// Load a mesh from a text file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or has an invalid format.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        log::info!("Loading face mesh from {}", path.as_ref().display());
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse vertex coordinates from text, one value per line
    pub fn parse(content: &str) -> Result<Self> {
        let values: Vec<f32> = content
            .lines()
            .filter_map(|line| line.trim().parse::<f32>().ok())
            .collect();

        if values.is_empty() || values.len() % 3 != 0 {
            return Err(Error::MeshError(format!(
                "Expected a non-empty multiple of 3 coordinate values, got {}",
                values.len()
            )));
        }

        let vertices = values
            .chunks_exact(3)
            .map(|v| Point3::new(v[0], v[1], v[2]))
            .collect();

        Ok(Self { vertices })
    }

    pub fn vertices(&self) -> &[Point3<f32>] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Distance between the centers of the two eyes in mesh units
    fn inter_eye_distance(&self) -> Result<f32> {
        let (l0, l1) = LEFT_EYE_CORNER_INDICES;
        let (r0, r1) = RIGHT_EYE_CORNER_INDICES;
        let max_idx = l0.max(l1).max(r0).max(r1);
        if self.vertices.len() <= max_idx {
            return Err(Error::MeshError(format!(
                "Mesh has {} vertices but eye corner index {} is required",
                self.vertices.len(),
                max_idx
            )));
        }

        let left_center = nalgebra::center(&self.vertices[l0], &self.vertices[l1]);
        let right_center = nalgebra::center(&self.vertices[r0], &self.vertices[r1]);
        Ok((left_center - right_center).norm())
    }

    /// Scale factor converting mesh units to real-world meters, from the
    /// configured inter-pupil distance. Computed once at startup.
    pub fn mesh_scale(&self, inter_pupil_distance: f32) -> Result<f32> {
        let eye_distance = self.inter_eye_distance()?;
        if eye_distance <= 0.0 {
            return Err(Error::MeshError(
                "Degenerate mesh: eye centers coincide".to_string(),
            ));
        }
        Ok(inter_pupil_distance / eye_distance)
    }

    /// Vertices flattened to `[x0,y0,z0,x1,...]` and scaled to world units
    pub fn scaled_flat(&self, scale: f32) -> Vec<f32> {
        let mut flat = Vec::with_capacity(self.vertices.len() * 3);
        for v in &self.vertices {
            flat.push(scale * v.x);
            flat.push(scale * v.y);
            flat.push(scale * v.z);
        }
        flat
    }

    /// Per-vertex displacement from a neutral mesh, flattened and scaled
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex counts differ.
    pub fn delta_flat(&self, neutral: &FaceMesh, scale: f32) -> Result<Vec<f32>> {
        if self.vertices.len() != neutral.vertices.len() {
            return Err(Error::MeshError(format!(
                "Blendshape has {} vertices, neutral mesh has {}",
                self.vertices.len(),
                neutral.vertices.len()
            )));
        }

        let mut flat = Vec::with_capacity(self.vertices.len() * 3);
        for (v, n) in self.vertices.iter().zip(neutral.vertices.iter()) {
            flat.push(scale * (v.x - n.x));
            flat.push(scale * (v.y - n.y));
            flat.push(scale * (v.z - n.z));
        }
        Ok(flat)
    }
}
