/// Camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3};

use crate::error::{GlowslabError, GlowslabResult};
use crate::transform::{Matrix4x4, Transform};

const PARALLEL_EPSILON: f32 = 1e-6;

/// Right-handed perspective projection with OpenGL clip-space depth
pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> GlowslabResult<Matrix4x4> {
    if ![fov_y_degrees, aspect, near, far].iter().all(|v| v.is_finite()) {
        return Err(GlowslabError::DegenerateTransform(
            "perspective parameters must be finite".to_string(),
        ));
    }
    if fov_y_degrees <= 0.0 || fov_y_degrees >= 180.0 {
        return Err(GlowslabError::DegenerateTransform(format!(
            "field of view {} must lie strictly between 0 and 180 degrees",
            fov_y_degrees
        )));
    }
    if aspect <= 0.0 {
        return Err(GlowslabError::DegenerateTransform(format!(
            "aspect ratio {} must be positive",
            aspect
        )));
    }
    if near <= 0.0 || near >= far {
        return Err(GlowslabError::DegenerateTransform(format!(
            "clip planes must satisfy 0 < near < far (near={}, far={})",
            near, far
        )));
    }

    Ok(Matrix4::new_perspective(aspect, fov_y_degrees.to_radians(), near, far))
}

/// Right-handed view matrix looking from `eye` towards `target`.
///
/// An `up` vector parallel to the viewing direction has no well-defined
/// orientation and is rejected rather than producing NaNs.
pub fn look_at(eye: &Point3<f32>, target: &Point3<f32>, up: &Vector3<f32>) -> GlowslabResult<Matrix4x4> {
    let forward = target - eye;
    let forward_len = forward.norm();
    let up_len = up.norm();

    if forward_len < PARALLEL_EPSILON {
        return Err(GlowslabError::DegenerateTransform(
            "eye and target coincide".to_string(),
        ));
    }
    if up_len < PARALLEL_EPSILON {
        return Err(GlowslabError::DegenerateTransform(
            "up vector has zero length".to_string(),
        ));
    }
    if forward.cross(up).norm() < PARALLEL_EPSILON * forward_len * up_len {
        return Err(GlowslabError::DegenerateTransform(
            "up vector is parallel to the viewing direction".to_string(),
        ));
    }

    Ok(Matrix4::look_at_rh(eye, target, up))
}

/// Static camera for the slab scene
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, -5.0),
            target: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            fov: 40.0,
            aspect: width as f32 / height.max(1) as f32,
            near: 0.01,
            far: 10.0,
        }
    }

    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> GlowslabResult<Matrix4x4> {
        look_at(&self.position, &self.target, &self.up)
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> GlowslabResult<Matrix4x4> {
        perspective(self.fov, self.aspect, self.near, self.far)
    }

    /// Compose `projection * view`
    pub fn view_projection(&self) -> GlowslabResult<Matrix4x4> {
        Ok(Transform::view_projection(
            &self.projection_matrix()?,
            &self.view_matrix()?,
        ))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(512, 512)
    }
}
