/// 4x4 transformation matrices
use nalgebra::{Matrix4, Vector3};

/// Homogeneous 3D transform, column-major
pub type Matrix4x4 = Matrix4<f32>;

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    pub fn identity() -> Matrix4x4 {
        Matrix4::identity()
    }

    /// Apply a translation to `src`, returning `src * T(offset)`
    pub fn translate(src: &Matrix4x4, offset: Vector3<f32>) -> Matrix4x4 {
        src * Matrix4::new_translation(&offset)
    }

    /// Standard matrix product `a * b`
    pub fn multiply(a: &Matrix4x4, b: &Matrix4x4) -> Matrix4x4 {
        a * b
    }

    /// Compose the world-to-clip transform used by every draw call
    pub fn view_projection(projection: &Matrix4x4, view: &Matrix4x4) -> Matrix4x4 {
        Self::multiply(projection, view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_matrix() -> Matrix4x4 {
        Matrix4::new(
            1.0, 2.0, 3.0, 4.0, //
            5.0, 6.0, 7.0, 8.0, //
            9.0, 10.0, 11.0, 12.0, //
            13.0, 14.0, 15.0, 16.0,
        )
    }

    #[test]
    fn test_identity_is_neutral() {
        let m = sample_matrix();
        let id = Transform::identity();
        assert!((Transform::multiply(&id, &m) - m).norm() < 1e-6);
        assert!((Transform::multiply(&m, &id) - m).norm() < 1e-6);
    }

    #[test]
    fn test_multiply_is_not_commutative() {
        let a = Transform::translate(&Transform::identity(), Vector3::new(1.0, 0.0, 0.0));
        let b = Matrix4::new_nonuniform_scaling(&Vector3::new(2.0, 2.0, 2.0));
        let ab = Transform::multiply(&a, &b);
        let ba = Transform::multiply(&b, &a);
        assert!((ab - ba).norm() > 1e-3);
    }

    #[test]
    fn test_translate_leaves_source_untouched() {
        let src = Transform::identity();
        let moved = Transform::translate(&src, Vector3::new(0.0, 0.0, -0.5));
        assert_eq!(src, Matrix4::identity());
        // Column-major: translation lives in elements 12..15
        assert!((moved.as_slice()[14] + 0.5).abs() < 1e-6);
        assert_eq!(moved.as_slice()[12], 0.0);
    }

    #[test]
    fn test_translate_by_zero_is_identity() {
        let moved = Transform::translate(&Transform::identity(), Vector3::zeros());
        assert!((moved - Matrix4::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_translate_composes_after_source() {
        let scale = Matrix4::new_scaling(2.0);
        let moved = Transform::translate(&scale, Vector3::new(1.0, 0.0, 0.0));
        let p = moved.transform_point(&nalgebra::Point3::origin());
        assert!((p.x - 2.0).abs() < 1e-6);
    }
}
