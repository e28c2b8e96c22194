// Transform utilities for bone hierarchies
//
// Euler angles follow the host scene convention: degrees, applied
// Z first, then X, then Y (q = qy * qx * qz).

use glam::{EulerRot, Mat4, Quat, Vec3};
use crate::Aabb;

/// Build a rotation from Euler angles given in degrees.
pub fn quat_from_euler_degrees(euler: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        euler.y.to_radians(),
        euler.x.to_radians(),
        euler.z.to_radians(),
    )
}

/// Local matrix from a translation, Euler rotation (degrees) and scale.
pub fn trs_matrix(translation: Vec3, euler_degrees: Vec3, scale: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(scale, quat_from_euler_degrees(euler_degrees), translation)
}

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Transform an axis-aligned bounding box.
    /// Computes the bounding box of all 8 transformed corners.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;
}

impl Mat4Ext for Mat4 {
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        if aabb.is_empty() {
            return Aabb::EMPTY;
        }

        let mut result = Aabb::EMPTY;
        for corner in aabb.corners() {
            result.grow(self.transform_point3(corner));
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 0.001
    }

    #[test]
    fn test_euler_single_axis() {
        let q = quat_from_euler_degrees(Vec3::new(0.0, 90.0, 0.0));
        assert!(approx(q * Vec3::X, Vec3::new(0.0, 0.0, -1.0)));

        let q = quat_from_euler_degrees(Vec3::new(0.0, 0.0, 90.0));
        assert!(approx(q * Vec3::X, Vec3::Y));
    }

    #[test]
    fn test_euler_application_order() {
        // X is applied before Y: Y -> Z (about X) -> X (about Y)
        let q = quat_from_euler_degrees(Vec3::new(90.0, 90.0, 0.0));
        assert!(approx(q * Vec3::Y, Vec3::X));
    }

    #[test]
    fn test_trs_matrix() {
        let m = trs_matrix(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.0, 0.0, 90.0), Vec3::ONE);
        let p = m.transform_point3(Vec3::X);
        assert!(approx(p, Vec3::new(1.0, 3.0, 3.0)));
    }

    #[test]
    fn test_transform_aabb_translation() {
        let mat = Mat4::from_translation(Vec3::new(5.0, 5.0, 5.0));
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        let transformed = mat.transform_aabb(&aabb);

        assert!(approx(transformed.min, Vec3::splat(5.0)));
        assert!(approx(transformed.max, Vec3::splat(6.0)));
    }

    #[test]
    fn test_transform_aabb_empty() {
        let mat = Mat4::from_translation(Vec3::ONE);
        assert!(mat.transform_aabb(&Aabb::EMPTY).is_empty());
    }

    #[test]
    fn test_mat4_rotation_inverse() {
        let mat = trs_matrix(Vec3::new(1.0, 0.0, 0.0), Vec3::new(10.0, 45.0, 30.0), Vec3::ONE);
        let inv = mat.inverse();

        let point = Vec3::new(5.0, 3.0, 2.0);
        let back = inv.transform_point3(mat.transform_point3(point));

        assert!(approx(back, point));
    }
}
