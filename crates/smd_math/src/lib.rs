// Re-export glam for convenience
pub use glam::*;

// SMD math types
mod aabb;
mod transform;
pub use aabb::Aabb;
pub use transform::{quat_from_euler_degrees, trs_matrix, Mat4Ext};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_creation() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v.x, 1.0);
        assert_eq!(v.y, 2.0);
        assert_eq!(v.z, 3.0);
    }

    #[test]
    fn test_vec3_equality_is_exact() {
        let a = Vec3::new(0.1, 0.2, 0.3);
        let b = Vec3::new(0.1, 0.2, 0.3 + 1e-6);
        assert_ne!(a, b);
        assert_eq!(Vec3::new(0.0, 1.0, 2.0), Vec3::new(-0.0, 1.0, 2.0));
    }
}
