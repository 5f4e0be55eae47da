//! Position / rotation / scale with an eagerly cached local matrix.

use cgmath::{Deg, Matrix4, One, Quaternion, Rad, Rotation3, Vector3};

/// Local transform of a scene node or camera
///
/// The composed matrix is always `T * R * S` of the current components and is
/// recomputed synchronously by every setter, so `matrix()` never lags behind.
/// Inputs are not validated: a zero scale is accepted and yields a singular
/// matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    position: Vector3<f32>,
    rotation: Quaternion<f32>,
    scale: Vector3<f32>,
    matrix: Matrix4<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(
            Vector3::new(0.0, 0.0, 0.0),
            Quaternion::one(),
            Vector3::new(1.0, 1.0, 1.0),
        )
    }
}

impl Transform {
    pub fn new(position: Vector3<f32>, rotation: Quaternion<f32>, scale: Vector3<f32>) -> Self {
        Self {
            position,
            rotation,
            scale,
            matrix: compose(position, rotation, scale),
        }
    }

    /// Transform with the given position and rotation and unit scale
    pub fn from_position_rotation(position: Vector3<f32>, rotation: Quaternion<f32>) -> Self {
        Self::new(position, rotation, Vector3::new(1.0, 1.0, 1.0))
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.position = position;
        self.refresh();
    }

    pub fn rotation(&self) -> Quaternion<f32> {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Quaternion<f32>) {
        self.rotation = rotation;
        self.refresh();
    }

    pub fn scale(&self) -> Vector3<f32> {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vector3<f32>) {
        self.scale = scale;
        self.refresh();
    }

    /// The cached local matrix (`T * R * S`)
    pub fn matrix(&self) -> Matrix4<f32> {
        self.matrix
    }

    /// Adds `offset` to the position
    pub fn translate(&mut self, offset: Vector3<f32>) {
        self.set_position(self.position + offset);
    }

    /// Rotates about the local Y axis (`rotation * rotY(angle)`)
    pub fn rotate_y(&mut self, angle: Rad<f32>) {
        self.set_rotation(self.rotation * Quaternion::from_angle_y(angle));
    }

    /// Post-multiplies the rotation by `rotation`
    pub fn rotate(&mut self, rotation: Quaternion<f32>) {
        self.set_rotation(self.rotation * rotation);
    }

    /// Multiplies the scale component-wise by `factor`
    pub fn scale_by(&mut self, factor: Vector3<f32>) {
        let s = self.scale;
        self.set_scale(Vector3::new(s.x * factor.x, s.y * factor.y, s.z * factor.z));
    }

    fn refresh(&mut self) {
        self.matrix = compose(self.position, self.rotation, self.scale);
    }
}

fn compose(position: Vector3<f32>, rotation: Quaternion<f32>, scale: Vector3<f32>) -> Matrix4<f32> {
    Matrix4::from_translation(position)
        * Matrix4::from(rotation)
        * Matrix4::from_nonuniform_scale(scale.x, scale.y, scale.z)
}

/// Builds a rotation from Euler angles in degrees, applied X first, then Y, then Z
pub fn quat_from_euler(x: f32, y: f32, z: f32) -> Quaternion<f32> {
    Quaternion::from_angle_z(Deg(z)) * Quaternion::from_angle_y(Deg(y)) * Quaternion::from_angle_x(Deg(x))
}

/// `T * R` for a rotation and translation (no scale)
pub fn from_rotation_translation(rotation: Quaternion<f32>, translation: Vector3<f32>) -> Matrix4<f32> {
    Matrix4::from_translation(translation) * Matrix4::from(rotation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, SquareMatrix, Vector4};
    use rand::Rng;

    fn assert_matrix_eq(a: Matrix4<f32>, b: Matrix4<f32>) {
        let a: &[f32; 16] = a.as_ref();
        let b: &[f32; 16] = b.as_ref();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-4, "{a:?} != {b:?}");
        }
    }

    fn random_transform(rng: &mut impl Rng) -> Transform {
        let axis = Vector3::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(0.1..1.0),
        )
        .normalize();
        Transform::new(
            Vector3::new(
                rng.random_range(-10.0..10.0),
                rng.random_range(-10.0..10.0),
                rng.random_range(-10.0..10.0),
            ),
            Quaternion::from_axis_angle(axis, Rad(rng.random_range(-3.0..3.0))),
            Vector3::new(
                rng.random_range(0.1..5.0),
                rng.random_range(0.1..5.0),
                rng.random_range(0.1..5.0),
            ),
        )
    }

    #[test]
    fn test_default_is_identity() {
        assert_eq!(Transform::default().matrix(), Matrix4::identity());
    }

    #[test]
    fn test_matrix_is_translation_rotation_scale() {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let t = random_transform(&mut rng);
            let expected = Matrix4::from_translation(t.position())
                * Matrix4::from(t.rotation())
                * Matrix4::from_nonuniform_scale(t.scale().x, t.scale().y, t.scale().z);
            assert_matrix_eq(t.matrix(), expected);
        }
    }

    #[test]
    fn test_setting_scale_keeps_translation_column() {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let mut t = random_transform(&mut rng);
            let before = t.matrix().w;
            t.set_scale(Vector3::new(
                rng.random_range(0.1..5.0),
                rng.random_range(0.1..5.0),
                rng.random_range(0.1..5.0),
            ));
            assert_eq!(t.matrix().w, before);
        }
    }

    #[test]
    fn test_setters_refresh_matrix() {
        let mut t = Transform::default();
        t.set_position(Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(t.matrix().w, Vector4::new(1.0, 2.0, 3.0, 1.0));

        t.set_scale(Vector3::new(2.0, 1.0, 1.0));
        assert_eq!(t.matrix().x, Vector4::new(2.0, 0.0, 0.0, 0.0));

        t.set_rotation(Quaternion::from_angle_y(Deg(90.0)));
        let x_axis = t.matrix().x;
        assert!((x_axis.z - -2.0).abs() < 1e-5);
    }

    #[test]
    fn test_zero_scale_is_accepted() {
        let mut t = Transform::default();
        t.set_scale(Vector3::new(0.0, 1.0, 1.0));
        assert!(t.matrix().invert().is_none());
    }

    #[test]
    fn test_rotate_y_post_multiplies() {
        let start = quat_from_euler(15.0, 0.0, 0.0);
        let mut t = Transform::from_position_rotation(Vector3::new(0.0, 0.0, 0.0), start);
        t.rotate_y(Rad(0.5));
        let expected = start * Quaternion::from_angle_y(Rad(0.5));
        assert!((t.rotation() - expected).magnitude() < 1e-6);
    }

    #[test]
    fn test_euler_matches_single_axis_rotation() {
        let q = quat_from_euler(0.0, 45.0, 0.0);
        let expected = Quaternion::from_angle_y(Deg(45.0));
        assert!((q - expected).magnitude() < 1e-6);
    }

    #[test]
    fn test_scale_by_is_component_wise() {
        let mut t = Transform::new(
            Vector3::new(0.0, 0.0, 0.0),
            Quaternion::one(),
            Vector3::new(2.0, 3.0, 4.0),
        );
        t.scale_by(Vector3::new(0.5, 2.0, 1.0));
        assert_eq!(t.scale(), Vector3::new(1.0, 6.0, 4.0));
    }

    #[test]
    fn test_from_rotation_translation_has_no_scale() {
        let q = quat_from_euler(15.0, 0.0, 0.0);
        let m = from_rotation_translation(q, Vector3::new(0.0, -40.0, -120.0));
        assert_eq!(m.w, Vector4::new(0.0, -40.0, -120.0, 1.0));
        assert!((m.x.truncate().magnitude() - 1.0).abs() < 1e-6);
    }
}
