//! Perspective camera with cached view and projection matrices

use cgmath::{Matrix4, Rad};

use crate::gfx::transform::{from_rotation_translation, Transform};

/// Perspective projection parameters; `fov_y` is in radians
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_y: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y: std::f32::consts::FRAC_PI_3,
            aspect_ratio: 1.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Projection {
    pub fn new(fov_y: f32, aspect_ratio: f32, near: f32, far: f32) -> Self {
        Self {
            fov_y,
            aspect_ratio,
            near,
            far,
        }
    }

    /// Right-handed perspective matrix with clip depth in [-1, 1]
    pub fn matrix(&self) -> Matrix4<f32> {
        cgmath::perspective(Rad(self.fov_y), self.aspect_ratio, self.near, self.far)
    }
}

/// A camera placed by a [`Transform`]
///
/// The view matrix is `T * R` of the camera's own transform, used as-is
/// rather than inverted: a camera at (0, 0, -3) therefore shifts the world
/// by (0, 0, -3), putting an object at the origin three units in front of the
/// eye. Scenes position their cameras with that convention.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    transform: Transform,
    projection: Projection,
    view_matrix: Matrix4<f32>,
    projection_matrix: Matrix4<f32>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Transform::default(), Projection::default())
    }
}

impl Camera {
    pub fn new(transform: Transform, projection: Projection) -> Self {
        Self {
            view_matrix: view_from(&transform),
            projection_matrix: projection.matrix(),
            transform,
            projection,
        }
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.view_matrix = view_from(&transform);
        self.transform = transform;
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn set_projection(&mut self, projection: Projection) {
        self.projection_matrix = projection.matrix();
        self.projection = projection;
    }

    /// Replaces only the aspect ratio
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.set_projection(Projection {
            aspect_ratio,
            ..self.projection
        });
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.view_matrix
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection_matrix
    }
}

fn view_from(transform: &Transform) -> Matrix4<f32> {
    from_rotation_translation(transform.rotation(), transform.position())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::transform::quat_from_euler;
    use cgmath::{Quaternion, Vector3, Vector4};

    #[test]
    fn test_view_matrix_is_camera_transform() {
        let position = Vector3::new(0.0, -40.0, -120.0);
        let rotation = quat_from_euler(15.0, 0.0, 0.0);
        let camera = Camera::new(
            Transform::from_position_rotation(position, rotation),
            Projection::default(),
        );

        assert_eq!(camera.view_matrix().w, Vector4::new(0.0, -40.0, -120.0, 1.0));
        assert_eq!(camera.view_matrix(), from_rotation_translation(rotation, position));
    }

    #[test]
    fn test_view_ignores_scale() {
        let camera = Camera::new(
            Transform::new(
                Vector3::new(1.0, 2.0, 3.0),
                Quaternion::new(1.0, 0.0, 0.0, 0.0),
                Vector3::new(5.0, 5.0, 5.0),
            ),
            Projection::default(),
        );
        assert_eq!(camera.view_matrix(), Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_aspect_change_only_touches_x_scale() {
        let mut camera = Camera::new(Transform::default(), Projection::new(1.0472, 1.0, 0.1, 1000.0));
        let before = camera.projection_matrix();

        camera.set_aspect_ratio(16.0 / 9.0);
        let after = camera.projection_matrix();

        assert_ne!(after.x.x, before.x.x);
        assert!((after.x.x * 16.0 / 9.0 - before.x.x).abs() < 1e-5);
        assert_eq!(after.y, before.y);
        assert_eq!(after.z, before.z);
        assert_eq!(after.w, before.w);
        assert_eq!(camera.projection().fov_y, 1.0472);
    }

    #[test]
    fn test_set_transform_refreshes_view() {
        let mut camera = Camera::default();
        camera.set_transform(Transform::from_position_rotation(
            Vector3::new(0.0, 0.0, -3.0),
            Quaternion::new(1.0, 0.0, 0.0, 0.0),
        ));
        assert_eq!(camera.view_matrix().w, Vector4::new(0.0, 0.0, -3.0, 1.0));
    }
}
