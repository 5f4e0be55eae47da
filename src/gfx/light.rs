//! Directional light shared by every lit draw in a scene.

use cgmath::Vector3;

/// A directional light
///
/// `direction` is the direction the light travels; lit materials shade with
/// `max(dot(n, -direction), 0)`. `luminosity` is carried for callers but is not
/// consumed by the built-in shaders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    direction: Vector3<f32>,
    ambient_color: Vector3<f32>,
    color: Vector3<f32>,
    luminosity: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            direction: Vector3::new(0.0, -1.0, 0.0),
            ambient_color: Vector3::new(1.0, 1.0, 1.0),
            color: Vector3::new(1.0, 1.0, 1.0),
            luminosity: 1.0,
        }
    }
}

impl Light {
    pub fn new(
        direction: Vector3<f32>,
        ambient_color: Vector3<f32>,
        color: Vector3<f32>,
        luminosity: f32,
    ) -> Self {
        Self {
            direction,
            ambient_color,
            color,
            luminosity,
        }
    }

    pub fn direction(&self) -> Vector3<f32> {
        self.direction
    }

    pub fn ambient_color(&self) -> Vector3<f32> {
        self.ambient_color
    }

    pub fn color(&self) -> Vector3<f32> {
        self.color
    }

    pub fn luminosity(&self) -> f32 {
        self.luminosity
    }
}
