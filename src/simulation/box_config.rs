//! Pallet and box layouts
//!
//! Sizes are in inches with one model unit per inch: the built-in cube is
//! 1x1x1, so a 16 inch box has scale (16, 16, 16). Box positions are relative
//! to the center of the pallet's top face, with `y` the height of the box's
//! bottom above it. [`BoxConfig::on_base`] converts them into the base's
//! local space.

use cgmath::{One, Quaternion, Vector3};

use crate::gfx::transform::Transform;

const BASE_HEIGHT: f32 = 8.0;
const BOX_UNIT: f32 = 16.0;
const HALF_BOX_UNIT: f32 = BOX_UNIT / 2.0;
/// Spacing kept between neighbouring boxes
const GAP: f32 = 0.25;

/// Placement and size of one box (or the pallet base)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxConfig {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl BoxConfig {
    pub fn new(position: Vector3<f32>, scale: Vector3<f32>) -> Self {
        Self {
            position,
            rotation: Quaternion::one(),
            scale,
        }
    }

    pub fn transform(&self) -> Transform {
        Transform::new(self.position, self.rotation, self.scale)
    }

    /// Local transform of this box as a child of `base`
    ///
    /// Children inherit the base's scale, so position and scale are divided
    /// by it; the box is lifted by half its height plus half the base height
    /// to rest on the base's top face.
    pub fn on_base(&self, base: &BoxConfig) -> Transform {
        let b = self.position;
        let bs = self.scale;
        let s = base.scale;
        Transform::new(
            Vector3::new(b.x / s.x, (bs.y / 2.0 + b.y + s.y / 2.0) / s.y, b.z / s.z),
            self.rotation,
            Vector3::new(bs.x / s.x, bs.y / s.y, bs.z / s.z),
        )
    }
}

/// 48x8x48 pallet centered on the origin
pub fn pallet_base() -> BoxConfig {
    BoxConfig::new(Vector3::new(0.0, 0.0, 0.0), Vector3::new(48.0, BASE_HEIGHT, 48.0))
}

/// Two tiers of four 16 inch boxes, corners meeting at the pallet center
pub fn boxes_4x2() -> Vec<BoxConfig> {
    let offset = HALF_BOX_UNIT + GAP;
    let cube = Vector3::new(BOX_UNIT, BOX_UNIT, BOX_UNIT);
    let footprint = [(-offset, offset), (-offset, -offset), (offset, -offset), (offset, offset)];

    [0.0, BOX_UNIT + GAP]
        .into_iter()
        .flat_map(|y| {
            footprint
                .into_iter()
                .map(move |(x, z)| BoxConfig::new(Vector3::new(x, y, z), cube))
        })
        .collect()
}

/// One long box and two cubes on the first tier, a half-height box on top
pub fn asymmetrical_stack() -> Vec<BoxConfig> {
    let offset = HALF_BOX_UNIT + GAP;
    let cube = Vector3::new(BOX_UNIT, BOX_UNIT, BOX_UNIT);
    vec![
        BoxConfig::new(Vector3::new(0.0, 0.0, offset), Vector3::new(32.0, BOX_UNIT, BOX_UNIT)),
        BoxConfig::new(Vector3::new(-offset, 0.0, -offset), cube),
        BoxConfig::new(Vector3::new(offset, 0.0, -offset), cube),
        BoxConfig::new(
            Vector3::new(0.0, BOX_UNIT + GAP, 0.0),
            Vector3::new(BOX_UNIT, HALF_BOX_UNIT, BOX_UNIT),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector4;

    #[test]
    fn test_layout_sizes() {
        let boxes = boxes_4x2();
        assert_eq!(boxes.len(), 8);
        assert!(boxes[..4].iter().all(|b| b.position.y == 0.0));
        assert!(boxes[4..].iter().all(|b| b.position.y == 16.25));
        assert_eq!(boxes[0].position, Vector3::new(-8.25, 0.0, 8.25));

        let stack = asymmetrical_stack();
        assert_eq!(stack.len(), 4);
        assert_eq!(stack[0].scale, Vector3::new(32.0, 16.0, 16.0));
        assert_eq!(stack[0].position, Vector3::new(0.0, 0.0, 8.25));
        assert_eq!(stack[3].scale, Vector3::new(16.0, 8.0, 16.0));
        assert_eq!(stack[3].position, Vector3::new(0.0, 16.25, 0.0));
    }

    #[test]
    fn test_box_rests_on_base_at_its_own_size() {
        let base = pallet_base();
        let first = boxes_4x2()[0];
        let local = first.on_base(&base);

        assert_eq!(local.position(), Vector3::new(-8.25 / 48.0, 1.5, 8.25 / 48.0));
        assert_eq!(local.scale(), Vector3::new(16.0 / 48.0, 2.0, 16.0 / 48.0));

        let world = base.transform().matrix() * local.matrix();
        // center sits half a box above the base's top face
        let center = world * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!((center.y - 12.0).abs() < 1e-5);
        assert!((center.x + 8.25).abs() < 1e-5);
        // and the unit cube ends up 16 inches tall
        assert!((world.y.y - 16.0).abs() < 1e-5);
    }
}
