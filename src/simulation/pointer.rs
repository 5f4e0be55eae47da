//! Pointer input and drag-to-rotate tracking

use cgmath::Deg;

/// Pointer input in canvas pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { x: f32, y: f32 },
    Move { x: f32, y: f32 },
    Up,
    Leave,
}

/// Turns horizontal pointer drags into rotation angles
///
/// A drag starts on `Down` and ends on `Up` or `Leave`; each `Move` while
/// dragging yields `Δx * sensitivity` degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct DragRotation {
    /// Degrees of rotation per pixel of horizontal movement
    pub sensitivity: f32,
    last: Option<(f32, f32)>,
}

impl DragRotation {
    pub fn new(sensitivity: f32) -> Self {
        Self {
            sensitivity,
            last: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.last.is_some()
    }

    /// Feeds one event; returns the rotation to apply, if any
    pub fn handle(&mut self, event: PointerEvent) -> Option<Deg<f32>> {
        match event {
            PointerEvent::Down { x, y } => {
                self.last = Some((x, y));
                None
            }
            PointerEvent::Move { x, y } => {
                let (last_x, _) = self.last?;
                self.last = Some((x, y));
                let delta_x = x - last_x;
                (delta_x != 0.0).then(|| Deg(delta_x * self.sensitivity))
            }
            PointerEvent::Up | PointerEvent::Leave => {
                self.last = None;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_without_press_is_ignored() {
        let mut drag = DragRotation::new(0.15);
        assert_eq!(drag.handle(PointerEvent::Move { x: 50.0, y: 0.0 }), None);
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_drag_accumulates_from_last_position() {
        let mut drag = DragRotation::new(0.5);
        drag.handle(PointerEvent::Down { x: 10.0, y: 5.0 });
        assert_eq!(drag.handle(PointerEvent::Move { x: 30.0, y: 90.0 }), Some(Deg(10.0)));
        assert_eq!(drag.handle(PointerEvent::Move { x: 20.0, y: 0.0 }), Some(Deg(-5.0)));
        // vertical movement alone does not rotate
        assert_eq!(drag.handle(PointerEvent::Move { x: 20.0, y: 40.0 }), None);
    }

    #[test]
    fn test_up_and_leave_end_the_drag() {
        let mut drag = DragRotation::new(0.15);
        for end in [PointerEvent::Up, PointerEvent::Leave] {
            drag.handle(PointerEvent::Down { x: 0.0, y: 0.0 });
            assert!(drag.is_dragging());
            drag.handle(end);
            assert!(!drag.is_dragging());
            assert_eq!(drag.handle(PointerEvent::Move { x: 100.0, y: 0.0 }), None);
        }
    }
}
