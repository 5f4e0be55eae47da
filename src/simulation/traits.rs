//! Core simulation trait
//!
//! Defines the lifecycle the app drives a simulation through: one `begin`,
//! a `frame` per redraw, resize and pointer input in between, one `stop`.

use std::time::Duration;

use crate::gfx::device::GraphicsDevice;
use crate::gfx::error::RenderResult;

use super::pointer::PointerEvent;

/// A scene plus the behavior that animates it
///
/// Simulations create their GPU resources against the device they are built
/// with and must be dropped before that device.
pub trait Simulation {
    /// Prepare device state and size the view to the initial canvas
    ///
    /// Called once, before the first frame.
    fn begin(&mut self, device: &mut dyn GraphicsDevice, width: u32, height: u32) -> RenderResult<()>;

    /// Render one frame
    ///
    /// # Arguments
    /// * `device` - Device to draw through; the caller presents afterwards
    /// * `elapsed` - Time since the app started
    fn frame(&mut self, device: &mut dyn GraphicsDevice, elapsed: Duration) -> RenderResult<()>;

    /// The canvas changed size
    fn handle_resize(&mut self, device: &mut dyn GraphicsDevice, width: u32, height: u32);

    /// Pointer input over the canvas
    fn handle_pointer(&mut self, _event: PointerEvent) {
        // Default: ignore pointer input
    }

    /// Stop animating; no frames follow
    fn stop(&mut self);

    /// Simulation name for logs and the window title
    fn name(&self) -> &str;

    /// Whether `begin` has run and `stop` has not
    fn is_running(&self) -> bool;
}
