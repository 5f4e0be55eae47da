// src/lib.rs
//! pallet3d
//!
//! A small scene-graph renderer built on wgpu and winit: hierarchical
//! transforms, lit and unlit materials, a headless recording device for
//! tests, and two ready-made simulations (a pallet of boxes and a
//! single-model example scene).

pub mod app;
pub mod config;
pub mod gfx;
pub mod logging;
pub mod prelude;
pub mod simulation;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::App;
pub use config::{AppConfig, RenderConfig};
