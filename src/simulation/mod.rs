// src/simulation/mod.rs
//! Simulation system
//!
//! Frame-driven scenes the app runs: the [`Simulation`] lifecycle trait,
//! pointer input handling, the pallet simulation with its box layouts and
//! the single-model example scene.

pub mod box_config;
pub mod example_scene;
pub mod pallet;
pub mod pointer;
pub mod traits;

// Re-export main types
pub use box_config::{asymmetrical_stack, boxes_4x2, pallet_base, BoxConfig};
pub use example_scene::{ExampleScene, FrameCallback};
pub use pallet::{PalletConfig, PalletSimulation};
pub use pointer::{DragRotation, PointerEvent};
pub use traits::Simulation;
