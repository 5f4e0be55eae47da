//! # Prelude
//!
//! Commonly used types in one import:
//!
//! ```no_run
//! use pallet3d::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(LoggingConfig::default());
//!     App::new(AppConfig::default(), |device| {
//!         let pallet = PalletSimulation::new(device, &boxes_4x2(), PalletConfig::default())?;
//!         Ok(Box::new(pallet) as Box<dyn Simulation>)
//!     })
//!     .run()
//! }
//! ```

// Application and configuration
pub use crate::app::App;
pub use crate::config::{AppConfig, RenderConfig};
pub use crate::logging::{init_logging, LoggingConfig};

// Graphics
pub use crate::gfx::camera::{Camera, Projection};
pub use crate::gfx::device::{GraphicsDevice, RecordingDevice};
pub use crate::gfx::error::{RenderError, RenderResult};
pub use crate::gfx::geometry::{cube_model_data, load_obj, Model, ModelData};
pub use crate::gfx::light::Light;
pub use crate::gfx::rendering::{RenderEngine, Renderer};
pub use crate::gfx::resources::{LitMaterial, Material, UnlitMaterial};
pub use crate::gfx::scene::{NodeId, Scene, SceneGraph};
pub use crate::gfx::transform::{quat_from_euler, Transform};

// Simulations
pub use crate::simulation::{
    asymmetrical_stack, boxes_4x2, pallet_base, BoxConfig, ExampleScene, PalletConfig,
    PalletSimulation, PointerEvent, Simulation,
};
