//! # Graphics Module
//!
//! Everything between a scene description and pixels on the surface.
//!
//! ## Architecture Overview
//!
//! - **Transforms** ([`transform`]) - position/rotation/scale with a cached matrix
//! - **Geometry** ([`geometry`]) - validated models, the built-in cube, OBJ input
//! - **Device** ([`device`]) - the GPU capability everything draws through
//! - **Resources** ([`resources`]) - materials and their WGSL programs
//! - **Rendering** ([`rendering`]) - per-object renderers and the wgpu backend
//! - **Scene Management** ([`scene`]) - node hierarchy, camera and light
//!
//! ## Usage
//!
//! ```no_run
//! use std::rc::Rc;
//! use pallet3d::gfx::{
//!     camera::Camera, device::RecordingDevice, geometry::{cube_model_data, Model},
//!     light::Light, rendering::Renderer, resources::{LitMaterial, Material},
//!     scene::Scene, transform::Transform,
//! };
//!
//! let mut device = RecordingDevice::new();
//! let material: Rc<dyn Material> = Rc::new(LitMaterial::new(&mut device, [1.0; 4]).unwrap());
//! let cube = Rc::new(Model::new(cube_model_data()).unwrap());
//!
//! let mut scene = Scene::new(Camera::default(), Light::default());
//! scene.graph.add_root(Transform::default(), Some(Renderer::new(cube, material)));
//! scene.render(&mut device).unwrap();
//! ```

pub mod camera;
pub mod device;
pub mod error;
pub mod geometry;
pub mod light;
pub mod rendering;
pub mod resources;
pub mod scene;
pub mod transform;

// Re-export commonly used types
pub use device::GraphicsDevice;
pub use error::{RenderError, RenderResult};
pub use rendering::render_engine::RenderEngine;
