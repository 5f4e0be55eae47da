//! # Scene Management Module
//!
//! Object hierarchy and the scene that renders it.
//!
//! - [`SceneGraph`] - arena of [`Object3D`] nodes with parent/child links
//! - [`Scene`] - the graph plus one camera and one light
//! - [`Vertex3D`] - the interleaved position + normal vertex format
//!
//! ## Usage
//!
//! ```no_run
//! use pallet3d::gfx::{camera::Camera, light::Light, scene::Scene, transform::Transform};
//!
//! let mut scene = Scene::new(Camera::default(), Light::default());
//! let root = scene.graph.add_root(Transform::default(), None);
//! let child = scene.graph.add_child(root, Transform::default(), None).unwrap();
//! assert_eq!(scene.graph.child(root, 0), child);
//! ```

pub mod object;
pub mod scene;
pub mod vertex;

use thiserror::Error;

// Re-export main types
pub use object::{NodeId, Object3D, ObjectRenderProps, SceneGraph};
pub use scene::Scene;
pub use vertex::Vertex3D;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("no scene node with id {0:?}")]
    UnknownNode(NodeId),

    #[error("scene node {0:?} has no renderer")]
    NoRenderer(NodeId),

    #[error("scene node {parent:?} has no child at index {index}")]
    NoChild { parent: NodeId, index: usize },
}
