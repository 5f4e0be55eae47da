//! Scene graph: an arena of [`Object3D`] nodes addressed by [`NodeId`]
//!
//! A node's parent is fixed when the node is inserted and must already
//! exist, so the graph is always a forest and never has cycles.

use cgmath::Matrix4;

use crate::gfx::device::GraphicsDevice;
use crate::gfx::error::RenderResult;
use crate::gfx::light::Light;
use crate::gfx::rendering::{RenderProperties, Renderer};
use crate::gfx::transform::Transform;

use super::SceneError;

/// Index of a node in its [`SceneGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Camera and light context passed down the tree during rendering
#[derive(Debug, Clone, Copy)]
pub struct ObjectRenderProps<'a> {
    pub view_matrix: Matrix4<f32>,
    pub projection_matrix: Matrix4<f32>,
    pub light: &'a Light,
}

/// One node: a local transform, an optional renderer and ordered children
///
/// Nodes without a renderer only group their children.
pub struct Object3D {
    pub transform: Transform,
    pub renderer: Option<Renderer>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Object3D {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Default)]
pub struct SceneGraph {
    nodes: Vec<Object3D>,
    roots: Vec<NodeId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, transform: Transform, renderer: Option<Renderer>, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Object3D {
            transform,
            renderer,
            parent,
            children: Vec::new(),
        });
        id
    }

    /// Adds a top-level node
    pub fn add_root(&mut self, transform: Transform, renderer: Option<Renderer>) -> NodeId {
        let id = self.insert(transform, renderer, None);
        self.roots.push(id);
        id
    }

    /// Appends a child to `parent`, after any existing children
    pub fn add_child(
        &mut self,
        parent: NodeId,
        transform: Transform,
        renderer: Option<Renderer>,
    ) -> Result<NodeId, SceneError> {
        if parent.0 >= self.nodes.len() {
            return Err(SceneError::UnknownNode(parent));
        }
        let id = self.insert(transform, renderer, Some(parent));
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Object3D> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Object3D> {
        self.nodes.get_mut(id.0)
    }

    /// The `index`th child of `parent`
    ///
    /// # Panics
    /// Panics if `parent` is unknown or has no child at `index`.
    pub fn child(&self, parent: NodeId, index: usize) -> NodeId {
        self.nodes[parent.0].children[index]
    }

    /// Like [`SceneGraph::child`] but reports a missing node or child
    pub fn try_child(&self, parent: NodeId, index: usize) -> Result<NodeId, SceneError> {
        let node = self.node(parent).ok_or(SceneError::UnknownNode(parent))?;
        node.children
            .get(index)
            .copied()
            .ok_or(SceneError::NoChild { parent, index })
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Local-to-world matrix: the product of every ancestor's local matrix
    /// down to this node's own
    pub fn world_matrix(&self, id: NodeId) -> Result<Matrix4<f32>, SceneError> {
        let mut node = self.node(id).ok_or(SceneError::UnknownNode(id))?;
        let mut matrix = node.transform.matrix();
        while let Some(parent) = node.parent {
            node = &self.nodes[parent.0];
            matrix = node.transform.matrix() * matrix;
        }
        Ok(matrix)
    }

    /// Renders every root and its descendants depth-first, each node before
    /// its children and children in insertion order
    pub fn render(&mut self, device: &mut dyn GraphicsDevice, props: &ObjectRenderProps) -> RenderResult<()> {
        let identity = Matrix4::from_scale(1.0);
        for i in 0..self.roots.len() {
            let root = self.roots[i];
            self.render_node(root, identity, device, props)?;
        }
        Ok(())
    }

    fn render_node(
        &mut self,
        id: NodeId,
        parent_world: Matrix4<f32>,
        device: &mut dyn GraphicsDevice,
        props: &ObjectRenderProps,
    ) -> RenderResult<()> {
        let node = &mut self.nodes[id.0];
        let world = parent_world * node.transform.matrix();

        if let Some(renderer) = node.renderer.as_mut() {
            renderer.render(
                device,
                &RenderProperties {
                    model_matrix: world,
                    view_matrix: props.view_matrix,
                    projection_matrix: props.projection_matrix,
                    light: props.light,
                },
            )?;
        }

        for i in 0..self.nodes[id.0].children.len() {
            let child = self.nodes[id.0].children[i];
            self.render_node(child, world, device, props)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use cgmath::{Quaternion, SquareMatrix, Vector3, Vector4};

    use crate::gfx::device::RecordingDevice;
    use crate::gfx::geometry::{cube_model_data, Model};
    use crate::gfx::resources::{Material, UnlitMaterial};

    fn scaled(s: f32) -> Transform {
        Transform::new(Vector3::new(0.0, 0.0, 0.0), Quaternion::new(1.0, 0.0, 0.0, 0.0), Vector3::new(s, s, s))
    }

    fn translated(x: f32, y: f32, z: f32) -> Transform {
        Transform::from_position_rotation(Vector3::new(x, y, z), Quaternion::new(1.0, 0.0, 0.0, 0.0))
    }

    #[test]
    fn test_world_matrix_composes_full_chain() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(scaled(2.0), None);
        let child = graph.add_child(root, translated(1.0, 0.0, 0.0), None).unwrap();
        let grandchild = graph.add_child(child, translated(0.0, 1.0, 0.0), None).unwrap();

        let origin = Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_eq!(graph.world_matrix(child).unwrap() * origin, Vector4::new(2.0, 0.0, 0.0, 1.0));
        assert_eq!(graph.world_matrix(grandchild).unwrap() * origin, Vector4::new(2.0, 2.0, 0.0, 1.0));
        assert_eq!(
            graph.world_matrix(grandchild).unwrap(),
            scaled(2.0).matrix() * translated(1.0, 0.0, 0.0).matrix() * translated(0.0, 1.0, 0.0).matrix()
        );
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(Transform::default(), None);
        let a = graph.add_child(root, translated(1.0, 0.0, 0.0), None).unwrap();
        let b = graph.add_child(root, translated(2.0, 0.0, 0.0), None).unwrap();

        assert_eq!(graph.child(root, 0), a);
        assert_eq!(graph.child(root, 1), b);
        assert_eq!(graph.node(b).unwrap().parent(), Some(root));
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.roots(), &[root]);
    }

    #[test]
    #[should_panic]
    fn test_child_out_of_range_panics() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(Transform::default(), None);
        graph.child(root, 0);
    }

    #[test]
    fn test_try_child_reports_missing_index() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(Transform::default(), None);
        let only = graph.add_child(root, Transform::default(), None).unwrap();

        assert_eq!(graph.try_child(root, 0), Ok(only));
        assert_eq!(
            graph.try_child(root, 1),
            Err(SceneError::NoChild { parent: root, index: 1 })
        );
    }

    #[test]
    fn test_unknown_parent_is_rejected() {
        let mut graph = SceneGraph::new();
        let missing = NodeId(7);
        assert_eq!(
            graph.add_child(missing, Transform::default(), None).err(),
            Some(SceneError::UnknownNode(missing))
        );
    }

    #[test]
    fn test_render_visits_nodes_depth_first() {
        let mut device = RecordingDevice::new();
        let material: Rc<dyn Material> = Rc::new(UnlitMaterial::new(&mut device, [1.0; 4]).unwrap());
        let cube = Rc::new(Model::new(cube_model_data()).unwrap());
        let renderer = || Some(Renderer::new(cube.clone(), material.clone()));

        let mut graph = SceneGraph::new();
        let root = graph.add_root(translated(1.0, 0.0, 0.0), renderer());
        let group = graph.add_child(root, translated(0.0, 1.0, 0.0), None).unwrap();
        graph.add_child(group, translated(0.0, 0.0, 1.0), renderer()).unwrap();
        graph.add_root(translated(5.0, 0.0, 0.0), renderer());

        let light = Light::default();
        let props = ObjectRenderProps {
            view_matrix: Matrix4::identity(),
            projection_matrix: Matrix4::identity(),
            light: &light,
        };
        device.clear([0.0; 4]);
        graph.render(&mut device, &props).unwrap();
        device.present().unwrap();

        let origins: Vec<Vec<f32>> = device
            .last_frame()
            .unwrap()
            .draws
            .iter()
            .map(|d| d.uniform("uModelMatrix").unwrap()[12..15].to_vec())
            .collect();
        assert_eq!(
            origins,
            vec![vec![1.0, 0.0, 0.0], vec![1.0, 1.0, 1.0], vec![5.0, 0.0, 0.0]]
        );
    }
}
