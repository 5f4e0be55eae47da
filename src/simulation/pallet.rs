//! Pallet loading simulation
//!
//! A gray pallet base with a stack of brown boxes resting on it. Dragging
//! the pointer spins the pallet about its vertical axis, and one box at a
//! time can be highlighted.

use std::rc::Rc;
use std::time::Duration;

use cgmath::{Quaternion, Vector3};

use crate::gfx::camera::{Camera, Projection};
use crate::gfx::device::GraphicsDevice;
use crate::gfx::error::RenderResult;
use crate::gfx::geometry::{cube_model_data, Model};
use crate::gfx::light::Light;
use crate::gfx::rendering::Renderer;
use crate::gfx::resources::{LitMaterial, Material};
use crate::gfx::scene::{NodeId, Scene, SceneError};
use crate::gfx::transform::{quat_from_euler, Transform};

use super::box_config::{pallet_base, BoxConfig};
use super::pointer::{DragRotation, PointerEvent};
use super::traits::Simulation;

/// Tunable parameters of a [`PalletSimulation`]
#[derive(Debug, Clone, PartialEq)]
pub struct PalletConfig {
    pub base: BoxConfig,
    /// Initial rotation of the pallet
    pub base_rotation: Quaternion<f32>,
    /// Degrees of pallet rotation per pixel dragged
    pub rotation_sensitivity: f32,
    pub box_color: [f32; 4],
    pub base_color: [f32; 4],
    pub highlight_color: [f32; 4],
    pub camera_transform: Transform,
    pub projection: Projection,
    pub light: Light,
    pub clear_color: [f32; 4],
}

impl Default for PalletConfig {
    fn default() -> Self {
        Self {
            base: pallet_base(),
            base_rotation: quat_from_euler(0.0, 45.0, 0.0),
            rotation_sensitivity: 0.15,
            box_color: [0.480, 0.368, 0.264, 1.0],
            base_color: [0.3, 0.3, 0.4, 1.0],
            highlight_color: [0.48, 0.77, 0.75, 1.0],
            camera_transform: Transform::from_position_rotation(
                Vector3::new(0.0, -40.0, -120.0),
                quat_from_euler(15.0, 0.0, 0.0),
            ),
            projection: Projection::new(1.0472, 1.0, 0.1, 1000.0),
            light: Light::new(
                Vector3::new(-0.25, -1.0, -0.5),
                Vector3::new(0.5, 0.5, 0.5),
                Vector3::new(1.0, 1.0, 1.0),
                1.0,
            ),
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl PalletConfig {
    pub fn with_base(mut self, base: BoxConfig) -> Self {
        self.base = base;
        self
    }

    pub fn with_rotation_sensitivity(mut self, degrees_per_pixel: f32) -> Self {
        self.rotation_sensitivity = degrees_per_pixel;
        self
    }

    pub fn with_colors(mut self, boxes: [f32; 4], base: [f32; 4], highlight: [f32; 4]) -> Self {
        self.box_color = boxes;
        self.base_color = base;
        self.highlight_color = highlight;
        self
    }

    pub fn with_camera(mut self, transform: Transform, projection: Projection) -> Self {
        self.camera_transform = transform;
        self.projection = projection;
        self
    }

    pub fn with_light(mut self, light: Light) -> Self {
        self.light = light;
        self
    }
}

/// A pallet of boxes that can be spun and inspected
pub struct PalletSimulation {
    scene: Scene,
    base: NodeId,
    boxes: Vec<NodeId>,
    box_material: Rc<dyn Material>,
    highlight_material: Rc<dyn Material>,
    selected: Option<usize>,
    drag: DragRotation,
    running: bool,
}

impl PalletSimulation {
    /// Builds the scene: the base as the only root, one child per box
    ///
    /// The first box starts selected.
    pub fn new(
        device: &mut dyn GraphicsDevice,
        boxes: &[BoxConfig],
        config: PalletConfig,
    ) -> RenderResult<Self> {
        let box_material: Rc<dyn Material> = Rc::new(LitMaterial::new(device, config.box_color)?);
        let base_material: Rc<dyn Material> = Rc::new(LitMaterial::new(device, config.base_color)?);
        let highlight_material: Rc<dyn Material> =
            Rc::new(LitMaterial::new(device, config.highlight_color)?);
        let cube = Rc::new(Model::new(cube_model_data())?);

        let mut scene = Scene::new(
            Camera::new(config.camera_transform, config.projection),
            config.light,
        )
        .with_clear_color(config.clear_color);

        let mut base_transform = config.base.transform();
        base_transform.set_rotation(config.base_rotation);
        let base = scene
            .graph
            .add_root(base_transform, Some(Renderer::new(Rc::clone(&cube), base_material)));

        let box_nodes = boxes
            .iter()
            .map(|b| {
                scene.graph.add_child(
                    base,
                    b.on_base(&config.base),
                    Some(Renderer::new(Rc::clone(&cube), Rc::clone(&box_material))),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut simulation = Self {
            scene,
            base,
            boxes: box_nodes,
            box_material,
            highlight_material,
            selected: None,
            drag: DragRotation::new(config.rotation_sensitivity),
            running: false,
        };
        if !simulation.boxes.is_empty() {
            simulation.select_box(0)?;
        }
        Ok(simulation)
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn base(&self) -> NodeId {
        self.base
    }

    pub fn box_count(&self) -> usize {
        self.boxes.len()
    }

    pub fn selected_box(&self) -> Option<usize> {
        self.selected
    }

    /// Highlights box `index`, restoring the previously selected box
    pub fn select_box(&mut self, index: usize) -> Result<(), SceneError> {
        let node = self.scene.graph.try_child(self.base, index)?;
        if let Some(previous) = self.selected {
            let material = Rc::clone(&self.box_material);
            self.box_renderer(previous)?.set_material(material);
        }
        let material = Rc::clone(&self.highlight_material);
        self.renderer_mut(node)?.set_material(material);
        self.selected = Some(index);
        log::debug!("selected box {index}");
        Ok(())
    }

    /// Moves the highlight to the next box, wrapping to the first
    pub fn select_next_box(&mut self) -> Result<(), SceneError> {
        match self.selected {
            Some(i) => self.select_box((i + 1) % self.boxes.len()),
            None => Ok(()),
        }
    }

    /// Moves the highlight to the previous box, wrapping to the last
    pub fn select_previous_box(&mut self) -> Result<(), SceneError> {
        match self.selected {
            Some(i) => self.select_box((i + self.boxes.len() - 1) % self.boxes.len()),
            None => Ok(()),
        }
    }

    fn box_renderer(&mut self, index: usize) -> Result<&mut Renderer, SceneError> {
        let node = self.scene.graph.try_child(self.base, index)?;
        self.renderer_mut(node)
    }

    fn renderer_mut(&mut self, node: NodeId) -> Result<&mut Renderer, SceneError> {
        self.scene
            .graph
            .node_mut(node)
            .ok_or(SceneError::UnknownNode(node))?
            .renderer
            .as_mut()
            .ok_or(SceneError::NoRenderer(node))
    }

    /// Current rotation of the pallet base
    pub fn base_rotation(&self) -> Option<Quaternion<f32>> {
        self.scene.graph.node(self.base).map(|n| n.transform.rotation())
    }
}

impl Simulation for PalletSimulation {
    fn begin(&mut self, device: &mut dyn GraphicsDevice, width: u32, height: u32) -> RenderResult<()> {
        device.enable_depth_test(true);
        self.scene.resize(device, width, height);
        self.running = true;
        log::info!("pallet simulation started with {} boxes", self.boxes.len());
        Ok(())
    }

    fn frame(&mut self, device: &mut dyn GraphicsDevice, _elapsed: Duration) -> RenderResult<()> {
        if !self.running {
            return Ok(());
        }
        self.scene.render(device)
    }

    fn handle_resize(&mut self, device: &mut dyn GraphicsDevice, width: u32, height: u32) {
        self.scene.resize(device, width, height);
    }

    fn handle_pointer(&mut self, event: PointerEvent) {
        let Some(angle) = self.drag.handle(event) else {
            return;
        };
        if let Some(base) = self.scene.graph.node_mut(self.base) {
            base.transform.rotate_y(angle.into());
        }
    }

    fn stop(&mut self) {
        self.running = false;
        log::info!("pallet simulation stopped");
    }

    fn name(&self) -> &str {
        "Pallet"
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
