//! Single-model teaching scene
//!
//! One lit model in front of a fixed camera, with mutators for every piece
//! of state a lesson might tweak between frames: the model transform, its
//! color, the geometry itself and the camera placement.

use std::rc::Rc;
use std::time::Duration;

use cgmath::Vector3;

use crate::gfx::camera::{Camera, Projection};
use crate::gfx::device::GraphicsDevice;
use crate::gfx::error::RenderResult;
use crate::gfx::geometry::{Model, ModelData};
use crate::gfx::light::Light;
use crate::gfx::rendering::Renderer;
use crate::gfx::resources::{LitMaterial, Material};
use crate::gfx::scene::{NodeId, Scene};
use crate::gfx::transform::{quat_from_euler, Transform};

use super::traits::Simulation;

/// Per-frame hook: receives the time since start and the model transform
pub type FrameCallback = Box<dyn FnMut(Duration, &mut Transform)>;

pub const DEFAULT_COLOR: [f32; 4] = [0.25, 1.0, 0.75, 1.0];

/// A single lit model, the camera looking at it and one light
pub struct ExampleScene {
    scene: Scene,
    model: NodeId,
    material: Rc<dyn Material>,
    canvas_scale: f32,
    on_frame: Option<FrameCallback>,
    running: bool,
}

impl ExampleScene {
    /// Creates the scene around `model_data`
    ///
    /// The model starts at the origin turned 45° about Y; the camera sits at
    /// (0, 0, -3). Canvas sizes passed to `begin` and `handle_resize` are
    /// divided by `canvas_scale` before use; non-positive scales fall back to 1.
    pub fn new(
        device: &mut dyn GraphicsDevice,
        model_data: ModelData,
        projection: Projection,
        canvas_scale: f32,
    ) -> RenderResult<Self> {
        let material: Rc<dyn Material> = Rc::new(LitMaterial::new(device, DEFAULT_COLOR)?);
        let model = Rc::new(Model::new(model_data)?);

        let camera = Camera::new(
            Transform::from_position_rotation(Vector3::new(0.0, 0.0, -3.0), quat_from_euler(0.0, 0.0, 0.0)),
            projection,
        );
        let light = Light::new(
            Vector3::new(-0.25, -1.0, -0.5),
            Vector3::new(0.5, 0.5, 0.5),
            Vector3::new(1.0, 1.0, 1.0),
            1.0,
        );
        let mut scene = Scene::new(camera, light);

        let model_transform = Transform::from_position_rotation(
            Vector3::new(0.0, 0.0, 0.0),
            quat_from_euler(0.0, 45.0, 0.0),
        );
        let node = scene
            .graph
            .add_root(model_transform, Some(Renderer::new(model, Rc::clone(&material))));

        let canvas_scale = if canvas_scale > 0.0 {
            canvas_scale
        } else {
            log::warn!("canvas scale {canvas_scale} is not positive, using 1");
            1.0
        };

        Ok(Self {
            scene,
            model: node,
            material,
            canvas_scale,
            on_frame: None,
            running: false,
        })
    }

    /// Starts the model at `transform` instead of the default pose
    pub fn with_model_transform(mut self, transform: Transform) -> Self {
        if let Some(current) = self.model_transform_mut() {
            *current = transform;
        }
        self
    }

    /// Places the camera at `transform` instead of (0, 0, -3)
    pub fn with_camera_transform(mut self, transform: Transform) -> Self {
        self.scene.camera.set_transform(transform);
        self
    }

    /// Starts the model with `color` instead of [`DEFAULT_COLOR`]
    pub fn with_color(self, color: [f32; 4]) -> Self {
        self.material.set_color(color);
        self
    }

    /// Installs a hook that runs before every frame is drawn
    pub fn on_frame(&mut self, callback: impl FnMut(Duration, &mut Transform) + 'static) {
        self.on_frame = Some(Box::new(callback));
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn model_transform(&self) -> Transform {
        self.scene
            .graph
            .node(self.model)
            .map(|n| n.transform)
            .unwrap_or_default()
    }

    fn model_transform_mut(&mut self) -> Option<&mut Transform> {
        self.scene.graph.node_mut(self.model).map(|n| &mut n.transform)
    }

    /// Replaces any of position, rotation and scale; `None` keeps the current value
    pub fn update_model_transform(
        &mut self,
        position: Option<Vector3<f32>>,
        rotation: Option<cgmath::Quaternion<f32>>,
        scale: Option<Vector3<f32>>,
    ) {
        let Some(transform) = self.model_transform_mut() else {
            return;
        };
        *transform = Transform::new(
            position.unwrap_or(transform.position()),
            rotation.unwrap_or(transform.rotation()),
            scale.unwrap_or(transform.scale()),
        );
    }

    /// Rotates by Euler angles in degrees, after the current rotation
    pub fn rotate_model(&mut self, degrees: Vector3<f32>) {
        if let Some(transform) = self.model_transform_mut() {
            transform.rotate(quat_from_euler(degrees.x, degrees.y, degrees.z));
        }
    }

    pub fn translate_model(&mut self, offset: Vector3<f32>) {
        if let Some(transform) = self.model_transform_mut() {
            transform.translate(offset);
        }
    }

    pub fn scale_model(&mut self, factor: Vector3<f32>) {
        if let Some(transform) = self.model_transform_mut() {
            transform.scale_by(factor);
        }
    }

    /// Sets the model's RGB color; alpha is always 1
    pub fn update_color(&mut self, rgb: [f32; 3]) {
        self.material.set_color([rgb[0], rgb[1], rgb[2], 1.0]);
    }

    pub fn color(&self) -> [f32; 4] {
        self.material.color()
    }

    /// Swaps the geometry; the new buffers are uploaded on the next frame
    pub fn update_model_data(&mut self, model_data: ModelData) -> RenderResult<()> {
        let model = Rc::new(Model::new(model_data)?);
        if let Some(renderer) = self
            .scene
            .graph
            .node_mut(self.model)
            .and_then(|n| n.renderer.as_mut())
        {
            renderer.set_model(model);
        }
        Ok(())
    }

    /// Moves the camera; `None` keeps the current value
    pub fn update_camera_transform(
        &mut self,
        position: Option<Vector3<f32>>,
        rotation: Option<cgmath::Quaternion<f32>>,
    ) {
        let current = *self.scene.camera.transform();
        self.scene.camera.set_transform(Transform::from_position_rotation(
            position.unwrap_or(current.position()),
            rotation.unwrap_or(current.rotation()),
        ));
    }

    fn resize_scaled(&mut self, device: &mut dyn GraphicsDevice, width: u32, height: u32) {
        let width = (width as f32 / self.canvas_scale) as u32;
        let height = (height as f32 / self.canvas_scale) as u32;
        self.scene.resize(device, width, height);
    }
}

impl Simulation for ExampleScene {
    fn begin(&mut self, device: &mut dyn GraphicsDevice, width: u32, height: u32) -> RenderResult<()> {
        device.enable_depth_test(true);
        self.resize_scaled(device, width, height);
        self.running = true;
        log::info!("example scene started");
        Ok(())
    }

    fn frame(&mut self, device: &mut dyn GraphicsDevice, elapsed: Duration) -> RenderResult<()> {
        if !self.running {
            return Ok(());
        }
        if let Some(mut callback) = self.on_frame.take() {
            if let Some(transform) = self.model_transform_mut() {
                callback(elapsed, transform);
            }
            self.on_frame = Some(callback);
        }
        self.scene.render(device)
    }

    fn handle_resize(&mut self, device: &mut dyn GraphicsDevice, width: u32, height: u32) {
        self.resize_scaled(device, width, height);
    }

    fn stop(&mut self) {
        self.running = false;
        log::info!("example scene stopped");
    }

    fn name(&self) -> &str {
        "Example Scene"
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
