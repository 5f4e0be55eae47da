//! Windowed application shell
//!
//! [`App`] owns the winit event loop. Once the window exists it creates the
//! [`RenderEngine`], builds the simulation against it and then drives one
//! frame per redraw, forwarding resize and pointer events.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::config::AppConfig;
use crate::gfx::device::GraphicsDevice;
use crate::gfx::error::RenderResult;
use crate::gfx::rendering::RenderEngine;
use crate::simulation::{PointerEvent, Simulation};

/// Builds the simulation once the device exists
pub type SimulationFactory =
    Box<dyn FnOnce(&mut dyn GraphicsDevice) -> RenderResult<Box<dyn Simulation>>>;

pub struct App {
    config: AppConfig,
    factory: SimulationFactory,
}

struct AppState {
    config: AppConfig,
    factory: Option<SimulationFactory>,
    window: Option<Arc<Window>>,
    // Declared before the engine so it is dropped first
    simulation: Option<Box<dyn Simulation>>,
    render_engine: Option<RenderEngine>,
    cursor: (f32, f32),
    started: Instant,
    error: Option<anyhow::Error>,
}

impl App {
    pub fn new<F>(config: AppConfig, factory: F) -> Self
    where
        F: FnOnce(&mut dyn GraphicsDevice) -> RenderResult<Box<dyn Simulation>> + 'static,
    {
        Self {
            config,
            factory: Box::new(factory),
        }
    }

    /// Runs the event loop until the window closes or a frame fails
    pub fn run(self) -> anyhow::Result<()> {
        let event_loop = EventLoop::new().context("failed to create event loop")?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut state = AppState {
            config: self.config,
            factory: Some(self.factory),
            window: None,
            simulation: None,
            render_engine: None,
            cursor: (0.0, 0.0),
            started: Instant::now(),
            error: None,
        };
        event_loop
            .run_app(&mut state)
            .context("event loop terminated abnormally")?;

        match state.error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn start(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let attributes = WindowAttributes::default()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("failed to create window")?,
        );
        let (width, height) = window.inner_size().into();

        let mut render_engine = pollster::block_on(RenderEngine::new(
            window.clone(),
            width,
            height,
            &self.config.render,
        ))
        .context("failed to initialize the render engine")?;

        let factory = self
            .factory
            .take()
            .ok_or_else(|| anyhow!("simulation was already built"))?;
        let mut simulation = factory(&mut render_engine).context("failed to build the simulation")?;
        simulation
            .begin(&mut render_engine, width, height)
            .with_context(|| format!("failed to start '{}'", simulation.name()))?;
        log::info!("running '{}' at {width}x{height}", simulation.name());

        self.window = Some(window);
        self.render_engine = Some(render_engine);
        self.simulation = Some(simulation);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.error = Some(error);
        event_loop.exit();
    }

    fn pointer(&mut self, event: PointerEvent) {
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.handle_pointer(event);
        }
    }

    fn redraw(&mut self) -> RenderResult<()> {
        let (Some(simulation), Some(render_engine)) =
            (self.simulation.as_mut(), self.render_engine.as_mut())
        else {
            return Ok(());
        };
        simulation.frame(render_engine, self.started.elapsed())?;
        render_engine.present()
    }

    fn shutdown(&mut self) {
        if let Some(mut simulation) = self.simulation.take() {
            simulation.stop();
        }
        if let Some(render_engine) = self.render_engine.as_mut() {
            let released = render_engine.collect_released();
            log::debug!("released {released} GPU resources on shutdown");
        }
        self.render_engine = None;
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.error.is_some() {
            return;
        }
        if let Err(error) = self.start(event_loop) {
            self.fail(event_loop, error);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                    if let Some(simulation) = self.simulation.as_mut() {
                        simulation.handle_resize(render_engine, width, height);
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x as f32, position.y as f32);
                let (x, y) = self.cursor;
                self.pointer(PointerEvent::Move { x, y });
            }
            WindowEvent::CursorLeft { .. } => self.pointer(PointerEvent::Leave),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let (x, y) = self.cursor;
                match state {
                    ElementState::Pressed => self.pointer(PointerEvent::Down { x, y }),
                    ElementState::Released => self.pointer(PointerEvent::Up),
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(error) = self.redraw() {
                    self.fail(event_loop, anyhow::Error::new(error).context("frame failed"));
                }
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
        log::info!("exiting");
    }
}
