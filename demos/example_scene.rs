//! # Example Scene
//!
//! One lit model spinning in front of the camera. Pass a path to an OBJ file
//! to show that instead of the built-in cube.
//!
//! ## Usage:
//! ```bash
//! cargo run --example example_scene
//! cargo run --example example_scene -- path/to/model.obj
//! ```

use std::time::Duration;

use anyhow::Context;
use pallet3d::prelude::*;

/// Degrees per second about the Y axis
const SPIN_SPEED: f32 = 30.0;

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let model_data = match std::env::args().nth(1) {
        Some(path) => load_obj(&path)
            .with_context(|| format!("failed to load '{path}'"))?
            .data()
            .clone(),
        None => cube_model_data(),
    };

    let config = AppConfig::default().with_title("Example Scene").with_size(800, 800);
    App::new(config, move |device| {
        let mut scene = ExampleScene::new(device, model_data, Projection::default(), 1.0)?
            .with_color([0.9, 0.6, 0.2, 1.0]);
        let spin = |elapsed: Duration, transform: &mut Transform| {
            transform.set_rotation(quat_from_euler(0.0, elapsed.as_secs_f32() * SPIN_SPEED, 0.0));
        };
        scene.on_frame(spin);
        Ok(Box::new(scene) as Box<dyn Simulation>)
    })
    .run()
}
