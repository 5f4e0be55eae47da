//! # Pallet Example
//!
//! A pallet loaded with boxes. Drag with the left mouse button to spin it.
//!
//! ## Usage:
//! ```bash
//! cargo run --example pallet             # two tiers of four boxes
//! cargo run --example pallet -- stack    # the asymmetrical stack
//! RUST_LOG=debug cargo run --example pallet
//! ```

use pallet3d::prelude::*;

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let boxes = match std::env::args().nth(1).as_deref() {
        Some("stack") => asymmetrical_stack(),
        _ => boxes_4x2(),
    };

    let config = AppConfig::default().with_title("Pallet Simulation");
    App::new(config, move |device| {
        let simulation = PalletSimulation::new(device, &boxes, PalletConfig::default())?;
        Ok(Box::new(simulation) as Box<dyn Simulation>)
    })
    .run()
}
