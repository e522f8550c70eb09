use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use terre_zenoh_agent::actuator::{Pca9685, SimActuator};
use terre_zenoh_agent::config::PCA9685_ADDRESS;
use terre_zenoh_agent::control::{MotionController, Wiring};
use terre_zenoh_agent::runtime;

#[derive(Parser, Debug)]
#[command(about = "PWM drive agent for the terrE robot")]
struct Args {
    /// I2C bus the PCA9685 servo hat is attached to
    #[arg(long, default_value_t = 1)]
    i2c_bus: u8,

    /// Wheel wiring variant of this build
    #[arg(long, value_enum, default_value_t = Wiring::Direct)]
    wiring: Wiring,

    /// Log actuator writes instead of touching hardware
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let args = Args::parse();

    let result = if args.dry_run {
        info!("Dry run: actuator writes are logged, not applied");
        runtime::run(MotionController::new(SimActuator, args.wiring)).await
    } else {
        match Pca9685::open(args.i2c_bus, PCA9685_ADDRESS) {
            Ok(pca) => runtime::run(MotionController::new(pca, args.wiring)).await,
            Err(e) => {
                eprintln!("Failed to open PWM controller: {}", e);
                std::process::exit(1);
            }
        }
    };

    if let Err(e) = result {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
