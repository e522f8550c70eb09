// Send a single-wheel diagnostic pulse to a running agent
use clap::Parser;
use tracing::info;

use terre_zenoh_agent::config::TOPIC_CMD;
use terre_zenoh_agent::messages::Command;

#[derive(Parser, Debug)]
#[command(about = "Pulse one drive wheel for bench testing")]
struct Args {
    /// Wheel channel to pulse (0-3)
    #[arg(long)]
    wheel: u8,

    /// Throttle to apply; the agent defaults to a safe low value
    #[arg(long)]
    value: Option<f32>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args = Args::parse();
    let command = match args.wheel {
        0 => Command::Wheel0 { value: args.value },
        1 => Command::Wheel1 { value: args.value },
        2 => Command::Wheel2 { value: args.value },
        3 => Command::Wheel3 { value: args.value },
        other => {
            eprintln!("wheel must be 0-3, got {}", other);
            std::process::exit(1);
        }
    };

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_CMD).await?;

    info!("Sending {:?}", command);
    publisher.put(serde_json::to_string(&command)?).await?;
    session.close().await?;
    Ok(())
}
