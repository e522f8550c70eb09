// Keyboard teleop: WASD drive, R/F lift, space stop, Q quit
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::time::{Duration, Instant};
use tracing::info;

use terre_zenoh_agent::config::TOPIC_CMD;
use terre_zenoh_agent::messages::{Command, MoveTarget};

const HOLD_TIMEOUT: Duration = Duration::from_millis(150); // stop after key release
const LIFT_STEP: f32 = 10.0;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_CMD).await?;

    // presence token: the agent stops if this disappears mid-drive
    let _token = session.liveliness().declare_token("terre/op/teleop").await?;

    info!("Controls: WASD=drive, R/F=lift, SPACE=stop, Q=quit");

    enable_raw_mode()?;
    let result = run_teleop(&publisher).await;
    disable_raw_mode()?;

    result
}

async fn run_teleop(
    publisher: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut held: Option<&'static str> = None;
    let mut last_input = Instant::now();
    let mut lift_angle: f32 = 90.0;

    loop {
        // Poll for key with 20ms timeout (50Hz effective rate)
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;

                match code {
                    KeyCode::Char('w') if pressed => {
                        held = Some("forward");
                        last_input = Instant::now();
                    }
                    KeyCode::Char('s') if pressed => {
                        held = Some("backward");
                        last_input = Instant::now();
                    }
                    KeyCode::Char('a') if pressed => {
                        held = Some("left");
                        last_input = Instant::now();
                    }
                    KeyCode::Char('d') if pressed => {
                        held = Some("right");
                        last_input = Instant::now();
                    }

                    KeyCode::Char(' ') if pressed => {
                        held = None;
                        publish(publisher, &Command::Stop).await?;
                    }

                    KeyCode::Char('r') if pressed => {
                        lift_angle = (lift_angle + LIFT_STEP).min(180.0);
                        info!("Lift: {}", lift_angle);
                        publish(publisher, &Command::Lift { angle: lift_angle }).await?;
                    }
                    KeyCode::Char('f') if pressed => {
                        lift_angle = (lift_angle - LIFT_STEP).max(0.0);
                        info!("Lift: {}", lift_angle);
                        publish(publisher, &Command::Lift { angle: lift_angle }).await?;
                    }

                    KeyCode::Char('q') | KeyCode::Esc if pressed => break,

                    _ => {}
                }
            }
        }

        // Re-send the held direction every cycle so the agent's watchdog
        // stays fed; send one stop when the key goes stale
        match held {
            Some(direction) if last_input.elapsed() <= HOLD_TIMEOUT => {
                let cmd = Command::Move {
                    target: MoveTarget::Direction(direction.to_string()),
                };
                publish(publisher, &cmd).await?;
            }
            Some(_) => {
                held = None;
                publish(publisher, &Command::Stop).await?;
            }
            None => {}
        }
    }

    publish(publisher, &Command::Stop).await?;
    Ok(())
}

async fn publish(
    publisher: &zenoh::pubsub::Publisher<'_>,
    command: &Command,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    publisher.put(serde_json::to_string(command)?).await?;
    Ok(())
}
