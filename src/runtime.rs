// Transport glue: zenoh session, command subscription, identity handshake
//
// The motion controller never sees the transport. This loop receives named
// commands, hands them to the dispatcher, and turns transport-level events
// (operator liveliness loss, channel closure, ctrl-c) into safety stops.

use tokio::time::interval;
use tracing::{debug, error, info, warn};
use zenoh::sample::SampleKind;

use crate::actuator::Actuator;
use crate::config::{
    HEALTH_PERIOD, OPERATOR_LIVELINESS, TOPIC_CMD, TOPIC_HEALTH, TOPIC_IDENTITY, WATCHDOG_WINDOW,
};
use crate::control::MotionController;
use crate::messages::{AgentHealth, Command, DeviceIdentity};

pub async fn run<A: Actuator>(
    controller: MotionController<A>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let commands = session.declare_subscriber(TOPIC_CMD).await?;
    let operators = session
        .liveliness()
        .declare_subscriber(OPERATOR_LIVELINESS)
        .await?;
    let identity_pub = session.declare_publisher(TOPIC_IDENTITY).await?;
    let health_pub = session.declare_publisher(TOPIC_HEALTH).await?;

    // identification handshake for the command station, not authentication
    let identity = DeviceIdentity::this_device();
    identity_pub.put(serde_json::to_string(&identity)?).await?;
    info!("Announced identity: {:?}", identity);

    let health_task = tokio::spawn({
        let controller = controller.clone();
        async move {
            let mut tick = interval(HEALTH_PERIOD);
            loop {
                tick.tick().await;
                let health = if controller.is_driving() {
                    AgentHealth::Driving
                } else {
                    AgentHealth::Idle
                };
                let Ok(payload) = serde_json::to_string(&health) else {
                    continue;
                };
                if health_pub.put(payload).await.is_err() {
                    break;
                }
            }
        }
    });

    info!(
        "Agent started: {}ms watchdog window, listening on {}",
        WATCHDOG_WINDOW.as_millis(),
        TOPIC_CMD
    );

    loop {
        tokio::select! {
            sample = commands.recv_async() => {
                let Ok(sample) = sample else {
                    warn!("command channel closed");
                    controller.on_disconnect().await?;
                    break;
                };
                let payload = sample.payload().to_bytes();
                match serde_json::from_slice::<Command>(&payload) {
                    Ok(command) => {
                        debug!("received {:?}", command);
                        if let Err(e) = controller.dispatch(command).await {
                            // motion state is already reset to stopped;
                            // keep serving so the operator sees the fault
                            error!("actuator error while handling command: {}", e);
                        }
                    }
                    Err(e) => warn!("failed to parse command: {}", e),
                }
            }
            sample = operators.recv_async() => {
                if let Ok(sample) = sample {
                    if sample.kind() == SampleKind::Delete {
                        warn!("operator {} gone", sample.key_expr());
                        controller.on_disconnect().await?;
                    } else {
                        info!("operator present: {}", sample.key_expr());
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                break;
            }
        }
    }

    health_task.abort();
    controller.stop_motion().await?;
    session.close().await?;
    Ok(())
}
