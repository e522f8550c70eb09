// Actuator interface for the PWM servo channels
//
// The motion controller only needs "set this channel to a throttle" and
// "set this channel to an angle"; everything about pulse encoding and the
// peripheral protocol stays behind this trait.

mod pca9685;

pub use pca9685::{Pca9685, angle_to_pulse, throttle_to_pulse};

use tracing::debug;

/// Errors from the PWM controller peripheral
#[derive(Debug, thiserror::Error)]
pub enum ActuatorError {
    #[error("I2C bus error: {0}")]
    I2c(#[from] rppal::i2c::Error),

    #[error("channel {0} out of range")]
    InvalidChannel(u8),
}

/// Synchronous channel-level control of the servo hardware.
///
/// `set_throttle` drives a continuous-rotation servo: 0 means stopped,
/// sign is direction, magnitude is speed. `set_angle` drives a positional
/// servo to a target in degrees. Both complete before returning.
pub trait Actuator: Send + 'static {
    fn set_throttle(&mut self, channel: u8, throttle: f32) -> Result<(), ActuatorError>;
    fn set_angle(&mut self, channel: u8, degrees: f32) -> Result<(), ActuatorError>;
}

/// Logging stand-in for runs without the PWM hat attached (`--dry-run`)
pub struct SimActuator;

impl Actuator for SimActuator {
    fn set_throttle(&mut self, channel: u8, throttle: f32) -> Result<(), ActuatorError> {
        debug!("sim: channel {} throttle {:.2}", channel, throttle);
        Ok(())
    }

    fn set_angle(&mut self, channel: u8, degrees: f32) -> Result<(), ActuatorError> {
        debug!("sim: channel {} angle {:.1}", channel, degrees);
        Ok(())
    }
}
