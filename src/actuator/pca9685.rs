// PCA9685 16-channel PWM controller over I2C
//
// Register-level driver for the servo hat: reset, prescaler setup for the
// servo frame rate, and per-channel on/off pulse writes. Servos expect a
// 50Hz frame with pulse widths between ~0.7ms and ~2.9ms, expressed here
// in 12-bit steps of the 4096-step frame.

use std::thread;
use std::time::Duration;

use rppal::i2c::I2c;
use tracing::{debug, info};

use super::{Actuator, ActuatorError};

// Register map
const MODE1: u8 = 0x00;
const PRESCALE: u8 = 0xFE;
const LED0_ON_L: u8 = 0x06;

// MODE1 bits
const MODE1_SLEEP: u8 = 0x10;
const MODE1_RESTART_AI: u8 = 0xA0; // restart + register auto-increment

// 25MHz internal oscillator, 12-bit resolution
const OSC_CLOCK_HZ: f64 = 25_000_000.0;
const FRAME_STEPS: f64 = 4096.0;

// Pulse limits in frame steps (out of 4096 at 50Hz)
pub const SERVO_MIN_PULSE: u16 = 150;
pub const SERVO_MAX_PULSE: u16 = 600;
pub const SERVO_NEUTRAL_PULSE: u16 = 375; // ~1.5ms, continuous servo stopped

const CHANNELS: u8 = 16;

/// Convert a throttle in [-1, 1] to a pulse width in frame steps.
/// Neutral-centered, half the neutral-to-max span per unit of throttle.
pub fn throttle_to_pulse(throttle: f32) -> u16 {
    let throttle = throttle.clamp(-1.0, 1.0);
    let span = (SERVO_MAX_PULSE - SERVO_NEUTRAL_PULSE) as f32;
    (SERVO_NEUTRAL_PULSE as f32 + throttle * span / 2.0) as u16
}

/// Convert an angle in [0, 180] degrees to a pulse width in frame steps.
pub fn angle_to_pulse(degrees: f32) -> u16 {
    let degrees = degrees.clamp(0.0, 180.0);
    let span = (SERVO_MAX_PULSE - SERVO_MIN_PULSE) as f32;
    SERVO_MIN_PULSE + (degrees / 180.0 * span) as u16
}

/// Prescaler value for a target PWM frequency
fn prescale_for(freq_hz: f64) -> u8 {
    (OSC_CLOCK_HZ / (FRAME_STEPS * freq_hz)).round() as u8 - 1
}

/// A throttle of exactly 0 releases the channel (no pulse at all) instead
/// of driving the neutral pulse; continuous servos can creep around neutral.
fn drive_pulse(throttle: f32) -> Option<u16> {
    if throttle == 0.0 {
        None
    } else {
        Some(throttle_to_pulse(throttle))
    }
}

/// PCA9685 driver bound to one I2C address
pub struct Pca9685 {
    i2c: I2c,
}

impl Pca9685 {
    /// Open the controller on the given I2C bus and initialize it:
    /// reset, set the servo frame rate, and release all channels.
    pub fn open(bus: u8, address: u16) -> Result<Self, ActuatorError> {
        info!("Opening PCA9685 at 0x{:02X} on /dev/i2c-{}", address, bus);
        let mut i2c = I2c::with_bus(bus)?;
        i2c.set_slave_address(address)?;

        let mut dev = Self { i2c };
        dev.write_register(MODE1, 0x00)?;
        thread::sleep(Duration::from_millis(50)); // reset settle time
        dev.set_frequency(crate::config::PWM_FREQUENCY_HZ)?;
        for channel in 0..CHANNELS {
            dev.set_pwm(channel, 0, 0)?;
        }
        info!("PCA9685 initialized");
        Ok(dev)
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), ActuatorError> {
        self.i2c.smbus_write_byte(register, value)?;
        Ok(())
    }

    fn read_register(&mut self, register: u8) -> Result<u8, ActuatorError> {
        Ok(self.i2c.smbus_read_byte(register)?)
    }

    /// Set the PWM frame frequency. The prescaler can only be written while
    /// the oscillator sleeps, so the previous mode is saved and restored.
    pub fn set_frequency(&mut self, freq_hz: f64) -> Result<(), ActuatorError> {
        let prescale = prescale_for(freq_hz);
        debug!("Setting PWM frequency to {}Hz (prescale {})", freq_hz, prescale);

        let old_mode = self.read_register(MODE1)?;
        self.write_register(MODE1, (old_mode & 0x7F) | MODE1_SLEEP)?;
        self.write_register(PRESCALE, prescale)?;
        self.write_register(MODE1, old_mode)?;
        thread::sleep(Duration::from_millis(5)); // oscillator wake-up
        self.write_register(MODE1, old_mode | MODE1_RESTART_AI)
    }

    /// Write the on/off step counts for one channel. `(0, 0)` releases the
    /// channel entirely.
    pub fn set_pwm(&mut self, channel: u8, on: u16, off: u16) -> Result<(), ActuatorError> {
        if channel >= CHANNELS {
            return Err(ActuatorError::InvalidChannel(channel));
        }
        let base = LED0_ON_L + 4 * channel;
        self.write_register(base, (on & 0xFF) as u8)?;
        self.write_register(base + 1, (on >> 8) as u8)?;
        self.write_register(base + 2, (off & 0xFF) as u8)?;
        self.write_register(base + 3, (off >> 8) as u8)
    }
}

impl Actuator for Pca9685 {
    fn set_throttle(&mut self, channel: u8, throttle: f32) -> Result<(), ActuatorError> {
        match drive_pulse(throttle) {
            None => self.set_pwm(channel, 0, 0),
            Some(pulse) => self.set_pwm(channel, 0, pulse),
        }
    }

    fn set_angle(&mut self, channel: u8, degrees: f32) -> Result<(), ActuatorError> {
        self.set_pwm(channel, 0, angle_to_pulse(degrees))
    }
}
