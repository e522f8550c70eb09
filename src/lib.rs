// Remote motor-control agent for the terrE wheeled/lift robot.
//
// Commands arrive as JSON over zenoh and are translated into PWM output on
// a PCA9685 servo hat: four continuous-rotation drive wheels plus one
// positional lift servo.

pub mod actuator;
pub mod config;
pub mod control;
pub mod messages;
pub mod runtime;
