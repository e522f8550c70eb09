// Direction presets and wheel wiring variants
//
// A preset direction maps to a fixed per-wheel throttle vector. The two
// tables reflect the two physical builds in circulation: on the `direct`
// build all four wheels share the same polarity, on the `mirrored` build
// wheels 1 and 3 are mounted flipped and run inverted at half throttle.

use std::fmt;
use std::str::FromStr;

/// Named drive direction resolved from a `move` command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown direction {0:?}")]
pub struct UnknownDirection(pub String);

impl FromStr for Direction {
    type Err = UnknownDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(Direction::Forward),
            "backward" => Ok(Direction::Backward),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            other => Err(UnknownDirection(other.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
            Direction::Left => "left",
            Direction::Right => "right",
        };
        f.write_str(name)
    }
}

/// Wheel wiring variant of the running build, selected at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Wiring {
    /// All wheels share one polarity, full throttle presets
    Direct,
    /// Wheels 1 and 3 mounted flipped, half throttle presets
    Mirrored,
}

impl Wiring {
    /// Throttle vector for a preset direction under this wiring
    pub fn preset(self, direction: Direction) -> [f32; 4] {
        match self {
            Wiring::Direct => match direction {
                Direction::Forward => [1.0, 1.0, 1.0, 1.0],
                Direction::Backward => [-1.0, -1.0, -1.0, -1.0],
                Direction::Left => [0.5, 1.0, 0.5, 1.0],
                Direction::Right => [1.0, 0.5, 1.0, 0.5],
            },
            Wiring::Mirrored => match direction {
                Direction::Forward => [0.5, -0.5, 0.5, -0.5],
                Direction::Backward => [-0.5, 0.5, -0.5, 0.5],
                Direction::Left => [0.5, 0.5, 0.5, 0.5],
                Direction::Right => [-0.5, -0.5, -0.5, -0.5],
            },
        }
    }
}
