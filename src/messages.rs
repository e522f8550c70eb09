// Wire types exchanged with the remote command source (JSON over zenoh)

use serde::{Deserialize, Serialize};

use crate::config::{DEVICE_TYPE, DEVICE_UNIT};

/// Inbound command, tagged by name:
/// `{"cmd":"move","target":"forward"}`,
/// `{"cmd":"move","target":[0.5,-0.5,0.5,-0.5]}`,
/// `{"cmd":"stop"}`, `{"cmd":"lift","angle":90}`,
/// `{"cmd":"0","value":0.5}` .. `{"cmd":"3"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    Move { target: MoveTarget },
    Stop,
    Lift { angle: f32 },
    #[serde(rename = "0")]
    Wheel0 { value: Option<f32> },
    #[serde(rename = "1")]
    Wheel1 { value: Option<f32> },
    #[serde(rename = "2")]
    Wheel2 { value: Option<f32> },
    #[serde(rename = "3")]
    Wheel3 { value: Option<f32> },
}

/// Move payload: a preset direction name or a raw per-wheel throttle vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MoveTarget {
    Direction(String),
    Wheels([f32; 4]),
}

/// Identity record announced to the command source on connect.
/// Field names match what the control station expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIdentity {
    pub device_type: String,
    pub unit: String,
}

impl DeviceIdentity {
    pub fn this_device() -> Self {
        Self {
            device_type: DEVICE_TYPE.to_string(),
            unit: DEVICE_UNIT.to_string(),
        }
    }
}

/// Health status published periodically by the agent
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum AgentHealth {
    Idle,
    Driving,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_move_direction() {
        let cmd: Command = serde_json::from_str(r#"{"cmd":"move","target":"forward"}"#).unwrap();
        match cmd {
            Command::Move {
                target: MoveTarget::Direction(name),
            } => assert_eq!(name, "forward"),
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn test_parse_move_wheels() {
        let cmd: Command =
            serde_json::from_str(r#"{"cmd":"move","target":[0.5,-0.5,0.5,-0.5]}"#).unwrap();
        match cmd {
            Command::Move {
                target: MoveTarget::Wheels(v),
            } => assert_eq!(v, [0.5, -0.5, 0.5, -0.5]),
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn test_parse_stop_and_lift() {
        assert!(matches!(
            serde_json::from_str::<Command>(r#"{"cmd":"stop"}"#).unwrap(),
            Command::Stop
        ));
        match serde_json::from_str::<Command>(r#"{"cmd":"lift","angle":42.5}"#).unwrap() {
            Command::Lift { angle } => assert_eq!(angle, 42.5),
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn test_parse_diagnostic_commands() {
        match serde_json::from_str::<Command>(r#"{"cmd":"0","value":0.25}"#).unwrap() {
            Command::Wheel0 { value } => assert_eq!(value, Some(0.25)),
            other => panic!("unexpected parse: {:?}", other),
        }
        // value is optional
        assert!(matches!(
            serde_json::from_str::<Command>(r#"{"cmd":"3"}"#).unwrap(),
            Command::Wheel3 { value: None }
        ));
    }

    #[test]
    fn test_identity_uses_station_field_names() {
        let json = serde_json::to_string(&DeviceIdentity::this_device()).unwrap();
        assert!(json.contains("\"deviceType\":\"terrE\""));
        assert!(json.contains("\"unit\""));
    }
}
