//! Control protocol types shared between the relay client and the control server.
//!
//! Every message is one JSON object sent as a WebSocket text frame.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Commands sent from the relay to the control service
#[derive(Clone, Debug, PartialEq)]
pub enum OutboundCommand {
    MoveAbsolute { x: f32, y: f32, is_percentage: bool },
    MoveRelative { x: f32, y: f32, is_percentage: bool },
    GetScreenInfo,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum MoveKind {
    #[default]
    Absolute,
    Relative,
}

/// `{"command": "move", "type": ...}` layout of [`OutboundCommand`]
#[derive(Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
enum WireCommand {
    Move {
        #[serde(rename = "type", default)]
        kind: MoveKind,
        #[serde(default)]
        x: f32,
        #[serde(default)]
        y: f32,
        #[serde(rename = "isPercentage", default)]
        is_percentage: bool,
    },
    GetScreenInfo,
}

impl Serialize for OutboundCommand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match *self {
            OutboundCommand::MoveAbsolute { x, y, is_percentage } => WireCommand::Move {
                kind: MoveKind::Absolute,
                x,
                y,
                is_percentage,
            },
            OutboundCommand::MoveRelative { x, y, is_percentage } => WireCommand::Move {
                kind: MoveKind::Relative,
                x,
                y,
                is_percentage,
            },
            OutboundCommand::GetScreenInfo => WireCommand::GetScreenInfo,
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OutboundCommand {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match WireCommand::deserialize(deserializer)? {
            WireCommand::Move {
                kind: MoveKind::Absolute,
                x,
                y,
                is_percentage,
            } => OutboundCommand::MoveAbsolute { x, y, is_percentage },
            WireCommand::Move {
                kind: MoveKind::Relative,
                x,
                y,
                is_percentage,
            } => OutboundCommand::MoveRelative { x, y, is_percentage },
            WireCommand::GetScreenInfo => OutboundCommand::GetScreenInfo,
        })
    }
}

impl OutboundCommand {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).with_context(|| format!("failed to encode {self:?}"))
    }

    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).with_context(|| format!("invalid command `{text}`"))
    }
}

/// Notifications sent from the control service to the relay
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundNotification {
    Position {
        x: f64,
        y: f64,
        #[serde(
            rename = "screenWidth",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        screen_width: Option<f64>,
        #[serde(
            rename = "screenHeight",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        screen_height: Option<f64>,
    },
    ScreenInfo {
        width: f64,
        height: f64,
    },
}

impl InboundNotification {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).with_context(|| format!("failed to encode {self:?}"))
    }

    /// Fails for malformed JSON and for unknown `type` values alike.
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).with_context(|| format!("unrecognized notification `{text}`"))
    }
}

/// Last cursor position reported by the control service, in screen pixels
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MousePosition {
    pub x: f64,
    pub y: f64,
}

/// Bounds of the remote display, in pixels
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScreenInfo {
    pub width: f64,
    pub height: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn encoded(cmd: OutboundCommand) -> Value {
        serde_json::from_str(&cmd.to_json().unwrap()).unwrap()
    }

    #[test]
    fn test_outbound_wire_format() {
        assert_eq!(
            encoded(OutboundCommand::MoveAbsolute {
                x: 25.0,
                y: 50.0,
                is_percentage: true
            }),
            json!({"command": "move", "type": "absolute", "x": 25.0, "y": 50.0, "isPercentage": true})
        );
        assert_eq!(
            encoded(OutboundCommand::MoveRelative {
                x: -4.0,
                y: 2.5,
                is_percentage: false
            }),
            json!({"command": "move", "type": "relative", "x": -4.0, "y": 2.5, "isPercentage": false})
        );
        assert_eq!(
            OutboundCommand::GetScreenInfo.to_json().unwrap(),
            r#"{"command":"get_screen_info"}"#
        );
    }

    #[test]
    fn test_outbound_defaults() {
        assert_eq!(
            OutboundCommand::parse(r#"{"command":"move","x":3}"#).unwrap(),
            OutboundCommand::MoveAbsolute {
                x: 3.0,
                y: 0.0,
                is_percentage: false
            }
        );
        assert!(OutboundCommand::parse(r#"{"command":"click"}"#).is_err());
    }

    #[test]
    fn test_inbound_parse() {
        assert_eq!(
            InboundNotification::parse(r#"{"type":"position","x":10,"y":20}"#).unwrap(),
            InboundNotification::Position {
                x: 10.0,
                y: 20.0,
                screen_width: None,
                screen_height: None
            }
        );
        assert_eq!(
            InboundNotification::parse(
                r#"{"type":"position","x":1,"y":2,"screenWidth":1920,"screenHeight":1080}"#
            )
            .unwrap(),
            InboundNotification::Position {
                x: 1.0,
                y: 2.0,
                screen_width: Some(1920.0),
                screen_height: Some(1080.0)
            }
        );
        assert_eq!(
            InboundNotification::parse(r#"{"type":"screen_info","width":1920,"height":1080}"#)
                .unwrap(),
            InboundNotification::ScreenInfo {
                width: 1920.0,
                height: 1080.0
            }
        );
    }

    #[test]
    fn test_inbound_fractional_dimensions() {
        assert_eq!(
            InboundNotification::parse(r#"{"type":"screen_info","width":1920.0,"height":1080.5}"#)
                .unwrap(),
            InboundNotification::ScreenInfo {
                width: 1920.0,
                height: 1080.5
            }
        );
        assert_eq!(
            InboundNotification::parse(
                r#"{"type":"position","x":12.5,"y":40,"screenWidth":1920.0,"screenHeight":1080.0}"#
            )
            .unwrap(),
            InboundNotification::Position {
                x: 12.5,
                y: 40.0,
                screen_width: Some(1920.0),
                screen_height: Some(1080.0)
            }
        );
    }

    #[test]
    fn test_inbound_rejects_unknown() {
        assert!(InboundNotification::parse(r#"{"type":"foo"}"#).is_err());
        assert!(InboundNotification::parse("not json").is_err());
        assert!(InboundNotification::parse(r#"{"type":"screen_info"}"#).is_err());
    }
}
