//! OSC-style control messages.
//!
//! The relay's connectionless listener accepts OSC packets addressed
//! under a fixed namespace:
//!
//! - `/chip/mode` (string) - select the synthesis engine
//! - `/chip/trigger/<name>` (int voice) - fire a one-shot trigger
//! - `/chip/<voice>/set` (int gate, freq, wave, vol) - set a voice
//! - `/chip/<voice>/gate` (int gate) - gate a voice
//!
//! Anything else - foreign namespaces, malformed paths, out-of-range
//! voice indices, missing arguments - decodes to a [`ControlError`] the
//! listener drops without dying.

use chipstream_core::VoiceParams;
use rosc::{OscMessage, OscType};

/// First address segment every control message must carry.
pub const CONTROL_NAMESPACE: &str = "chip";

/// Number of addressable voices.
const VOICE_COUNT: i32 = 4;

/// A validated control message.
#[derive(Clone, Debug, PartialEq)]
pub enum ControlMessage {
    /// Select the active synthesis engine by name.
    Mode(String),
    /// Fire a named one-shot trigger at a voice.
    Trigger {
        /// Trigger name from the address path.
        name: String,
        /// Target voice, 0-3.
        voice: usize,
    },
    /// Replace all four registers of a voice.
    VoiceSet {
        /// Target voice, 0-3.
        voice: usize,
        /// New register values (clamped).
        params: VoiceParams,
    },
    /// Gate a voice on or off.
    VoiceGate {
        /// Target voice, 0-3.
        voice: usize,
        /// Gate value (clamped to 0/1).
        gate: u8,
    },
}

/// Reasons a control packet is dropped.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ControlError {
    /// First path segment did not match [`CONTROL_NAMESPACE`].
    #[error("address outside the control namespace: {0}")]
    ForeignNamespace(String),

    /// Address did not match any known pattern.
    #[error("malformed control address: {0}")]
    BadAddress(String),

    /// Voice index parsed but lies outside 0-3.
    #[error("voice index out of range: {0}")]
    VoiceOutOfRange(i32),

    /// Argument at the given position was missing or mistyped.
    #[error("missing or mistyped argument {1} for {0}")]
    BadArgs(String, usize),
}

fn int_arg(message: &OscMessage, position: usize) -> Result<i32, ControlError> {
    match message.args.get(position) {
        Some(OscType::Int(value)) => Ok(*value),
        Some(OscType::Long(value)) => Ok((*value).clamp(i32::MIN as i64, i32::MAX as i64) as i32),
        _ => Err(ControlError::BadArgs(message.addr.clone(), position)),
    }
}

fn string_arg(message: &OscMessage, position: usize) -> Result<String, ControlError> {
    match message.args.get(position) {
        Some(OscType::String(value)) => Ok(value.clone()),
        _ => Err(ControlError::BadArgs(message.addr.clone(), position)),
    }
}

fn voice_index(raw: i32) -> Result<usize, ControlError> {
    if (0..VOICE_COUNT).contains(&raw) {
        Ok(raw as usize)
    } else {
        Err(ControlError::VoiceOutOfRange(raw))
    }
}

/// Clamp an OSC int into a u8 register before the register-level clamp.
fn register_value(raw: i32) -> u8 {
    raw.clamp(0, u8::MAX as i32) as u8
}

impl ControlMessage {
    /// Validate and decode one OSC message.
    pub fn from_osc(message: &OscMessage) -> Result<Self, ControlError> {
        let segments: Vec<&str> = message
            .addr
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();

        let Some((&namespace, rest)) = segments.split_first() else {
            return Err(ControlError::BadAddress(message.addr.clone()));
        };
        if namespace != CONTROL_NAMESPACE {
            return Err(ControlError::ForeignNamespace(message.addr.clone()));
        }

        match rest {
            ["mode"] => Ok(ControlMessage::Mode(string_arg(message, 0)?)),

            ["trigger", name] => Ok(ControlMessage::Trigger {
                name: (*name).to_string(),
                voice: voice_index(int_arg(message, 0)?)?,
            }),

            [index, "set"] => {
                let voice = parse_voice_segment(index, &message.addr)?;
                let params = VoiceParams {
                    gate: register_value(int_arg(message, 0)?),
                    freq: register_value(int_arg(message, 1)?),
                    wave: register_value(int_arg(message, 2)?),
                    vol: register_value(int_arg(message, 3)?),
                }
                .clamped();
                Ok(ControlMessage::VoiceSet { voice, params })
            }

            [index, "gate"] => {
                let voice = parse_voice_segment(index, &message.addr)?;
                let gate = register_value(int_arg(message, 0)?).min(1);
                Ok(ControlMessage::VoiceGate { voice, gate })
            }

            _ => Err(ControlError::BadAddress(message.addr.clone())),
        }
    }
}

fn parse_voice_segment(segment: &str, addr: &str) -> Result<usize, ControlError> {
    let raw: i32 = segment
        .parse()
        .map_err(|_| ControlError::BadAddress(addr.to_string()))?;
    voice_index(raw)
}

/// Encode a voice-targeted trigger for the wire's `trig` string list.
///
/// Triggers fired from control messages name a voice; bridge-originated
/// triggers usually do not. The wire form is `name` or `name:voice`.
pub fn trigger_tag(name: &str, voice: usize) -> String {
    format!("{name}:{voice}")
}

/// Split a `trig` entry into its name and optional voice index.
pub fn parse_trigger_tag(tag: &str) -> (&str, Option<usize>) {
    match tag.rsplit_once(':') {
        Some((name, voice)) => match voice.parse() {
            Ok(index) => (name, Some(index)),
            Err(_) => (tag, None),
        },
        None => (tag, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn osc(addr: &str, args: Vec<OscType>) -> OscMessage {
        OscMessage {
            addr: addr.to_string(),
            args,
        }
    }

    #[test]
    fn mode_message_parses() {
        let message = osc("/chip/mode", vec![OscType::String("atari".into())]);
        assert_eq!(
            ControlMessage::from_osc(&message).unwrap(),
            ControlMessage::Mode("atari".into())
        );
    }

    #[test]
    fn voice_set_parses_and_clamps() {
        let message = osc(
            "/chip/2/set",
            vec![
                OscType::Int(1),
                OscType::Int(99),
                OscType::Int(-3),
                OscType::Int(300),
            ],
        );
        assert_eq!(
            ControlMessage::from_osc(&message).unwrap(),
            ControlMessage::VoiceSet {
                voice: 2,
                params: VoiceParams {
                    gate: 1,
                    freq: 31,
                    wave: 0,
                    vol: 15
                }
            }
        );
    }

    #[test]
    fn voice_gate_parses() {
        let message = osc("/chip/0/gate", vec![OscType::Int(7)]);
        assert_eq!(
            ControlMessage::from_osc(&message).unwrap(),
            ControlMessage::VoiceGate { voice: 0, gate: 1 }
        );
    }

    #[test]
    fn trigger_carries_name_and_voice() {
        let message = osc("/chip/trigger/explosion", vec![OscType::Int(3)]);
        assert_eq!(
            ControlMessage::from_osc(&message).unwrap(),
            ControlMessage::Trigger {
                name: "explosion".into(),
                voice: 3
            }
        );
    }

    #[test]
    fn out_of_range_voice_is_rejected() {
        let message = osc("/chip/4/set", vec![OscType::Int(1); 4]);
        assert_eq!(
            ControlMessage::from_osc(&message),
            Err(ControlError::VoiceOutOfRange(4))
        );

        let message = osc("/chip/-1/gate", vec![OscType::Int(1)]);
        assert_eq!(
            ControlMessage::from_osc(&message),
            Err(ControlError::VoiceOutOfRange(-1))
        );

        let message = osc("/chip/trigger/hit", vec![OscType::Int(12)]);
        assert_eq!(
            ControlMessage::from_osc(&message),
            Err(ControlError::VoiceOutOfRange(12))
        );
    }

    #[test]
    fn foreign_namespace_is_rejected() {
        let message = osc("/mixer/0/set", vec![OscType::Int(1); 4]);
        assert!(matches!(
            ControlMessage::from_osc(&message),
            Err(ControlError::ForeignNamespace(_))
        ));
    }

    #[test]
    fn malformed_addresses_are_rejected() {
        for addr in ["/chip", "/chip/frequency", "/chip/x/set", "/chip/0/warp", "/"] {
            let message = osc(addr, vec![OscType::Int(1); 4]);
            assert!(
                matches!(
                    ControlMessage::from_osc(&message),
                    Err(ControlError::BadAddress(_)) | Err(ControlError::ForeignNamespace(_))
                ),
                "{addr} should be rejected"
            );
        }
    }

    #[test]
    fn trigger_tags_round_trip() {
        assert_eq!(trigger_tag("explosion", 2), "explosion:2");
        assert_eq!(parse_trigger_tag("explosion:2"), ("explosion", Some(2)));
        assert_eq!(parse_trigger_tag("scored"), ("scored", None));
        assert_eq!(parse_trigger_tag("weird:name"), ("weird:name", None));
    }

    #[test]
    fn missing_arguments_are_rejected() {
        let message = osc("/chip/1/set", vec![OscType::Int(1), OscType::Int(2)]);
        assert_eq!(
            ControlMessage::from_osc(&message),
            Err(ControlError::BadArgs("/chip/1/set".into(), 2))
        );

        let message = osc("/chip/mode", vec![OscType::Int(1)]);
        assert!(matches!(
            ControlMessage::from_osc(&message),
            Err(ControlError::BadArgs(_, 0))
        ));
    }
}
