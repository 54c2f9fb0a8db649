use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Ball coordinate sent by a robot that had no ball signal this tick.
pub const NO_BALL: f32 = -100.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("{kind} packet must be {expected} bytes, got {actual}")]
    Length {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{kind} packet has a non-finite {field}")]
    NonFinite {
        kind: &'static str,
        field: &'static str,
    },
}

/// A fixed-layout message exchanged over one of the radio channels.
pub trait Packet: Sized {
    /// Name used in log messages.
    const KIND: &'static str;

    fn encode(&self) -> Bytes;

    fn decode(packet: &[u8]) -> Result<Self, CodecError>;
}

/// State a robot broadcasts to its teammates every tick.
///
/// Encoded as a little-endian `i32` followed by five little-endian `f32`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeamMessage {
    pub sender_id: i32,
    pub x: f32,
    pub y: f32,
    pub heading: f32,
    pub ball_x: f32,
    pub ball_y: f32,
}

impl TeamMessage {
    pub const LEN: usize = 24;

    /// Whether the message carries a ball position.
    pub fn has_ball(&self) -> bool {
        self.ball_x != NO_BALL && self.ball_y != NO_BALL
    }
}

impl Packet for TeamMessage {
    const KIND: &'static str = "team";

    fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(Self::LEN);
        buf.put_i32_le(self.sender_id);
        buf.put_f32_le(self.x);
        buf.put_f32_le(self.y);
        buf.put_f32_le(self.heading);
        buf.put_f32_le(self.ball_x);
        buf.put_f32_le(self.ball_y);
        buf.freeze()
    }

    fn decode(mut packet: &[u8]) -> Result<Self, CodecError> {
        if packet.len() != Self::LEN {
            return Err(CodecError::Length {
                kind: Self::KIND,
                expected: Self::LEN,
                actual: packet.len(),
            });
        }
        let msg = TeamMessage {
            sender_id: packet.get_i32_le(),
            x: packet.get_f32_le(),
            y: packet.get_f32_le(),
            heading: packet.get_f32_le(),
            ball_x: packet.get_f32_le(),
            ball_y: packet.get_f32_le(),
        };
        for (field, value) in [
            ("x", msg.x),
            ("y", msg.y),
            ("heading", msg.heading),
            ("ball_x", msg.ball_x),
            ("ball_y", msg.ball_y),
        ] {
            if !value.is_finite() {
                return Err(CodecError::NonFinite {
                    kind: Self::KIND,
                    field,
                });
            }
        }
        Ok(msg)
    }
}

/// The referee's per-tick broadcast to all robots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorMessage {
    pub waiting_for_kickoff: bool,
}

impl Packet for SupervisorMessage {
    const KIND: &'static str = "supervisor";

    fn encode(&self) -> Bytes {
        Bytes::copy_from_slice(&[self.waiting_for_kickoff as u8])
    }

    fn decode(packet: &[u8]) -> Result<Self, CodecError> {
        match packet {
            // Any non-zero byte reads as true
            [byte] => Ok(SupervisorMessage {
                waiting_for_kickoff: *byte != 0,
            }),
            _ => Err(CodecError::Length {
                kind: Self::KIND,
                expected: 1,
                actual: packet.len(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TeamMessage {
        TeamMessage {
            sender_id: 2,
            x: 0.25,
            y: -0.5,
            heading: 1.5,
            ball_x: NO_BALL,
            ball_y: NO_BALL,
        }
    }

    #[test]
    fn team_message_layout() {
        let bytes = sample().encode();
        assert_eq!(bytes.len(), TeamMessage::LEN);
        assert_eq!(&bytes[..4], &2i32.to_le_bytes());
        assert_eq!(&bytes[4..8], &0.25f32.to_le_bytes());
        assert_eq!(&bytes[20..], &(-100f32).to_le_bytes());
        assert_eq!(TeamMessage::decode(&bytes), Ok(sample()));
        assert!(!sample().has_ball());
    }

    #[test]
    fn rejects_bad_lengths() {
        let bytes = sample().encode();
        assert!(matches!(
            TeamMessage::decode(&bytes[..20]),
            Err(CodecError::Length { actual: 20, .. })
        ));
        assert!(SupervisorMessage::decode(&[]).is_err());
        assert!(SupervisorMessage::decode(&[1, 0]).is_err());
    }

    #[test]
    fn rejects_nan() {
        let mut msg = sample();
        msg.heading = f32::NAN;
        assert_eq!(
            TeamMessage::decode(&msg.encode()),
            Err(CodecError::NonFinite {
                kind: "team",
                field: "heading"
            })
        );
    }

    #[test]
    fn supervisor_flag() {
        let msg = SupervisorMessage {
            waiting_for_kickoff: true,
        };
        assert_eq!(msg.encode().as_ref(), &[1]);
        assert_eq!(SupervisorMessage::decode(&[0]).map(|m| m.waiting_for_kickoff), Ok(false));
        assert_eq!(SupervisorMessage::decode(&[7]).map(|m| m.waiting_for_kickoff), Ok(true));
    }
}
