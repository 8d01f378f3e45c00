use super::*;
use crate::codec;
use crate::error::EncodingError;
use crate::host::{Position, UnitType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const STATUS_BITS: u32 = 8;

const HEADER_BITS: u32 = 2;
const PAYLOAD_BITS: u32 = STATUS_BITS - HEADER_BITS;

const HEADER_HEARTBEAT: i64 = 0;
const HEADER_COORDINATE_X: i64 = 1;
const HEADER_COORDINATE_Y: i64 = 2;
const HEADER_BID: i64 = 3;

const HEARTBEAT_LAYOUT: [u32; 2] = [3, 3];

/// Long-range, low-bandwidth status messages. Anything wider than one part
/// (positions) is split across consecutive turns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusMessage {
    /// Silence or an unrecognised value.
    Event,
    Heartbeat { unit: UnitType, state: u8 },
    CoordinateX(u8),
    CoordinateY(u8),
    Bid(u8),
}

impl StatusMessage {
    pub fn encode(&self) -> Result<u8, EncodingError> {
        let (header, payload) = match self {
            StatusMessage::Event => (HEADER_HEARTBEAT, 0),
            StatusMessage::Heartbeat { unit, state } => (
                HEADER_HEARTBEAT,
                codec::encode(&[unit.index() as i64 + 1, *state as i64], &HEARTBEAT_LAYOUT)? as i64,
            ),
            StatusMessage::CoordinateX(x) => (HEADER_COORDINATE_X, *x as i64),
            StatusMessage::CoordinateY(y) => (HEADER_COORDINATE_Y, *y as i64),
            StatusMessage::Bid(value) => (HEADER_BID, *value as i64),
        };

        let message = codec::encode(&[header, payload], &[HEADER_BITS, PAYLOAD_BITS])?;

        Ok(message as u8)
    }

    pub fn decode(value: u8) -> StatusMessage {
        let parts = codec::decode(value as u64, &[HEADER_BITS, PAYLOAD_BITS]);
        let (header, payload) = (parts[0], parts[1]);

        match header {
            HEADER_HEARTBEAT => {
                let fields = codec::decode(payload as u64, &HEARTBEAT_LAYOUT);

                match fields[0].checked_sub(1).and_then(|i| UnitType::from_index(i as u8)) {
                    Some(unit) => StatusMessage::Heartbeat {
                        unit,
                        state: fields[1] as u8,
                    },
                    None => StatusMessage::Event,
                }
            }
            HEADER_COORDINATE_X => StatusMessage::CoordinateX(payload as u8),
            HEADER_COORDINATE_Y => StatusMessage::CoordinateY(payload as u8),
            HEADER_BID => StatusMessage::Bid(payload as u8),
            _ => StatusMessage::Event,
        }
    }

    /// A position as a two-part status message.
    pub fn position(position: Position) -> Result<[StatusMessage; 2], EncodingError> {
        let max = (1i32 << COORDINATE_BITS) - 1;

        for (index, value) in [position.x, position.y].iter().enumerate() {
            if *value < 0 {
                return Err(EncodingError::Negative {
                    index,
                    value: *value as i64,
                });
            }

            if *value > max {
                return Err(EncodingError::Overflow {
                    index,
                    value: *value as i64,
                    width: COORDINATE_BITS,
                });
            }
        }

        Ok([
            StatusMessage::CoordinateX(position.x as u8),
            StatusMessage::CoordinateY(position.y as u8),
        ])
    }
}

/// Reassembles two-part positions sent over the status channel. Keeps at most
/// one dangling X coordinate per sender.
#[derive(Clone, Debug, Default)]
pub struct StatusAssembler {
    pending_x: HashMap<u32, u8>,
}

impl StatusAssembler {
    pub fn new() -> StatusAssembler {
        StatusAssembler::default()
    }

    /// Feeds one received part. Returns a completed position when this part
    /// finishes a message from `sender`.
    pub fn accept(&mut self, sender: u32, message: StatusMessage) -> Option<Position> {
        match message {
            StatusMessage::CoordinateX(x) => {
                self.pending_x.insert(sender, x);
                None
            }
            StatusMessage::CoordinateY(y) => self
                .pending_x
                .remove(&sender)
                .map(|x| Position::new(x as i32, y as i32)),
            _ => None,
        }
    }

    /// Drops partial messages from senders that are no longer around.
    pub fn retain_senders<F>(&mut self, mut alive: F)
    where
        F: FnMut(u32) -> bool,
    {
        self.pending_x.retain(|sender, _| alive(*sender));
    }

    pub fn pending(&self) -> usize {
        self.pending_x.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_silence() {
        assert_eq!(StatusMessage::decode(0), StatusMessage::Event);
        assert_eq!(StatusMessage::Event.encode(), Ok(0));
    }

    #[test]
    fn heartbeat_is_never_zero() {
        let heartbeat = StatusMessage::Heartbeat {
            unit: UnitType::Castle,
            state: 0,
        };
        let encoded = heartbeat.encode().unwrap();

        assert_ne!(encoded, 0);
        assert_eq!(StatusMessage::decode(encoded), heartbeat);
    }

    #[test]
    fn variants_decode_to_themselves() {
        for message in [
            StatusMessage::Heartbeat {
                unit: UnitType::Preacher,
                state: 7,
            },
            StatusMessage::CoordinateX(63),
            StatusMessage::CoordinateY(0),
            StatusMessage::Bid(17),
        ] {
            assert_eq!(StatusMessage::decode(message.encode().unwrap()), message);
        }
    }

    #[test]
    fn oversized_payload_fails() {
        assert!(StatusMessage::CoordinateX(64).encode().is_err());
        assert!(StatusMessage::position(Position::new(3, 70)).is_err());
    }

    #[test]
    fn assembler_pairs_parts_per_sender() {
        let mut assembler = StatusAssembler::new();

        assert_eq!(assembler.accept(1, StatusMessage::CoordinateX(10)), None);
        assert_eq!(assembler.accept(2, StatusMessage::CoordinateX(20)), None);
        assert_eq!(assembler.accept(2, StatusMessage::CoordinateY(21)), Some(Position::new(20, 21)));
        assert_eq!(assembler.accept(1, StatusMessage::CoordinateY(11)), Some(Position::new(10, 11)));

        // A Y without a preceding X is dropped.
        assert_eq!(assembler.accept(3, StatusMessage::CoordinateY(5)), None);
        assert_eq!(assembler.pending(), 0);
    }
}
