use super::*;
use crate::codec;
use crate::error::EncodingError;
use crate::host::{Direction, Position, UnitMask};
use serde::{Deserialize, Serialize};

pub const RADIO_BITS: u32 = 16;

const HEADER_BITS: u32 = 3;
const BODY_BITS: u32 = RADIO_BITS - HEADER_BITS;

const HEADER_EVENT: i64 = 0;
const HEADER_HOLD: i64 = 1;
const HEADER_REPULSE: i64 = 2;
const HEADER_CHARGE: i64 = 3;
const HEADER_TARGET_LIST: i64 = 4;
const HEADER_ORDER: i64 = 5;
const HEADER_SCOUT_REPORT: i64 = 6;
const HEADER_TARGET_ON_CONSTRUCT: i64 = 7;

const ENTITY_ID_BITS: u32 = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    Mine,
    Construct,
}

/// Short-range tactical radio messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RadioMessage {
    /// Unrecognised header; carries no payload.
    Event,
    Hold { position: Position },
    Repulse { position: Position },
    Charge { units: UnitMask, direction: Direction },
    TargetList { clear: bool, target: u32 },
    Order { kind: OrderKind, position: Position },
    /// Sent by scouts: their own position and whether hostiles are in sight.
    ScoutReport { hostile: bool, position: Position },
    TargetOnConstruct { mirror: bool, position: Position },
}

impl RadioMessage {
    pub fn encode(&self) -> Result<u16, EncodingError> {
        let (header, values, widths): (i64, Vec<i64>, &[u32]) = match self {
            RadioMessage::Event => (HEADER_EVENT, vec![0], &[BODY_BITS][..]),
            RadioMessage::Hold { position } => (HEADER_HOLD, position_fields(*position), &POSITION_PADDED[..]),
            RadioMessage::Repulse { position } => (HEADER_REPULSE, position_fields(*position), &POSITION_PADDED[..]),
            RadioMessage::Charge { units, direction } => (
                HEADER_CHARGE,
                vec![units.bits() as i64, direction.index() as i64, 0],
                &CHARGE_LAYOUT[..],
            ),
            RadioMessage::TargetList { clear, target } => {
                (HEADER_TARGET_LIST, vec![*clear as i64, *target as i64], &TARGET_LIST_LAYOUT[..])
            }
            RadioMessage::Order { kind, position } => {
                let flag = matches!(kind, OrderKind::Construct) as i64;
                (HEADER_ORDER, flagged_position_fields(flag, *position), &FLAGGED_POSITION[..])
            }
            RadioMessage::ScoutReport { hostile, position } => (
                HEADER_SCOUT_REPORT,
                flagged_position_fields(*hostile as i64, *position),
                &FLAGGED_POSITION[..],
            ),
            RadioMessage::TargetOnConstruct { mirror, position } => (
                HEADER_TARGET_ON_CONSTRUCT,
                flagged_position_fields(*mirror as i64, *position),
                &FLAGGED_POSITION[..],
            ),
        };

        let body = codec::encode(&values, widths)?;
        let message = codec::encode(&[header, body as i64], &[HEADER_BITS, BODY_BITS])?;

        Ok(message as u16)
    }

    pub fn decode(value: u16) -> RadioMessage {
        let parts = codec::decode(value as u64, &[HEADER_BITS, BODY_BITS]);
        let (header, body) = (parts[0], parts[1] as u64);

        match header {
            HEADER_HOLD => RadioMessage::Hold {
                position: decode_position(body),
            },
            HEADER_REPULSE => RadioMessage::Repulse {
                position: decode_position(body),
            },
            HEADER_CHARGE => {
                let fields = codec::decode(body, &CHARGE_LAYOUT);
                let units = UnitMask::from_bits_truncate(fields[0] as u8);

                match Direction::from_index(fields[1] as u8) {
                    Some(direction) => RadioMessage::Charge { units, direction },
                    None => RadioMessage::Event,
                }
            }
            HEADER_TARGET_LIST => {
                let fields = codec::decode(body, &TARGET_LIST_LAYOUT[..]);
                RadioMessage::TargetList {
                    clear: fields[0] == 1,
                    target: fields[1] as u32,
                }
            }
            HEADER_ORDER => {
                let fields = codec::decode(body, &FLAGGED_POSITION[..]);
                let kind = if fields[0] == 1 { OrderKind::Construct } else { OrderKind::Mine };
                RadioMessage::Order {
                    kind,
                    position: Position::new(fields[1] as i32, fields[2] as i32),
                }
            }
            HEADER_SCOUT_REPORT => {
                let fields = codec::decode(body, &FLAGGED_POSITION[..]);
                RadioMessage::ScoutReport {
                    hostile: fields[0] == 1,
                    position: Position::new(fields[1] as i32, fields[2] as i32),
                }
            }
            HEADER_TARGET_ON_CONSTRUCT => {
                let fields = codec::decode(body, &FLAGGED_POSITION[..]);
                RadioMessage::TargetOnConstruct {
                    mirror: fields[0] == 1,
                    position: Position::new(fields[1] as i32, fields[2] as i32),
                }
            }
            _ => RadioMessage::Event,
        }
    }

    /// Arbitration priority of a received order when several arrive in the
    /// same turn. Higher wins.
    pub fn priority(&self) -> u32 {
        match self {
            RadioMessage::Event => MESSAGE_PRIORITY_NONE,
            RadioMessage::ScoutReport { .. } => MESSAGE_PRIORITY_LOW,
            RadioMessage::Order { .. } => MESSAGE_PRIORITY_LOW,
            RadioMessage::Hold { .. } => MESSAGE_PRIORITY_MEDIUM,
            RadioMessage::TargetOnConstruct { .. } => MESSAGE_PRIORITY_MEDIUM + 5,
            RadioMessage::Repulse { .. } => MESSAGE_PRIORITY_HIGH,
            RadioMessage::TargetList { .. } => MESSAGE_PRIORITY_HIGH + 5,
            RadioMessage::Charge { .. } => MESSAGE_PRIORITY_CRITICAL,
        }
    }

    /// Whether the message carries the sender's own location.
    pub fn sender_position(&self) -> Option<Position> {
        match self {
            RadioMessage::ScoutReport { position, .. } => Some(*position),
            _ => None,
        }
    }
}

const POSITION_PADDED: [u32; 3] = [COORDINATE_BITS, COORDINATE_BITS, 1];
const FLAGGED_POSITION: [u32; 3] = [1, COORDINATE_BITS, COORDINATE_BITS];
const CHARGE_LAYOUT: [u32; 3] = [3, 3, 7];
const TARGET_LIST_LAYOUT: [u32; 2] = [1, ENTITY_ID_BITS];

fn position_fields(position: Position) -> Vec<i64> {
    vec![position.x as i64, position.y as i64, 0]
}

fn flagged_position_fields(flag: i64, position: Position) -> Vec<i64> {
    vec![flag, position.x as i64, position.y as i64]
}

fn decode_position(body: u64) -> Position {
    let fields = codec::decode(body, &POSITION_PADDED);

    Position::new(fields[0] as i32, fields[1] as i32)
}
