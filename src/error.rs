use crate::host::{Team, UnitType};
use thiserror::Error;

/// Failure to pack values into a fixed-width channel message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("value count {values} does not match width count {widths}")]
    LengthMismatch { values: usize, widths: usize },
    #[error("field {index} is negative: {value}")]
    Negative { index: usize, value: i64 },
    #[error("field {index} value {value} does not fit in {width} bits")]
    Overflow { index: usize, value: i64, width: u32 },
    #[error("total width {total} exceeds 64 bits")]
    TooWide { total: u32 },
    #[error("field {index} is {width} bits wide, at most 63 are supported")]
    FieldTooWide { index: usize, width: u32 },
}

/// Contradictions and invalid operations against the belief store. These are
/// always logged and rejected; they never abort a turn on their own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KnowledgeError {
    #[error("identity conflict for entity {id}: known {known_team:?}/{known_unit:?}, observed {team:?}/{unit:?}")]
    IdentityConflict {
        id: u32,
        known_team: Option<Team>,
        known_unit: Option<UnitType>,
        team: Team,
        unit: UnitType,
    },
    #[error("unknown entity {0}")]
    UnknownEntity(u32),
    #[error("stale observation for entity {id}: turn {turn} is not newer than {last}")]
    StaleObservation { id: u32, turn: u32, last: u32 },
    #[error("structure {id} reported at ({x}, {y}) but is fixed at ({known_x}, {known_y})")]
    StructureMoved {
        id: u32,
        x: i32,
        y: i32,
        known_x: i32,
        known_y: i32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("dequeue from empty priority queue")]
    Empty,
}

/// Anything that can go wrong inside a single unit's turn. The orchestrator
/// catches these and returns no action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Knowledge(#[from] KnowledgeError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error("insufficient resources for {unit:?}: need {karbonite} karbonite and {fuel} fuel")]
    InsufficientResources { unit: UnitType, karbonite: u32, fuel: u32 },
}
