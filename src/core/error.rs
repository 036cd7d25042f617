use thiserror::Error;

use crate::decode::UnitId;

/// Failures reported by the table, engine and query surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectomeError {
    /// The id is outside the range accepted by the call (`0..limit`).
    #[error("unit id {id} is out of range (expected < {limit})")]
    InvalidUnitId { id: UnitId, limit: u16 },

    #[error("invalid connection table: {0}")]
    InvalidTable(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = core::result::Result<T, ConnectomeError>;
