use ulid::Ulid;

use crate::model::{Ms, ReservationStatus, RoomStatus};

#[derive(Debug)]
pub enum EngineError {
    /// Zero-length or inverted window (`end <= start`).
    InvalidWindow { start: Ms, end: Ms },
    NotFound(Ulid),
    AlreadyExists(Ulid),
    /// An active reservation overlaps the requested window.
    Conflict(Ulid),
    /// Room status hard-blocks the request (Maintenance or Inactive).
    RoomUnavailable(RoomStatus),
    InvalidTransition {
        from: ReservationStatus,
        to: ReservationStatus,
    },
    /// Mutation attempted on a Rejected/Cancelled/Completed reservation.
    ReservationClosed(Ulid),
    /// Completion attempted before the reservation's window has elapsed.
    StillInProgress(Ulid),
    LimitExceeded(&'static str),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidWindow { start, end } => {
                write!(f, "invalid window [{start}, {end}): end must be after start")
            }
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::AlreadyExists(id) => write!(f, "already exists: {id}"),
            EngineError::Conflict(id) => write!(f, "conflict with reservation: {id}"),
            EngineError::RoomUnavailable(status) => {
                write!(f, "room unavailable: status is {status:?}")
            }
            EngineError::InvalidTransition { from, to } => {
                write!(f, "invalid transition: {from:?} -> {to:?}")
            }
            EngineError::ReservationClosed(id) => {
                write!(f, "reservation already finalized: {id}")
            }
            EngineError::StillInProgress(id) => {
                write!(f, "reservation window has not elapsed yet: {id}")
            }
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
