//! roomkeeper — an in-memory room-reservation engine.
//!
//! The core is a pure availability check over half-open time windows
//! ([`engine::is_available`], [`engine::find_conflicts`],
//! [`engine::find_available_rooms`]); around it sits an async registry
//! ([`engine::Engine`]) that owns rooms, enforces the reservation lifecycle,
//! schedules maintenance, and broadcasts change events. Durable storage and
//! any wire/HTTP surface are the embedding application's job.

pub mod engine;
pub mod limits;
pub mod model;
pub mod notify;
pub mod observability;
pub mod sweeper;

pub use engine::{Engine, EngineError};
pub use model::{
    Event, Ms, Reservation, ReservationStatus, RoomInfo, RoomStatus, Window,
};
pub use notify::NotifyHub;
