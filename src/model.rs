use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unix milliseconds — the only time type.
pub type Ms = i64;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: Ms,
    pub end: Ms,
}

impl Window {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Window start must be before end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Window) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_instant(&self, t: Ms) -> bool {
        self.start <= t && t < self.end
    }

    /// True once the whole window lies in the past.
    pub fn has_elapsed(&self, now: Ms) -> bool {
        self.end <= now
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomStatus {
    Available,
    Occupied,
    Maintenance,
    Inactive,
}

impl RoomStatus {
    /// Maintenance and Inactive make the room unavailable regardless of
    /// what reservations exist. Occupied is informational only.
    pub fn blocks_availability(&self) -> bool {
        matches!(self, RoomStatus::Maintenance | RoomStatus::Inactive)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    Completed,
}

impl ReservationStatus {
    /// Active reservations occupy time. Rejected/Cancelled/Completed never do.
    pub fn is_active(&self) -> bool {
        matches!(self, ReservationStatus::Pending | ReservationStatus::Approved)
    }

    /// Terminal states admit no further transition.
    pub fn is_final(&self) -> bool {
        !self.is_active()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Ulid,
    pub room_id: Ulid,
    pub requester: Ulid,
    pub window: Window,
    pub status: ReservationStatus,
}

#[derive(Debug, Clone)]
pub struct RoomState {
    pub id: Ulid,
    pub name: Option<String>,
    /// Seats in the room (not concurrent-booking capacity — one active
    /// reservation owns the whole room at a time).
    pub capacity: u32,
    pub status: RoomStatus,
    pub department_id: Option<Ulid>,
    /// Currently scheduled maintenance window, if any.
    pub maintenance: Option<Window>,
    /// All reservations made on this room, sorted by `window.start`.
    /// Finished ones stay as history; the status filter keeps them inert.
    pub reservations: Vec<Reservation>,
}

impl RoomState {
    pub fn new(
        id: Ulid,
        name: Option<String>,
        capacity: u32,
        department_id: Option<Ulid>,
    ) -> Self {
        Self {
            id,
            name,
            capacity,
            status: RoomStatus::Available,
            department_id,
            maintenance: None,
            reservations: Vec::new(),
        }
    }

    /// Insert a reservation maintaining sort order by window.start.
    pub fn insert_reservation(&mut self, reservation: Reservation) {
        let pos = self
            .reservations
            .binary_search_by_key(&reservation.window.start, |r| r.window.start)
            .unwrap_or_else(|e| e);
        self.reservations.insert(pos, reservation);
    }

    /// Remove a reservation by id (drops it from history entirely).
    pub fn remove_reservation(&mut self, id: Ulid) -> Option<Reservation> {
        if let Some(pos) = self.reservations.iter().position(|r| r.id == id) {
            Some(self.reservations.remove(pos))
        } else {
            None
        }
    }

    pub fn reservation(&self, id: Ulid) -> Option<&Reservation> {
        self.reservations.iter().find(|r| r.id == id)
    }

    pub fn reservation_mut(&mut self, id: Ulid) -> Option<&mut Reservation> {
        self.reservations.iter_mut().find(|r| r.id == id)
    }

    /// Return only reservations whose window overlaps the query window.
    /// Uses binary search to skip reservations starting at or after `query.end`.
    pub fn overlapping(&self, query: &Window) -> impl Iterator<Item = &Reservation> {
        // Everything at index >= right_bound starts at or after query.end → can't overlap.
        let right_bound = self
            .reservations
            .partition_point(|r| r.window.start < query.end);
        self.reservations[..right_bound]
            .iter()
            .filter(move |r| r.window.end > query.start)
    }
}

/// Change-notification record — flat, no nesting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    RoomCreated {
        id: Ulid,
        name: Option<String>,
        capacity: u32,
        department_id: Option<Ulid>,
    },
    RoomUpdated {
        id: Ulid,
        name: Option<String>,
        capacity: u32,
    },
    RoomStatusChanged {
        id: Ulid,
        status: RoomStatus,
    },
    RoomDeleted {
        id: Ulid,
    },
    ReservationRequested {
        id: Ulid,
        room_id: Ulid,
        requester: Ulid,
        window: Window,
    },
    ReservationRescheduled {
        id: Ulid,
        room_id: Ulid,
        window: Window,
    },
    ReservationApproved {
        id: Ulid,
        room_id: Ulid,
    },
    ReservationRejected {
        id: Ulid,
        room_id: Ulid,
    },
    ReservationCancelled {
        id: Ulid,
        room_id: Ulid,
    },
    ReservationCompleted {
        id: Ulid,
        room_id: Ulid,
    },
    MaintenanceScheduled {
        room_id: Ulid,
        window: Window,
    },
    MaintenanceEnded {
        room_id: Ulid,
    },
}

// ── Query result types ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    pub id: Ulid,
    pub name: Option<String>,
    pub capacity: u32,
    pub status: RoomStatus,
    pub department_id: Option<Ulid>,
}
