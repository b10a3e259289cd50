mod availability;
mod error;
mod lifecycle;
mod mutations;
mod queries;

pub use availability::{check_window, find_available_rooms, find_conflicts, is_available};
pub use error::EngineError;
pub(crate) use lifecycle::now_ms;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::RwLock;
use ulid::Ulid;

use crate::model::*;
use crate::notify::NotifyHub;

pub type SharedRoomState = Arc<RwLock<RoomState>>;

/// In-memory room registry. One write lock per room: every mutation runs
/// its validity checks and the state change under that lock, so a conflict
/// check can never be invalidated between check and commit.
pub struct Engine {
    pub state: DashMap<Ulid, SharedRoomState>,
    pub notify: Arc<NotifyHub>,
    /// Reverse lookup: reservation id → room id.
    pub(super) reservation_to_room: DashMap<Ulid, Ulid>,
    /// Department → rooms index for O(1) department listings.
    pub(super) departments: DashMap<Ulid, Vec<Ulid>>,
}

/// Apply an event directly to a RoomState (no locking — caller holds the lock).
fn apply_to_room(rs: &mut RoomState, event: &Event, index: &DashMap<Ulid, Ulid>) {
    match event {
        Event::ReservationRequested {
            id,
            room_id,
            requester,
            window,
        } => {
            rs.insert_reservation(Reservation {
                id: *id,
                room_id: *room_id,
                requester: *requester,
                window: *window,
                status: ReservationStatus::Pending,
            });
            index.insert(*id, *room_id);
        }
        Event::ReservationRescheduled { id, window, .. } => {
            // Remove and reinsert so the start-sorted order survives the move.
            if let Some(mut r) = rs.remove_reservation(*id) {
                r.window = *window;
                rs.insert_reservation(r);
            }
        }
        Event::ReservationApproved { id, .. } => set_status(rs, *id, ReservationStatus::Approved),
        Event::ReservationRejected { id, .. } => set_status(rs, *id, ReservationStatus::Rejected),
        Event::ReservationCancelled { id, .. } => set_status(rs, *id, ReservationStatus::Cancelled),
        Event::ReservationCompleted { id, .. } => set_status(rs, *id, ReservationStatus::Completed),
        Event::RoomUpdated { name, capacity, .. } => {
            rs.name = name.clone();
            rs.capacity = *capacity;
        }
        Event::RoomStatusChanged { status, .. } => {
            rs.status = *status;
        }
        Event::MaintenanceScheduled { window, .. } => {
            rs.maintenance = Some(*window);
            rs.status = RoomStatus::Maintenance;
        }
        Event::MaintenanceEnded { .. } => {
            rs.maintenance = None;
            rs.status = RoomStatus::Available;
        }
        // RoomCreated/Deleted are handled at the DashMap level, not here
        Event::RoomCreated { .. } | Event::RoomDeleted { .. } => {}
    }
}

fn set_status(rs: &mut RoomState, id: Ulid, status: ReservationStatus) {
    if let Some(r) = rs.reservation_mut(id) {
        r.status = status;
    }
}

impl Engine {
    pub fn new(notify: Arc<NotifyHub>) -> Self {
        Self {
            state: DashMap::new(),
            notify,
            reservation_to_room: DashMap::new(),
            departments: DashMap::new(),
        }
    }

    pub fn get_room(&self, id: &Ulid) -> Option<SharedRoomState> {
        self.state.get(id).map(|e| e.value().clone())
    }

    pub fn get_room_for_reservation(&self, reservation_id: &Ulid) -> Option<Ulid> {
        self.reservation_to_room
            .get(reservation_id)
            .map(|e| *e.value())
    }

    /// Apply + notify in one call. Eliminates the repeated 2-line pattern.
    pub(super) fn commit(&self, room_id: Ulid, rs: &mut RoomState, event: &Event) {
        apply_to_room(rs, event, &self.reservation_to_room);
        self.notify.send(room_id, event);
    }

    /// Lookup reservation → room, get room, acquire write lock.
    pub(super) async fn resolve_reservation_write(
        &self,
        reservation_id: &Ulid,
    ) -> Result<(Ulid, tokio::sync::OwnedRwLockWriteGuard<RoomState>), EngineError> {
        let room_id = self
            .get_room_for_reservation(reservation_id)
            .ok_or(EngineError::NotFound(*reservation_id))?;
        let rs = self
            .get_room(&room_id)
            .ok_or(EngineError::NotFound(room_id))?;
        let guard = rs.write_owned().await;
        Ok((room_id, guard))
    }
}
