use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use tokio::sync::RwLock;
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;
use crate::observability;

use super::availability::find_conflicts;
use super::lifecycle::{check_transition, validate_window};
use super::{Engine, EngineError};

impl Engine {
    // ── Room CRUD ────────────────────────────────────────────

    pub async fn create_room(
        &self,
        id: Ulid,
        name: Option<String>,
        capacity: u32,
        department_id: Option<Ulid>,
    ) -> Result<(), EngineError> {
        if self.state.len() >= MAX_ROOMS {
            return Err(EngineError::LimitExceeded("too many rooms"));
        }
        if let Some(ref n) = name
            && n.len() > MAX_NAME_LEN {
                return Err(EngineError::LimitExceeded("room name too long"));
            }
        if self.state.contains_key(&id) {
            return Err(EngineError::AlreadyExists(id));
        }

        let rs = RoomState::new(id, name.clone(), capacity, department_id);
        self.state.insert(id, Arc::new(RwLock::new(rs)));
        if let Some(dept) = department_id {
            self.departments.entry(dept).or_default().push(id);
        }
        metrics::gauge!(observability::ROOMS_ACTIVE).set(self.state.len() as f64);
        self.notify.send(
            id,
            &Event::RoomCreated { id, name, capacity, department_id },
        );
        Ok(())
    }

    pub async fn update_room(
        &self,
        id: Ulid,
        name: Option<String>,
        capacity: u32,
    ) -> Result<(), EngineError> {
        if let Some(ref n) = name
            && n.len() > MAX_NAME_LEN {
                return Err(EngineError::LimitExceeded("room name too long"));
            }
        let rs = self.get_room(&id).ok_or(EngineError::NotFound(id))?;
        let mut guard = rs.write().await;
        let event = Event::RoomUpdated { id, name, capacity };
        self.commit(id, &mut guard, &event);
        Ok(())
    }

    /// Direct administrative status change. Maintenance entered this way has
    /// no scheduled window; the sweeper leaves it alone.
    pub async fn set_room_status(&self, id: Ulid, status: RoomStatus) -> Result<(), EngineError> {
        let rs = self.get_room(&id).ok_or(EngineError::NotFound(id))?;
        let mut guard = rs.write().await;
        if !matches!(status, RoomStatus::Maintenance) {
            guard.maintenance = None;
        }
        let event = Event::RoomStatusChanged { id, status };
        self.commit(id, &mut guard, &event);
        Ok(())
    }

    pub async fn delete_room(&self, id: Ulid) -> Result<(), EngineError> {
        let rs = self.get_room(&id).ok_or(EngineError::NotFound(id))?;
        let guard = rs.write().await;
        // Unregister while still holding the room's write lock: a request
        // queued on this lock re-checks registration once it gets in and
        // backs out instead of indexing a reservation for a vanished room.
        self.state.remove(&id);
        if let Some(dept) = guard.department_id
            && let Some(mut rooms) = self.departments.get_mut(&dept) {
                rooms.retain(|r| r != &id);
            }
        for r in &guard.reservations {
            self.reservation_to_room.remove(&r.id);
        }
        drop(guard);

        metrics::gauge!(observability::ROOMS_ACTIVE).set(self.state.len() as f64);
        self.notify.send(id, &Event::RoomDeleted { id });
        self.notify.remove(&id);
        Ok(())
    }

    // ── Reservation workflow ─────────────────────────────────

    /// Create a Pending reservation if the window is free.
    ///
    /// The conflict check and the insert both happen under the room's write
    /// lock: two concurrent overlapping requests serialize here and the
    /// loser sees the winner's reservation. This is the storage-boundary
    /// exclusion that makes check-then-create safe.
    pub async fn request_reservation(
        &self,
        id: Ulid,
        room_id: Ulid,
        requester: Ulid,
        window: Window,
    ) -> Result<(), EngineError> {
        validate_window(&window)?;
        let rs = self
            .get_room(&room_id)
            .ok_or(EngineError::NotFound(room_id))?;
        // Claim the id before touching the room: two concurrent requests
        // reusing one id must not both pass the duplicate check.
        match self.reservation_to_room.entry(id) {
            Entry::Occupied(_) => return Err(EngineError::AlreadyExists(id)),
            Entry::Vacant(vacant) => {
                vacant.insert(room_id);
            }
        }
        let mut guard = rs.write().await;
        if let Err(e) = self.admit_reservation(&guard, room_id, &window) {
            drop(guard);
            self.reservation_to_room.remove(&id);
            return Err(e);
        }

        let event = Event::ReservationRequested { id, room_id, requester, window };
        self.commit(room_id, &mut guard, &event);
        metrics::counter!(observability::RESERVATIONS_REQUESTED_TOTAL).increment(1);
        Ok(())
    }

    /// Validity checks for a new reservation. Runs under the room's write
    /// lock; any error unwinds the caller's id claim.
    fn admit_reservation(
        &self,
        rs: &RoomState,
        room_id: Ulid,
        window: &Window,
    ) -> Result<(), EngineError> {
        // The room may have been deleted while we waited on its lock
        if !self.state.contains_key(&room_id) {
            return Err(EngineError::NotFound(room_id));
        }
        if rs.reservations.len() >= MAX_RESERVATIONS_PER_ROOM {
            return Err(EngineError::LimitExceeded("too many reservations on room"));
        }
        if rs.status.blocks_availability() {
            return Err(EngineError::RoomUnavailable(rs.status));
        }
        if let Some(existing) = find_conflicts(rs, window, None)?.first() {
            metrics::counter!(observability::CONFLICTS_DETECTED_TOTAL).increment(1);
            return Err(EngineError::Conflict(existing.id));
        }
        Ok(())
    }

    /// Move an active reservation to a new window. The reservation's own
    /// slot is excluded from the conflict check, so shrinking or shifting
    /// inside it always succeeds.
    pub async fn reschedule_reservation(
        &self,
        id: Ulid,
        window: Window,
    ) -> Result<Ulid, EngineError> {
        validate_window(&window)?;
        let (room_id, mut guard) = self.resolve_reservation_write(&id).await?;
        let current = guard.reservation(id).ok_or(EngineError::NotFound(id))?;
        if current.status.is_final() {
            return Err(EngineError::ReservationClosed(id));
        }
        if guard.status.blocks_availability() {
            return Err(EngineError::RoomUnavailable(guard.status));
        }
        if let Some(existing) = find_conflicts(&guard, &window, Some(id))?.first() {
            metrics::counter!(observability::CONFLICTS_DETECTED_TOTAL).increment(1);
            return Err(EngineError::Conflict(existing.id));
        }

        let event = Event::ReservationRescheduled { id, room_id, window };
        self.commit(room_id, &mut guard, &event);
        Ok(room_id)
    }

    pub async fn approve_reservation(&self, id: Ulid) -> Result<Ulid, EngineError> {
        self.transition(id, ReservationStatus::Approved).await
    }

    pub async fn reject_reservation(&self, id: Ulid) -> Result<Ulid, EngineError> {
        self.transition(id, ReservationStatus::Rejected).await
    }

    pub async fn cancel_reservation(&self, id: Ulid) -> Result<Ulid, EngineError> {
        self.transition(id, ReservationStatus::Cancelled).await
    }

    /// Finalize an Approved reservation whose window has elapsed.
    pub async fn complete_reservation(&self, id: Ulid, now: Ms) -> Result<Ulid, EngineError> {
        let (room_id, mut guard) = self.resolve_reservation_write(&id).await?;
        let current = guard.reservation(id).ok_or(EngineError::NotFound(id))?;
        check_transition(current.status, ReservationStatus::Completed)?;
        if !current.window.has_elapsed(now) {
            return Err(EngineError::StillInProgress(id));
        }
        let event = Event::ReservationCompleted { id, room_id };
        self.commit(room_id, &mut guard, &event);
        Ok(room_id)
    }

    async fn transition(&self, id: Ulid, to: ReservationStatus) -> Result<Ulid, EngineError> {
        let (room_id, mut guard) = self.resolve_reservation_write(&id).await?;
        let current = guard.reservation(id).ok_or(EngineError::NotFound(id))?;
        check_transition(current.status, to)?;
        let event = match to {
            ReservationStatus::Approved => Event::ReservationApproved { id, room_id },
            ReservationStatus::Rejected => Event::ReservationRejected { id, room_id },
            ReservationStatus::Cancelled => Event::ReservationCancelled { id, room_id },
            // Completed goes through complete_reservation; Pending is never a target
            _ => unreachable!("transition() only handles approve/reject/cancel"),
        };
        self.commit(room_id, &mut guard, &event);
        Ok(room_id)
    }

    // ── Maintenance workflow ─────────────────────────────────

    /// Put a room into maintenance for a window, but only if no active
    /// reservation overlaps it. The first overlap is reported as the
    /// conflict so the caller can chase it down.
    pub async fn schedule_maintenance(
        &self,
        room_id: Ulid,
        window: Window,
    ) -> Result<(), EngineError> {
        validate_window(&window)?;
        let rs = self
            .get_room(&room_id)
            .ok_or(EngineError::NotFound(room_id))?;
        let mut guard = rs.write().await;
        if guard.maintenance.is_some() {
            return Err(EngineError::AlreadyExists(room_id));
        }
        if let Some(existing) = find_conflicts(&guard, &window, None)?.first() {
            return Err(EngineError::Conflict(existing.id));
        }

        let event = Event::MaintenanceScheduled { room_id, window };
        self.commit(room_id, &mut guard, &event);
        Ok(())
    }

    /// Manually end maintenance and restore the room to Available.
    pub async fn end_maintenance(&self, room_id: Ulid) -> Result<(), EngineError> {
        let rs = self
            .get_room(&room_id)
            .ok_or(EngineError::NotFound(room_id))?;
        let mut guard = rs.write().await;
        if guard.maintenance.is_none() {
            return Err(EngineError::NotFound(room_id));
        }
        let event = Event::MaintenanceEnded { room_id };
        self.commit(room_id, &mut guard, &event);
        Ok(())
    }

    // ── Sweeper support ──────────────────────────────────────

    /// Approved reservations whose window has elapsed: `(reservation, room)`.
    pub fn collect_elapsed_reservations(&self, now: Ms) -> Vec<(Ulid, Ulid)> {
        let mut elapsed = Vec::new();
        for entry in self.state.iter() {
            let rs = entry.value().clone();
            if let Ok(guard) = rs.try_read() {
                for r in &guard.reservations {
                    if r.status == ReservationStatus::Approved && r.window.has_elapsed(now) {
                        elapsed.push((r.id, guard.id));
                    }
                }
            }
        }
        elapsed
    }

    /// Rooms whose scheduled maintenance window has fully elapsed.
    pub fn collect_elapsed_maintenance(&self, now: Ms) -> Vec<Ulid> {
        let mut elapsed = Vec::new();
        for entry in self.state.iter() {
            let rs = entry.value().clone();
            if let Ok(guard) = rs.try_read()
                && let Some(window) = guard.maintenance
                && window.has_elapsed(now) {
                    elapsed.push(guard.id);
                }
        }
        elapsed
    }
}
