use ulid::Ulid;

use crate::limits::*;
use crate::model::*;
use crate::observability;

use super::availability::{find_available_rooms, find_conflicts, is_available};
use super::{Engine, EngineError};

fn room_info(rs: &RoomState) -> RoomInfo {
    RoomInfo {
        id: rs.id,
        name: rs.name.clone(),
        capacity: rs.capacity,
        status: rs.status,
        department_id: rs.department_id,
    }
}

impl Engine {
    /// Is the room free for the whole window? See [`is_available`] for the
    /// rules; `exclude` lets an update ignore the reservation being moved.
    pub async fn is_room_available(
        &self,
        room_id: Ulid,
        window: Window,
        exclude: Option<Ulid>,
    ) -> Result<bool, EngineError> {
        let rs = self
            .get_room(&room_id)
            .ok_or(EngineError::NotFound(room_id))?;
        let guard = rs.read().await;
        let free = is_available(&guard, &window, exclude)?;
        metrics::counter!(
            observability::AVAILABILITY_CHECKS_TOTAL,
            "outcome" => if free { "free" } else { "busy" }
        )
        .increment(1);
        Ok(free)
    }

    /// Every active reservation overlapping the window, start-ascending.
    pub async fn room_conflicts(
        &self,
        room_id: Ulid,
        window: Window,
        exclude: Option<Ulid>,
    ) -> Result<Vec<Reservation>, EngineError> {
        let rs = self
            .get_room(&room_id)
            .ok_or(EngineError::NotFound(room_id))?;
        let guard = rs.read().await;
        find_conflicts(&guard, &window, exclude)
    }

    /// Filter candidate rooms to those free for the window (and big enough,
    /// if `min_capacity` is given). Caller order is preserved; unknown ids
    /// are skipped rather than failing the whole query.
    pub async fn available_rooms(
        &self,
        candidates: &[Ulid],
        window: Window,
        min_capacity: Option<u32>,
    ) -> Result<Vec<RoomInfo>, EngineError> {
        if candidates.len() > MAX_CANDIDATE_IDS {
            return Err(EngineError::LimitExceeded("too many candidate ids"));
        }
        // One room lock at a time, released before the next is taken:
        // holding earlier read guards while waiting on later ones can cycle
        // with queued writers. The answer is per-room, not a cross-room
        // atomic snapshot.
        let mut snapshots = Vec::with_capacity(candidates.len());
        for id in candidates {
            if let Some(rs) = self.get_room(id) {
                let guard = rs.read().await;
                snapshots.push((*guard).clone());
            }
        }
        let refs: Vec<&RoomState> = snapshots.iter().collect();
        let free = find_available_rooms(&refs, &window, min_capacity)?;
        Ok(free.into_iter().map(room_info).collect())
    }

    pub async fn list_rooms(&self) -> Vec<RoomInfo> {
        // Snapshot the Arcs first: holding a DashMap shard guard across an
        // await point can deadlock against writers.
        let rooms: Vec<_> = self.state.iter().map(|e| e.value().clone()).collect();
        let mut infos = Vec::with_capacity(rooms.len());
        for rs in rooms {
            let guard = rs.read().await;
            infos.push(room_info(&guard));
        }
        infos
    }

    pub async fn room(&self, id: Ulid) -> Result<RoomInfo, EngineError> {
        let rs = self.get_room(&id).ok_or(EngineError::NotFound(id))?;
        let guard = rs.read().await;
        Ok(room_info(&guard))
    }

    /// Room ids registered under a department, in creation order.
    pub fn department_rooms(&self, department_id: &Ulid) -> Vec<Ulid> {
        self.departments
            .get(department_id)
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }

    /// Full reservation history of a room, sorted by window start.
    pub async fn room_reservations(&self, room_id: Ulid) -> Result<Vec<Reservation>, EngineError> {
        let rs = self
            .get_room(&room_id)
            .ok_or(EngineError::NotFound(room_id))?;
        let guard = rs.read().await;
        Ok(guard.reservations.clone())
    }

    pub async fn get_reservation(&self, id: Ulid) -> Result<Reservation, EngineError> {
        let room_id = self
            .get_room_for_reservation(&id)
            .ok_or(EngineError::NotFound(id))?;
        let rs = self
            .get_room(&room_id)
            .ok_or(EngineError::NotFound(room_id))?;
        let guard = rs.read().await;
        guard
            .reservation(id)
            .copied()
            .ok_or(EngineError::NotFound(id))
    }
}
