use ulid::Ulid;

use crate::model::*;

use super::EngineError;

// ── Availability Algorithm ────────────────────────────────────────

/// Reject zero-length and inverted windows up front — they are invalid
/// input, not "always available".
pub fn check_window(window: &Window) -> Result<(), EngineError> {
    if window.end <= window.start {
        return Err(EngineError::InvalidWindow {
            start: window.start,
            end: window.end,
        });
    }
    Ok(())
}

/// Is the room free for the whole window?
///
/// Fails fast if the room status hard-blocks it (Maintenance/Inactive),
/// otherwise scans active reservations for an overlap under half-open
/// semantics. `exclude` removes one reservation from consideration so an
/// update can be checked against all *other* reservations.
///
/// Pure query over the supplied snapshot — no side effects.
pub fn is_available(
    room: &RoomState,
    window: &Window,
    exclude: Option<Ulid>,
) -> Result<bool, EngineError> {
    check_window(window)?;
    if room.status.blocks_availability() {
        return Ok(false);
    }
    for r in room.overlapping(window) {
        if !r.status.is_active() {
            continue;
        }
        if exclude == Some(r.id) {
            continue;
        }
        return Ok(false);
    }
    Ok(true)
}

/// Every active reservation overlapping the window, ordered by start
/// ascending. Empty means no reservation stands in the way.
///
/// Unlike [`is_available`] this does not consult room status — it reports
/// reservation conflicts only, which is what the maintenance workflow and
/// conflict error messages need.
pub fn find_conflicts(
    room: &RoomState,
    window: &Window,
    exclude: Option<Ulid>,
) -> Result<Vec<Reservation>, EngineError> {
    check_window(window)?;
    // `overlapping` walks the start-sorted list, so output order is free.
    Ok(room
        .overlapping(window)
        .filter(|r| r.status.is_active())
        .filter(|r| exclude != Some(r.id))
        .copied()
        .collect())
}

/// Filter candidates down to rooms free for the window, keeping input
/// order. `min_capacity` additionally requires `capacity >= min_capacity`.
pub fn find_available_rooms<'a>(
    candidates: &[&'a RoomState],
    window: &Window,
    min_capacity: Option<u32>,
) -> Result<Vec<&'a RoomState>, EngineError> {
    check_window(window)?;
    let mut free = Vec::new();
    for room in candidates {
        if let Some(min) = min_capacity
            && room.capacity < min {
                continue;
            }
        if is_available(room, window, None)? {
            free.push(*room);
        }
    }
    Ok(free)
}
