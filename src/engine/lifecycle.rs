use crate::model::*;

use super::availability::check_window;
use super::EngineError;

pub(crate) fn now_ms() -> Ms {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as Ms
}

/// Full validation for windows entering the registry: shape plus limits.
pub(crate) fn validate_window(window: &Window) -> Result<(), EngineError> {
    use crate::limits::*;
    check_window(window)?;
    if window.start < MIN_VALID_TIMESTAMP_MS || window.end > MAX_VALID_TIMESTAMP_MS {
        return Err(EngineError::LimitExceeded("timestamp out of range"));
    }
    if window.duration_ms() > MAX_WINDOW_DURATION_MS {
        return Err(EngineError::LimitExceeded("window too wide"));
    }
    Ok(())
}

/// The reservation state machine. Everything not listed here is invalid:
///
/// Pending  → Approved | Rejected | Cancelled
/// Approved → Cancelled | Completed
pub(crate) fn check_transition(
    from: ReservationStatus,
    to: ReservationStatus,
) -> Result<(), EngineError> {
    use ReservationStatus::*;
    let ok = matches!(
        (from, to),
        (Pending, Approved) | (Pending, Rejected) | (Pending, Cancelled)
            | (Approved, Cancelled)
            | (Approved, Completed)
    );
    if ok {
        Ok(())
    } else {
        Err(EngineError::InvalidTransition { from, to })
    }
}
