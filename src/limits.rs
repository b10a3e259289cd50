//! Hard caps protecting the registry from unbounded input.

use crate::model::Ms;

/// Max rooms held in one registry.
pub const MAX_ROOMS: usize = 100_000;

/// Max reservations kept on a single room (including history).
pub const MAX_RESERVATIONS_PER_ROOM: usize = 100_000;

/// Max room name length in bytes.
pub const MAX_NAME_LEN: usize = 256;

/// Unix epoch — negative timestamps are malformed.
pub const MIN_VALID_TIMESTAMP_MS: Ms = 0;

/// 2100-01-01T00:00:00Z — anything later is a malformed timestamp.
pub const MAX_VALID_TIMESTAMP_MS: Ms = 4_102_444_800_000;

/// Max width of a single reservation or maintenance window (366 days).
pub const MAX_WINDOW_DURATION_MS: Ms = 366 * 24 * 3_600_000;

/// Max candidate room ids in one availability filter.
pub const MAX_CANDIDATE_IDS: usize = 1_000;
