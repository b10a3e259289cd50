use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::engine::{now_ms, Engine};
use crate::observability;

/// Background task that finalizes elapsed state: Approved reservations whose
/// window has passed become Completed, and rooms whose maintenance window
/// has passed return to Available.
pub async fn run_sweeper(engine: Arc<Engine>) {
    let mut interval = tokio::time::interval(Duration::from_secs(5));
    loop {
        interval.tick().await;
        sweep_once(&engine, now_ms()).await;
    }
}

/// One sweep pass at the given instant. Split out so tests can drive it
/// without waiting on the interval.
pub async fn sweep_once(engine: &Engine, now: i64) {
    let start = std::time::Instant::now();

    for (reservation_id, _room_id) in engine.collect_elapsed_reservations(now) {
        match engine.complete_reservation(reservation_id, now).await {
            Ok(_) => {
                metrics::counter!(observability::SWEEPER_COMPLETED_TOTAL).increment(1);
                info!("completed elapsed reservation {reservation_id}");
            }
            Err(e) => {
                // May have been cancelled concurrently — that's fine
                tracing::debug!("sweep skip {reservation_id}: {e}");
            }
        }
    }

    for room_id in engine.collect_elapsed_maintenance(now) {
        match engine.end_maintenance(room_id).await {
            Ok(()) => info!("ended elapsed maintenance on room {room_id}"),
            Err(e) => tracing::debug!("sweep skip room {room_id}: {e}"),
        }
    }

    metrics::histogram!(observability::SWEEP_DURATION_SECONDS)
        .record(start.elapsed().as_secs_f64());
}
