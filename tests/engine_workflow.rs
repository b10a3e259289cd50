//! End-to-end workflow over the public API: rooms, reservations, the notify
//! stream, maintenance, and the sweeper, all in one process.

use std::sync::Arc;

use ulid::Ulid;

use roomkeeper::sweeper::sweep_once;
use roomkeeper::{Engine, EngineError, Event, NotifyHub, ReservationStatus, RoomStatus, Window};

const H: i64 = 3_600_000;

fn setup() -> (Arc<NotifyHub>, Arc<Engine>) {
    let _ = tracing_subscriber::fmt::try_init();
    let notify = Arc::new(NotifyHub::new());
    let engine = Arc::new(Engine::new(notify.clone()));
    (notify, engine)
}

#[tokio::test]
async fn booking_day_in_the_life() {
    let (notify, engine) = setup();

    // A department with two rooms, one big, one small
    let dept = Ulid::new();
    let small = Ulid::new();
    let big = Ulid::new();
    engine
        .create_room(small, Some("Huddle".into()), 4, Some(dept))
        .await
        .unwrap();
    engine
        .create_room(big, Some("Auditorium".into()), 80, Some(dept))
        .await
        .unwrap();

    let mut events = notify.subscribe(big);

    // A requester books the big room for the morning and gets approved
    let requester = Ulid::new();
    let morning = Window::new(9 * H, 12 * H);
    let res = Ulid::new();
    engine
        .request_reservation(res, big, requester, morning)
        .await
        .unwrap();
    engine.approve_reservation(res).await.unwrap();

    assert_eq!(
        events.recv().await.unwrap(),
        Event::ReservationRequested { id: res, room_id: big, requester, window: morning }
    );
    assert_eq!(
        events.recv().await.unwrap(),
        Event::ReservationApproved { id: res, room_id: big }
    );

    // A second large booking overlapping the morning has to fall back to
    // whatever fits — capacity 10 rules the small room out, and the big
    // room is taken, so nothing qualifies.
    let candidates = engine.department_rooms(&dept);
    let free = engine
        .available_rooms(&candidates, Window::new(10 * H, 11 * H), Some(10))
        .await
        .unwrap();
    assert!(free.is_empty());

    // The afternoon is wide open
    let free = engine
        .available_rooms(&candidates, Window::new(13 * H, 15 * H), Some(10))
        .await
        .unwrap();
    assert_eq!(free.len(), 1);
    assert_eq!(free[0].id, big);

    // Evening: the morning booking has elapsed, the sweeper finalizes it
    sweep_once(&engine, 18 * H).await;
    assert_eq!(
        engine.get_reservation(res).await.unwrap().status,
        ReservationStatus::Completed
    );
    assert_eq!(
        events.recv().await.unwrap(),
        Event::ReservationCompleted { id: res, room_id: big }
    );

    // With the room clear, facilities schedules overnight maintenance
    engine
        .schedule_maintenance(big, Window::new(20 * H, 23 * H))
        .await
        .unwrap();
    assert_eq!(
        engine.room(big).await.unwrap().status,
        RoomStatus::Maintenance
    );
    let result = engine
        .request_reservation(Ulid::new(), big, Ulid::new(), Window::new(21 * H, 22 * H))
        .await;
    assert!(matches!(result, Err(EngineError::RoomUnavailable(_))));

    // Next morning the sweeper reopens the room
    sweep_once(&engine, 24 * H).await;
    assert_eq!(
        engine.room(big).await.unwrap().status,
        RoomStatus::Available
    );
    assert!(
        engine
            .is_room_available(big, Window::new(33 * H, 34 * H), None)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn double_booking_race_has_single_winner() {
    let (_notify, engine) = setup();
    let room = Ulid::new();
    engine.create_room(room, None, 6, None).await.unwrap();

    let window = Window::new(9 * H, 11 * H);
    let mut handles = Vec::new();
    for _ in 0..32 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .request_reservation(Ulid::new(), room, Ulid::new(), window)
                .await
        }));
    }

    let mut winners = 0;
    for h in handles {
        if h.await.unwrap().is_ok() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);

    // Exactly one reservation landed, and it blocks the slot
    let all = engine.room_reservations(room).await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(!engine.is_room_available(room, window, None).await.unwrap());
}

#[tokio::test]
async fn reschedule_respects_existing_reservations() {
    let (_notify, engine) = setup();
    let room = Ulid::new();
    engine.create_room(room, None, 6, None).await.unwrap();

    let keep = Ulid::new();
    engine
        .request_reservation(keep, room, Ulid::new(), Window::new(9 * H, 10 * H))
        .await
        .unwrap();
    let moving = Ulid::new();
    engine
        .request_reservation(moving, room, Ulid::new(), Window::new(11 * H, 12 * H))
        .await
        .unwrap();

    // Sliding onto the other booking fails and names it
    match engine
        .reschedule_reservation(moving, Window::new(9 * H + H / 2, 11 * H))
        .await
    {
        Err(EngineError::Conflict(id)) => assert_eq!(id, keep),
        other => panic!("expected Conflict, got {other:?}"),
    }

    // Sliding into free space works
    engine
        .reschedule_reservation(moving, Window::new(10 * H, 11 * H))
        .await
        .unwrap();
    let r = engine.get_reservation(moving).await.unwrap();
    assert_eq!(r.window, Window::new(10 * H, 11 * H));
}
