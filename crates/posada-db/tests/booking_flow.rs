//! Full booking lifecycle against the store: register, book, pay, check in,
//! check out, with availability queries observed at each step.

use chrono::NaiveDate;
use posada_db::{Database, StoreError};
use posada_types::models::ReservationStatus;
use uuid::Uuid;

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

#[test]
fn booking_lifecycle() {
    let db = Database::open_in_memory().unwrap();
    let today = d("2025-06-01");

    // Front desk sets up two rooms
    let room_a = Uuid::new_v4().to_string();
    let room_b = Uuid::new_v4().to_string();
    db.create_room(&room_a, "double", 101, 150.0, true, None, Some("Garden view"))
        .unwrap();
    db.create_room(&room_b, "single", 102, 90.0, true, None, None)
        .unwrap();

    // A guest registers and books room 101 for four nights
    let guest = Uuid::new_v4().to_string();
    db.create_user(&guest, "maria", Some("maria@example.com"), "argon2-hash")
        .unwrap();

    let reservation = Uuid::new_v4().to_string();
    db.create_reservation(
        &reservation,
        &room_a,
        &guest,
        d("2025-06-10"),
        d("2025-06-14"),
        ReservationStatus::Pending,
        today,
    )
    .unwrap();

    // The pending reservation already blocks the room for those dates
    let open = db
        .list_available_rooms(Some((d("2025-06-11"), d("2025-06-13"))))
        .unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].number, 102);

    // A competing booking for an overlapping window fails outright
    let err = db
        .create_reservation(
            &Uuid::new_v4().to_string(),
            &room_a,
            &guest,
            d("2025-06-13"),
            d("2025-06-16"),
            ReservationStatus::Pending,
            today,
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));

    // The guest pays
    db.update_reservation(
        &reservation,
        d("2025-06-10"),
        d("2025-06-14"),
        ReservationStatus::Paid,
        today,
    )
    .unwrap();

    // Arrival: check-in flips the room to occupied
    db.checkin_reservation(&reservation).unwrap();
    assert!(!db.get_room(&room_a).unwrap().unwrap().available);
    let open = db.list_available_rooms(None).unwrap();
    assert_eq!(open.len(), 1);

    // Departure: checkout frees the room again and the window reopens
    let row = db.checkout_reservation(&reservation).unwrap();
    assert_eq!(row.status, "checkout");
    assert!(db.get_room(&room_a).unwrap().unwrap().available);

    let open = db
        .list_available_rooms(Some((d("2025-06-10"), d("2025-06-14"))))
        .unwrap();
    assert_eq!(open.len(), 2);

    // The guest's history still lists the completed stay
    let mine = db.list_reservations(Some(&guest)).unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].username, "maria");
    assert_eq!(mine[0].status, "checkout");
}
