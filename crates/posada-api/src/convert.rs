//! Row-to-model conversions. Stored TEXT is parsed here; corrupt values are
//! logged and replaced with defaults rather than failing the whole listing.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use posada_db::models::{ReservationRow, RoomRow, SettingsRow, UserRow};
use posada_types::api::ReservationResponse;
use posada_types::models::{HotelSettings, ReservationStatus, Room, RoomCategory, User};
use tracing::warn;
use uuid::Uuid;

pub(crate) fn parse_uuid(s: &str, what: &str) -> Uuid {
    s.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, s, e);
        Uuid::default()
    })
}

pub(crate) fn parse_timestamp(s: &str) -> DateTime<Utc> {
    s.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
            // Parse as naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", s, e);
            DateTime::default()
        })
}

pub(crate) fn parse_date(s: &str) -> NaiveDate {
    s.parse().unwrap_or_else(|e| {
        warn!("Corrupt date '{}': {}", s, e);
        NaiveDate::default()
    })
}

pub(crate) fn parse_time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .unwrap_or_else(|e| {
            warn!("Corrupt time '{}': {}", s, e);
            NaiveTime::default()
        })
}

pub(crate) fn user_from_row(row: UserRow) -> User {
    User {
        id: parse_uuid(&row.id, "user id"),
        username: row.username,
        email: row.email,
        admin: row.admin,
        created_at: parse_timestamp(&row.created_at),
    }
}

pub(crate) fn room_from_row(row: RoomRow) -> Room {
    Room {
        id: parse_uuid(&row.id, "room id"),
        category: RoomCategory::parse(&row.category).unwrap_or_else(|| {
            warn!("Corrupt category '{}' on room '{}'", row.category, row.id);
            RoomCategory::Single
        }),
        number: row.number,
        price: row.price,
        available: row.available,
        image: row.image,
        description: row.description,
        created_at: parse_timestamp(&row.created_at),
    }
}

pub(crate) fn reservation_response(row: ReservationRow, room: Room) -> ReservationResponse {
    ReservationResponse {
        id: parse_uuid(&row.id, "reservation id"),
        room,
        user_id: parse_uuid(&row.user_id, "user id"),
        username: row.username,
        start_date: parse_date(&row.start_date),
        end_date: parse_date(&row.end_date),
        status: ReservationStatus::parse(&row.status).unwrap_or_else(|| {
            warn!("Corrupt status '{}' on reservation '{}'", row.status, row.id);
            ReservationStatus::Pending
        }),
        created_at: parse_timestamp(&row.created_at),
    }
}

pub(crate) fn settings_from_row(row: SettingsRow) -> HotelSettings {
    HotelSettings {
        check_in_time: parse_time(&row.check_in_time),
        check_out_time: parse_time(&row.check_out_time),
    }
}
