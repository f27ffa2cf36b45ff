use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ReservationStatus, Room, RoomCategory};

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub admin: bool,
    pub token: String,
}

/// Profile update. All fields optional; changing the password requires the
/// current one.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub current_password: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

// -- Rooms --

/// Create/replace payload for a room. PUT semantics: the whole record is
/// supplied each time.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoomPayload {
    pub category: RoomCategory,
    pub number: i64,
    pub price: f64,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

// -- Reservations --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateReservationRequest {
    pub room_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub status: Option<ReservationStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateReservationRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ReservationStatus,
}

/// Reservation with its room embedded, the shape the room cards render from.
#[derive(Debug, Serialize)]
pub struct ReservationResponse {
    pub id: Uuid,
    pub room: Room,
    pub user_id: Uuid,
    pub username: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ReservationStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// -- Settings --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateSettingsRequest {
    pub check_in_time: chrono::NaiveTime,
    pub check_out_time: chrono::NaiveTime,
}
