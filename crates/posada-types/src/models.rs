use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomCategory {
    Single,
    Double,
    Triple,
}

impl RoomCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomCategory::Single => "single",
            RoomCategory::Double => "double",
            RoomCategory::Triple => "triple",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "single" => Some(RoomCategory::Single),
            "double" => Some(RoomCategory::Double),
            "triple" => Some(RoomCategory::Triple),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Paid,
    CheckinAccepted,
    Checkout,
    Cancelled,
}

impl ReservationStatus {
    /// Statuses that hold a room during overlap checks. Checked-out and
    /// cancelled reservations never block new ones.
    pub const BLOCKING: [ReservationStatus; 3] = [
        ReservationStatus::Pending,
        ReservationStatus::Paid,
        ReservationStatus::CheckinAccepted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Paid => "paid",
            ReservationStatus::CheckinAccepted => "checkin_accepted",
            ReservationStatus::Checkout => "checkout",
            ReservationStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReservationStatus::Pending),
            "paid" => Some(ReservationStatus::Paid),
            "checkin_accepted" => Some(ReservationStatus::CheckinAccepted),
            "checkout" => Some(ReservationStatus::Checkout),
            "cancelled" => Some(ReservationStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_blocking(&self) -> bool {
        Self::BLOCKING.contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ReservationStatus::Checkout | ReservationStatus::Cancelled)
    }

    /// Legal lifecycle transitions. Staying in the current status is not a
    /// transition and is always allowed by callers.
    pub fn can_transition(self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, next),
            (Pending, Paid)
                | (Pending, CheckinAccepted)
                | (Pending, Cancelled)
                | (Paid, CheckinAccepted)
                | (Paid, Cancelled)
                | (CheckinAccepted, Checkout)
                | (CheckinAccepted, Cancelled)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: Uuid,
    pub category: RoomCategory,
    pub number: i64,
    pub price: f64,
    pub available: bool,
    pub image: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Hotel-wide defaults for check-in and check-out times. A single record
/// exists for the whole process; see posada-db for the storage guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotelSettings {
    pub check_in_time: NaiveTime,
    pub check_out_time: NaiveTime,
}
