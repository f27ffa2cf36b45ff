/// Database row types — these map directly to SQLite rows.
/// Distinct from the posada-types API models to keep the DB layer independent;
/// dates, statuses and timestamps stay as stored TEXT and are parsed at the
/// API boundary.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub password: String,
    pub admin: bool,
    pub created_at: String,
}

pub struct RoomRow {
    pub id: String,
    pub category: String,
    pub number: i64,
    pub price: f64,
    pub available: bool,
    pub image: Option<String>,
    pub description: Option<String>,
    pub created_at: String,
}

#[derive(Debug)]
pub struct ReservationRow {
    pub id: String,
    pub room_id: String,
    pub user_id: String,
    pub username: String,
    pub start_date: String,
    pub end_date: String,
    pub status: String,
    pub created_at: String,
}

pub struct SettingsRow {
    pub check_in_time: String,
    pub check_out_time: String,
}
