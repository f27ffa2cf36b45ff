use crate::Database;
use crate::error::{StoreError, StoreResult};
use crate::models::{ReservationRow, RoomRow, SettingsRow, UserRow};
use chrono::NaiveDate;
use posada_types::models::ReservationStatus;
use rusqlite::{Connection, OptionalExtension, Row, params};

const ROOM_COLS: &str = "id, category, number, price, available, image, description, created_at";

/// SQL literal for the statuses that hold a room, kept in lockstep with
/// `ReservationStatus::BLOCKING`.
fn blocking_sql() -> String {
    let quoted: Vec<String> = ReservationStatus::BLOCKING
        .iter()
        .map(|s| format!("'{}'", s.as_str()))
        .collect();
    format!("({})", quoted.join(", "))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        email: Option<&str>,
        password_hash: &str,
    ) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password) VALUES (?1, ?2, ?3, ?4)",
                params![id, username, email, password_hash],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Duplicate(format!("username '{}' is already in use", username))
                } else {
                    e.into()
                }
            })?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> StoreResult<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, username, email, password, admin, created_at
                     FROM users WHERE username = ?1",
                    [username],
                    map_user,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> StoreResult<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, username, email, password, admin, created_at
                     FROM users WHERE id = ?1",
                    [id],
                    map_user,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Full-row profile update. Collisions on the username unique index come
    /// back as `Duplicate`.
    pub fn update_user(
        &self,
        id: &str,
        username: &str,
        email: Option<&str>,
        password_hash: &str,
    ) -> StoreResult<()> {
        self.with_conn(|conn| {
            let affected = conn
                .execute(
                    "UPDATE users SET username = ?2, email = ?3, password = ?4 WHERE id = ?1",
                    params![id, username, email, password_hash],
                )
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        StoreError::Duplicate(format!("username '{}' is already in use", username))
                    } else {
                        e.into()
                    }
                })?;
            if affected == 0 {
                return Err(StoreError::NotFound(format!("user {} not found", id)));
            }
            Ok(())
        })
    }

    pub fn email_taken_by_other(&self, email: &str, user_id: &str) -> StoreResult<bool> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM users WHERE email = ?1 AND id <> ?2",
                params![email, user_id],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    /// Startup bootstrap: create the named user as admin, or promote it if it
    /// already exists. The existing password is left alone on promotion.
    pub fn ensure_admin(&self, id: &str, username: &str, password_hash: &str) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password, admin) VALUES (?1, ?2, ?3, 1)
                 ON CONFLICT(username) DO UPDATE SET admin = 1",
                params![id, username, password_hash],
            )?;
            Ok(())
        })
    }

    // -- Rooms --

    pub fn create_room(
        &self,
        id: &str,
        category: &str,
        number: i64,
        price: f64,
        available: bool,
        image: Option<&str>,
        description: Option<&str>,
    ) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO rooms (id, category, number, price, available, image, description)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![id, category, number, price, available, image, description],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Duplicate(format!("room number {} is already in use", number))
                } else {
                    e.into()
                }
            })?;
            Ok(())
        })
    }

    pub fn list_rooms(&self) -> StoreResult<Vec<RoomRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {ROOM_COLS} FROM rooms ORDER BY number"))?;
            let rows = stmt
                .query_map([], map_room)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_room(&self, id: &str) -> StoreResult<Option<RoomRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {ROOM_COLS} FROM rooms WHERE id = ?1"),
                    [id],
                    map_room,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Batch-fetch rooms for a set of ids, used when assembling reservation
    /// listings without an N+1 scan.
    pub fn get_rooms_by_ids(&self, ids: &[String]) -> StoreResult<Vec<RoomRow>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT {ROOM_COLS} FROM rooms WHERE id IN ({})",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let bound: Vec<&dyn rusqlite::types::ToSql> = ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(bound.as_slice(), map_room)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_room(
        &self,
        id: &str,
        category: &str,
        number: i64,
        price: f64,
        available: bool,
        image: Option<&str>,
        description: Option<&str>,
    ) -> StoreResult<()> {
        self.with_conn(|conn| {
            let affected = conn
                .execute(
                    "UPDATE rooms SET category = ?2, number = ?3, price = ?4, available = ?5,
                     image = ?6, description = ?7 WHERE id = ?1",
                    params![id, category, number, price, available, image, description],
                )
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        StoreError::Duplicate(format!("room number {} is already in use", number))
                    } else {
                        e.into()
                    }
                })?;
            if affected == 0 {
                return Err(StoreError::NotFound(format!("room {} not found", id)));
            }
            Ok(())
        })
    }

    /// Deleting a room cascades to its reservations via the foreign key.
    pub fn delete_room(&self, id: &str) -> StoreResult<()> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM rooms WHERE id = ?1", [id])?;
            if affected == 0 {
                return Err(StoreError::NotFound(format!("room {} not found", id)));
            }
            Ok(())
        })
    }

    /// Rooms open for booking. With no window: every room whose availability
    /// flag is set. With a `[start, end)` window: additionally no blocking
    /// reservation overlapping it.
    pub fn list_available_rooms(
        &self,
        window: Option<(NaiveDate, NaiveDate)>,
    ) -> StoreResult<Vec<RoomRow>> {
        self.with_conn(|conn| match window {
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ROOM_COLS} FROM rooms WHERE available = 1 ORDER BY number"
                ))?;
                let rows = stmt
                    .query_map([], map_room)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            }
            Some((start, end)) => {
                let sql = format!(
                    "SELECT {ROOM_COLS} FROM rooms
                     WHERE available = 1
                       AND NOT EXISTS (
                           SELECT 1 FROM reservations v
                           WHERE v.room_id = rooms.id
                             AND v.status IN {}
                             AND v.start_date < ?2 AND v.end_date > ?1
                       )
                     ORDER BY number",
                    blocking_sql()
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![start.to_string(), end.to_string()], map_room)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            }
        })
    }

    // -- Reservations --

    /// Date-window validation against every other blocking reservation on the
    /// room. `excluding` omits one reservation id so the update path does not
    /// collide with itself.
    pub fn validate_reservation(
        &self,
        room_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        today: NaiveDate,
        excluding: Option<&str>,
    ) -> StoreResult<()> {
        self.with_conn(|conn| check_reservation_window(conn, room_id, start, end, today, excluding))
    }

    /// Conflict scan and insert run in one transaction on the mutex-held
    /// connection, so two overlapping requests cannot both pass the scan.
    pub fn create_reservation(
        &self,
        id: &str,
        room_id: &str,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        status: ReservationStatus,
        today: NaiveDate,
    ) -> StoreResult<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let room_exists: i64 =
                tx.query_row("SELECT COUNT(*) FROM rooms WHERE id = ?1", [room_id], |row| {
                    row.get(0)
                })?;
            if room_exists == 0 {
                return Err(StoreError::NotFound(format!("room {} not found", room_id)));
            }

            check_reservation_window(&tx, room_id, start, end, today, None)?;

            tx.execute(
                "INSERT INTO reservations (id, room_id, user_id, start_date, end_date, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id,
                    room_id,
                    user_id,
                    start.to_string(),
                    end.to_string(),
                    status.as_str()
                ],
            )?;

            tx.commit()?;
            Ok(())
        })
    }

    /// All reservations, or one user's when `owner` is given, newest first.
    pub fn list_reservations(&self, owner: Option<&str>) -> StoreResult<Vec<ReservationRow>> {
        self.with_conn(|conn| {
            let base = "SELECT v.id, v.room_id, v.user_id, u.username,
                               v.start_date, v.end_date, v.status, v.created_at
                        FROM reservations v
                        LEFT JOIN users u ON v.user_id = u.id";
            let rows = match owner {
                Some(user_id) => {
                    let mut stmt = conn.prepare(&format!(
                        "{base} WHERE v.user_id = ?1 ORDER BY v.created_at DESC"
                    ))?;
                    stmt.query_map([user_id], map_reservation)?
                        .collect::<Result<Vec<_>, _>>()?
                }
                None => {
                    let mut stmt =
                        conn.prepare(&format!("{base} ORDER BY v.created_at DESC"))?;
                    stmt.query_map([], map_reservation)?
                        .collect::<Result<Vec<_>, _>>()?
                }
            };
            Ok(rows)
        })
    }

    pub fn get_reservation(&self, id: &str) -> StoreResult<Option<ReservationRow>> {
        self.with_conn(|conn| query_reservation(conn, id))
    }

    /// Re-validates the new window excluding this reservation, and checks a
    /// status change against the lifecycle table.
    pub fn update_reservation(
        &self,
        id: &str,
        start: NaiveDate,
        end: NaiveDate,
        status: ReservationStatus,
        today: NaiveDate,
    ) -> StoreResult<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let row = query_reservation(&tx, id)?
                .ok_or_else(|| StoreError::NotFound(format!("reservation {} not found", id)))?;
            let current = parse_status(&row)?;

            if status != current && !current.can_transition(status) {
                return Err(StoreError::State(format!(
                    "cannot move a {} reservation to {}",
                    current.as_str(),
                    status.as_str()
                )));
            }

            check_reservation_window(&tx, &row.room_id, start, end, today, Some(id))?;

            tx.execute(
                "UPDATE reservations SET start_date = ?2, end_date = ?3, status = ?4 WHERE id = ?1",
                params![id, start.to_string(), end.to_string(), status.as_str()],
            )?;

            tx.commit()?;
            Ok(())
        })
    }

    pub fn delete_reservation(&self, id: &str) -> StoreResult<()> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM reservations WHERE id = ?1", [id])?;
            if affected == 0 {
                return Err(StoreError::NotFound(format!("reservation {} not found", id)));
            }
            Ok(())
        })
    }

    /// Guest arrival: a pending or paid reservation becomes checkin_accepted
    /// and the room is marked occupied. Both writes commit together.
    pub fn checkin_reservation(&self, id: &str) -> StoreResult<ReservationRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut row = query_reservation(&tx, id)?
                .ok_or_else(|| StoreError::NotFound(format!("reservation {} not found", id)))?;
            let current = parse_status(&row)?;

            if !matches!(current, ReservationStatus::Pending | ReservationStatus::Paid) {
                return Err(StoreError::State(format!(
                    "check-in requires a pending or paid reservation, found {}",
                    current.as_str()
                )));
            }

            tx.execute(
                "UPDATE reservations SET status = ?2 WHERE id = ?1",
                params![id, ReservationStatus::CheckinAccepted.as_str()],
            )?;
            tx.execute(
                "UPDATE rooms SET available = 0 WHERE id = ?1",
                [row.room_id.as_str()],
            )?;

            tx.commit()?;
            row.status = ReservationStatus::CheckinAccepted.as_str().to_string();
            Ok(row)
        })
    }

    /// Guest departure: only a checkin_accepted reservation can check out.
    /// The status change and the room's availability flag flip back to free
    /// are one unit — neither commits without the other.
    pub fn checkout_reservation(&self, id: &str) -> StoreResult<ReservationRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut row = query_reservation(&tx, id)?
                .ok_or_else(|| StoreError::NotFound(format!("reservation {} not found", id)))?;
            let current = parse_status(&row)?;

            if current != ReservationStatus::CheckinAccepted {
                return Err(StoreError::State(format!(
                    "checkout requires a checkin_accepted reservation, found {}",
                    current.as_str()
                )));
            }

            tx.execute(
                "UPDATE reservations SET status = ?2 WHERE id = ?1",
                params![id, ReservationStatus::Checkout.as_str()],
            )?;
            tx.execute(
                "UPDATE rooms SET available = 1 WHERE id = ?1",
                [row.room_id.as_str()],
            )?;

            tx.commit()?;
            row.status = ReservationStatus::Checkout.as_str().to_string();
            Ok(row)
        })
    }

    // -- Settings --

    /// Fetch the settings row, creating it with the 14:00/12:00 defaults if
    /// absent. The fixed-id INSERT OR IGNORE is race-safe: losing the race
    /// just means reading the row the winner created.
    pub fn get_settings(&self) -> StoreResult<SettingsRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO settings (id) VALUES (1)",
                [],
            )?;
            let row = conn.query_row(
                "SELECT check_in_time, check_out_time FROM settings WHERE id = 1",
                [],
                |row| {
                    Ok(SettingsRow {
                        check_in_time: row.get(0)?,
                        check_out_time: row.get(1)?,
                    })
                },
            )?;
            Ok(row)
        })
    }

    pub fn update_settings(&self, check_in: &str, check_out: &str) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO settings (id, check_in_time, check_out_time) VALUES (1, ?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET
                     check_in_time = excluded.check_in_time,
                     check_out_time = excluded.check_out_time",
                params![check_in, check_out],
            )?;
            Ok(())
        })
    }
}

/// The overlap check itself. Half-open `[start, end)` semantics: ranges
/// collide iff `s1 < e2 AND e1 > s2`, so a stay ending on day D never
/// conflicts with one starting on day D. Only blocking statuses count.
/// ISO date strings compare lexicographically, which SQLite relies on here.
fn check_reservation_window(
    conn: &Connection,
    room_id: &str,
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
    excluding: Option<&str>,
) -> StoreResult<()> {
    if start >= end {
        return Err(StoreError::DateRange(
            "start date must be before end date".into(),
        ));
    }
    if start < today {
        return Err(StoreError::DateRange(
            "start date must not be in the past".into(),
        ));
    }

    let sql = format!(
        "SELECT COUNT(*) FROM reservations
         WHERE room_id = ?1
           AND status IN {}
           AND start_date < ?2 AND end_date > ?3
           AND (?4 IS NULL OR id <> ?4)",
        blocking_sql()
    );
    let conflicts: i64 = conn.query_row(
        &sql,
        params![room_id, end.to_string(), start.to_string(), excluding],
        |row| row.get(0),
    )?;

    if conflicts > 0 {
        return Err(StoreError::Conflict(
            "room is not available for the selected dates".into(),
        ));
    }
    Ok(())
}

fn query_reservation(conn: &Connection, id: &str) -> StoreResult<Option<ReservationRow>> {
    let row = conn
        .query_row(
            "SELECT v.id, v.room_id, v.user_id, u.username,
                    v.start_date, v.end_date, v.status, v.created_at
             FROM reservations v
             LEFT JOIN users u ON v.user_id = u.id
             WHERE v.id = ?1",
            [id],
            map_reservation,
        )
        .optional()?;
    Ok(row)
}

fn parse_status(row: &ReservationRow) -> StoreResult<ReservationStatus> {
    ReservationStatus::parse(&row.status).ok_or_else(|| {
        StoreError::Internal(format!(
            "corrupt status '{}' on reservation {}",
            row.status, row.id
        ))
    })
}

fn map_user(row: &Row) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        admin: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn map_room(row: &Row) -> rusqlite::Result<RoomRow> {
    Ok(RoomRow {
        id: row.get(0)?,
        category: row.get(1)?,
        number: row.get(2)?,
        price: row.get(3)?,
        available: row.get(4)?,
        image: row.get(5)?,
        description: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn map_reservation(row: &Row) -> rusqlite::Result<ReservationRow> {
    Ok(ReservationRow {
        id: row.get(0)?,
        room_id: row.get(1)?,
        user_id: row.get(2)?,
        username: row
            .get::<_, Option<String>>(3)?
            .unwrap_or_else(|| "unknown".to_string()),
        start_date: row.get(4)?,
        end_date: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn today() -> NaiveDate {
        d("2025-06-01")
    }

    fn seed_user(db: &Database) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_user(&id, &format!("guest-{}", &id[..8]), None, "hash")
            .unwrap();
        id
    }

    fn seed_room(db: &Database, number: i64) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_room(&id, "double", number, 150.0, true, None, None)
            .unwrap();
        id
    }

    fn reserve(
        db: &Database,
        room: &str,
        user: &str,
        start: &str,
        end: &str,
        status: ReservationStatus,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_reservation(&id, room, user, d(start), d(end), status, today())
            .unwrap();
        id
    }

    #[test]
    fn free_room_validates() {
        let db = db();
        let room = seed_room(&db, 101);
        db.validate_reservation(&room, d("2025-06-02"), d("2025-06-05"), today(), None)
            .unwrap();
    }

    #[test]
    fn inverted_and_empty_ranges_rejected() {
        let db = db();
        let room = seed_room(&db, 101);

        let err = db
            .validate_reservation(&room, d("2025-06-05"), d("2025-06-02"), today(), None)
            .unwrap_err();
        assert!(matches!(err, StoreError::DateRange(_)));

        // start == end is an empty stay
        let err = db
            .validate_reservation(&room, d("2025-06-02"), d("2025-06-02"), today(), None)
            .unwrap_err();
        assert!(matches!(err, StoreError::DateRange(_)));
    }

    #[test]
    fn past_start_date_rejected() {
        let db = db();
        let room = seed_room(&db, 101);
        let err = db
            .validate_reservation(&room, d("2025-05-28"), d("2025-06-03"), today(), None)
            .unwrap_err();
        assert!(matches!(err, StoreError::DateRange(_)));
    }

    #[test]
    fn double_booking_is_impossible() {
        let db = db();
        let user = seed_user(&db);
        let room = seed_room(&db, 101);
        reserve(&db, &room, &user, "2025-06-01", "2025-06-05", ReservationStatus::Pending);

        let err = db
            .create_reservation(
                &Uuid::new_v4().to_string(),
                &room,
                &user,
                d("2025-06-03"),
                d("2025-06-08"),
                ReservationStatus::Pending,
                today(),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn back_to_back_stays_do_not_conflict() {
        let db = db();
        let user = seed_user(&db);
        let room = seed_room(&db, 101);
        reserve(&db, &room, &user, "2025-06-01", "2025-06-05", ReservationStatus::Paid);

        // Half-open ranges: checkout day == next arrival day is fine
        db.validate_reservation(&room, d("2025-06-05"), d("2025-06-08"), today(), None)
            .unwrap();
    }

    #[test]
    fn non_blocking_statuses_do_not_block() {
        let db = db();
        let user = seed_user(&db);
        let room = seed_room(&db, 101);
        let cancelled = reserve(&db, &room, &user, "2025-06-02", "2025-06-06", ReservationStatus::Pending);
        db.update_reservation(
            &cancelled,
            d("2025-06-02"),
            d("2025-06-06"),
            ReservationStatus::Cancelled,
            today(),
        )
        .unwrap();

        db.validate_reservation(&room, d("2025-06-02"), d("2025-06-06"), today(), None)
            .unwrap();
    }

    #[test]
    fn conflicts_are_per_room() {
        let db = db();
        let user = seed_user(&db);
        let room_a = seed_room(&db, 101);
        let room_b = seed_room(&db, 102);
        reserve(&db, &room_a, &user, "2025-06-02", "2025-06-06", ReservationStatus::Pending);

        db.validate_reservation(&room_b, d("2025-06-02"), d("2025-06-06"), today(), None)
            .unwrap();
    }

    #[test]
    fn update_excludes_own_reservation() {
        let db = db();
        let user = seed_user(&db);
        let room = seed_room(&db, 101);
        let id = reserve(&db, &room, &user, "2025-06-02", "2025-06-06", ReservationStatus::Pending);

        // Extending our own stay by a day must not collide with ourselves
        db.update_reservation(
            &id,
            d("2025-06-02"),
            d("2025-06-07"),
            ReservationStatus::Pending,
            today(),
        )
        .unwrap();

        let row = db.get_reservation(&id).unwrap().unwrap();
        assert_eq!(row.end_date, "2025-06-07");
    }

    #[test]
    fn update_still_sees_other_reservations() {
        let db = db();
        let user = seed_user(&db);
        let room = seed_room(&db, 101);
        let first = reserve(&db, &room, &user, "2025-06-02", "2025-06-05", ReservationStatus::Pending);
        reserve(&db, &room, &user, "2025-06-05", "2025-06-08", ReservationStatus::Pending);

        let err = db
            .update_reservation(
                &first,
                d("2025-06-02"),
                d("2025-06-06"),
                ReservationStatus::Pending,
                today(),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn update_enforces_lifecycle() {
        let db = db();
        let user = seed_user(&db);
        let room = seed_room(&db, 101);
        let id = reserve(&db, &room, &user, "2025-06-02", "2025-06-06", ReservationStatus::Pending);

        // pending -> checkout skips the whole lifecycle
        let err = db
            .update_reservation(
                &id,
                d("2025-06-02"),
                d("2025-06-06"),
                ReservationStatus::Checkout,
                today(),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::State(_)));

        // pending -> paid is legal
        db.update_reservation(
            &id,
            d("2025-06-02"),
            d("2025-06-06"),
            ReservationStatus::Paid,
            today(),
        )
        .unwrap();
        assert_eq!(db.get_reservation(&id).unwrap().unwrap().status, "paid");
    }

    #[test]
    fn checkin_marks_room_occupied() {
        let db = db();
        let user = seed_user(&db);
        let room = seed_room(&db, 101);
        let id = reserve(&db, &room, &user, "2025-06-02", "2025-06-06", ReservationStatus::Paid);

        let row = db.checkin_reservation(&id).unwrap();
        assert_eq!(row.status, "checkin_accepted");
        assert!(!db.get_room(&room).unwrap().unwrap().available);
    }

    #[test]
    fn checkin_requires_pending_or_paid() {
        let db = db();
        let user = seed_user(&db);
        let room = seed_room(&db, 101);
        let id = reserve(&db, &room, &user, "2025-06-02", "2025-06-06", ReservationStatus::Paid);
        db.checkin_reservation(&id).unwrap();

        // Already checked in
        let err = db.checkin_reservation(&id).unwrap_err();
        assert!(matches!(err, StoreError::State(_)));
    }

    #[test]
    fn checkout_requires_checkin_accepted() {
        let db = db();
        let user = seed_user(&db);
        let room = seed_room(&db, 101);
        let id = reserve(&db, &room, &user, "2025-06-02", "2025-06-06", ReservationStatus::Pending);

        let err = db.checkout_reservation(&id).unwrap_err();
        assert!(matches!(err, StoreError::State(_)));
        // Room flag untouched by the failed checkout
        assert!(db.get_room(&room).unwrap().unwrap().available);
    }

    #[test]
    fn checkout_frees_the_room() {
        let db = db();
        let user = seed_user(&db);
        let room = seed_room(&db, 101);
        let id = reserve(&db, &room, &user, "2025-06-02", "2025-06-06", ReservationStatus::Paid);
        db.checkin_reservation(&id).unwrap();
        assert!(!db.get_room(&room).unwrap().unwrap().available);

        let row = db.checkout_reservation(&id).unwrap();
        assert_eq!(row.status, "checkout");
        assert!(db.get_room(&room).unwrap().unwrap().available);

        // Terminal: a second checkout fails
        let err = db.checkout_reservation(&id).unwrap_err();
        assert!(matches!(err, StoreError::State(_)));
    }

    #[test]
    fn checkout_unknown_reservation() {
        let db = db();
        let err = db
            .checkout_reservation(&Uuid::new_v4().to_string())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn reservation_requires_existing_room() {
        let db = db();
        let user = seed_user(&db);
        let err = db
            .create_reservation(
                &Uuid::new_v4().to_string(),
                &Uuid::new_v4().to_string(),
                &user,
                d("2025-06-02"),
                d("2025-06-06"),
                ReservationStatus::Pending,
                today(),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn unfiltered_availability_is_flag_only() {
        let db = db();
        let user = seed_user(&db);
        let free = seed_room(&db, 101);
        let occupied_id = Uuid::new_v4().to_string();
        db.create_room(&occupied_id, "single", 102, 90.0, false, None, None)
            .unwrap();

        // Reservation history is irrelevant without a window
        reserve(&db, &free, &user, "2025-06-02", "2025-06-06", ReservationStatus::Pending);

        let rooms = db.list_available_rooms(None).unwrap();
        let numbers: Vec<i64> = rooms.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![101]);
    }

    #[test]
    fn windowed_availability_excludes_blocked_rooms() {
        let db = db();
        let user = seed_user(&db);
        let blocked = seed_room(&db, 101);
        seed_room(&db, 102);
        reserve(&db, &blocked, &user, "2025-06-02", "2025-06-06", ReservationStatus::Paid);

        let rooms = db
            .list_available_rooms(Some((d("2025-06-04"), d("2025-06-08"))))
            .unwrap();
        let numbers: Vec<i64> = rooms.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![102]);

        // Adjacent window starting on the checkout day sees both rooms
        let rooms = db
            .list_available_rooms(Some((d("2025-06-06"), d("2025-06-09"))))
            .unwrap();
        assert_eq!(rooms.len(), 2);
    }

    #[test]
    fn windowed_availability_ignores_cancelled() {
        let db = db();
        let user = seed_user(&db);
        let room = seed_room(&db, 101);
        let id = reserve(&db, &room, &user, "2025-06-02", "2025-06-06", ReservationStatus::Pending);
        db.update_reservation(
            &id,
            d("2025-06-02"),
            d("2025-06-06"),
            ReservationStatus::Cancelled,
            today(),
        )
        .unwrap();

        let rooms = db
            .list_available_rooms(Some((d("2025-06-02"), d("2025-06-06"))))
            .unwrap();
        assert_eq!(rooms.len(), 1);
    }

    #[test]
    fn duplicate_room_number_rejected() {
        let db = db();
        seed_room(&db, 101);
        let err = db
            .create_room(
                &Uuid::new_v4().to_string(),
                "single",
                101,
                80.0,
                true,
                None,
                None,
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[test]
    fn duplicate_username_rejected() {
        let db = db();
        db.create_user(&Uuid::new_v4().to_string(), "maria", None, "hash")
            .unwrap();
        let err = db
            .create_user(&Uuid::new_v4().to_string(), "maria", None, "hash")
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[test]
    fn room_delete_cascades_reservations() {
        let db = db();
        let user = seed_user(&db);
        let room = seed_room(&db, 101);
        let id = reserve(&db, &room, &user, "2025-06-02", "2025-06-06", ReservationStatus::Pending);

        db.delete_room(&room).unwrap();
        assert!(db.get_reservation(&id).unwrap().is_none());
        assert!(matches!(
            db.delete_room(&room).unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[test]
    fn settings_lazy_create_with_defaults() {
        let db = db();
        let settings = db.get_settings().unwrap();
        assert_eq!(settings.check_in_time, "14:00");
        assert_eq!(settings.check_out_time, "12:00");

        // Recreated on first access even if the row went missing
        db.with_conn(|conn| {
            conn.execute("DELETE FROM settings", [])?;
            Ok(())
        })
        .unwrap();
        let settings = db.get_settings().unwrap();
        assert_eq!(settings.check_in_time, "14:00");
    }

    #[test]
    fn settings_row_is_unique() {
        let db = db();
        db.get_settings().unwrap();

        // The CHECK constraint refuses any id but 1
        let err = db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO settings (id, check_in_time, check_out_time) VALUES (2, '15:00', '11:00')",
                [],
            )?;
            Ok(())
        });
        assert!(err.is_err());

        let count: i64 = db
            .with_conn(|conn| {
                let n = conn.query_row("SELECT COUNT(*) FROM settings", [], |row| row.get(0))?;
                Ok(n)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn settings_update_persists() {
        let db = db();
        db.update_settings("15:00", "11:00").unwrap();
        let settings = db.get_settings().unwrap();
        assert_eq!(settings.check_in_time, "15:00");
        assert_eq!(settings.check_out_time, "11:00");
    }

    #[test]
    fn ensure_admin_promotes_existing_user() {
        let db = db();
        let id = Uuid::new_v4().to_string();
        db.create_user(&id, "front-desk", None, "original-hash")
            .unwrap();

        db.ensure_admin(&Uuid::new_v4().to_string(), "front-desk", "other-hash")
            .unwrap();

        let user = db.get_user_by_username("front-desk").unwrap().unwrap();
        assert!(user.admin);
        assert_eq!(user.id, id);
        assert_eq!(user.password, "original-hash");
    }
}
