use crate::StoreResult;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            email       TEXT,
            password    TEXT NOT NULL,
            admin       INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS rooms (
            id          TEXT PRIMARY KEY,
            category    TEXT NOT NULL,
            number      INTEGER NOT NULL UNIQUE,
            price       REAL NOT NULL,
            available   INTEGER NOT NULL DEFAULT 1,
            image       TEXT,
            description TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS reservations (
            id          TEXT PRIMARY KEY,
            room_id     TEXT NOT NULL REFERENCES rooms(id) ON DELETE CASCADE,
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            start_date  TEXT NOT NULL,
            end_date    TEXT NOT NULL,
            status      TEXT NOT NULL DEFAULT 'pending',
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_reservations_room
            ON reservations(room_id, start_date);

        -- Single-row table: the CHECK makes a second settings record impossible
        CREATE TABLE IF NOT EXISTS settings (
            id              INTEGER PRIMARY KEY CHECK (id = 1),
            check_in_time   TEXT NOT NULL DEFAULT '14:00',
            check_out_time  TEXT NOT NULL DEFAULT '12:00'
        );

        -- Seed the settings row
        INSERT OR IGNORE INTO settings (id) VALUES (1);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
