//! Process-wide SQLite storage handle.
//!
//! The connection is opened lazily on first use, which also applies the schema, and is
//! closed explicitly at shutdown. Once closed, every further operation fails with
//! [`IntakeError::StorageClosed`].
//!
//! ## Schema
//!
//! Two independent tables, `patients` and `consultations`, with no foreign key between
//! them. Ids come from `INTEGER PRIMARY KEY AUTOINCREMENT`, so they are monotonic and
//! never reused.

use crate::config::DatabaseLocation;
use crate::error::{IntakeError, IntakeResult};
use rusqlite::Connection;
use std::sync::Mutex;

/// Complete database schema.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS patients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    middle_name TEXT,
    date_of_birth TEXT NOT NULL,
    gender TEXT NOT NULL,
    phone TEXT NOT NULL,
    email TEXT,
    address TEXT NOT NULL,
    city TEXT NOT NULL,
    postal_code TEXT,
    emergency_contact TEXT,
    emergency_phone TEXT,
    medical_history TEXT,
    allergies TEXT,
    medications TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_patients_created_at ON patients(created_at);

CREATE TABLE IF NOT EXISTS consultations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_name TEXT NOT NULL,
    age INTEGER NOT NULL DEFAULT 0,
    gender TEXT NOT NULL,
    phone TEXT,
    height INTEGER NOT NULL DEFAULT 0,
    weight INTEGER NOT NULL DEFAULT 0,
    bmi REAL,
    bmi_status TEXT CHECK (bmi_status IN ('Underweight', 'Normal', 'Overweight', 'Obese')),
    complaints TEXT,
    has_general_exam INTEGER NOT NULL DEFAULT 0,
    has_lab_tests INTEGER NOT NULL DEFAULT 0,
    has_ecg INTEGER NOT NULL DEFAULT 0,
    has_x_ray INTEGER NOT NULL DEFAULT 0,
    has_ultrasound INTEGER NOT NULL DEFAULT 0,
    has_ct INTEGER NOT NULL DEFAULT 0,
    has_mri INTEGER NOT NULL DEFAULT 0,
    has_chronic_diseases INTEGER NOT NULL DEFAULT 0,
    takes_medications INTEGER NOT NULL DEFAULT 0,
    has_allergies INTEGER NOT NULL DEFAULT 0,
    pain_level INTEGER NOT NULL DEFAULT 0 CHECK (pain_level BETWEEN 0 AND 10),
    additional_notes TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_consultations_created_at ON consultations(created_at);
"#;

enum Slot {
    Unopened,
    Open(Connection),
    Closed,
}

/// Shared handle to the intake database.
pub struct Storage {
    location: DatabaseLocation,
    slot: Mutex<Slot>,
}

impl Storage {
    /// Creates a handle for `location` without opening it.
    pub fn new(location: DatabaseLocation) -> Self {
        Self {
            location,
            slot: Mutex::new(Slot::Unopened),
        }
    }

    /// Creates a handle for a fresh in-memory database.
    pub fn in_memory() -> Self {
        Self::new(DatabaseLocation::InMemory)
    }

    pub fn location(&self) -> &DatabaseLocation {
        &self.location
    }

    /// Runs `f` against the connection, opening it first if this is the first use.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::StorageClosed` after [`Storage::close`],
    /// `IntakeError::LockPoisoned` if a previous user panicked while holding the
    /// connection, or `IntakeError::Storage` for any SQLite failure.
    pub fn with_connection<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> rusqlite::Result<T>,
    ) -> IntakeResult<T> {
        let mut slot = self.slot.lock().map_err(|_| IntakeError::LockPoisoned)?;

        match &mut *slot {
            Slot::Open(conn) => return Ok(f(conn)?),
            Slot::Closed => return Err(IntakeError::StorageClosed),
            Slot::Unopened => {}
        }

        let mut conn = open_connection(&self.location)?;
        tracing::info!(database = %self.location, "opened intake database");
        let result = f(&mut conn);
        *slot = Slot::Open(conn);
        Ok(result?)
    }

    pub fn is_open(&self) -> bool {
        self.slot
            .lock()
            .map(|slot| matches!(*slot, Slot::Open(_)))
            .unwrap_or(false)
    }

    /// Flushes and closes the connection. Closing twice, or closing a handle that was
    /// never opened, is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::Storage` if SQLite fails to close the connection cleanly.
    pub fn close(&self) -> IntakeResult<()> {
        let mut slot = self.slot.lock().map_err(|_| IntakeError::LockPoisoned)?;
        match std::mem::replace(&mut *slot, Slot::Closed) {
            Slot::Open(conn) => {
                conn.close().map_err(|(_, e)| IntakeError::Storage(e))?;
                tracing::info!(database = %self.location, "closed intake database");
                Ok(())
            }
            Slot::Unopened | Slot::Closed => Ok(()),
        }
    }
}

fn open_connection(location: &DatabaseLocation) -> rusqlite::Result<Connection> {
    let conn = match location {
        DatabaseLocation::File(path) => Connection::open(path)?,
        DatabaseLocation::InMemory => Connection::open_in_memory()?,
    };
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}
