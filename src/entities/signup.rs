// Signup entity
// Join record between a camper and an activity, carrying the hour of day.
// Reference checks are left to the foreign keys declared in the schema.

use crate::error::{StoreError, StoreResult, ValidationError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const ENTITY: &str = "Signup";

pub const FIRST_HOUR: i64 = 0;
pub const LAST_HOUR: i64 = 23;

const SIGNUP_SELECT_SQL: &str = "SELECT id, time, camper_id, activity_id FROM signups";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signup {
    pub id: i64,
    pub time: i64,
    pub camper_id: i64,
    pub activity_id: i64,
}

impl Signup {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Signup {
            id: row.get(0)?,
            time: row.get(1)?,
            camper_id: row.get(2)?,
            activity_id: row.get(3)?,
        })
    }
}

/// Presence and range are checked separately, so hour 0 is accepted.
pub fn validate_time(time: Option<i64>) -> Result<i64, ValidationError> {
    match time {
        Some(time) if (FIRST_HOUR..=LAST_HOUR).contains(&time) => Ok(time),
        _ => Err(ValidationError::Time),
    }
}

pub fn insert_signup(
    conn: &Connection,
    camper_id: Option<i64>,
    activity_id: Option<i64>,
    time: Option<i64>,
) -> StoreResult<Signup> {
    let time = validate_time(time)?;

    let result = conn.execute(
        "INSERT INTO signups (time, camper_id, activity_id) VALUES (?1, ?2, ?3)",
        params![time, camper_id, activity_id],
    );

    match result {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            info!(?camper_id, ?activity_id, "signup rejected: dangling reference");
            return Err(ValidationError::Reference.into());
        }
        Err(e) => return Err(e.into()),
    }

    // Both ids are non-null once the NOT NULL constraints have passed
    let signup = Signup {
        id: conn.last_insert_rowid(),
        time,
        camper_id: camper_id.unwrap_or_default(),
        activity_id: activity_id.unwrap_or_default(),
    };
    debug!(id = signup.id, "signup created");

    Ok(signup)
}

pub fn get_signup(conn: &Connection, id: i64) -> StoreResult<Signup> {
    conn.query_row(
        &format!("{SIGNUP_SELECT_SQL} WHERE id = ?1"),
        [id],
        Signup::from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found(ENTITY, id))
}

pub fn list_signups(conn: &Connection) -> StoreResult<Vec<Signup>> {
    query_signups(conn, &format!("{SIGNUP_SELECT_SQL} ORDER BY id"), None)
}

pub fn signups_for_camper(conn: &Connection, camper_id: i64) -> StoreResult<Vec<Signup>> {
    query_signups(
        conn,
        &format!("{SIGNUP_SELECT_SQL} WHERE camper_id = ?1 ORDER BY id"),
        Some(camper_id),
    )
}

pub fn signups_for_activity(conn: &Connection, activity_id: i64) -> StoreResult<Vec<Signup>> {
    query_signups(
        conn,
        &format!("{SIGNUP_SELECT_SQL} WHERE activity_id = ?1 ORDER BY id"),
        Some(activity_id),
    )
}

fn query_signups(conn: &Connection, sql: &str, key: Option<i64>) -> StoreResult<Vec<Signup>> {
    let mut stmt = conn.prepare(sql)?;

    let rows = match key {
        Some(key) => stmt.query_map([key], Signup::from_row)?,
        None => stmt.query_map([], Signup::from_row)?,
    };

    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
