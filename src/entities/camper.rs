// Camper entity
// name is required and non-empty; age is required and within MIN_AGE..=MAX_AGE.

use crate::error::{StoreError, StoreResult, ValidationError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const ENTITY: &str = "Camper";

pub const MIN_AGE: i64 = 8;
pub const MAX_AGE: i64 = 18;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Camper {
    pub id: i64,
    pub name: String,
    pub age: i64,
}

impl Camper {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Camper {
            id: row.get(0)?,
            name: row.get(1)?,
            age: row.get(2)?,
        })
    }

    /// Assign one field, running that field's rule first.
    pub fn apply(&mut self, field: &CamperField) -> Result<(), ValidationError> {
        match field {
            CamperField::Name(name) => {
                self.name = validate_name(name.as_deref())?.to_string();
            }
            CamperField::Age(age) => {
                self.age = validate_age(*age)?;
            }
        }
        Ok(())
    }
}

/// A single assignment in a partial update. `None` means the caller supplied
/// the key without a usable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CamperField {
    Name(Option<String>),
    Age(Option<i64>),
}

// ============================================================================
// VALIDATION
// ============================================================================

pub fn validate_name(name: Option<&str>) -> Result<&str, ValidationError> {
    match name {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(ValidationError::Name),
    }
}

pub fn validate_age(age: Option<i64>) -> Result<i64, ValidationError> {
    match age {
        Some(age) if (MIN_AGE..=MAX_AGE).contains(&age) => Ok(age),
        _ => Err(ValidationError::Age),
    }
}

// ============================================================================
// STORE OPERATIONS
// ============================================================================

pub fn insert_camper(
    conn: &Connection,
    name: Option<&str>,
    age: Option<i64>,
) -> StoreResult<Camper> {
    let name = validate_name(name)?;
    let age = validate_age(age)?;

    conn.execute(
        "INSERT INTO campers (name, age) VALUES (?1, ?2)",
        params![name, age],
    )?;

    let camper = Camper {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        age,
    };
    debug!(id = camper.id, "camper created");

    Ok(camper)
}

pub fn get_camper(conn: &Connection, id: i64) -> StoreResult<Camper> {
    conn.query_row(
        "SELECT id, name, age FROM campers WHERE id = ?1",
        [id],
        Camper::from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found(ENTITY, id))
}

pub fn list_campers(conn: &Connection) -> StoreResult<Vec<Camper>> {
    let mut stmt = conn.prepare("SELECT id, name, age FROM campers ORDER BY id")?;

    let campers = stmt
        .query_map([], Camper::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(campers)
}

/// Apply `fields` in order to the stored camper. Any rejected field rejects
/// the whole update and the row is left as it was.
pub fn update_camper(conn: &Connection, id: i64, fields: &[CamperField]) -> StoreResult<Camper> {
    let mut camper = get_camper(conn, id)?;

    for field in fields {
        if let Err(err) = camper.apply(field) {
            info!(id, error = %err, "camper update rejected");
            return Err(err.into());
        }
    }

    conn.execute(
        "UPDATE campers SET name = ?1, age = ?2 WHERE id = ?3",
        params![camper.name, camper.age, id],
    )?;
    debug!(id, fields = fields.len(), "camper updated");

    Ok(camper)
}

/// Delete a camper and, in the same transaction, all of its signups.
pub fn delete_camper(conn: &Connection, id: i64) -> StoreResult<()> {
    let tx = conn.unchecked_transaction()?;

    let exists = tx
        .query_row("SELECT 1 FROM campers WHERE id = ?1", [id], |_| Ok(()))
        .optional()?
        .is_some();
    if !exists {
        return Err(StoreError::not_found(ENTITY, id));
    }

    let removed = tx.execute("DELETE FROM signups WHERE camper_id = ?1", [id])?;
    tx.execute("DELETE FROM campers WHERE id = ?1", [id])?;
    tx.commit()?;

    info!(id, signups_removed = removed, "camper deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{open_database, table_counts};
    use crate::entities::activity::insert_activity;
    use crate::entities::signup::{insert_signup, signups_for_camper};

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name(Some("Alex")), Ok("Alex"));
        assert_eq!(validate_name(Some("")), Err(ValidationError::Name));
        assert_eq!(validate_name(None), Err(ValidationError::Name));
    }

    #[test]
    fn test_validate_age_bounds() {
        assert_eq!(validate_age(Some(8)), Ok(8));
        assert_eq!(validate_age(Some(18)), Ok(18));
        for bad in [0, 7, 19, -3] {
            assert_eq!(validate_age(Some(bad)), Err(ValidationError::Age));
        }
        assert_eq!(validate_age(None), Err(ValidationError::Age));
    }

    #[test]
    fn test_insert_and_get() {
        let conn = open_database(":memory:").unwrap();

        let created = insert_camper(&conn, Some("Alex"), Some(12)).unwrap();
        let fetched = get_camper(&conn, created.id).unwrap();

        assert_eq!(fetched.name, "Alex");
        assert_eq!(fetched.age, 12);
        assert_eq!(fetched, created);
    }

    #[test]
    fn test_invalid_insert_persists_nothing() {
        let conn = open_database(":memory:").unwrap();

        let cases = [
            (Some(""), Some(12)),
            (None, Some(12)),
            (Some("Alex"), Some(7)),
            (Some("Alex"), Some(19)),
            (Some("Alex"), None),
        ];
        for (name, age) in cases {
            let err = insert_camper(&conn, name, age).unwrap_err();
            assert!(err.is_validation(), "{:?} {:?} should be rejected", name, age);
        }

        assert_eq!(table_counts(&conn).unwrap().campers, 0);
    }

    #[test]
    fn test_update_applies_fields() {
        let conn = open_database(":memory:").unwrap();
        let camper = insert_camper(&conn, Some("Alex"), Some(12)).unwrap();

        let updated = update_camper(
            &conn,
            camper.id,
            &[
                CamperField::Name(Some("Sam".to_string())),
                CamperField::Age(Some(14)),
            ],
        )
        .unwrap();

        assert_eq!(updated.name, "Sam");
        assert_eq!(updated.age, 14);
        assert_eq!(get_camper(&conn, camper.id).unwrap(), updated);
    }

    #[test]
    fn test_rejected_update_leaves_row_unchanged() {
        let conn = open_database(":memory:").unwrap();
        let camper = insert_camper(&conn, Some("Alex"), Some(12)).unwrap();

        // First field is fine, second is not: nothing may stick
        let err = update_camper(
            &conn,
            camper.id,
            &[
                CamperField::Name(Some("Sam".to_string())),
                CamperField::Age(Some(30)),
            ],
        )
        .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(get_camper(&conn, camper.id).unwrap(), camper);
    }

    #[test]
    fn test_update_missing_camper() {
        let conn = open_database(":memory:").unwrap();
        insert_camper(&conn, Some("Alex"), Some(12)).unwrap();

        let err = update_camper(&conn, 77, &[CamperField::Age(Some(10))]).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Camper not found");
        assert_eq!(list_campers(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_camper_cascades() {
        let conn = open_database(":memory:").unwrap();
        let camper = insert_camper(&conn, Some("Alex"), Some(12)).unwrap();
        let other = insert_camper(&conn, Some("Jo"), Some(10)).unwrap();
        let activity = insert_activity(&conn, Some("Archery"), Some(2)).unwrap();

        insert_signup(&conn, Some(camper.id), Some(activity.id), Some(9)).unwrap();
        insert_signup(&conn, Some(camper.id), Some(activity.id), Some(10)).unwrap();
        insert_signup(&conn, Some(other.id), Some(activity.id), Some(11)).unwrap();

        delete_camper(&conn, camper.id).unwrap();

        assert!(get_camper(&conn, camper.id).unwrap_err().is_not_found());
        assert!(signups_for_camper(&conn, camper.id).unwrap().is_empty());
        assert_eq!(table_counts(&conn).unwrap().signups, 1);
    }
}
