// Activity entity
// Owns its signups: deleting an activity removes every signup that points at it.

use crate::error::{StoreError, StoreResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const ENTITY: &str = "Activity";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub name: Option<String>,
    pub difficulty: Option<i64>,
}

impl Activity {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Activity {
            id: row.get(0)?,
            name: row.get(1)?,
            difficulty: row.get(2)?,
        })
    }
}

pub fn insert_activity(
    conn: &Connection,
    name: Option<&str>,
    difficulty: Option<i64>,
) -> StoreResult<Activity> {
    conn.execute(
        "INSERT INTO activities (name, difficulty) VALUES (?1, ?2)",
        params![name, difficulty],
    )?;

    let activity = Activity {
        id: conn.last_insert_rowid(),
        name: name.map(str::to_string),
        difficulty,
    };
    debug!(id = activity.id, "activity created");

    Ok(activity)
}

pub fn get_activity(conn: &Connection, id: i64) -> StoreResult<Activity> {
    conn.query_row(
        "SELECT id, name, difficulty FROM activities WHERE id = ?1",
        [id],
        Activity::from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found(ENTITY, id))
}

/// All activities in insertion order
pub fn list_activities(conn: &Connection) -> StoreResult<Vec<Activity>> {
    let mut stmt = conn.prepare("SELECT id, name, difficulty FROM activities ORDER BY id")?;

    let activities = stmt
        .query_map([], Activity::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(activities)
}

/// Delete an activity and, in the same transaction, all of its signups.
pub fn delete_activity(conn: &Connection, id: i64) -> StoreResult<()> {
    let tx = conn.unchecked_transaction()?;

    let exists = tx
        .query_row("SELECT 1 FROM activities WHERE id = ?1", [id], |_| Ok(()))
        .optional()?
        .is_some();
    if !exists {
        return Err(StoreError::not_found(ENTITY, id));
    }

    let removed = tx.execute("DELETE FROM signups WHERE activity_id = ?1", [id])?;
    tx.execute("DELETE FROM activities WHERE id = ?1", [id])?;
    tx.commit()?;

    info!(id, signups_removed = removed, "activity deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_database;
    use crate::entities::camper::insert_camper;
    use crate::entities::signup::{get_signup, insert_signup, list_signups};

    #[test]
    fn test_insert_and_list_in_order() {
        let conn = open_database(":memory:").unwrap();

        let archery = insert_activity(&conn, Some("Archery"), Some(2)).unwrap();
        let canoe = insert_activity(&conn, Some("Canoeing"), Some(4)).unwrap();

        let all = list_activities(&conn).unwrap();
        assert_eq!(all, vec![archery, canoe]);
    }

    #[test]
    fn test_get_missing_activity() {
        let conn = open_database(":memory:").unwrap();

        let err = get_activity(&conn, 99).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Activity not found");
    }

    #[test]
    fn test_delete_cascades_to_signups() {
        let conn = open_database(":memory:").unwrap();

        let hike = insert_activity(&conn, Some("Hiking"), Some(3)).unwrap();
        let swim = insert_activity(&conn, Some("Swimming"), Some(1)).unwrap();
        let camper = insert_camper(&conn, Some("Alex"), Some(12)).unwrap();

        let doomed: Vec<i64> = (9..12)
            .map(|hour| {
                insert_signup(&conn, Some(camper.id), Some(hike.id), Some(hour))
                    .unwrap()
                    .id
            })
            .collect();
        let kept = insert_signup(&conn, Some(camper.id), Some(swim.id), Some(14)).unwrap();

        delete_activity(&conn, hike.id).unwrap();

        assert!(get_activity(&conn, hike.id).unwrap_err().is_not_found());
        for id in doomed {
            assert!(get_signup(&conn, id).unwrap_err().is_not_found());
        }
        assert_eq!(list_signups(&conn).unwrap(), vec![kept]);
    }

    #[test]
    fn test_delete_missing_activity_changes_nothing() {
        let conn = open_database(":memory:").unwrap();
        insert_activity(&conn, Some("Archery"), Some(2)).unwrap();

        let err = delete_activity(&conn, 42).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(list_activities(&conn).unwrap().len(), 1);
    }
}
