// CSV seeding
// Every row goes through the same validated store operations as the API;
// rows that fail are skipped and counted rather than aborting the run.

use crate::entities::{insert_activity, insert_camper, insert_signup};
use crate::error::StoreError;
use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// activities.csv: `name,difficulty`
#[derive(Debug, Deserialize)]
struct ActivityRow {
    name: Option<String>,
    difficulty: Option<i64>,
}

/// campers.csv: `name,age`
#[derive(Debug, Deserialize)]
struct CamperRow {
    name: Option<String>,
    age: Option<i64>,
}

/// signups.csv: `camper_row,activity_row,time`, rows counted from 1 within
/// the camper and activity files of the same run.
#[derive(Debug, Deserialize)]
struct SignupRow {
    camper_row: usize,
    activity_row: usize,
    time: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub inserted: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub activities: Tally,
    pub campers: Tally,
    pub signups: Tally,
}

/// Empty all three tables, dependents first.
pub fn reset(conn: &Connection) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM signups", [])?;
    tx.execute("DELETE FROM campers", [])?;
    tx.execute("DELETE FROM activities", [])?;
    tx.commit()?;
    Ok(())
}

pub fn seed_from_csv(
    conn: &Connection,
    activities_csv: &Path,
    campers_csv: &Path,
    signups_csv: Option<&Path>,
) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    let activity_ids = load_rows(activities_csv, &mut report.activities, |row: ActivityRow| {
        insert_activity(conn, row.name.as_deref(), row.difficulty).map(|a| a.id)
    })?;

    let camper_ids = load_rows(campers_csv, &mut report.campers, |row: CamperRow| {
        insert_camper(conn, row.name.as_deref(), row.age).map(|c| c.id)
    })?;

    if let Some(path) = signups_csv {
        let position = |ids: &[Option<i64>], row: usize| {
            row.checked_sub(1).and_then(|i| ids.get(i).copied().flatten())
        };

        load_rows(path, &mut report.signups, |row: SignupRow| {
            insert_signup(
                conn,
                position(&camper_ids, row.camper_row),
                position(&activity_ids, row.activity_row),
                row.time,
            )
            .map(|s| s.id)
        })?;
    }

    info!(
        activities = report.activities.inserted,
        campers = report.campers.inserted,
        signups = report.signups.inserted,
        "seed complete"
    );

    Ok(report)
}

/// Insert each row of `path`; returns the new id per row (None when skipped).
fn load_rows<T, F>(path: &Path, tally: &mut Tally, mut insert: F) -> Result<Vec<Option<i64>>>
where
    T: for<'de> Deserialize<'de>,
    F: FnMut(T) -> Result<i64, StoreError>,
{
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV file: {:?}", path))?;

    let mut ids = Vec::new();

    for (index, result) in rdr.deserialize::<T>().enumerate() {
        let line = index + 2;

        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!(?path, line, error = %e, "unreadable row skipped");
                tally.skipped += 1;
                ids.push(None);
                continue;
            }
        };

        match insert(row) {
            Ok(id) => {
                tally.inserted += 1;
                ids.push(Some(id));
            }
            Err(StoreError::Validation(e)) => {
                warn!(?path, line, error = %e, "invalid row skipped");
                tally.skipped += 1;
                ids.push(None);
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to seed {:?}", path)),
        }
    }

    Ok(ids)
}
