use anyhow::{bail, Result};
use std::env;
use std::path::Path;
use tracing::info;

use camp_signups::{logging, open_database, reset, seed_from_csv, table_counts, Config};

const USAGE: &str = "usage: camp-signups <init | seed <activities.csv> <campers.csv> [signups.csv] | stats>";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let config = Config::load()?;
    logging::init_logger(&config.log_filter);

    match args.get(1).map(String::as_str) {
        Some("init") => run_init(&config),
        Some("seed") => run_seed(&config, &args[2..]),
        Some("stats") => run_stats(&config),
        _ => bail!(USAGE),
    }
}

fn run_init(config: &Config) -> Result<()> {
    open_database(&config.database_url)?;
    info!(database = %config.database_url, "schema ready");
    Ok(())
}

fn run_seed(config: &Config, files: &[String]) -> Result<()> {
    let (activities, campers, signups) = match files {
        [a, c] => (a, c, None),
        [a, c, s] => (a, c, Some(s)),
        _ => bail!(USAGE),
    };

    let conn = open_database(&config.database_url)?;
    reset(&conn)?;

    let report = seed_from_csv(
        &conn,
        Path::new(activities),
        Path::new(campers),
        signups.map(Path::new),
    )?;

    println!("Activities: {} inserted, {} skipped", report.activities.inserted, report.activities.skipped);
    println!("Campers:    {} inserted, {} skipped", report.campers.inserted, report.campers.skipped);
    println!("Signups:    {} inserted, {} skipped", report.signups.inserted, report.signups.skipped);

    Ok(())
}

fn run_stats(config: &Config) -> Result<()> {
    let conn = open_database(&config.database_url)?;
    let counts = table_counts(&conn)?;

    println!("Activities: {}", counts.activities);
    println!("Campers:    {}", counts.campers);
    println!("Signups:    {}", counts.signups);

    Ok(())
}
