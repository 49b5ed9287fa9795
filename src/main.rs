use std::fs;
use std::process::ExitCode;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use chambers_data::{Combinator, DataRef, DbConfig, DriverRegistry};

const USAGE: &str = "usage: chambers-data <config.json> <database> <namespace>";

fn run() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let (Some(config_path), Some(database), Some(namespace)) =
        (args.next(), args.next(), args.next())
    else {
        anyhow::bail!(USAGE);
    };

    let text = fs::read_to_string(&config_path).with_context(|| format!("reading {config_path}"))?;
    let config = DbConfig::from_json(&text)?;

    let registry = DriverRegistry::with_defaults();
    let mut conn = registry.connect(&config)?;

    let data_ref = DataRef::new(database, namespace);
    let result = conn.query(&data_ref, &[], &[], Combinator::And);
    // Close even when the query failed; report the query error first.
    let closed = conn.close();
    let result = result?;
    closed?;

    let header: Vec<&str> = result.metadata.columns.iter().map(|c| c.name.as_str()).collect();
    if !header.is_empty() {
        println!("{}", header.join("\t"));
    }
    for record in &result.records {
        let cells: Vec<String> = record.values.iter().map(ToString::to_string).collect();
        println!("{}", cells.join("\t"));
    }
    eprintln!("{} record(s)", result.lines);
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
