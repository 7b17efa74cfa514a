//! Command handlers for the `midi-locator` binary

use anyhow::{Context, Result};
use colored::*;

use midi_locator::table::entities;
use midi_locator::{
    is_offline, name_of, unique_id_of, DeviceTable, Direction, EndpointRef, LocateError, Lister,
    Locator, Resolver,
};

/// Output format of the `list` command
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One line per device
    Text,
    Json,
    Yaml,
}

/// Print the inventory. Always succeeds, even for an empty table.
pub fn list(table: &dyn DeviceTable, format: OutputFormat) -> Result<bool> {
    let lister = Lister::new(table);

    match format {
        OutputFormat::Text => {
            let listing = lister.list_topology();
            if listing.is_empty() {
                eprintln!("{}", "No MIDI devices found".dimmed());
            } else {
                println!("{}", listing);
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&lister.snapshot())
                .context("Failed to serialize topology to JSON")?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&lister.snapshot())
                .context("Failed to serialize topology to YAML")?;
            print!("{}", yaml);
        }
    }

    Ok(true)
}

pub fn resolve(table: &dyn DeviceTable, locator: &str, direction: Direction, index: usize) -> bool {
    let resolver = Resolver::new(table);
    let result = Locator::parse(locator).and_then(|l| resolver.locate(&l, direction, index));
    report(table, result)
}

pub fn source(table: &dyn DeviceTable, device: &str, entity_index: usize, index: usize) -> bool {
    let resolver = Resolver::new(table);
    let result = resolver.locate_by_index(device, entity_index, Direction::Source, index);
    report(table, result)
}

pub fn device(table: &dyn DeviceTable, name: &str) -> bool {
    let resolver = Resolver::new(table);
    let Some(device) = resolver.resolve_device_by_name(name) else {
        eprintln!("{} {}", "✗".red().bold(), LocateError::DeviceNotFound(name.to_string()));
        return false;
    };

    let status = if is_offline(table, device) {
        "offline".red()
    } else {
        "online".green()
    };
    println!(
        "{} {} [{}] id={}",
        device.to_string().dimmed(),
        name.bright_white().bold(),
        status,
        unique_id_of(table, device)
    );

    let children: Vec<_> = entities(table, device).collect();
    if children.is_empty() {
        println!("  {}", "No entities".dimmed());
    }
    for (i, entity) in children.into_iter().enumerate() {
        let entity_name = name_of(table, entity).unwrap_or_default();
        println!(
            "  {}: {} {} sources, {} destinations",
            i,
            format!("\"{}::{}\"", name, entity_name).cyan(),
            table.source_count(entity),
            table.destination_count(entity)
        );
    }

    true
}

fn report(table: &dyn DeviceTable, result: Result<EndpointRef, LocateError>) -> bool {
    match result {
        Ok(endpoint) => {
            let name = name_of(table, endpoint).unwrap_or_else(|| "-".to_string());
            println!(
                "{} {} id={}",
                endpoint.to_string().green().bold(),
                name,
                unique_id_of(table, endpoint)
            );
            true
        }
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            false
        }
    }
}
