//! Device table selection

use anyhow::{Context, Result};
use tracing::info;

use crate::config::{AppConfig, Backend};
use crate::table::{DeviceTable, MemoryTable};

/// Open the device table the configuration asks for
pub fn open_table(config: &AppConfig) -> Result<Box<dyn DeviceTable>> {
    match config.backend {
        Backend::File => open_file(config),
        Backend::CoreMidi => open_coremidi(),
        Backend::Ports => open_ports(),
        Backend::Auto if config.topology.is_some() => open_file(config),
        Backend::Auto if cfg!(target_os = "macos") => open_coremidi(),
        Backend::Auto if cfg!(feature = "ports") => open_ports(),
        Backend::Auto => anyhow::bail!(
            "No MIDI backend available on this platform; pass --topology <file.yaml>"
        ),
    }
}

fn open_file(config: &AppConfig) -> Result<Box<dyn DeviceTable>> {
    let path = config
        .topology
        .as_ref()
        .context("No topology file configured")?;
    let table = MemoryTable::load(path)?;
    info!("Using topology file {}", path.display());
    Ok(Box::new(table))
}

#[cfg(target_os = "macos")]
fn open_coremidi() -> Result<Box<dyn DeviceTable>> {
    info!("Using CoreMIDI device table");
    Ok(Box::new(crate::table::CoreMidiTable::new()))
}

#[cfg(not(target_os = "macos"))]
fn open_coremidi() -> Result<Box<dyn DeviceTable>> {
    anyhow::bail!("The CoreMIDI backend is only available on macOS")
}

#[cfg(feature = "ports")]
fn open_ports() -> Result<Box<dyn DeviceTable>> {
    let table = crate::table::PortTable::scan().context("Failed to scan MIDI ports")?;
    info!("Using midir port scan");
    Ok(Box::new(table))
}

#[cfg(not(feature = "ports"))]
fn open_ports() -> Result<Box<dyn DeviceTable>> {
    anyhow::bail!("The port scan backend needs the 'ports' feature")
}
