//! Topology listing
//!
//! Walks every device and entity and renders an inventory, one line per
//! device:
//!
//! ```text
//! Keystation[online]:	"Keystation::Port 1", "Keystation::Port 2"
//! ```

use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::locator::DELIMITER;
use crate::naming::{is_offline, name_of, unique_id_of};
use crate::table::{self, DeviceTable};

/// Structured inventory of a device table at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Topology {
    pub devices: Vec<DeviceInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub name: Option<String>,
    /// `0` when unavailable
    pub unique_id: i32,
    pub online: bool,
    pub entities: Vec<EntityInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityInfo {
    pub name: Option<String>,
    pub unique_id: i32,
    /// Fully qualified `"<device>::<entity>"` form
    pub locator: String,
    pub sources: usize,
    pub destinations: usize,
}

impl DeviceInfo {
    fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    fn status(&self) -> &'static str {
        if self.online {
            "online"
        } else {
            "offline"
        }
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]:\t", self.display_name(), self.status())?;
        for (i, entity) in self.entities.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "\"{}\"", entity.locator)?;
        }
        Ok(())
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, device) in self.devices.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}", device)?;
        }
        Ok(())
    }
}

/// Renders the device table inventory
#[derive(Debug, Clone)]
pub struct Lister<T> {
    table: T,
}

impl<T: DeviceTable> Lister<T> {
    pub fn new(table: T) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    /// One line per device, joined by `\n` without a trailing newline
    pub fn list_topology(&self) -> String {
        self.snapshot().to_string()
    }

    /// Walk the table once and collect every device and entity
    pub fn snapshot(&self) -> Topology {
        let devices: Vec<DeviceInfo> = table::devices(&self.table)
            .map(|device| {
                let name = name_of(&self.table, device);
                let prefix = name.as_deref().unwrap_or_default();

                let entities = table::entities(&self.table, device)
                    .map(|entity| {
                        let entity_name = name_of(&self.table, entity);
                        EntityInfo {
                            locator: format!(
                                "{}{}{}",
                                prefix,
                                DELIMITER,
                                entity_name.as_deref().unwrap_or_default()
                            ),
                            unique_id: unique_id_of(&self.table, entity),
                            sources: self.table.source_count(entity),
                            destinations: self.table.destination_count(entity),
                            name: entity_name,
                        }
                    })
                    .collect();

                DeviceInfo {
                    unique_id: unique_id_of(&self.table, device),
                    online: !is_offline(&self.table, device),
                    name,
                    entities,
                }
            })
            .collect();

        debug!("Listed {} devices", devices.len());
        Topology { devices }
    }
}
