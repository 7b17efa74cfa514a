//! Locator resolution
//!
//! Walks the device table to turn a `"<device>::<entity>"` locator into an
//! endpoint handle. Matching is exact, case-sensitive name equality and
//! first-match: when several devices share a name only the first one in
//! enumeration order is searched, and likewise for entities within it.

use tracing::{debug, trace};

use crate::error::{LocateError, Result};
use crate::locator::Locator;
use crate::naming::name_of;
use crate::table::{self, DeviceRef, DeviceTable, Direction, EndpointRef, EntityRef};

/// Resolves locators against a device table.
///
/// Each call re-enumerates the table; nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct Resolver<T> {
    table: T,
}

impl<T: DeviceTable> Resolver<T> {
    pub fn new(table: T) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    pub fn into_inner(self) -> T {
        self.table
    }

    /// Endpoint `index` of the given direction on the entity named by
    /// `locator`. Malformed locators and misses are both `None`.
    pub fn resolve_endpoint(
        &self,
        locator: &str,
        direction: Direction,
        index: usize,
    ) -> Option<EndpointRef> {
        let locator = match Locator::parse(locator) {
            Ok(locator) => locator,
            Err(e) => {
                debug!("{}", e);
                return None;
            }
        };
        self.locate(&locator, direction, index).ok()
    }

    /// Like [`resolve_endpoint`](Self::resolve_endpoint) but reports which
    /// stage failed
    pub fn locate(
        &self,
        locator: &Locator,
        direction: Direction,
        index: usize,
    ) -> Result<EndpointRef> {
        let entity = self.locate_entity(locator)?;

        match self.table.endpoint(entity, direction, index) {
            Some(endpoint) => {
                debug!("Resolved {} {}[{}] -> {}", locator, direction, index, endpoint);
                Ok(endpoint)
            }
            None => {
                debug!("{} has no {} at index {}", locator, direction, index);
                Err(LocateError::EndpointNotFound {
                    locator: locator.to_string(),
                    direction,
                    index,
                })
            }
        }
    }

    /// Entity named by `locator`, without selecting an endpoint
    pub fn resolve_entity(&self, locator: &str) -> Option<EntityRef> {
        let locator = Locator::parse(locator).ok()?;
        self.locate_entity(&locator).ok()
    }

    fn locate_entity(&self, locator: &Locator) -> Result<EntityRef> {
        let device = self
            .resolve_device_by_name(locator.device())
            .ok_or_else(|| LocateError::DeviceNotFound(locator.device().to_string()))?;

        table::entities(&self.table, device)
            .find(|&entity| self.name_matches(entity, locator.entity()))
            .ok_or_else(|| LocateError::EntityNotFound {
                device: locator.device().to_string(),
                entity: locator.entity().to_string(),
            })
    }

    /// First device whose display name equals `name`
    pub fn resolve_device_by_name(&self, name: &str) -> Option<DeviceRef> {
        let device = table::devices(&self.table).find(|&device| self.name_matches(device, name));
        if device.is_none() {
            debug!("No device named {:?}", name);
        }
        device
    }

    /// Source `source_index` of the entity at `entity_index` on the first
    /// device named `device_name`
    pub fn resolve_source_by_device_entity_index(
        &self,
        device_name: &str,
        entity_index: usize,
        source_index: usize,
    ) -> Option<EndpointRef> {
        self.locate_by_index(device_name, entity_index, Direction::Source, source_index)
            .ok()
    }

    /// Positional form of [`locate`](Self::locate): the entity is picked by
    /// index instead of by name
    pub fn locate_by_index(
        &self,
        device_name: &str,
        entity_index: usize,
        direction: Direction,
        index: usize,
    ) -> Result<EndpointRef> {
        let device = self
            .resolve_device_by_name(device_name)
            .ok_or_else(|| LocateError::DeviceNotFound(device_name.to_string()))?;

        let entity = self.table.entity(device, entity_index).ok_or_else(|| {
            LocateError::EntityIndexOutOfRange {
                device: device_name.to_string(),
                index: entity_index,
            }
        })?;

        self.table
            .endpoint(entity, direction, index)
            .ok_or_else(|| LocateError::EndpointNotFound {
                locator: format!("{}[{}]", device_name, entity_index),
                direction,
                index,
            })
    }

    fn name_matches(&self, node: impl Into<table::ObjectRef>, expected: &str) -> bool {
        let node = node.into();
        match name_of(&self.table, node) {
            Some(name) => {
                trace!("Comparing {} {:?} with {:?}", node, name, expected);
                name == expected
            }
            None => false,
        }
    }
}
