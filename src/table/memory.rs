//! In-memory device table
//!
//! Holds a fabricated topology with the same shape as the platform table:
//! sequentially allocated handles, optional properties per node, and
//! mutation through `&self` so the topology can change between calls.

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use super::{
    DeviceRef, DeviceTable, EndpointRef, EntityRef, ObjectRef, Property, PropertyError,
    STATUS_OBJECT_NOT_FOUND, STATUS_UNKNOWN_PROPERTY,
};

/// Description of a whole topology, loadable from YAML
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TopologySpec {
    #[serde(default)]
    pub devices: Vec<DeviceSpec>,
}

/// One device and its entities
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DeviceSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<i32>,
    #[serde(default)]
    pub offline: bool,
    #[serde(default)]
    pub entities: Vec<EntitySpec>,
}

/// One entity and its endpoints
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EntitySpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<i32>,
    #[serde(default)]
    pub sources: Vec<EndpointSpec>,
    #[serde(default)]
    pub destinations: Vec<EndpointSpec>,
}

/// One source or destination
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EndpointSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<i32>,
}

impl TopologySpec {
    /// Parse a YAML topology description
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse YAML topology")
    }
}

impl DeviceSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// A device whose name query fails
    pub fn unnamed() -> Self {
        Self::default()
    }

    pub fn with_unique_id(mut self, unique_id: i32) -> Self {
        self.unique_id = Some(unique_id);
        self
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn with_entity(mut self, entity: EntitySpec) -> Self {
        self.entities.push(entity);
        self
    }
}

impl EntitySpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn unnamed() -> Self {
        Self::default()
    }

    pub fn with_unique_id(mut self, unique_id: i32) -> Self {
        self.unique_id = Some(unique_id);
        self
    }

    /// Append `count` anonymous sources
    pub fn with_sources(mut self, count: usize) -> Self {
        self.sources
            .extend(std::iter::repeat_with(EndpointSpec::default).take(count));
        self
    }

    /// Append `count` anonymous destinations
    pub fn with_destinations(mut self, count: usize) -> Self {
        self.destinations
            .extend(std::iter::repeat_with(EndpointSpec::default).take(count));
        self
    }
}

#[derive(Debug, Default)]
struct Properties {
    strings: HashMap<Property, String>,
    integers: HashMap<Property, i32>,
}

#[derive(Debug, Default)]
struct Endpoints {
    sources: Vec<EndpointRef>,
    destinations: Vec<EndpointRef>,
}

#[derive(Debug, Default)]
struct Arena {
    last_id: u32,
    devices: Vec<DeviceRef>,
    entities: HashMap<DeviceRef, Vec<EntityRef>>,
    endpoints: HashMap<EntityRef, Endpoints>,
    properties: HashMap<ObjectRef, Properties>,
}

impl Arena {
    fn allocate(&mut self, name: Option<&str>, unique_id: Option<i32>) -> ObjectRef {
        self.last_id += 1;
        let object = ObjectRef::from_raw(self.last_id);

        let mut properties = Properties::default();
        if let Some(name) = name {
            properties.strings.insert(Property::Name, name.to_string());
        }
        if let Some(unique_id) = unique_id {
            properties.integers.insert(Property::UniqueId, unique_id);
        }
        self.properties.insert(object, properties);

        object
    }

    fn insert_endpoint(&mut self, spec: &EndpointSpec) -> EndpointRef {
        EndpointRef(self.allocate(spec.name.as_deref(), spec.unique_id))
    }

    fn insert_entity(&mut self, spec: &EntitySpec) -> EntityRef {
        let entity = EntityRef(self.allocate(spec.name.as_deref(), spec.unique_id));
        let endpoints = Endpoints {
            sources: spec.sources.iter().map(|s| self.insert_endpoint(s)).collect(),
            destinations: spec
                .destinations
                .iter()
                .map(|d| self.insert_endpoint(d))
                .collect(),
        };
        self.endpoints.insert(entity, endpoints);
        entity
    }

    fn insert_device(&mut self, spec: &DeviceSpec) -> DeviceRef {
        let device = DeviceRef(self.allocate(spec.name.as_deref(), spec.unique_id));
        if spec.offline {
            if let Some(properties) = self.properties.get_mut(&device.object()) {
                properties.integers.insert(Property::Offline, 1);
            }
        }

        let entities = spec.entities.iter().map(|e| self.insert_entity(e)).collect();
        self.entities.insert(device, entities);
        self.devices.push(device);
        device
    }

    fn remove_device(&mut self, device: DeviceRef) -> bool {
        let Some(position) = self.devices.iter().position(|d| *d == device) else {
            return false;
        };
        self.devices.remove(position);
        self.properties.remove(&device.object());

        for entity in self.entities.remove(&device).unwrap_or_default() {
            self.properties.remove(&entity.object());
            if let Some(endpoints) = self.endpoints.remove(&entity) {
                for endpoint in endpoints.sources.iter().chain(&endpoints.destinations) {
                    self.properties.remove(&endpoint.object());
                }
            }
        }
        true
    }

    fn properties(&self, object: ObjectRef, property: Property) -> Result<&Properties, PropertyError> {
        self.properties
            .get(&object)
            .ok_or_else(|| PropertyError::new(object, property, STATUS_OBJECT_NOT_FOUND))
    }
}

/// Device table backed by a fabricated topology
#[derive(Debug, Default)]
pub struct MemoryTable {
    arena: RwLock<Arena>,
}

impl MemoryTable {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_spec(spec: &TopologySpec) -> Self {
        let table = Self::new();
        for device in &spec.devices {
            table.add_device(device);
        }
        table
    }

    /// Load a topology description from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read topology file: {}", path.display()))?;
        let spec = TopologySpec::from_yaml(&contents)
            .with_context(|| format!("Invalid topology file: {}", path.display()))?;

        debug!(
            "Loaded topology with {} devices from {}",
            spec.devices.len(),
            path.display()
        );
        Ok(Self::from_spec(&spec))
    }

    /// Append a device at the end of the enumeration order
    pub fn add_device(&self, spec: &DeviceSpec) -> DeviceRef {
        let device = self.arena.write().insert_device(spec);
        debug!("Added device {} ({:?})", device, spec.name);
        device
    }

    /// Drop a device and everything below it. Its handles become stale.
    pub fn remove_device(&self, device: DeviceRef) -> bool {
        let removed = self.arena.write().remove_device(device);
        if removed {
            debug!("Removed device {}", device);
        }
        removed
    }

    /// Flip the device's offline status property
    pub fn set_offline(&self, device: DeviceRef, offline: bool) -> bool {
        let mut arena = self.arena.write();
        let Some(properties) = arena.properties.get_mut(&device.object()) else {
            return false;
        };
        properties.integers.insert(Property::Offline, i32::from(offline));
        true
    }
}

impl DeviceTable for MemoryTable {
    fn device_count(&self) -> usize {
        self.arena.read().devices.len()
    }

    fn device(&self, index: usize) -> Option<DeviceRef> {
        self.arena.read().devices.get(index).copied()
    }

    fn entity_count(&self, device: DeviceRef) -> usize {
        self.arena.read().entities.get(&device).map_or(0, Vec::len)
    }

    fn entity(&self, device: DeviceRef, index: usize) -> Option<EntityRef> {
        self.arena
            .read()
            .entities
            .get(&device)
            .and_then(|entities| entities.get(index).copied())
    }

    fn source_count(&self, entity: EntityRef) -> usize {
        self.arena
            .read()
            .endpoints
            .get(&entity)
            .map_or(0, |e| e.sources.len())
    }

    fn source(&self, entity: EntityRef, index: usize) -> Option<EndpointRef> {
        self.arena
            .read()
            .endpoints
            .get(&entity)
            .and_then(|e| e.sources.get(index).copied())
    }

    fn destination_count(&self, entity: EntityRef) -> usize {
        self.arena
            .read()
            .endpoints
            .get(&entity)
            .map_or(0, |e| e.destinations.len())
    }

    fn destination(&self, entity: EntityRef, index: usize) -> Option<EndpointRef> {
        self.arena
            .read()
            .endpoints
            .get(&entity)
            .and_then(|e| e.destinations.get(index).copied())
    }

    fn string_property(
        &self,
        object: ObjectRef,
        property: Property,
    ) -> Result<String, PropertyError> {
        let arena = self.arena.read();
        arena
            .properties(object, property)?
            .strings
            .get(&property)
            .cloned()
            .ok_or_else(|| PropertyError::new(object, property, STATUS_UNKNOWN_PROPERTY))
    }

    fn integer_property(&self, object: ObjectRef, property: Property) -> Result<i32, PropertyError> {
        let arena = self.arena.read();
        arena
            .properties(object, property)?
            .integers
            .get(&property)
            .copied()
            .ok_or_else(|| PropertyError::new(object, property, STATUS_UNKNOWN_PROPERTY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn keystation() -> DeviceSpec {
        DeviceSpec::new("Keystation")
            .with_unique_id(1001)
            .with_entity(EntitySpec::new("Port 1").with_sources(1).with_destinations(2))
    }

    #[test]
    fn test_handles_are_sequential_and_non_nil() {
        let table = MemoryTable::from_spec(&TopologySpec {
            devices: vec![keystation()],
        });

        let device = table.device(0).unwrap();
        let entity = table.entity(device, 0).unwrap();
        let source = table.source(entity, 0).unwrap();
        let first_dest = table.destination(entity, 0).unwrap();
        let second_dest = table.destination(entity, 1).unwrap();

        assert_eq!(device.object().raw(), 1);
        assert_eq!(entity.object().raw(), 2);
        assert_eq!(source.object().raw(), 3);
        assert_eq!(first_dest.object().raw(), 4);
        assert_eq!(second_dest.object().raw(), 5);
    }

    #[test]
    fn test_out_of_range_indices_are_nil() {
        let table = MemoryTable::from_spec(&TopologySpec {
            devices: vec![keystation()],
        });

        let device = table.device(0).unwrap();
        let entity = table.entity(device, 0).unwrap();

        assert!(table.device(1).is_none());
        assert!(table.entity(device, 1).is_none());
        assert!(table.source(entity, 1).is_none());
        assert!(table.destination(entity, 2).is_none());
    }

    #[test]
    fn test_missing_properties_report_unknown_property() {
        let table = MemoryTable::from_spec(&TopologySpec {
            devices: vec![DeviceSpec::unnamed()],
        });
        let device = table.device(0).unwrap();

        let err = table.string_property(device.into(), Property::Name).unwrap_err();
        assert_eq!(err.status, STATUS_UNKNOWN_PROPERTY);
        assert_eq!(err.property, Property::Name);

        let err = table
            .integer_property(device.into(), Property::Offline)
            .unwrap_err();
        assert_eq!(err.status, STATUS_UNKNOWN_PROPERTY);
    }

    #[test]
    fn test_remove_device_invalidates_handles() {
        let table = MemoryTable::from_spec(&TopologySpec {
            devices: vec![keystation(), DeviceSpec::new("Other")],
        });
        let device = table.device(0).unwrap();
        let entity = table.entity(device, 0).unwrap();

        assert!(table.remove_device(device));
        assert!(!table.remove_device(device));

        assert_eq!(table.device_count(), 1);
        assert_eq!(table.entity_count(device), 0);
        assert!(table.source(entity, 0).is_none());

        let err = table.string_property(entity.into(), Property::Name).unwrap_err();
        assert_eq!(err.status, STATUS_OBJECT_NOT_FOUND);
    }

    #[test]
    fn test_set_offline() {
        let table = MemoryTable::new();
        let device = table.add_device(&keystation());

        assert!(table.integer_property(device.into(), Property::Offline).is_err());
        assert!(table.set_offline(device, true));
        assert_eq!(table.integer_property(device.into(), Property::Offline), Ok(1));
        assert!(table.set_offline(device, false));
        assert_eq!(table.integer_property(device.into(), Property::Offline), Ok(0));
    }

    #[test]
    fn test_load_yaml_topology() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
devices:
  - name: Keystation
    unique_id: 42
    entities:
      - name: Port 1
        sources: [{{}}]
        destinations:
          - name: Keystation Out
  - name: Old Synth
    offline: true
"#
        )
        .unwrap();

        let table = MemoryTable::load(file.path()).unwrap();
        assert_eq!(table.device_count(), 2);

        let device = table.device(0).unwrap();
        assert_eq!(table.integer_property(device.into(), Property::UniqueId), Ok(42));

        let entity = table.entity(device, 0).unwrap();
        assert_eq!(table.source_count(entity), 1);
        let destination = table.destination(entity, 0).unwrap();
        assert_eq!(
            table.string_property(destination.into(), Property::Name),
            Ok("Keystation Out".to_string())
        );

        let old = table.device(1).unwrap();
        assert_eq!(table.integer_property(old.into(), Property::Offline), Ok(1));
        assert_eq!(table.entity_count(old), 0);
    }

    #[test]
    fn test_load_rejects_bad_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "devices: 12").unwrap();
        assert!(MemoryTable::load(file.path()).is_err());
    }
}
