//! Device table providers
//!
//! The device table is the platform-owned graph of MIDI devices, their
//! entities and the source/destination endpoints of each entity. Everything
//! in this crate reads it through the [`DeviceTable`] trait so that the
//! resolver and lister can run against CoreMIDI, a midir port scan or a
//! fabricated in-memory topology.

pub mod memory;

#[cfg(target_os = "macos")]
pub mod coremidi;

#[cfg(feature = "ports")]
pub mod ports;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use memory::{DeviceSpec, EndpointSpec, EntitySpec, MemoryTable, TopologySpec};

#[cfg(target_os = "macos")]
pub use self::coremidi::CoreMidiTable;

#[cfg(feature = "ports")]
pub use ports::PortTable;

/// Status returned when a handle no longer refers to a live object
pub const STATUS_OBJECT_NOT_FOUND: i32 = -10842;

/// Status returned when an object does not carry the requested property
pub const STATUS_UNKNOWN_PROPERTY: i32 = -10835;

/// Untyped handle to any node of the device table.
///
/// `0` is the nil reference; providers never hand it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectRef(u32);

impl ObjectRef {
    /// The nil reference
    pub const NONE: ObjectRef = ObjectRef(0);

    pub fn from_raw(raw: u32) -> Self {
        ObjectRef(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}

macro_rules! node_ref {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(ObjectRef);

        impl $name {
            /// Wrap a raw handle, rejecting the nil reference
            pub fn from_raw(raw: u32) -> Option<Self> {
                let object = ObjectRef::from_raw(raw);
                object.is_valid().then_some($name(object))
            }

            pub fn object(self) -> ObjectRef {
                self.0
            }
        }

        impl From<$name> for ObjectRef {
            fn from(node: $name) -> ObjectRef {
                node.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

node_ref!(
    /// Handle to a physical or virtual MIDI device
    DeviceRef
);
node_ref!(
    /// Handle to an entity (port group) of a device
    EntityRef
);
node_ref!(
    /// Handle to one concrete MIDI source or destination
    EndpointRef
);

/// Endpoint list selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Source,
    Destination,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Source => f.write_str("source"),
            Direction::Destination => f.write_str("destination"),
        }
    }
}

/// Node properties the crate reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    /// Display name (string)
    Name,
    /// Stable identifier (integer)
    UniqueId,
    /// Non-zero when the device is disconnected (integer)
    Offline,
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Name => f.write_str("name"),
            Property::UniqueId => f.write_str("uniqueID"),
            Property::Offline => f.write_str("offline"),
        }
    }
}

/// A property lookup failed on a specific node
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("property '{property}' unavailable on {object} (status {status})")]
pub struct PropertyError {
    pub object: ObjectRef,
    pub property: Property,
    pub status: i32,
}

impl PropertyError {
    pub fn new(object: ObjectRef, property: Property, status: i32) -> Self {
        Self {
            object,
            property,
            status,
        }
    }
}

/// Read-only access to a device table.
///
/// Every index-based getter returns `None` for an out-of-range index or a
/// stale handle. Nothing here caches: each call observes the table as it is
/// at that moment.
pub trait DeviceTable {
    fn device_count(&self) -> usize;
    fn device(&self, index: usize) -> Option<DeviceRef>;

    fn entity_count(&self, device: DeviceRef) -> usize;
    fn entity(&self, device: DeviceRef, index: usize) -> Option<EntityRef>;

    fn source_count(&self, entity: EntityRef) -> usize;
    fn source(&self, entity: EntityRef, index: usize) -> Option<EndpointRef>;

    fn destination_count(&self, entity: EntityRef) -> usize;
    fn destination(&self, entity: EntityRef, index: usize) -> Option<EndpointRef>;

    fn string_property(
        &self,
        object: ObjectRef,
        property: Property,
    ) -> Result<String, PropertyError>;
    fn integer_property(&self, object: ObjectRef, property: Property) -> Result<i32, PropertyError>;

    /// Source or destination `index` of `entity`
    fn endpoint(&self, entity: EntityRef, direction: Direction, index: usize) -> Option<EndpointRef> {
        match direction {
            Direction::Source => self.source(entity, index),
            Direction::Destination => self.destination(entity, index),
        }
    }
}

impl<T: DeviceTable + ?Sized> DeviceTable for &T {
    fn device_count(&self) -> usize {
        (**self).device_count()
    }

    fn device(&self, index: usize) -> Option<DeviceRef> {
        (**self).device(index)
    }

    fn entity_count(&self, device: DeviceRef) -> usize {
        (**self).entity_count(device)
    }

    fn entity(&self, device: DeviceRef, index: usize) -> Option<EntityRef> {
        (**self).entity(device, index)
    }

    fn source_count(&self, entity: EntityRef) -> usize {
        (**self).source_count(entity)
    }

    fn source(&self, entity: EntityRef, index: usize) -> Option<EndpointRef> {
        (**self).source(entity, index)
    }

    fn destination_count(&self, entity: EntityRef) -> usize {
        (**self).destination_count(entity)
    }

    fn destination(&self, entity: EntityRef, index: usize) -> Option<EndpointRef> {
        (**self).destination(entity, index)
    }

    fn string_property(
        &self,
        object: ObjectRef,
        property: Property,
    ) -> Result<String, PropertyError> {
        (**self).string_property(object, property)
    }

    fn integer_property(&self, object: ObjectRef, property: Property) -> Result<i32, PropertyError> {
        (**self).integer_property(object, property)
    }
}

impl<T: DeviceTable + ?Sized> DeviceTable for Box<T> {
    fn device_count(&self) -> usize {
        (**self).device_count()
    }

    fn device(&self, index: usize) -> Option<DeviceRef> {
        (**self).device(index)
    }

    fn entity_count(&self, device: DeviceRef) -> usize {
        (**self).entity_count(device)
    }

    fn entity(&self, device: DeviceRef, index: usize) -> Option<EntityRef> {
        (**self).entity(device, index)
    }

    fn source_count(&self, entity: EntityRef) -> usize {
        (**self).source_count(entity)
    }

    fn source(&self, entity: EntityRef, index: usize) -> Option<EndpointRef> {
        (**self).source(entity, index)
    }

    fn destination_count(&self, entity: EntityRef) -> usize {
        (**self).destination_count(entity)
    }

    fn destination(&self, entity: EntityRef, index: usize) -> Option<EndpointRef> {
        (**self).destination(entity, index)
    }

    fn string_property(
        &self,
        object: ObjectRef,
        property: Property,
    ) -> Result<String, PropertyError> {
        (**self).string_property(object, property)
    }

    fn integer_property(&self, object: ObjectRef, property: Property) -> Result<i32, PropertyError> {
        (**self).integer_property(object, property)
    }
}

/// Devices in enumeration order. The count is read once, up front.
pub fn devices<T: DeviceTable + ?Sized>(table: &T) -> impl Iterator<Item = DeviceRef> + '_ {
    (0..table.device_count()).filter_map(move |index| table.device(index))
}

/// Entities of `device` in enumeration order. The count is read once, up front.
pub fn entities<T: DeviceTable + ?Sized>(
    table: &T,
    device: DeviceRef,
) -> impl Iterator<Item = EntityRef> + '_ {
    (0..table.entity_count(device)).filter_map(move |index| table.entity(device, index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nil_reference_is_rejected() {
        assert!(DeviceRef::from_raw(0).is_none());
        assert!(EndpointRef::from_raw(7).is_some());
        assert!(!ObjectRef::NONE.is_valid());
    }

    #[test]
    fn test_ref_display() {
        let endpoint = EndpointRef::from_raw(0x2A).unwrap();
        assert_eq!(endpoint.to_string(), "#0000002A");
        assert_eq!(ObjectRef::from(endpoint).raw(), 0x2A);
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::Source.to_string(), "source");
        assert_eq!(Direction::Destination.to_string(), "destination");
    }

    #[test]
    fn test_iterators_follow_enumeration_order() {
        let table = MemoryTable::from_spec(&TopologySpec {
            devices: vec![
                DeviceSpec::new("A")
                    .with_entity(EntitySpec::new("a1"))
                    .with_entity(EntitySpec::new("a2")),
                DeviceSpec::new("B"),
            ],
        });

        let found: Vec<DeviceRef> = devices(&table).collect();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0], table.device(0).unwrap());
        assert_eq!(found[1], table.device(1).unwrap());

        let children: Vec<EntityRef> = entities(&table, found[0]).collect();
        assert_eq!(
            children,
            vec![
                table.entity(found[0], 0).unwrap(),
                table.entity(found[0], 1).unwrap()
            ]
        );
        assert_eq!(entities(&table, found[1]).count(), 0);
    }

    #[test]
    fn test_boxed_table_delegates() {
        let table: Box<dyn DeviceTable> = Box::new(MemoryTable::from_spec(&TopologySpec {
            devices: vec![DeviceSpec::new("A").with_entity(EntitySpec::new("a1").with_sources(2))],
        }));

        let device = table.device(0).unwrap();
        let entity = table.entity(device, 0).unwrap();
        assert_eq!(table.source_count(entity), 2);
        assert!(table.endpoint(entity, Direction::Source, 1).is_some());
        assert!(table.endpoint(entity, Direction::Destination, 0).is_none());
    }
}
