//! midi-locator
//!
//! Resolves `"<device>::<entity>"` MIDI locators to endpoint handles and
//! lists the connected MIDI hardware, over any [`DeviceTable`].
//!
//! ```
//! use midi_locator::{DeviceSpec, Direction, EntitySpec, Lister, MemoryTable, Resolver, TopologySpec};
//!
//! let table = MemoryTable::from_spec(&TopologySpec {
//!     devices: vec![DeviceSpec::new("Keystation")
//!         .with_entity(EntitySpec::new("Port 1").with_sources(1))],
//! });
//!
//! let resolver = Resolver::new(&table);
//! assert!(resolver.resolve_endpoint("Keystation::Port 1", Direction::Source, 0).is_some());
//! assert!(resolver.resolve_endpoint("Keystation::Port 2", Direction::Source, 0).is_none());
//!
//! let lister = Lister::new(&table);
//! assert_eq!(lister.list_topology(), "Keystation[online]:\t\"Keystation::Port 1\"");
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod lister;
pub mod locator;
pub mod naming;
pub mod paths;
pub mod resolver;
pub mod table;

pub use error::LocateError;
pub use lister::{Lister, Topology};
pub use locator::Locator;
pub use naming::{is_offline, name_of, unique_id_of};
pub use resolver::Resolver;
pub use table::{
    DeviceRef, DeviceSpec, DeviceTable, Direction, EndpointRef, EntityRef, EntitySpec,
    MemoryTable, ObjectRef, Property, PropertyError, TopologySpec,
};
