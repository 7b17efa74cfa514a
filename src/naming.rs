//! Node naming
//!
//! Display names and unique ids for any node of the device table. Property
//! failures are recovered here: an absent name or a `0` id.

use tracing::trace;

use crate::table::{DeviceRef, DeviceTable, ObjectRef, Property};

/// Display name of `node`, or `None` when the name query fails
pub fn name_of<T>(table: &T, node: impl Into<ObjectRef>) -> Option<String>
where
    T: DeviceTable + ?Sized,
{
    match table.string_property(node.into(), Property::Name) {
        Ok(name) => Some(name),
        Err(e) => {
            trace!("{}", e);
            None
        }
    }
}

/// Unique id of `node`, or `0` when the query fails or the node has none.
///
/// `0` is never a valid id.
pub fn unique_id_of<T>(table: &T, node: impl Into<ObjectRef>) -> i32
where
    T: DeviceTable + ?Sized,
{
    match table.integer_property(node.into(), Property::UniqueId) {
        Ok(id) => id,
        Err(e) => {
            trace!("{}", e);
            0
        }
    }
}

/// Whether the device is disconnected. A missing status counts as online.
pub fn is_offline<T>(table: &T, device: DeviceRef) -> bool
where
    T: DeviceTable + ?Sized,
{
    match table.integer_property(device.into(), Property::Offline) {
        Ok(status) => status != 0,
        Err(e) => {
            trace!("{}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{DeviceSpec, EntitySpec, MemoryTable, TopologySpec};

    fn table() -> MemoryTable {
        MemoryTable::from_spec(&TopologySpec {
            devices: vec![
                DeviceSpec::new("Keystation")
                    .with_unique_id(-559038737)
                    .with_entity(EntitySpec::new("Port 1").with_sources(1)),
                DeviceSpec::unnamed().offline(true),
            ],
        })
    }

    #[test]
    fn test_name_of() {
        let table = table();
        let device = table.device(0).unwrap();
        let entity = table.entity(device, 0).unwrap();

        assert_eq!(name_of(&table, device), Some("Keystation".to_string()));
        assert_eq!(name_of(&table, entity), Some("Port 1".to_string()));
    }

    #[test]
    fn test_name_of_missing_is_none() {
        let table = table();
        let unnamed = table.device(1).unwrap();
        let entity = table.entity(table.device(0).unwrap(), 0).unwrap();
        let source = table.source(entity, 0).unwrap();

        assert_eq!(name_of(&table, unnamed), None);
        assert_eq!(name_of(&table, source), None);
        assert_eq!(name_of(&table, ObjectRef::from_raw(999)), None);
    }

    #[test]
    fn test_unique_id_of() {
        let table = table();
        let device = table.device(0).unwrap();
        let entity = table.entity(device, 0).unwrap();

        assert_eq!(unique_id_of(&table, device), -559038737);
        assert_eq!(unique_id_of(&table, entity), 0);
        assert_eq!(unique_id_of(&table, ObjectRef::NONE), 0);
    }

    #[test]
    fn test_is_offline() {
        let table = table();
        let online = table.device(0).unwrap();
        let offline = table.device(1).unwrap();

        assert!(!is_offline(&table, online));
        assert!(is_offline(&table, offline));

        table.set_offline(offline, false);
        assert!(!is_offline(&table, offline));
    }
}
