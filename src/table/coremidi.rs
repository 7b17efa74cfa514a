//! Live CoreMIDI device table (macOS)

use core_foundation::base::TCFType;
use core_foundation::string::{CFString, CFStringRef};
use coremidi_sys::{
    kMIDIPropertyName, kMIDIPropertyOffline, kMIDIPropertyUniqueID, MIDIDeviceGetEntity,
    MIDIDeviceGetNumberOfEntities, MIDIEntityGetDestination, MIDIEntityGetNumberOfDestinations,
    MIDIEntityGetNumberOfSources, MIDIEntityGetSource, MIDIGetDevice, MIDIGetNumberOfDevices,
    MIDIObjectGetIntegerProperty, MIDIObjectGetStringProperty,
};
use std::ptr;

use super::{
    DeviceRef, DeviceTable, EndpointRef, EntityRef, ObjectRef, Property, PropertyError,
    STATUS_UNKNOWN_PROPERTY,
};

/// Reads the system MIDI device table on every call.
///
/// CoreMIDI owns and serializes the table; devices may come and go between
/// calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoreMidiTable;

impl CoreMidiTable {
    pub fn new() -> Self {
        CoreMidiTable
    }
}

fn property_key(property: Property) -> CFStringRef {
    // SAFETY: the property keys are immutable CFString constants exported by CoreMIDI
    unsafe {
        match property {
            Property::Name => kMIDIPropertyName,
            Property::UniqueId => kMIDIPropertyUniqueID,
            Property::Offline => kMIDIPropertyOffline,
        }
    }
}

impl DeviceTable for CoreMidiTable {
    fn device_count(&self) -> usize {
        unsafe { MIDIGetNumberOfDevices() as usize }
    }

    fn device(&self, i: usize) -> Option<DeviceRef> {
        DeviceRef::from_raw(unsafe { MIDIGetDevice(i as _) })
    }

    fn entity_count(&self, device: DeviceRef) -> usize {
        unsafe { MIDIDeviceGetNumberOfEntities(device.object().raw()) as usize }
    }

    fn entity(&self, device: DeviceRef, i: usize) -> Option<EntityRef> {
        EntityRef::from_raw(unsafe { MIDIDeviceGetEntity(device.object().raw(), i as _) })
    }

    fn source_count(&self, entity: EntityRef) -> usize {
        unsafe { MIDIEntityGetNumberOfSources(entity.object().raw()) as usize }
    }

    fn source(&self, entity: EntityRef, i: usize) -> Option<EndpointRef> {
        EndpointRef::from_raw(unsafe { MIDIEntityGetSource(entity.object().raw(), i as _) })
    }

    fn destination_count(&self, entity: EntityRef) -> usize {
        unsafe { MIDIEntityGetNumberOfDestinations(entity.object().raw()) as usize }
    }

    fn destination(&self, entity: EntityRef, i: usize) -> Option<EndpointRef> {
        EndpointRef::from_raw(unsafe {
            MIDIEntityGetDestination(entity.object().raw(), i as _)
        })
    }

    fn string_property(
        &self,
        object: ObjectRef,
        property: Property,
    ) -> Result<String, PropertyError> {
        let mut value: CFStringRef = ptr::null();
        let status = unsafe {
            MIDIObjectGetStringProperty(object.raw(), property_key(property), &mut value)
        };
        if status != 0 {
            return Err(PropertyError::new(object, property, status));
        }
        if value.is_null() {
            return Err(PropertyError::new(object, property, STATUS_UNKNOWN_PROPERTY));
        }

        // SAFETY: CoreMIDI hands out a +1 retained string (copy rule)
        let value = unsafe { CFString::wrap_under_create_rule(value) };
        Ok(value.to_string())
    }

    fn integer_property(&self, object: ObjectRef, property: Property) -> Result<i32, PropertyError> {
        let mut value: i32 = 0;
        let status = unsafe {
            MIDIObjectGetIntegerProperty(object.raw(), property_key(property), &mut value)
        };
        if status != 0 {
            return Err(PropertyError::new(object, property, status));
        }
        Ok(value)
    }
}
