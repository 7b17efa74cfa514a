//! Device table built from a midir port scan
//!
//! midir exposes flat port lists, so the device → entity hierarchy is
//! rebuilt from port names. The scan is a point-in-time copy: call
//! [`PortTable::scan`] again to observe hot-plugged hardware.

use anyhow::Result;
use midir::{MidiInput, MidiInputPort, MidiOutput, MidiOutputPort};
use std::collections::HashMap;
use tracing::debug;

use super::memory::{DeviceSpec, EndpointSpec, EntitySpec, MemoryTable, TopologySpec};
use super::{
    DeviceRef, DeviceTable, EndpointRef, EntityRef, ObjectRef, Property, PropertyError,
};

const CLIENT_NAME: &str = "midi-locator-scan";

/// Ports sharing one device name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortDevice {
    pub name: String,
    pub entities: Vec<PortEntity>,
}

/// Ports sharing one device and entity name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortEntity {
    pub name: String,
    /// Indices into the scanned input ports
    pub inputs: Vec<usize>,
    /// Indices into the scanned output ports
    pub outputs: Vec<usize>,
}

/// Split a port name into `(device, entity)`.
///
/// ALSA names look like `"Client:Port 20:0"`; the trailing address is
/// dropped. Names without a `:` are both device and entity.
pub fn split_port_name(name: &str) -> (String, String) {
    let trimmed = match name.rsplit_once(' ') {
        Some((head, tail)) if is_alsa_address(tail) => head,
        _ => name,
    };

    match trimmed.split_once(':') {
        Some((device, entity)) if !device.is_empty() && !entity.is_empty() => {
            (device.trim().to_string(), entity.trim().to_string())
        }
        _ => (trimmed.to_string(), trimmed.to_string()),
    }
}

fn is_alsa_address(token: &str) -> bool {
    match token.split_once(':') {
        Some((client, port)) => {
            !client.is_empty()
                && !port.is_empty()
                && client.bytes().all(|b| b.is_ascii_digit())
                && port.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// Group port names into devices and entities, in first-seen order
pub fn group_ports(input_names: &[String], output_names: &[String]) -> Vec<PortDevice> {
    let mut devices: Vec<PortDevice> = Vec::new();

    let mut slot = |name: &str| -> (usize, usize) {
        let (device_name, entity_name) = split_port_name(name);
        let d = match devices.iter().position(|d| d.name == device_name) {
            Some(d) => d,
            None => {
                devices.push(PortDevice {
                    name: device_name,
                    entities: Vec::new(),
                });
                devices.len() - 1
            }
        };
        let entities = &mut devices[d].entities;
        let e = match entities.iter().position(|e| e.name == entity_name) {
            Some(e) => e,
            None => {
                entities.push(PortEntity {
                    name: entity_name,
                    inputs: Vec::new(),
                    outputs: Vec::new(),
                });
                entities.len() - 1
            }
        };
        (d, e)
    };

    let mut placed_inputs = Vec::with_capacity(input_names.len());
    for name in input_names {
        placed_inputs.push(slot(name));
    }
    let mut placed_outputs = Vec::with_capacity(output_names.len());
    for name in output_names {
        placed_outputs.push(slot(name));
    }

    for (index, (d, e)) in placed_inputs.into_iter().enumerate() {
        devices[d].entities[e].inputs.push(index);
    }
    for (index, (d, e)) in placed_outputs.into_iter().enumerate() {
        devices[d].entities[e].outputs.push(index);
    }

    devices
}

/// Snapshot of the midir ports, shaped as a device table
pub struct PortTable {
    table: MemoryTable,
    inputs: HashMap<EndpointRef, MidiInputPort>,
    outputs: HashMap<EndpointRef, MidiOutputPort>,
}

impl PortTable {
    /// Enumerate the currently available input and output ports
    pub fn scan() -> Result<Self> {
        let midi_in = MidiInput::new(CLIENT_NAME)?;
        let midi_out = MidiOutput::new(CLIENT_NAME)?;

        let inputs: Vec<(String, MidiInputPort)> = midi_in
            .ports()
            .into_iter()
            .filter_map(|port| midi_in.port_name(&port).ok().map(|name| (name, port)))
            .collect();
        let outputs: Vec<(String, MidiOutputPort)> = midi_out
            .ports()
            .into_iter()
            .filter_map(|port| midi_out.port_name(&port).ok().map(|name| (name, port)))
            .collect();

        debug!(
            "Scanned {} input and {} output ports",
            inputs.len(),
            outputs.len()
        );

        let input_names: Vec<String> = inputs.iter().map(|(name, _)| name.clone()).collect();
        let output_names: Vec<String> = outputs.iter().map(|(name, _)| name.clone()).collect();
        let groups = group_ports(&input_names, &output_names);

        let spec = TopologySpec {
            devices: groups
                .iter()
                .map(|device| DeviceSpec {
                    name: Some(device.name.clone()),
                    entities: device
                        .entities
                        .iter()
                        .map(|entity| EntitySpec {
                            name: Some(entity.name.clone()),
                            sources: entity
                                .inputs
                                .iter()
                                .map(|&i| named_endpoint(&input_names[i]))
                                .collect(),
                            destinations: entity
                                .outputs
                                .iter()
                                .map(|&o| named_endpoint(&output_names[o]))
                                .collect(),
                            ..EntitySpec::default()
                        })
                        .collect(),
                    ..DeviceSpec::default()
                })
                .collect(),
        };
        let table = MemoryTable::from_spec(&spec);

        let mut input_ports = HashMap::new();
        let mut output_ports = HashMap::new();
        for (d, device) in groups.iter().enumerate() {
            let Some(device_ref) = table.device(d) else {
                continue;
            };
            for (e, entity) in device.entities.iter().enumerate() {
                let Some(entity_ref) = table.entity(device_ref, e) else {
                    continue;
                };
                for (position, &i) in entity.inputs.iter().enumerate() {
                    if let Some(endpoint) = table.source(entity_ref, position) {
                        input_ports.insert(endpoint, inputs[i].1.clone());
                    }
                }
                for (position, &o) in entity.outputs.iter().enumerate() {
                    if let Some(endpoint) = table.destination(entity_ref, position) {
                        output_ports.insert(endpoint, outputs[o].1.clone());
                    }
                }
            }
        }

        Ok(Self {
            table,
            inputs: input_ports,
            outputs: output_ports,
        })
    }

    /// midir input port behind a resolved source
    pub fn input_port(&self, endpoint: EndpointRef) -> Option<&MidiInputPort> {
        self.inputs.get(&endpoint)
    }

    /// midir output port behind a resolved destination
    pub fn output_port(&self, endpoint: EndpointRef) -> Option<&MidiOutputPort> {
        self.outputs.get(&endpoint)
    }
}

fn named_endpoint(name: &str) -> EndpointSpec {
    EndpointSpec {
        name: Some(name.to_string()),
        unique_id: None,
    }
}

impl DeviceTable for PortTable {
    fn device_count(&self) -> usize {
        self.table.device_count()
    }

    fn device(&self, index: usize) -> Option<DeviceRef> {
        self.table.device(index)
    }

    fn entity_count(&self, device: DeviceRef) -> usize {
        self.table.entity_count(device)
    }

    fn entity(&self, device: DeviceRef, index: usize) -> Option<EntityRef> {
        self.table.entity(device, index)
    }

    fn source_count(&self, entity: EntityRef) -> usize {
        self.table.source_count(entity)
    }

    fn source(&self, entity: EntityRef, index: usize) -> Option<EndpointRef> {
        self.table.source(entity, index)
    }

    fn destination_count(&self, entity: EntityRef) -> usize {
        self.table.destination_count(entity)
    }

    fn destination(&self, entity: EntityRef, index: usize) -> Option<EndpointRef> {
        self.table.destination(entity, index)
    }

    fn string_property(
        &self,
        object: ObjectRef,
        property: Property,
    ) -> Result<String, PropertyError> {
        self.table.string_property(object, property)
    }

    fn integer_property(&self, object: ObjectRef, property: Property) -> Result<i32, PropertyError> {
        self.table.integer_property(object, property)
    }
}
