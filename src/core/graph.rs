use crate::core::components::definition::ComponentDefinition;
use crate::core::components::state::ComponentState;
use crate::core::types::{ComponentId, ComponentPin, LogicState};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// Per-pin connection lists of one component
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectionBundle {
    pub inputs: Vec<Vec<ComponentPin>>,
    pub outputs: Vec<Vec<ComponentPin>>,
}

/// One edge, normalised so that `driver` is always the output end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub driver: ComponentPin,
    pub sink: ComponentPin,
}

/// A live component
#[derive(Debug, Clone)]
pub struct ComponentInstance {
    pub id: ComponentId,
    pub definition: Arc<ComponentDefinition>,
    pub state: ComponentState,
    /// Expressions resolved for this instance's slot counts
    pub expressions: Vec<String>,
    pub connections: ConnectionBundle,
}

impl ComponentInstance {
    pub fn new(id: ComponentId, definition: Arc<ComponentDefinition>, input_count: usize, output_count: usize) -> Self {
        let expressions = definition.expressions_for(input_count, output_count);
        let state = ComponentState::new(input_count, output_count, definition.initial_aux);
        Self {
            id,
            definition,
            state,
            expressions,
            connections: ConnectionBundle {
                inputs: vec![Vec::new(); input_count],
                outputs: vec![Vec::new(); output_count],
            },
        }
    }

    pub fn input_count(&self) -> usize {
        self.state.input_states.len()
    }

    pub fn output_count(&self) -> usize {
        self.state.output_states.len()
    }
}

/// Component table plus bidirectional edge lists
#[derive(Debug, Clone, Default)]
pub struct ComponentGraph {
    components: HashMap<ComponentId, ComponentInstance>,
    order: Vec<ComponentId>,
}

impl ComponentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, instance: ComponentInstance) {
        let id = instance.id;
        if self.components.insert(id, instance).is_none() {
            self.order.push(id);
        }
    }

    /// Remove a component after detaching every edge that touches it
    pub fn remove(&mut self, id: ComponentId) -> Option<ComponentInstance> {
        for record in self.edges_of(id) {
            self.detach(&record);
        }
        let instance = self.components.remove(&id)?;
        self.order.retain(|other| *other != id);
        Some(instance)
    }

    pub fn get(&self, id: ComponentId) -> Option<&ComponentInstance> {
        self.components.get(&id)
    }

    pub fn get_mut(&mut self, id: ComponentId) -> Option<&mut ComponentInstance> {
        self.components.get_mut(&id)
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.components.contains_key(&id)
    }

    /// Ids in insertion order
    pub fn ids(&self) -> &[ComponentId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn clear(&mut self) {
        self.components.clear();
        self.order.clear();
    }

    pub fn has_edge(&self, record: &ConnectionRecord) -> bool {
        self.get(record.driver.component)
            .and_then(|c| c.connections.outputs.get(record.driver.pin))
            .map_or(false, |pins| pins.contains(&record.sink))
    }

    /// Record an edge on both endpoints. Callers validate first.
    pub fn attach(&mut self, record: &ConnectionRecord) -> bool {
        let driver_ok = self
            .get(record.driver.component)
            .map_or(false, |c| record.driver.pin < c.output_count());
        let sink_ok = self
            .get(record.sink.component)
            .map_or(false, |c| record.sink.pin < c.input_count());
        if !driver_ok || !sink_ok {
            return false;
        }

        if let Some(driver) = self.components.get_mut(&record.driver.component) {
            driver.connections.outputs[record.driver.pin].push(record.sink);
            driver.state.output_connected[record.driver.pin] = true;
        }
        if let Some(sink) = self.components.get_mut(&record.sink.component) {
            sink.connections.inputs[record.sink.pin].push(record.driver);
            sink.state.input_connected[record.sink.pin] = true;
        }
        true
    }

    /// Remove an edge from both endpoints, clearing `connected` flags of emptied slots
    pub fn detach(&mut self, record: &ConnectionRecord) -> bool {
        let mut removed = false;

        if let Some(driver) = self.components.get_mut(&record.driver.component) {
            if let Some(pins) = driver.connections.outputs.get_mut(record.driver.pin) {
                let before = pins.len();
                pins.retain(|pin| *pin != record.sink);
                removed |= pins.len() != before;
                if pins.is_empty() {
                    driver.state.output_connected[record.driver.pin] = false;
                }
            }
        }
        if let Some(sink) = self.components.get_mut(&record.sink.component) {
            if let Some(pins) = sink.connections.inputs.get_mut(record.sink.pin) {
                let before = pins.len();
                pins.retain(|pin| *pin != record.driver);
                removed |= pins.len() != before;
                if pins.is_empty() {
                    sink.state.input_connected[record.sink.pin] = false;
                }
            }
        }
        removed
    }

    /// Every edge touching `id`, each reported once
    pub fn edges_of(&self, id: ComponentId) -> Vec<ConnectionRecord> {
        let Some(instance) = self.get(id) else {
            return Vec::new();
        };

        let mut records = Vec::new();
        for (pin, sinks) in instance.connections.outputs.iter().enumerate() {
            for sink in sinks {
                records.push(ConnectionRecord {
                    driver: ComponentPin::new(id, pin),
                    sink: *sink,
                });
            }
        }
        for (pin, drivers) in instance.connections.inputs.iter().enumerate() {
            for driver in drivers {
                let record = ConnectionRecord {
                    driver: *driver,
                    sink: ComponentPin::new(id, pin),
                };
                // Self loops were already listed from the output side
                if !records.contains(&record) {
                    records.push(record);
                }
            }
        }
        records
    }

    /// Values currently presented to each input of `id`.
    ///
    /// A connected input reads its driver's output, with high impedance reading as
    /// floating low. An unconnected input keeps its stored state.
    pub fn gather_inputs(&self, id: ComponentId) -> Option<Vec<LogicState>> {
        let instance = self.get(id)?;
        let values = instance
            .connections
            .inputs
            .iter()
            .zip(&instance.state.input_states)
            .map(|(drivers, stored)| match drivers.first() {
                Some(driver) => match self.output_state(driver) {
                    Some(LogicState::HighZ) => LogicState::Low,
                    Some(state) => state,
                    None => stored.state,
                },
                None => stored.state,
            })
            .collect();
        Some(values)
    }

    fn output_state(&self, pin: &ComponentPin) -> Option<LogicState> {
        self.get(pin.component)?
            .state
            .output_states
            .get(pin.pin)
            .map(|slot| slot.state)
    }

    /// Every component reachable from `start` through connections in either direction
    pub fn connected_component(&self, start: ComponentId) -> Vec<ComponentId> {
        if !self.contains(start) {
            return Vec::new();
        }

        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        let mut result = Vec::new();

        while let Some(id) = queue.pop_front() {
            result.push(id);
            let Some(instance) = self.get(id) else {
                continue;
            };
            let neighbours = instance
                .connections
                .inputs
                .iter()
                .chain(&instance.connections.outputs)
                .flatten();
            for pin in neighbours {
                if seen.insert(pin.component) {
                    queue.push_back(pin.component);
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::components::catalog::ComponentCatalog;
    use crate::core::types::{ComponentType, SlotState};

    fn instance(catalog: &ComponentCatalog, component_type: ComponentType, inputs: usize, outputs: usize) -> ComponentInstance {
        ComponentInstance::new(ComponentId::new(), catalog.definition(&component_type), inputs, outputs)
    }

    fn edge(driver: ComponentId, driver_pin: usize, sink: ComponentId, sink_pin: usize) -> ConnectionRecord {
        ConnectionRecord {
            driver: ComponentPin::new(driver, driver_pin),
            sink: ComponentPin::new(sink, sink_pin),
        }
    }

    #[test]
    fn test_attach_and_detach_update_both_ends() {
        let catalog = ComponentCatalog::with_builtins();
        let mut graph = ComponentGraph::new();
        let source = instance(&catalog, ComponentType::Input, 0, 1);
        let gate = instance(&catalog, ComponentType::And, 2, 1);
        let (s, g) = (source.id, gate.id);
        graph.insert(source);
        graph.insert(gate);

        let record = edge(s, 0, g, 1);
        assert!(graph.attach(&record));
        assert!(graph.has_edge(&record));
        assert!(graph.get(s).unwrap().state.output_connected[0]);
        assert!(graph.get(g).unwrap().state.input_connected[1]);
        assert_eq!(graph.get(g).unwrap().connections.inputs[1], vec![ComponentPin::new(s, 0)]);

        assert!(graph.detach(&record));
        assert!(!graph.has_edge(&record));
        assert!(!graph.get(s).unwrap().state.output_connected[0]);
        assert!(!graph.get(g).unwrap().state.input_connected[1]);
        assert!(!graph.detach(&record));
    }

    #[test]
    fn test_remove_scrubs_neighbours() {
        let catalog = ComponentCatalog::with_builtins();
        let mut graph = ComponentGraph::new();
        let source = instance(&catalog, ComponentType::Input, 0, 1);
        let gate = instance(&catalog, ComponentType::Not, 1, 1);
        let (s, g) = (source.id, gate.id);
        graph.insert(source);
        graph.insert(gate);
        graph.attach(&edge(s, 0, g, 0));

        assert!(graph.remove(s).is_some());
        assert!(graph.get(s).is_none());
        assert!(graph.get(g).unwrap().connections.inputs[0].is_empty());
        assert!(!graph.get(g).unwrap().state.input_connected[0]);
        assert_eq!(graph.ids(), &[g]);
    }

    #[test]
    fn test_gather_inputs_reads_drivers_and_latches() {
        let catalog = ComponentCatalog::with_builtins();
        let mut graph = ComponentGraph::new();
        let mut source = instance(&catalog, ComponentType::Input, 0, 1);
        source.state.output_states[0] = SlotState::new(LogicState::High, 0);
        let mut gate = instance(&catalog, ComponentType::And, 2, 1);
        gate.state.input_states[1] = SlotState::new(LogicState::High, 0);
        let (s, g) = (source.id, gate.id);
        graph.insert(source);
        graph.insert(gate);
        graph.attach(&edge(s, 0, g, 0));

        assert_eq!(graph.gather_inputs(g), Some(vec![LogicState::High, LogicState::High]));

        graph.get_mut(s).unwrap().state.output_states[0].state = LogicState::HighZ;
        assert_eq!(graph.gather_inputs(g), Some(vec![LogicState::Low, LogicState::High]));
    }

    #[test]
    fn test_self_loop_edge_listed_once() {
        let catalog = ComponentCatalog::with_builtins();
        let mut graph = ComponentGraph::new();
        let gate = instance(&catalog, ComponentType::Not, 1, 1);
        let g = gate.id;
        graph.insert(gate);
        graph.attach(&edge(g, 0, g, 0));
        assert_eq!(graph.edges_of(g).len(), 1);
        graph.remove(g);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_connected_component() {
        let catalog = ComponentCatalog::with_builtins();
        let mut graph = ComponentGraph::new();
        let a = instance(&catalog, ComponentType::Input, 0, 1);
        let b = instance(&catalog, ComponentType::Not, 1, 1);
        let c = instance(&catalog, ComponentType::Output, 1, 0);
        let lone = instance(&catalog, ComponentType::Input, 0, 1);
        let (ai, bi, ci, li) = (a.id, b.id, c.id, lone.id);
        for i in [a, b, c, lone] {
            graph.insert(i);
        }
        graph.attach(&edge(ai, 0, bi, 0));
        graph.attach(&edge(bi, 0, ci, 0));

        let reached = graph.connected_component(ci);
        assert_eq!(reached.len(), 3);
        assert!(!reached.contains(&li));
        assert_eq!(graph.connected_component(li), vec![li]);
    }
}
