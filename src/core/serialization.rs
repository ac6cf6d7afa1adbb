//! Snapshot and restore of the engine state
//!
//! A snapshot holds, per component, everything needed to rebuild it with the
//! same id: its type, slot counts, connection lists, live state and the fire
//! times of the evaluations it still had pending.

use crate::core::components::state::ComponentState;
use crate::core::execution::simulation_engine::SimulationEngine;
use crate::core::graph::{ComponentInstance, ConnectionBundle, ConnectionRecord};
use crate::core::types::{ComponentId, ComponentPin, ComponentType, SimTime};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("invalid snapshot json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("component type {0} is not registered")]
    UnknownType(ComponentType),

    #[error("component {0} already exists")]
    DuplicateId(ComponentId),

    #[error("component {id} declares {expected} {side} slots but its state holds {actual}")]
    SlotMismatch {
        id: ComponentId,
        side: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Serialized form of one component instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSnapshot {
    pub component_type: ComponentType,
    pub instance_id: ComponentId,
    pub input_count: usize,
    pub output_count: usize,
    pub connections: ConnectionBundle,
    pub state: ComponentState,
    /// Fire times of pending evaluations, earliest first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pending_events: Vec<SimTime>,
}

impl ComponentSnapshot {
    /// Every edge listed in this snapshot, each once
    pub fn edges(&self) -> Vec<ConnectionRecord> {
        let id = self.instance_id;
        let mut records = Vec::new();
        for (pin, sinks) in self.connections.outputs.iter().enumerate() {
            records.extend(sinks.iter().map(|sink| ConnectionRecord {
                driver: ComponentPin::new(id, pin),
                sink: *sink,
            }));
        }
        for (pin, drivers) in self.connections.inputs.iter().enumerate() {
            for driver in drivers {
                let record = ConnectionRecord {
                    driver: *driver,
                    sink: ComponentPin::new(id, pin),
                };
                if !records.contains(&record) {
                    records.push(record);
                }
            }
        }
        records
    }
}

/// Serialized form of the whole engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub time: SimTime,
    pub components: Vec<ComponentSnapshot>,
}

impl SimulationEngine {
    pub fn component_snapshot(&self, id: ComponentId) -> Option<ComponentSnapshot> {
        let instance = self.graph.get(id)?;
        let pending_events = self
            .scheduler
            .pending()
            .into_iter()
            .filter(|event| event.target == id)
            .map(|event| event.fire_time)
            .collect();

        Some(ComponentSnapshot {
            component_type: instance.definition.component_type.clone(),
            instance_id: id,
            input_count: instance.input_count(),
            output_count: instance.output_count(),
            connections: instance.connections.clone(),
            state: instance.state.clone(),
            pending_events,
        })
    }

    /// Snapshot of every component in creation order
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            time: self.current_time,
            components: self
                .graph
                .ids()
                .iter()
                .filter_map(|id| self.component_snapshot(*id))
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    /// Replace the engine contents with a JSON snapshot
    pub fn from_json(&mut self, json: &str) -> Result<(), SnapshotError> {
        let snapshot: EngineSnapshot = serde_json::from_str(json)?;
        self.load_snapshot(&snapshot)
    }

    /// Replace the engine contents with `snapshot`.
    ///
    /// The snapshot is validated before anything is touched, so on error the
    /// engine is left as it was.
    pub fn load_snapshot(&mut self, snapshot: &EngineSnapshot) -> Result<(), SnapshotError> {
        let mut seen = HashSet::new();
        for component in &snapshot.components {
            self.check_snapshot(component)?;
            if !seen.insert(component.instance_id) {
                return Err(SnapshotError::DuplicateId(component.instance_id));
            }
        }

        self.graph.clear();
        self.scheduler.clear();
        self.current_time = snapshot.time;

        for component in &snapshot.components {
            self.insert_snapshot(component)?;
        }

        // Output side lists every edge exactly once
        let mut edges = 0;
        for component in &snapshot.components {
            for (pin, sinks) in component.connections.outputs.iter().enumerate() {
                for sink in sinks {
                    let record = ConnectionRecord {
                        driver: ComponentPin::new(component.instance_id, pin),
                        sink: *sink,
                    };
                    if self.attach_connection(&record, true) {
                        edges += 1;
                    }
                }
            }
        }

        let mut pending: Vec<(SimTime, ComponentId)> = snapshot
            .components
            .iter()
            .flat_map(|c| c.pending_events.iter().map(move |time| (*time, c.instance_id)))
            .collect();
        pending.sort_by_key(|(time, _)| *time);
        for (time, id) in pending {
            self.schedule_event(id, ComponentId::NULL, time);
        }
        self.rearm_idle_clocks(snapshot.components.iter().map(|c| c.instance_id));

        info!(
            "Loaded snapshot at t={}: {} components, {} connections",
            snapshot.time,
            snapshot.components.len(),
            edges
        );
        Ok(())
    }

    /// Recreate one component with its original id and pending events.
    ///
    /// Connections are not restored; callers replay [`ComponentSnapshot::edges`]
    /// once every endpoint exists.
    pub fn restore_component(&mut self, snapshot: &ComponentSnapshot) -> Result<(), SnapshotError> {
        self.check_snapshot(snapshot)?;
        if self.graph.contains(snapshot.instance_id) {
            return Err(SnapshotError::DuplicateId(snapshot.instance_id));
        }
        self.insert_snapshot(snapshot)?;
        for time in &snapshot.pending_events {
            self.schedule_event(snapshot.instance_id, ComponentId::NULL, *time);
        }
        self.rearm_idle_clocks(std::iter::once(snapshot.instance_id));
        debug!("Restored component {}", snapshot.instance_id);
        Ok(())
    }

    /// Attach every edge of `snapshot` whose endpoints both exist, without scheduling
    pub fn restore_connections(&mut self, snapshot: &ComponentSnapshot) -> usize {
        let mut restored = 0;
        for record in snapshot.edges() {
            let live = self.graph.contains(record.driver.component) && self.graph.contains(record.sink.component);
            if live && !self.graph.has_edge(&record) && self.attach_connection(&record, true) {
                restored += 1;
            }
        }
        restored
    }

    fn check_snapshot(&self, snapshot: &ComponentSnapshot) -> Result<(), SnapshotError> {
        if !self.catalog.contains(&snapshot.component_type) {
            return Err(SnapshotError::UnknownType(snapshot.component_type.clone()));
        }
        let sides = [
            ("input", snapshot.input_count, snapshot.state.input_states.len()),
            ("output", snapshot.output_count, snapshot.state.output_states.len()),
        ];
        for (side, expected, actual) in sides {
            if expected != actual {
                return Err(SnapshotError::SlotMismatch {
                    id: snapshot.instance_id,
                    side,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    fn insert_snapshot(&mut self, snapshot: &ComponentSnapshot) -> Result<(), SnapshotError> {
        let definition = self
            .catalog
            .try_definition(&snapshot.component_type)
            .ok_or_else(|| SnapshotError::UnknownType(snapshot.component_type.clone()))?;

        let mut instance = ComponentInstance::new(
            snapshot.instance_id,
            Arc::clone(&definition),
            snapshot.input_count,
            snapshot.output_count,
        );
        let state = ComponentState {
            // Flags are set again as edges are attached
            input_connected: std::mem::take(&mut instance.state.input_connected),
            output_connected: std::mem::take(&mut instance.state.output_connected),
            ..snapshot.state.clone()
        };
        instance.state = state;
        self.graph.insert(instance);
        Ok(())
    }

    /// Self-rescheduling components must always have a pending event
    fn rearm_idle_clocks(&mut self, ids: impl Iterator<Item = ComponentId>) {
        let pending: HashSet<ComponentId> = self.scheduler.pending().iter().map(|e| e.target).collect();
        let idle: Vec<ComponentId> = ids
            .filter(|id| !pending.contains(id))
            .filter(|id| {
                self.graph
                    .get(*id)
                    .map_or(false, |c| c.definition.auto_reschedule)
            })
            .collect();
        for id in idle {
            self.schedule_event(id, ComponentId::NULL, self.current_time);
        }
    }
}
