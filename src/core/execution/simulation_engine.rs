use crate::core::components::catalog::ComponentCatalog;
use crate::core::components::definition::{
    ComponentBehaviorType, ComponentDefinition, ComponentLogic, SimulationError, SimulationInput,
    SlotsInfo, MAX_EXPRESSION_INPUTS,
};
use crate::core::components::state::{AuxState, ClockState, ComponentState, FrequencyUnit};
use crate::core::connections::connection_validator::{ConnectionError, ConnectionValidator};
use crate::core::execution::config::SimulationConfig;
use crate::core::execution::event_scheduler::{EventScheduler, SimulationEvent};
use crate::core::graph::{ComponentGraph, ComponentInstance, ConnectionBundle, ConnectionRecord};
use crate::core::types::{ComponentId, ComponentType, LogicState, PinType, SimTime, SlotState};
use log::{debug, error, info, trace, warn};
use std::collections::HashSet;
use std::sync::Arc;

/// Observer trait for simulation events
pub trait SimulationObserver: Send {
    /// Called when simulation time advances
    fn on_time_advance(&mut self, _old_time: SimTime, _new_time: SimTime) {}

    /// Called for every output slot whose value changes
    fn on_output_change(&mut self, _id: ComponentId, _pin: usize, _state: LogicState, _time: SimTime) {}

    /// Called when a simulation step completes
    fn on_step_complete(&mut self, _time: SimTime, _events_processed: usize) {}
}

/// Discrete-event logic simulator owning the component graph and the event queue.
///
/// An evaluation of component `X` caused at time `t` fires at `t + X.delay`, so a
/// component's delay is the time between an input change and its output update.
/// Events due at the same time are processed as one step: targets are deduplicated
/// in FIFO order and all of their inputs are sampled before any of them runs.
pub struct SimulationEngine {
    pub(crate) catalog: Arc<ComponentCatalog>,
    pub(crate) graph: ComponentGraph,
    pub(crate) scheduler: EventScheduler,
    pub(crate) current_time: SimTime,
    config: SimulationConfig,
    observers: Vec<Box<dyn SimulationObserver>>,
}

impl SimulationEngine {
    /// Create an engine resolving types through `catalog`
    pub fn new(catalog: Arc<ComponentCatalog>) -> Self {
        Self::with_config(catalog, SimulationConfig::default())
    }

    pub fn with_config(catalog: Arc<ComponentCatalog>, config: SimulationConfig) -> Self {
        Self {
            catalog,
            graph: ComponentGraph::new(),
            scheduler: EventScheduler::new(),
            current_time: 0,
            config,
            observers: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &Arc<ComponentCatalog> {
        &self.catalog
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Add an observer to the simulation
    pub fn add_observer(&mut self, observer: Box<dyn SimulationObserver>) {
        self.observers.push(observer);
    }

    /// Independent copy of the graph, queue and clock, without observers
    pub fn fork(&self) -> SimulationEngine {
        SimulationEngine {
            catalog: Arc::clone(&self.catalog),
            graph: self.graph.clone(),
            scheduler: self.scheduler.clone(),
            current_time: self.current_time,
            config: self.config.clone(),
            observers: Vec::new(),
        }
    }

    /// Remove every component and pending event; time is kept
    pub fn clear(&mut self) {
        self.graph.clear();
        self.scheduler.clear();
        info!("Simulation cleared at t={}", self.current_time);
    }

    // ---- structure -------------------------------------------------------

    /// Instantiate a component. `None` counts use the definition's defaults.
    ///
    /// Returns [`ComponentId::NULL`] when the type is unknown or the counts are invalid.
    pub fn add_component(
        &mut self,
        component_type: &ComponentType,
        input_count: Option<usize>,
        output_count: Option<usize>,
    ) -> ComponentId {
        let Some(definition) = self.catalog.try_definition(component_type) else {
            warn!("Cannot add component: type {} is not registered", component_type);
            return ComponentId::NULL;
        };

        let Some((inputs, outputs)) = Self::resolve_counts(&definition, input_count, output_count) else {
            return ComponentId::NULL;
        };

        let id = ComponentId::new();
        self.graph
            .insert(ComponentInstance::new(id, Arc::clone(&definition), inputs, outputs));
        self.schedule_event(id, ComponentId::NULL, self.current_time + definition.delay);

        info!(
            "Added component {} ({}) with {} inputs and {} outputs",
            id, definition.name, inputs, outputs
        );
        id
    }

    /// Slot counts for a new instance, or `None` if the request cannot be honoured.
    ///
    /// Counts below the definition's minimum are refused. A NOT gate keeps one
    /// input per output, so both sides grow to the larger request.
    pub(crate) fn resolve_counts(
        definition: &ComponentDefinition,
        input_count: Option<usize>,
        output_count: Option<usize>,
    ) -> Option<(usize, usize)> {
        let pick = |requested: Option<usize>, slots: &SlotsInfo, side: &str| match requested {
            Some(count) if count < slots.count => {
                warn!(
                    "{} needs at least {} {} slots, {} requested",
                    definition.name, slots.count, side, count
                );
                None
            }
            Some(count) if count != slots.count && !slots.is_resizeable => {
                warn!(
                    "{} has a fixed {} count of {}, ignoring requested {}",
                    definition.name, side, slots.count, count
                );
                Some(slots.count)
            }
            Some(count) => Some(count),
            None => Some(slots.count),
        };

        let mut inputs = pick(input_count, &definition.input_slots, "input")?;
        let mut outputs = pick(output_count, &definition.output_slots, "output")?;

        if matches!(definition.logic, ComponentLogic::Operator { op: '!', .. }) && inputs != outputs {
            let pairs = inputs.max(outputs);
            debug!(
                "{} evaluates one input per output, using {} of each",
                definition.name, pairs
            );
            inputs = pairs;
            outputs = pairs;
        }

        if definition.is_expression_based() && inputs > MAX_EXPRESSION_INPUTS {
            warn!(
                "{} supports at most {} inputs, {} requested",
                definition.name, MAX_EXPRESSION_INPUTS, inputs
            );
            return None;
        }
        Some((inputs, outputs))
    }

    /// Remove a component, every connection touching it and every event targeting it
    pub fn delete_component(&mut self, id: ComponentId) -> bool {
        let dropped = self.scheduler.remove_events_for(id);
        match self.graph.remove(id) {
            Some(instance) => {
                info!(
                    "Deleted component {} ({}), dropped {} pending events",
                    id, instance.definition.name, dropped
                );
                true
            }
            None => {
                warn!("Cannot delete component {}: not found", id);
                false
            }
        }
    }

    /// Check whether a connection could be made, without making it
    pub fn can_connect(
        &self,
        src: ComponentId,
        src_pin: usize,
        src_type: PinType,
        dst: ComponentId,
        dst_pin: usize,
        dst_type: PinType,
    ) -> Result<ConnectionRecord, ConnectionError> {
        let record = ConnectionValidator::normalise(src, src_pin, src_type, dst, dst_pin, dst_type)?;
        ConnectionValidator::validate(&self.graph, &record)?;
        Ok(record)
    }

    /// Connect two pins of opposite types.
    ///
    /// Unless `is_restore` is set the sink is scheduled for evaluation so that it
    /// picks up the driver's current value.
    #[allow(clippy::too_many_arguments)]
    pub fn connect_component(
        &mut self,
        src: ComponentId,
        src_pin: usize,
        src_type: PinType,
        dst: ComponentId,
        dst_pin: usize,
        dst_type: PinType,
        is_restore: bool,
    ) -> bool {
        match self.can_connect(src, src_pin, src_type, dst, dst_pin, dst_type) {
            Ok(record) => self.attach_connection(&record, is_restore),
            Err(e) => {
                warn!("Cannot connect {}:{} -> {}:{}: {}", src, src_pin, dst, dst_pin, e);
                false
            }
        }
    }

    /// Attach an already normalised connection record
    pub fn attach_connection(&mut self, record: &ConnectionRecord, is_restore: bool) -> bool {
        if let Err(e) = ConnectionValidator::validate(&self.graph, record) {
            warn!("Cannot attach connection: {}", e);
            return false;
        }
        if !self.graph.attach(record) {
            return false;
        }

        if !is_restore {
            self.schedule_component(record.sink.component, record.driver.component);
        }
        debug!(
            "Connected {}:{} -> {}:{}{}",
            record.driver.component,
            record.driver.pin,
            record.sink.component,
            record.sink.pin,
            if is_restore { " (restore)" } else { "" }
        );
        true
    }

    /// Remove a connection. The sink keeps the last value it saw.
    pub fn delete_connection(
        &mut self,
        a: ComponentId,
        a_pin: usize,
        a_type: PinType,
        b: ComponentId,
        b_pin: usize,
        b_type: PinType,
    ) -> bool {
        let record = match ConnectionValidator::normalise(a, a_pin, a_type, b, b_pin, b_type) {
            Ok(record) => record,
            Err(e) => {
                warn!("Cannot delete connection: {}", e);
                return false;
            }
        };
        self.detach_connection(&record)
    }

    pub fn detach_connection(&mut self, record: &ConnectionRecord) -> bool {
        if self.graph.detach(record) {
            debug!(
                "Disconnected {}:{} -> {}:{}",
                record.driver.component, record.driver.pin, record.sink.component, record.sink.pin
            );
            true
        } else {
            warn!("Cannot delete connection: no such edge");
            false
        }
    }

    pub fn has_connection(&self, record: &ConnectionRecord) -> bool {
        self.graph.has_edge(record)
    }

    // ---- stimulus --------------------------------------------------------

    /// Force output 0 of an input component; returns whether the value changed
    pub fn set_digital_input(&mut self, id: ComponentId, state: LogicState) -> bool {
        match self.graph.get(id) {
            Some(instance) if instance.definition.behavior == ComponentBehaviorType::Input => {
                self.set_output_slot_state(id, 0, state)
            }
            Some(instance) => {
                warn!("Component {} ({}) is not an input", id, instance.definition.name);
                false
            }
            None => {
                warn!("Cannot set input: component {} not found", id);
                false
            }
        }
    }

    /// Force an output slot and schedule everything it drives
    pub fn set_output_slot_state(&mut self, id: ComponentId, pin: usize, state: LogicState) -> bool {
        let now = self.current_time;
        let Some(instance) = self.graph.get_mut(id) else {
            return false;
        };
        let Some(slot) = instance.state.output_states.get_mut(pin) else {
            warn!("Output pin {} out of range on component {}", pin, id);
            return false;
        };
        if slot.state == state {
            return false;
        }

        *slot = SlotState::new(state, now);
        instance.state.is_changed = true;
        let sinks = instance.connections.outputs[pin].clone();

        self.notify_output_change(id, pin, state);
        for sink in sinks {
            self.schedule_component(sink.component, id);
        }
        true
    }

    /// Store a value on an input slot and schedule the component.
    ///
    /// Only meaningful for unconnected inputs: a connected input is re-read from its
    /// driver on every evaluation.
    pub fn set_input_slot_state(&mut self, id: ComponentId, pin: usize, state: LogicState) -> bool {
        let now = self.current_time;
        let Some(instance) = self.graph.get_mut(id) else {
            return false;
        };
        let Some(slot) = instance.state.input_states.get_mut(pin) else {
            warn!("Input pin {} out of range on component {}", pin, id);
            return false;
        };
        if slot.state != state {
            *slot = SlotState::new(state, now);
        }
        self.schedule_component(id, ComponentId::NULL);
        true
    }

    pub fn invert_input_slot_state(&mut self, id: ComponentId, pin: usize) -> bool {
        let current = match self.get_digital_pin_state(id, PinType::Input, pin) {
            Some(state) => state,
            None => return false,
        };
        let next = if current == LogicState::High {
            LogicState::Low
        } else {
            LogicState::High
        };
        self.set_input_slot_state(id, pin, next)
    }

    /// Reconfigure a clock and restart it from now
    pub fn update_clock(&mut self, id: ComponentId, frequency: f64, unit: FrequencyUnit) -> Result<(), SimulationError> {
        let clock = ClockState::new(frequency, unit);
        clock.phase_duration()?;

        let instance = self
            .graph
            .get_mut(id)
            .ok_or_else(|| SimulationError::InvalidClock(format!("component {} not found", id)))?;
        if !matches!(instance.state.aux, AuxState::Clock(_)) {
            return Err(SimulationError::InvalidClock(format!(
                "component {} is not a clock",
                id
            )));
        }
        let duty_cycle = instance.state.aux.clock().map_or(0.5, |c| c.duty_cycle);
        instance.state.aux = AuxState::Clock(ClockState { duty_cycle, ..clock });

        self.scheduler.remove_events_for(id);
        self.schedule_event(id, ComponentId::NULL, self.current_time);
        info!("Clock {} set to {} {:?}", id, frequency, unit);
        Ok(())
    }

    // ---- queries ---------------------------------------------------------

    pub fn get_digital_pin_state(&self, id: ComponentId, pin_type: PinType, pin: usize) -> Option<LogicState> {
        self.pin_slot(id, pin_type, pin).map(|slot| slot.state)
    }

    pub fn pin_slot(&self, id: ComponentId, pin_type: PinType, pin: usize) -> Option<SlotState> {
        let state = &self.graph.get(id)?.state;
        let slots = match pin_type {
            PinType::Input => &state.input_states,
            PinType::Output => &state.output_states,
        };
        slots.get(pin).copied()
    }

    pub fn get_connections(&self, id: ComponentId) -> Option<ConnectionBundle> {
        self.graph.get(id).map(|c| c.connections.clone())
    }

    pub fn get_component_state(&self, id: ComponentId) -> Option<&ComponentState> {
        self.graph.get(id).map(|c| &c.state)
    }

    /// Input waveform recorded by a state monitor, one entry per level change
    pub fn state_monitor_data(&self, id: ComponentId) -> Option<&[SlotState]> {
        let instance = self.graph.get(id)?;
        if !instance.definition.monitors_input {
            warn!("Component {} ({}) is not a state monitor", id, instance.definition.name);
            return None;
        }
        Some(&instance.state.monitor_history)
    }

    pub fn component_definition(&self, id: ComponentId) -> Option<Arc<ComponentDefinition>> {
        self.graph.get(id).map(|c| Arc::clone(&c.definition))
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.graph.contains(id)
    }

    /// Component ids in creation order
    pub fn component_ids(&self) -> Vec<ComponentId> {
        self.graph.ids().to_vec()
    }

    pub fn component_count(&self) -> usize {
        self.graph.len()
    }

    /// Every component transitively connected to `id`, including itself
    pub fn connected_graph(&self, id: ComponentId) -> Vec<ComponentId> {
        self.graph.connected_component(id)
    }

    pub fn current_time(&self) -> SimTime {
        self.current_time
    }

    pub fn pending_events(&self) -> Vec<SimulationEvent> {
        self.scheduler.pending()
    }

    /// Check if there are pending events in the scheduler
    pub fn has_pending_events(&self) -> bool {
        self.scheduler.has_events()
    }

    /// No pending work other than self-rescheduling components
    pub fn is_stable(&self) -> bool {
        self.scheduler.pending().iter().all(|event| {
            self.graph
                .get(event.target)
                .map_or(true, |c| c.definition.auto_reschedule)
        })
    }

    // ---- scheduling ------------------------------------------------------

    /// Queue an evaluation of `target`. Times in the past are clamped to now.
    pub fn schedule_event(&mut self, target: ComponentId, source: ComponentId, fire_time: SimTime) {
        let fire_time = if fire_time < self.current_time {
            warn!(
                "Event for {} at t={} is in the past, firing at t={}",
                target, fire_time, self.current_time
            );
            self.current_time
        } else {
            fire_time
        };
        trace!("Scheduled {} (from {}) at t={}", target, source, fire_time);
        self.scheduler
            .schedule_event(SimulationEvent::new(target, source, fire_time));
    }

    /// Schedule `target` after its own delay
    fn schedule_component(&mut self, target: ComponentId, source: ComponentId) {
        if let Some(instance) = self.graph.get(target) {
            let fire_time = self.current_time + instance.definition.delay;
            self.schedule_event(target, source, fire_time);
        }
    }

    // ---- drain loop ------------------------------------------------------

    /// Process one time step, returns true if events remain
    pub fn step(&mut self) -> bool {
        let Some(next_time) = self.scheduler.peek_next_time() else {
            return false;
        };

        if next_time > self.current_time {
            let old_time = self.current_time;
            self.current_time = next_time;
            for observer in &mut self.observers {
                observer.on_time_advance(old_time, next_time);
            }
        }

        debug!("=== Simulation Time {} ===", self.current_time);

        let events = self.scheduler.get_next_time_events();
        let events_count = events.len();

        let mut seen = HashSet::new();
        let targets: Vec<ComponentId> = events
            .iter()
            .map(|event| event.target)
            .filter(|target| seen.insert(*target))
            .collect();

        // Sample every input before any target runs
        let sampled: Vec<(ComponentId, Vec<LogicState>)> = targets
            .into_iter()
            .filter_map(|id| self.graph.gather_inputs(id).map(|inputs| (id, inputs)))
            .collect();

        for (id, inputs) in sampled {
            self.simulate_component(id, &inputs);
        }

        for observer in &mut self.observers {
            observer.on_step_complete(self.current_time, events_count);
        }

        self.scheduler.has_events()
    }

    /// Run every step due at or before `time`, then advance the clock to `time`
    pub fn run_until(&mut self, time: SimTime) -> usize {
        let mut steps = 0;
        while self.scheduler.peek_next_time().map_or(false, |next| next <= time) {
            self.step();
            steps += 1;
        }
        if time > self.current_time {
            let old_time = self.current_time;
            self.current_time = time;
            for observer in &mut self.observers {
                observer.on_time_advance(old_time, time);
            }
        }
        steps
    }

    /// Step until only self-rescheduling work remains or `max_steps` is spent.
    /// Returns true if the circuit settled.
    pub fn settle(&mut self, max_steps: usize) -> bool {
        for _ in 0..max_steps {
            if self.is_stable() {
                return true;
            }
            self.step();
        }
        let stable = self.is_stable();
        if !stable {
            warn!("Circuit did not settle within {} steps", max_steps);
        }
        stable
    }

    /// [`settle`](Self::settle) with the configured step budget
    pub fn settle_default(&mut self) -> bool {
        self.settle(self.config.settle_step_budget)
    }

    fn simulate_component(&mut self, id: ComponentId, inputs: &[LogicState]) {
        let now = self.current_time;
        let Some(instance) = self.graph.get_mut(id) else {
            return;
        };

        for (slot, value) in instance.state.input_states.iter_mut().zip(inputs) {
            if slot.state != *value {
                *slot = SlotState::new(*value, now);
            }
        }

        if instance.definition.monitors_input {
            if let Some(sample) = instance.state.input_states.first().copied() {
                if instance.state.monitor_history.last() != Some(&sample) {
                    instance.state.monitor_history.push(sample);
                }
            }
        }

        let definition = Arc::clone(&instance.definition);
        let result = definition
            .simulate(&SimulationInput {
                inputs,
                outputs: &instance.state.output_states,
                expressions: &instance.expressions,
                time: now,
                aux: &instance.state.aux,
            })
            .and_then(|output| {
                if output.outputs.len() == instance.state.output_states.len() {
                    Ok(output)
                } else {
                    Err(SimulationError::Evaluation(format!(
                        "produced {} outputs, expected {}",
                        output.outputs.len(),
                        instance.state.output_states.len()
                    )))
                }
            });

        let output = match result {
            Ok(output) => output,
            Err(e) => {
                error!("Simulation of {} ({}) failed, outputs not updated: {}", id, definition.name, e);
                instance.state.record_error(&e);
                return;
            }
        };

        instance.state.clear_error();
        instance.state.aux = output.aux;

        let mut changed = Vec::new();
        for (pin, (slot, value)) in instance
            .state
            .output_states
            .iter_mut()
            .zip(&output.outputs)
            .enumerate()
        {
            if slot.state != *value {
                *slot = SlotState::new(*value, now);
                changed.push((pin, *value));
            }
        }
        instance.state.is_changed = !changed.is_empty();

        let sinks: Vec<ComponentId> = changed
            .iter()
            .flat_map(|(pin, _)| instance.connections.outputs[*pin].iter().map(|p| p.component))
            .collect();

        trace!(
            "Evaluated {} ({}): inputs={:?} changed={:?}",
            id,
            definition.name,
            inputs,
            changed
        );

        for (pin, value) in changed {
            self.notify_output_change(id, pin, value);
        }
        for sink in sinks {
            self.schedule_component(sink, id);
        }

        if definition.auto_reschedule {
            if let Some(after) = output.reschedule_after {
                self.schedule_event(id, ComponentId::NULL, now + after);
            }
        }
    }

    fn notify_output_change(&mut self, id: ComponentId, pin: usize, state: LogicState) {
        let now = self.current_time;
        for observer in &mut self.observers {
            observer.on_output_change(id, pin, state, now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn engine() -> SimulationEngine {
        SimulationEngine::new(Arc::new(ComponentCatalog::with_builtins()))
    }

    #[derive(Default)]
    struct StepCounter {
        steps: Arc<Mutex<Vec<(SimTime, usize)>>>,
    }

    impl SimulationObserver for StepCounter {
        fn on_step_complete(&mut self, time: SimTime, events_processed: usize) {
            self.steps.lock().unwrap().push((time, events_processed));
        }
    }

    #[test]
    fn test_add_unknown_type_returns_null() {
        let mut engine = engine();
        let id = engine.add_component(&ComponentType::Custom("nope".into()), None, None);
        assert!(id.is_null());
        assert_eq!(engine.component_count(), 0);
    }

    #[test]
    fn test_add_schedules_initial_evaluation() {
        let mut engine = engine();
        let gate = engine.add_component(&ComponentType::Nand, None, None);
        assert_eq!(engine.pending_events(), vec![SimulationEvent::new(gate, ComponentId::NULL, 2)]);

        engine.step();
        assert_eq!(engine.current_time(), 2);
        assert_eq!(engine.get_digital_pin_state(gate, PinType::Output, 0), Some(LogicState::High));
    }

    #[test]
    fn test_fixed_counts_ignore_overrides() {
        let mut engine = engine();
        let adder = engine.add_component(&ComponentType::FullAdder, Some(5), None);
        let state = engine.get_component_state(adder).unwrap();
        assert_eq!(state.input_states.len(), 3);
        assert_eq!(state.output_states.len(), 2);

        let wide = engine.add_component(&ComponentType::Or, Some(4), None);
        assert_eq!(engine.get_component_state(wide).unwrap().input_states.len(), 4);

        assert!(engine.add_component(&ComponentType::And, Some(11), None).is_null());
    }

    #[test]
    fn test_counts_below_minimum_are_refused() {
        let mut engine = engine();
        assert!(engine.add_component(&ComponentType::And, Some(0), None).is_null());
        assert!(engine.add_component(&ComponentType::Or, Some(1), None).is_null());
        assert!(engine.add_component(&ComponentType::FullAdder, None, Some(1)).is_null());
        assert!(engine.add_component(&ComponentType::Output, Some(0), None).is_null());
        assert_eq!(engine.component_count(), 0);
    }

    #[test]
    fn test_not_gate_pairs_inputs_with_outputs() {
        let mut engine = engine();
        let wide = engine.add_component(&ComponentType::Not, Some(1), Some(3));
        assert!(!wide.is_null());
        let state = engine.get_component_state(wide).unwrap();
        assert_eq!(state.input_states.len(), 3);
        assert_eq!(state.output_states.len(), 3);

        let narrow = engine.add_component(&ComponentType::Not, Some(2), None);
        let state = engine.get_component_state(narrow).unwrap();
        assert_eq!((state.input_states.len(), state.output_states.len()), (2, 2));

        assert!(engine.settle(10));
        for id in [wide, narrow] {
            assert!(!engine.get_component_state(id).unwrap().sim_error);
        }
        for pin in 0..3 {
            assert_eq!(engine.get_digital_pin_state(wide, PinType::Output, pin), Some(LogicState::High));
        }
    }

    #[test]
    fn test_delete_drops_pending_events() {
        let mut engine = engine();
        let gate = engine.add_component(&ComponentType::And, None, None);
        assert!(engine.has_pending_events());
        assert!(engine.delete_component(gate));
        assert!(!engine.has_pending_events());
        assert!(!engine.contains(gate));
        assert!(engine.get_component_state(gate).is_none());
        assert!(!engine.delete_component(gate));
    }

    #[test]
    fn test_step_batches_same_time_events() {
        let mut engine = engine();
        let counter = StepCounter::default();
        let steps = Arc::clone(&counter.steps);
        engine.add_observer(Box::new(counter));

        let gate = engine.add_component(&ComponentType::And, None, None);
        engine.schedule_event(gate, ComponentId::NULL, 2);
        engine.schedule_event(gate, ComponentId::NULL, 4);

        assert!(engine.step());
        assert!(!engine.step());
        assert_eq!(*steps.lock().unwrap(), vec![(2, 2), (4, 1)]);
        assert!(!engine.step());
    }

    #[test]
    fn test_past_events_are_clamped() {
        let mut engine = engine();
        let gate = engine.add_component(&ComponentType::And, None, None);
        engine.run_until(100);
        engine.schedule_event(gate, ComponentId::NULL, 10);
        assert_eq!(engine.pending_events()[0].fire_time, 100);
    }

    #[test]
    fn test_set_digital_input_requires_input_behaviour() {
        let mut engine = engine();
        let gate = engine.add_component(&ComponentType::And, None, None);
        let input = engine.add_component(&ComponentType::Input, None, None);
        assert!(!engine.set_digital_input(gate, LogicState::High));
        assert!(engine.set_digital_input(input, LogicState::High));
        assert!(!engine.set_digital_input(input, LogicState::High));
    }

    #[test]
    fn test_invert_input_slot() {
        let mut engine = engine();
        let gate = engine.add_component(&ComponentType::Not, None, None);
        engine.settle(10);
        assert_eq!(engine.get_digital_pin_state(gate, PinType::Output, 0), Some(LogicState::High));

        assert!(engine.invert_input_slot_state(gate, 0));
        engine.settle(10);
        assert_eq!(engine.get_digital_pin_state(gate, PinType::Input, 0), Some(LogicState::High));
        assert_eq!(engine.get_digital_pin_state(gate, PinType::Output, 0), Some(LogicState::Low));
        assert!(!engine.invert_input_slot_state(gate, 3));
    }

    #[test]
    fn test_update_clock_validates() {
        let mut engine = engine();
        let clock = engine.add_component(&ComponentType::Clock, None, None);
        let gate = engine.add_component(&ComponentType::And, None, None);

        assert!(engine.update_clock(clock, 0.0, FrequencyUnit::Hz).is_err());
        assert!(engine.update_clock(gate, 1.0, FrequencyUnit::Hz).is_err());
        assert!(engine.update_clock(clock, 2.0, FrequencyUnit::KHz).is_ok());

        let clock_events: Vec<_> = engine
            .pending_events()
            .into_iter()
            .filter(|e| e.target == clock)
            .collect();
        assert_eq!(clock_events, vec![SimulationEvent::new(clock, ComponentId::NULL, 0)]);
    }

    #[test]
    fn test_clock_rearms_itself() {
        let mut engine = engine();
        let clock = engine.add_component(&ComponentType::Clock, None, None);
        engine.update_clock(clock, 1.0, FrequencyUnit::MHz).unwrap();

        engine.step();
        assert_eq!(engine.get_digital_pin_state(clock, PinType::Output, 0), Some(LogicState::High));
        assert_eq!(engine.pending_events(), vec![SimulationEvent::new(clock, ComponentId::NULL, 500)]);

        engine.step();
        assert_eq!(engine.current_time(), 500);
        assert_eq!(engine.get_digital_pin_state(clock, PinType::Output, 0), Some(LogicState::Low));
        assert!(engine.is_stable());
        assert!(engine.settle(5));
    }

    #[test]
    fn test_fork_is_independent() {
        let mut engine = engine();
        let input = engine.add_component(&ComponentType::Input, None, None);
        engine.settle(10);
        let mut fork = engine.fork();
        fork.set_digital_input(input, LogicState::High);
        assert_eq!(engine.get_digital_pin_state(input, PinType::Output, 0), Some(LogicState::Low));
        assert_eq!(fork.get_digital_pin_state(input, PinType::Output, 0), Some(LogicState::High));
    }
}
