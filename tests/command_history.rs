use bess_sim::{
    AddCommand, AddRequest, Command, CommandManager, CommandResult, ComponentCatalog, ComponentId, ComponentType,
    CompositeCommand, ConnectCommand, ConnectionBundle, DeleteCommand, DeleteConnectionCommand, Endpoints,
    LogicState, PinType, SetInputCommand, SimulationEngine,
};
use std::sync::Arc;

/// Topology and pin values, the state undo must restore
type Observable = Vec<(ComponentId, Vec<LogicState>, Vec<LogicState>, ConnectionBundle)>;

fn observe(engine: &SimulationEngine) -> Observable {
    let mut ids = engine.component_ids();
    ids.sort();
    ids.into_iter()
        .map(|id| {
            let state = engine.get_component_state(id).unwrap();
            (
                id,
                state.input_states.iter().map(|s| s.state).collect(),
                state.output_states.iter().map(|s| s.state).collect(),
                engine.get_connections(id).unwrap(),
            )
        })
        .collect()
}

struct Bench {
    engine: SimulationEngine,
    input: ComponentId,
    gate: ComponentId,
    lamp: ComponentId,
}

/// Input -> NOT -> Output, settled
fn bench() -> Bench {
    let mut engine = SimulationEngine::new(Arc::new(ComponentCatalog::with_builtins()));
    let input = engine.add_component(&ComponentType::Input, None, None);
    let gate = engine.add_component(&ComponentType::Not, None, None);
    let lamp = engine.add_component(&ComponentType::Output, None, None);
    engine.connect_component(input, 0, PinType::Output, gate, 0, PinType::Input, false);
    engine.connect_component(gate, 0, PinType::Output, lamp, 0, PinType::Input, false);
    engine.settle(100);
    Bench {
        engine,
        input,
        gate,
        lamp,
    }
}

/// Drain pending events so downstream pins are part of the comparison
fn settled(engine: &mut SimulationEngine) -> Observable {
    assert!(engine.settle(100));
    observe(engine)
}

fn assert_symmetric(engine: &mut SimulationEngine, command: impl Command + 'static) {
    let mut manager = CommandManager::new();
    let before = settled(engine);

    assert!(manager.execute(engine, command).is_some());
    let after = settled(engine);
    assert_ne!(before, after);

    manager.undo(engine).unwrap();
    assert_eq!(settled(engine), before);

    assert!(manager.redo(engine).is_some());
    assert_eq!(settled(engine), after);
}

#[test]
fn test_add_is_symmetric() {
    let mut bench = bench();
    let command = AddCommand::new(vec![
        AddRequest::new(ComponentType::Xor),
        AddRequest::new(ComponentType::Mux4To1),
    ]);
    assert_symmetric(&mut bench.engine, command);
}

#[test]
fn test_delete_is_symmetric() {
    let mut bench = bench();
    assert_symmetric(&mut bench.engine, DeleteCommand::new(vec![bench.gate]));
}

#[test]
fn test_connect_is_symmetric() {
    let mut bench = bench();
    let extra = bench.engine.add_component(&ComponentType::Output, None, None);
    let command = ConnectCommand::new(Endpoints::output_to_input(bench.input, 0, extra, 0));
    assert_symmetric(&mut bench.engine, command);
}

#[test]
fn test_disconnect_is_symmetric() {
    let mut bench = bench();
    let command = DeleteConnectionCommand::new(vec![Endpoints::output_to_input(bench.gate, 0, bench.lamp, 0)]);
    assert_symmetric(&mut bench.engine, command);
}

#[test]
fn test_set_input_is_symmetric() {
    let mut bench = bench();
    assert_symmetric(&mut bench.engine, SetInputCommand::new(bench.input, LogicState::High));
}

#[test]
fn test_set_input_noop_stays_out_of_history() {
    let mut bench = bench();
    let mut manager = CommandManager::new();
    let result = manager.execute(&mut bench.engine, SetInputCommand::new(bench.input, LogicState::Low));
    assert!(result.is_none());
    assert!(!manager.can_undo());
}

#[test]
fn test_undo_delete_restores_simulation_behaviour() {
    let mut bench = bench();
    let mut manager = CommandManager::new();
    manager.execute(&mut bench.engine, DeleteCommand::new(vec![bench.gate]));
    manager.undo(&mut bench.engine);

    manager.execute(&mut bench.engine, SetInputCommand::new(bench.input, LogicState::High));
    bench.engine.settle(100);
    assert_eq!(
        bench.engine.get_digital_pin_state(bench.lamp, PinType::Input, 0),
        Some(LogicState::Low)
    );
}

#[test]
fn test_composite_partial_failure_leaves_applied_steps_undoable() {
    let mut bench = bench();
    let mut manager = CommandManager::new();
    let before = observe(&bench.engine);

    // The connect fails because the edge already exists
    let composite = CompositeCommand::new()
        .with(SetInputCommand::new(bench.input, LogicState::High))
        .with(ConnectCommand::new(Endpoints::output_to_input(bench.input, 0, bench.gate, 0)))
        .with(DeleteCommand::new(vec![bench.lamp]));
    let Some(CommandResult::Partial { failed_index, applied }) = manager.execute(&mut bench.engine, composite) else {
        panic!("partial failure should be reported");
    };
    assert_eq!(failed_index, 1);
    assert_eq!(
        applied,
        vec![CommandResult::InputSet {
            id: bench.input,
            state: LogicState::High
        }]
    );

    // The first step stays applied and the third never ran
    assert_eq!(
        bench.engine.get_digital_pin_state(bench.input, PinType::Output, 0),
        Some(LogicState::High)
    );
    assert!(bench.engine.contains(bench.lamp));
    assert_ne!(settled(&mut bench.engine), before);

    assert!(manager.can_undo());
    manager.undo(&mut bench.engine);
    assert_eq!(settled(&mut bench.engine), before);
}

#[test]
fn test_composite_undo_is_one_step() {
    let mut bench = bench();
    let mut manager = CommandManager::new();
    let before = observe(&bench.engine);

    let composite = CompositeCommand::new()
        .with(DeleteConnectionCommand::new(vec![Endpoints::output_to_input(
            bench.gate, 0, bench.lamp, 0,
        )]))
        .with(SetInputCommand::new(bench.input, LogicState::High))
        .with(DeleteCommand::new(vec![bench.gate]));
    let Some(CommandResult::Composite(results)) = manager.execute(&mut bench.engine, composite) else {
        panic!("composite should succeed");
    };
    assert_eq!(results.len(), 3);
    assert_eq!(manager.undo_len(), 1);

    manager.undo(&mut bench.engine);
    assert_eq!(observe(&bench.engine), before);
}
