use bess_sim::{
    init_logging, CommandManager, CommandProcessor, CommandResult, ComponentCatalog, ComponentId, ComponentType,
    ConcurrencyMode, FrequencyUnit, LogicState, PinType, SimTime, SimulationConfig, SimulationEngine, SimulationObserver,
};
use std::sync::Arc;

/// Prints every change of the watched outputs
struct Trace {
    watched: Vec<(ComponentId, &'static str)>,
}

impl SimulationObserver for Trace {
    fn on_output_change(&mut self, id: ComponentId, pin: usize, state: LogicState, time: SimTime) {
        if pin != 0 {
            return;
        }
        if let Some((_, label)) = self.watched.iter().find(|(watched, _)| *watched == id) {
            println!("  t={:>9} {} -> {}", time, label, state);
        }
    }
}

fn added(result: CommandResult) -> Result<ComponentId, Box<dyn std::error::Error>> {
    match result {
        CommandResult::Added(ids) if !ids.is_empty() => Ok(ids[0]),
        other => Err(format!("unexpected result {:?}", other).into()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging("warn");

    println!("Starting 2-bit ripple counter");

    let config = SimulationConfig::new()
        .with_concurrency(ConcurrencyMode::Rayon)
        .with_history_limit(64);
    let mut engine = SimulationEngine::with_config(Arc::new(ComponentCatalog::with_builtins()), config.clone());
    let mut history = CommandManager::from_config(&config);
    let processor = CommandProcessor::new();

    let run = |engine: &mut SimulationEngine, history: &mut CommandManager, line: &str| {
        println!("> {}", line);
        processor.process(history, engine, line)
    };

    let clock = added(run(&mut engine, &mut history, "add clock")?)?;
    let enable = added(run(&mut engine, &mut history, "add input")?)?;
    let bit0 = added(run(&mut engine, &mut history, "add flip_flop_t")?)?;
    let bit1 = added(run(&mut engine, &mut history, "add flip_flop_t")?)?;

    run(&mut engine, &mut history, &format!("connect {} 0 {} 0", enable, bit0))?;
    run(&mut engine, &mut history, &format!("connect {} 0 {} 0", enable, bit1))?;
    run(&mut engine, &mut history, &format!("connect {} 0 {} 1", clock, bit0))?;
    // Q' of bit 0 rises when bit 0 falls
    run(&mut engine, &mut history, &format!("connect {} 1 {} 1", bit0, bit1))?;
    run(&mut engine, &mut history, &format!("set {} 1", enable))?;

    engine.update_clock(clock, 1.0, FrequencyUnit::KHz)?;
    engine.add_observer(Box::new(Trace {
        watched: vec![(bit0, "Q0"), (bit1, "Q1")],
    }));

    println!();
    println!("Running 8 clock periods...");
    engine.run_until(8_000_000);

    let value = |id| engine.get_digital_pin_state(id, PinType::Output, 0) == Some(LogicState::High);
    println!(
        "Counter after {} ticks: {}{}",
        engine.current_time(),
        u8::from(value(bit1)),
        u8::from(value(bit0))
    );

    println!();
    println!("Full adder truth table:");
    let mut adder_bench = SimulationEngine::with_config(Arc::new(ComponentCatalog::with_builtins()), config);
    let adder = adder_bench.add_component(&ComponentType::FullAdder, None, None);
    for pin in 0..3 {
        let input = adder_bench.add_component(&ComponentType::Input, None, None);
        adder_bench.connect_component(input, 0, PinType::Output, adder, pin, PinType::Input, false);
    }
    for pin in 0..2 {
        let output = adder_bench.add_component(&ComponentType::Output, None, None);
        adder_bench.connect_component(adder, pin, PinType::Output, output, 0, PinType::Input, false);
    }
    if let Some(table) = adder_bench.truth_table(adder) {
        println!("  A B Cin | S Cout");
        for row in &table.rows {
            let inputs: Vec<String> = row.inputs.iter().map(|bit| u8::from(*bit).to_string()).collect();
            let outputs: Vec<String> = row.outputs.iter().map(|state| state.to_string()).collect();
            println!("  {}   | {}", inputs.join(" "), outputs.join(" "));
        }
    }

    println!();
    println!("Undo history holds {} commands", history.undo_len());
    let snapshot = engine.to_json()?;
    println!("Snapshot size: {} bytes", snapshot.len());

    Ok(())
}
