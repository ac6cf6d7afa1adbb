//! Built-in component definitions.

use crate::core::components::catalog::ComponentCatalog;
use crate::core::components::definition::{
    simulation_fn, ComponentBehaviorType, ComponentDefinition, ComponentLogic, SimulationError,
    SimulationInput, SimulationOutput, SlotsInfo,
};
use crate::core::components::state::{AuxState, ClockState};
use crate::core::types::{ComponentType, LogicState, SimTime};

pub const IO_CATEGORY: &str = "IO";
pub const GATES_CATEGORY: &str = "Digital Gates";
pub const FLIP_FLOP_CATEGORY: &str = "Flip Flops";
pub const TRI_STATE_CATEGORY: &str = "Tri-State Buffers";
pub const COMBINATIONAL_CATEGORY: &str = "Combinational Circuits";

const GATE_DELAY: SimTime = 2;
const FLIP_FLOP_DELAY: SimTime = 5;
const TRI_STATE_DELAY: SimTime = 1;

/// Register every built-in definition
pub fn register_builtins(catalog: &mut ComponentCatalog) {
    for def in io_definitions()
        .into_iter()
        .chain(gate_definitions())
        .chain(tri_state_definitions())
        .chain(flip_flop_definitions())
        .chain(combinational_definitions())
    {
        catalog.register(def);
    }
}

fn hold_outputs(input: &SimulationInput<'_>) -> Result<SimulationOutput, SimulationError> {
    let outputs = input.outputs.iter().map(|slot| slot.state).collect();
    Ok(SimulationOutput::new(outputs, *input.aux))
}

fn clock_tick(input: &SimulationInput<'_>) -> Result<SimulationOutput, SimulationError> {
    let mut clock = match input.aux {
        AuxState::Clock(clock) => *clock,
        _ => {
            return Err(SimulationError::InvalidClock(
                "clock instance has no clock state".to_string(),
            ))
        }
    };

    let previous = input
        .outputs
        .first()
        .map(|slot| slot.state)
        .unwrap_or_default();
    let next = if previous == LogicState::High {
        LogicState::Low
    } else {
        LogicState::High
    };
    clock.high = next == LogicState::High;
    let phase = clock.phase_duration()?;

    Ok(SimulationOutput {
        outputs: vec![next; input.outputs.len()],
        aux: AuxState::Clock(clock),
        reschedule_after: Some(phase),
    })
}

fn tri_state(input: &SimulationInput<'_>) -> Result<SimulationOutput, SimulationError> {
    let (enable, data) = match input.inputs.split_last() {
        Some((enable, data)) => (*enable, data),
        None => {
            return Err(SimulationError::Evaluation(
                "tri-state buffer needs an enable input".to_string(),
            ))
        }
    };

    let outputs = (0..input.outputs.len())
        .map(|i| {
            if enable.is_high() {
                data.get(i).copied().unwrap_or_default()
            } else {
                LogicState::HighZ
            }
        })
        .collect();
    Ok(SimulationOutput::new(outputs, *input.aux))
}

#[derive(Clone, Copy)]
enum FlipFlopKind {
    Jk,
    Sr,
    D,
    T,
}

const FLIP_FLOP_CLOCK_PIN: usize = 1;

fn flip_flop(kind: FlipFlopKind, input: &SimulationInput<'_>) -> Result<SimulationOutput, SimulationError> {
    let clear = input.inputs.last().copied().unwrap_or_default();
    let clock = input
        .inputs
        .get(FLIP_FLOP_CLOCK_PIN)
        .copied()
        .unwrap_or_default();
    let prev_clock = match input.aux {
        AuxState::FlipFlop { prev_clock } => *prev_clock,
        _ => LogicState::Low,
    };
    let current_q = input.outputs.first().map(|s| s.state).unwrap_or_default();
    let current_q_bar = input.outputs.get(1).map(|s| s.state).unwrap_or_default();

    if clear.is_high() {
        // A rising edge must start from low once CLR is released
        return Ok(SimulationOutput::new(
            vec![LogicState::Low, LogicState::High],
            AuxState::FlipFlop {
                prev_clock: LogicState::High,
            },
        ));
    }

    let aux = AuxState::FlipFlop { prev_clock: clock };
    let rising_edge = clock == LogicState::High && prev_clock == LogicState::Low;
    if !rising_edge {
        return Ok(SimulationOutput::new(vec![current_q, current_q_bar], aux));
    }

    let first = input.inputs.first().copied().unwrap_or_default();
    let third = input.inputs.get(2).copied().unwrap_or_default();
    let toggled = if current_q == LogicState::High {
        LogicState::Low
    } else {
        LogicState::High
    };

    let new_q = match kind {
        FlipFlopKind::Jk => match (first.is_high(), third.is_high()) {
            (true, true) => toggled,
            (true, false) => LogicState::High,
            (false, true) => LogicState::Low,
            (false, false) => current_q,
        },
        FlipFlopKind::Sr => {
            if first.is_high() {
                LogicState::High
            } else if third.is_high() {
                LogicState::Low
            } else {
                current_q
            }
        }
        FlipFlopKind::D => first,
        FlipFlopKind::T => {
            if first.is_high() {
                toggled
            } else {
                current_q
            }
        }
    };

    Ok(SimulationOutput::new(vec![new_q, new_q.complement()], aux))
}

fn io_definitions() -> Vec<ComponentDefinition> {
    let input = ComponentDefinition::new(
        ComponentType::Input,
        "Input",
        IO_CATEGORY,
        SlotsInfo::fixed(0),
        SlotsInfo::resizeable(1),
        0,
        ComponentLogic::Function(simulation_fn(hold_outputs)),
    )
    .with_behavior(ComponentBehaviorType::Input);

    let output = ComponentDefinition::new(
        ComponentType::Output,
        "Output",
        IO_CATEGORY,
        SlotsInfo::resizeable(1),
        SlotsInfo::fixed(0),
        0,
        ComponentLogic::Function(simulation_fn(hold_outputs)),
    )
    .with_behavior(ComponentBehaviorType::Output);

    let clock = ComponentDefinition::new(
        ComponentType::Clock,
        "Clock",
        IO_CATEGORY,
        SlotsInfo::fixed(0),
        SlotsInfo::fixed(1),
        0,
        ComponentLogic::Function(simulation_fn(clock_tick)),
    )
    .with_auto_reschedule()
    .with_aux(AuxState::Clock(ClockState::default()));

    let state_monitor = ComponentDefinition::new(
        ComponentType::StateMonitor,
        "State Monitor",
        IO_CATEGORY,
        SlotsInfo::fixed(1),
        SlotsInfo::fixed(0),
        0,
        ComponentLogic::Function(simulation_fn(hold_outputs)),
    )
    .with_behavior(ComponentBehaviorType::Output)
    .with_input_monitor();

    // Inputs are BCD bits, 0 least significant; outputs are segments a..g
    let seven_segment = ComponentDefinition::new(
        ComponentType::SevenSegmentDriver,
        "Seven Segment Display Driver",
        IO_CATEGORY,
        SlotsInfo::named(&["A", "B", "C", "D"]),
        SlotsInfo::named(&["a", "b", "c", "d", "e", "f", "g"]),
        GATE_DELAY,
        ComponentLogic::Expressions(
            [
                "3+1+(2*0)+(!2*!0)",
                "!2+(!1*!0)+(1*0)",
                "2+!1+0",
                "3+(!2*!0)+(!2*1)+(1*!0)+(2*!1*0)",
                "(!2*!0)+(1*!0)",
                "3+(!1*!0)+(2*!1)+(2*!0)",
                "3+(2*!1)+(!2*1)+(1*!0)",
            ]
            .iter()
            .map(|e| e.to_string())
            .collect(),
        ),
    );

    vec![input, output, clock, state_monitor, seven_segment]
}

fn gate_definitions() -> Vec<ComponentDefinition> {
    let binary = [
        (ComponentType::And, "AND Gate", '*', false),
        (ComponentType::Or, "OR Gate", '+', false),
        (ComponentType::Xor, "XOR Gate", '^', false),
        (ComponentType::Nand, "NAND Gate", '*', true),
        (ComponentType::Nor, "NOR Gate", '+', true),
        (ComponentType::Xnor, "XNOR Gate", '^', true),
    ];

    let mut defs: Vec<ComponentDefinition> = binary
        .into_iter()
        .map(|(component_type, name, op, negate)| {
            ComponentDefinition::new(
                component_type,
                name,
                GATES_CATEGORY,
                SlotsInfo::resizeable(2),
                SlotsInfo::fixed(1),
                GATE_DELAY,
                ComponentLogic::Operator { op, negate },
            )
        })
        .collect();

    defs.push(ComponentDefinition::new(
        ComponentType::Not,
        "NOT Gate",
        GATES_CATEGORY,
        SlotsInfo::resizeable(1),
        SlotsInfo::resizeable(1),
        GATE_DELAY,
        ComponentLogic::Operator {
            op: '!',
            negate: false,
        },
    ));
    defs
}

fn tri_state_definitions() -> Vec<ComponentDefinition> {
    [
        (ComponentType::TriStateBuffer, "Tri-State Buffer", 1usize),
        (ComponentType::TriStateBuffer4, "4-Bit Tri-State Buffer", 4),
        (ComponentType::TriStateBuffer8, "8-Bit Tri-State Buffer", 8),
    ]
    .into_iter()
    .map(|(component_type, name, width)| {
        let mut inputs: Vec<String> = (0..width).map(|i| format!("D{}", i)).collect();
        inputs.push("OE".to_string());
        let outputs: Vec<String> = (0..width).map(|i| format!("Q{}", i)).collect();

        ComponentDefinition::new(
            component_type,
            name,
            TRI_STATE_CATEGORY,
            SlotsInfo {
                count: width + 1,
                is_resizeable: false,
                names: inputs,
            },
            SlotsInfo {
                count: width,
                is_resizeable: false,
                names: outputs,
            },
            TRI_STATE_DELAY,
            ComponentLogic::Function(simulation_fn(tri_state)),
        )
    })
    .collect()
}

fn flip_flop_definitions() -> Vec<ComponentDefinition> {
    let kinds = [
        (ComponentType::FlipFlopJk, "JK Flip Flop", FlipFlopKind::Jk, &["J", "CLK", "K", "CLR"][..]),
        (ComponentType::FlipFlopSr, "SR Flip Flop", FlipFlopKind::Sr, &["S", "CLK", "R", "CLR"][..]),
        (ComponentType::FlipFlopD, "D Flip Flop", FlipFlopKind::D, &["D", "CLK", "CLR"][..]),
        (ComponentType::FlipFlopT, "T Flip Flop", FlipFlopKind::T, &["T", "CLK", "CLR"][..]),
    ];

    kinds
        .into_iter()
        .map(|(component_type, name, kind, pins)| {
            ComponentDefinition::new(
                component_type,
                name,
                FLIP_FLOP_CATEGORY,
                SlotsInfo::named(pins),
                SlotsInfo::named(&["Q", "Q'"]),
                FLIP_FLOP_DELAY,
                ComponentLogic::Function(simulation_fn(move |input| flip_flop(kind, input))),
            )
            .with_aux(AuxState::FlipFlop {
                prev_clock: LogicState::Low,
            })
        })
        .collect()
}

fn combinational_definitions() -> Vec<ComponentDefinition> {
    let table: [(ComponentType, &str, usize, SimTime, &[&str]); 12] = [
        (ComponentType::HalfAdder, "Half Adder", 2, 2, &["0^1", "0*1"]),
        (ComponentType::FullAdder, "Full Adder", 3, 3, &["0^1^2", "(0*1)+2*(0^1)"]),
        (ComponentType::HalfSubtractor, "Half Subtractor", 2, 3, &["0^1", "!0*1"]),
        (
            ComponentType::FullSubtractor,
            "Full Subtractor",
            3,
            3,
            &["0^1^2", "(!0*1)+(!(0^1)*2)"],
        ),
        (ComponentType::Mux2To1, "2-to-1 Mux", 3, 3, &["(0*!2)+(1*2)"]),
        (
            ComponentType::Mux4To1,
            "4-to-1 Mux",
            6,
            2,
            &["(0*!5*!4)+(1*!5*4)+(2*5*!4)+(3*5*4)"],
        ),
        (
            ComponentType::Decoder2To4,
            "2-to-4 Decoder",
            2,
            2,
            &["!1*!0", "!1*0", "1*!0", "1*0"],
        ),
        (
            ComponentType::Demux1To4,
            "1-to-4 Demux",
            3,
            2,
            &["0*!2*!1", "0*!2*1", "0*2*!1", "0*2*1"],
        ),
        (ComponentType::Encoder4To2, "4-to-2 Encoder", 4, 3, &["1+3", "2+3"]),
        (
            ComponentType::PriorityEncoder4To2,
            "4-to-2 Priority Encoder",
            4,
            3,
            &["3+(!2*1)", "3+2", "0+1+2+3"],
        ),
        (
            ComponentType::Comparator1Bit,
            "1-Bit Comparator",
            2,
            3,
            &["0*!1", "!(0^1)", "!0*1"],
        ),
        (
            ComponentType::Comparator2Bit,
            "2-Bit Comparator",
            4,
            3,
            &[
                "(1*!3)+(!(1^3)*(0*!2))",
                "(!1*3)+(!(1^3)*(!0*2))",
                "(!(1^3))*(!(0^2))",
            ],
        ),
    ];

    table
        .into_iter()
        .map(|(component_type, name, inputs, delay, exprs)| {
            ComponentDefinition::new(
                component_type,
                name,
                COMBINATIONAL_CATEGORY,
                SlotsInfo::fixed(inputs),
                SlotsInfo::fixed(exprs.len()),
                delay,
                ComponentLogic::Expressions(exprs.iter().map(|e| e.to_string()).collect()),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::components::state::FrequencyUnit;
    use crate::core::types::SlotState;

    fn run(def: &ComponentDefinition, inputs: &[LogicState], outputs: &[SlotState], aux: &AuxState) -> SimulationOutput {
        let expressions = def.expressions_for(inputs.len(), outputs.len());
        def.simulate(&SimulationInput {
            inputs,
            outputs,
            expressions: &expressions,
            time: 0,
            aux,
        })
        .unwrap()
    }

    fn lookup(component_type: ComponentType) -> ComponentDefinition {
        let mut catalog = ComponentCatalog::new();
        register_builtins(&mut catalog);
        (*catalog.definition(&component_type)).clone()
    }

    fn bits(values: &[u8]) -> Vec<LogicState> {
        values.iter().map(|v| LogicState::from_bool(*v == 1)).collect()
    }

    #[test]
    fn test_full_adder_truth_table() {
        let def = lookup(ComponentType::FullAdder);
        let outputs = [SlotState::default(); 2];
        for a in 0..2u8 {
            for b in 0..2u8 {
                for c in 0..2u8 {
                    let result = run(&def, &bits(&[a, b, c]), &outputs, &AuxState::None);
                    let total = a + b + c;
                    assert_eq!(result.outputs, bits(&[total % 2, total / 2]));
                }
            }
        }
    }

    #[test]
    fn test_seven_segment_digits() {
        let def = lookup(ComponentType::SevenSegmentDriver);
        let outputs = [SlotState::default(); 7];
        // segments a..g for 1 and 8
        let one = run(&def, &bits(&[1, 0, 0, 0]), &outputs, &AuxState::None);
        assert_eq!(one.outputs, bits(&[0, 1, 1, 0, 0, 0, 0]));
        let eight = run(&def, &bits(&[0, 0, 0, 1]), &outputs, &AuxState::None);
        assert_eq!(eight.outputs, bits(&[1, 1, 1, 1, 1, 1, 1]));
    }

    #[test]
    fn test_tri_state_disabled_is_high_z() {
        let def = lookup(ComponentType::TriStateBuffer4);
        let outputs = [SlotState::default(); 4];
        let off = run(&def, &bits(&[1, 0, 1, 1, 0]), &outputs, &AuxState::None);
        assert!(off.outputs.iter().all(|s| *s == LogicState::HighZ));
        let on = run(&def, &bits(&[1, 0, 1, 1, 1]), &outputs, &AuxState::None);
        assert_eq!(on.outputs, bits(&[1, 0, 1, 1]));
    }

    #[test]
    fn test_jk_flip_flop_edges() {
        let def = lookup(ComponentType::FlipFlopJk);
        let low_outputs = [SlotState::default(); 2];
        let aux = def.initial_aux;

        // J=1, CLK rising
        let set = run(&def, &bits(&[1, 1, 0, 0]), &low_outputs, &aux);
        assert_eq!(set.outputs, bits(&[1, 0]));

        // Clock held high: no further edge
        let q_high = [
            SlotState::new(LogicState::High, 0),
            SlotState::new(LogicState::Low, 0),
        ];
        let held = run(&def, &bits(&[0, 1, 1, 0]), &q_high, &set.aux);
        assert_eq!(held.outputs, bits(&[1, 0]));

        // CLR forces Q low
        let cleared = run(&def, &bits(&[1, 1, 0, 1]), &q_high, &aux);
        assert_eq!(cleared.outputs, bits(&[0, 1]));
    }

    #[test]
    fn test_t_flip_flop_toggles_on_rising_edge() {
        let def = lookup(ComponentType::FlipFlopT);
        let outputs = [SlotState::default(); 2];
        let first = run(&def, &bits(&[1, 1, 0]), &outputs, &def.initial_aux);
        assert_eq!(first.outputs, bits(&[1, 0]));
    }

    #[test]
    fn test_clock_toggles_and_reschedules() {
        let def = lookup(ComponentType::Clock);
        let outputs = [SlotState::default()];
        let aux = AuxState::Clock(ClockState::new(1.0, FrequencyUnit::KHz));
        let tick = run(&def, &[], &outputs, &aux);
        assert_eq!(tick.outputs, vec![LogicState::High]);
        assert_eq!(tick.reschedule_after, Some(500_000));
        assert_eq!(tick.aux.clock().map(|c| c.high), Some(true));
    }
}
