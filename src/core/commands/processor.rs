use crate::core::commands::{
    AddCommand, AddRequest, Command, CommandManager, CommandResult, ConnectCommand, DeleteCommand,
    DeleteConnectionCommand, Endpoints, SetInputCommand,
};
use crate::core::execution::simulation_engine::SimulationEngine;
use crate::core::types::{ComponentId, ComponentType, LogicState};
use log::{debug, error};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("invalid arguments for {command}: {reason}")]
    InvalidArguments { command: String, reason: String },

    #[error("{0} made no change")]
    Rejected(String),

    #[error("nothing to {0}")]
    EmptyHistory(&'static str),
}

/// Builds a command from its whitespace separated arguments
pub type CommandFactory = Box<dyn Fn(&[&str]) -> Result<Box<dyn Command>, CommandError> + Send + Sync>;

/// Box a closure as a [`CommandFactory`]
pub fn command_factory<F>(factory: F) -> CommandFactory
where
    F: Fn(&[&str]) -> Result<Box<dyn Command>, CommandError> + Send + Sync + 'static,
{
    Box::new(factory)
}

/// Text front end over the command manager.
///
/// Lines look like `connect <src> <pin> <dst> <pin>`; names are case
/// insensitive. `undo` and `redo` operate on the history directly.
pub struct CommandProcessor {
    factories: HashMap<String, CommandFactory>,
}

fn invalid(command: &str, reason: impl Into<String>) -> CommandError {
    CommandError::InvalidArguments {
        command: command.to_string(),
        reason: reason.into(),
    }
}

fn arity(command: &str, args: &[&str], min: usize, max: usize) -> Result<(), CommandError> {
    if args.len() < min || args.len() > max {
        return Err(invalid(
            command,
            format!("expected {}..={} arguments, got {}", min, max, args.len()),
        ));
    }
    Ok(())
}

fn parse_id(command: &str, arg: &str) -> Result<ComponentId, CommandError> {
    match arg.parse::<u64>() {
        Ok(0) => Err(invalid(command, "null component id")),
        Ok(raw) => Ok(ComponentId::from_raw(raw)),
        Err(_) => Err(invalid(command, format!("bad component id '{}'", arg))),
    }
}

fn parse_count(command: &str, arg: &str) -> Result<usize, CommandError> {
    arg.parse()
        .map_err(|_| invalid(command, format!("bad number '{}'", arg)))
}

fn parse_state(command: &str, arg: &str) -> Result<LogicState, CommandError> {
    match arg.to_ascii_lowercase().as_str() {
        "0" | "low" => Ok(LogicState::Low),
        "1" | "high" => Ok(LogicState::High),
        _ => Err(invalid(command, format!("bad logic value '{}'", arg))),
    }
}

fn parse_endpoints(command: &str, args: &[&str]) -> Result<Endpoints, CommandError> {
    arity(command, args, 4, 4)?;
    Ok(Endpoints::output_to_input(
        parse_id(command, args[0])?,
        parse_count(command, args[1])?,
        parse_id(command, args[2])?,
        parse_count(command, args[3])?,
    ))
}

impl CommandProcessor {
    /// Processor without any registered commands
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Processor with `add`, `connect`, `disconnect`, `delete` and `set`
    pub fn new() -> Self {
        let mut processor = Self::empty();
        processor.register_command(
            "add",
            command_factory(|args| {
                arity("add", args, 1, 3)?;
                let mut request = AddRequest::new(ComponentType::parse(args[0]));
                if let Some(inputs) = args.get(1) {
                    request.input_count = Some(parse_count("add", inputs)?);
                }
                if let Some(outputs) = args.get(2) {
                    request.output_count = Some(parse_count("add", outputs)?);
                }
                Ok(Box::new(AddCommand::new(vec![request])))
            }),
        );
        processor.register_command(
            "connect",
            command_factory(|args| Ok(Box::new(ConnectCommand::new(parse_endpoints("connect", args)?)))),
        );
        processor.register_command(
            "disconnect",
            command_factory(|args| {
                let endpoints = parse_endpoints("disconnect", args)?;
                Ok(Box::new(DeleteConnectionCommand::new(vec![endpoints])))
            }),
        );
        processor.register_command(
            "delete",
            command_factory(|args| {
                if args.is_empty() {
                    return Err(invalid("delete", "expected at least one component id"));
                }
                let ids = args
                    .iter()
                    .map(|arg| parse_id("delete", arg))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Box::new(DeleteCommand::new(ids)))
            }),
        );
        processor.register_command(
            "set",
            command_factory(|args| {
                arity("set", args, 2, 2)?;
                Ok(Box::new(SetInputCommand::new(
                    parse_id("set", args[0])?,
                    parse_state("set", args[1])?,
                )))
            }),
        );
        processor
    }

    /// Register or replace a command factory
    pub fn register_command(&mut self, name: &str, factory: CommandFactory) {
        self.factories.insert(name.to_ascii_lowercase(), factory);
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_ascii_lowercase())
    }

    /// Parse and execute one line
    pub fn process(
        &self,
        manager: &mut CommandManager,
        engine: &mut SimulationEngine,
        line: &str,
    ) -> Result<CommandResult, CommandError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((name, args)) = tokens.split_first() else {
            return Err(CommandError::Empty);
        };
        let name = name.to_ascii_lowercase();

        match name.as_str() {
            "undo" => return manager.undo(engine).ok_or(CommandError::EmptyHistory("undo")),
            "redo" => return manager.redo(engine).ok_or(CommandError::EmptyHistory("redo")),
            _ => {}
        }

        let Some(factory) = self.factories.get(&name) else {
            error!("Unknown command: {}", line);
            return Err(CommandError::UnknownCommand(name));
        };
        let command = factory(args)?;
        debug!("Processing '{}'", line.trim());
        manager
            .execute_boxed(engine, command)
            .ok_or(CommandError::Rejected(name))
    }
}

impl Default for CommandProcessor {
    fn default() -> Self {
        Self::new()
    }
}
