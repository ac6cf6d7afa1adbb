pub mod commands;
pub mod components;
pub mod connections;
pub mod execution;
pub mod expression;
pub mod graph;
pub mod serialization;
pub mod types;

#[cfg(test)]
mod tests;
