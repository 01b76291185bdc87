//! This crate compiles k-tape Turing machines into equivalent single-tape machines.
//! It includes modules for parsing machine descriptions, encoding k tapes onto one,
//! generating the single-tape transition table, and writing it back out.

pub mod alphabet;
pub mod analyzer;
pub mod assembly;
pub mod config;
pub mod discovery;
pub mod encoder;
pub mod execution;
pub mod flattener;
pub mod injection;
pub mod loader;
#[cfg(test)]
mod machine;
pub mod parser;
pub mod programs;
pub mod safety;
pub mod state;
pub mod types;
pub mod writer;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `analyze` and `lint` functions and `AnalysisError` enum from the analyzer module.
pub use analyzer::{analyze, lint, AnalysisError};
/// Re-exports the compiler options from the config module.
pub use config::{FlattenConfig, SafetyConfig};
/// Re-exports the encoding functions from the encoder module.
pub use encoder::{decode, encode, marker_of, Tapes};
/// Re-exports the compiler entry points from the flattener module.
pub use flattener::{flatten, FlattenedMachine, Flattener};
/// Re-exports the `MachineLoader` struct from the loader module.
pub use loader::MachineLoader;
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
/// Re-exports `MachineInfo`, `MachineCatalog`, and `MACHINES` from the programs module.
pub use programs::{MachineCatalog, MachineInfo, MACHINES};
/// Re-exports the structured state names from the state module.
pub use state::{Phase, State};
/// Re-exports various types related to machine descriptions from the types module.
pub use types::{
    Direction, FlatTransition, Machine, MachineError, Mode, Symbol, Transition, MAX_MACHINE_SIZE,
};
/// Re-exports the `write` function from the writer module.
pub use writer::write;
