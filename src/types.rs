//! This module defines the core data structures and types used throughout the compiler,
//! including symbols, source machines, transitions, flattened transitions and error types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::state::State;
use crate::Rule;

/// The blank symbol, both on virtual tapes and on the physical tape.
pub const BLANK_SYMBOL: &str = "_";
/// Separates the virtual tapes on the encoded single tape.
pub const BOUNDARY_SYMBOL: &str = "#";
/// Marks the right end of the encoded single tape.
pub const TAPE_END_SYMBOL: &str = "$";
/// Anchors the left end of a shift subroutine so it can find its way back.
pub const RETURN_SYMBOL: &str = "R";
/// Stands for a blank on input tapes that cannot spell one out.
pub const PLACEHOLDER_SYMBOL: &str = "~";
/// Prefix and suffix of rewritten source symbols.
pub const ESCAPE_CHAR: char = '\\';
/// The maximum allowed size for a machine description in bytes.
pub const MAX_MACHINE_SIZE: usize = 1 << 20; // 1MB

/// An opaque tape symbol. Symbols are compared by exact value only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn blank() -> Self {
        Self::new(BLANK_SYMBOL)
    }

    pub fn boundary() -> Self {
        Self::new(BOUNDARY_SYMBOL)
    }

    pub fn tape_end() -> Self {
        Self::new(TAPE_END_SYMBOL)
    }

    pub fn return_marker() -> Self {
        Self::new(RETURN_SYMBOL)
    }

    pub fn placeholder() -> Self {
        Self::new(PLACEHOLDER_SYMBOL)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0 == BLANK_SYMBOL
    }

    pub fn is_boundary(&self) -> bool {
        self.0 == BOUNDARY_SYMBOL
    }

    /// Returns true for the tokens the encoded tape reserves for itself.
    /// Blank and placeholder are excluded: source machines use them with their usual meaning.
    pub fn is_reserved(&self) -> bool {
        matches!(
            self.0.as_str(),
            BOUNDARY_SYMBOL | TAPE_END_SYMBOL | RETURN_SYMBOL
        )
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Builds a symbol vector from string literals.
pub fn symbols(values: &[&str]) -> Vec<Symbol> {
    values.iter().map(|value| Symbol::from(*value)).collect()
}

/// Represents a k-tape Turing machine description, as loaded from a file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Machine {
    /// The name of the machine.
    pub name: String,
    /// The state the machine starts in.
    pub initial_state: String,
    /// States in which the machine accepts.
    pub accept_states: Vec<String>,
    /// The transition table, in file order.
    pub transitions: Vec<Transition>,
}

/// How the compiler treats source states whose rules do not cover every symbol tuple.
///
/// - `Normal` (default): uncovered tuples halt the flattened machine, just like the source.
/// - `Strict`: uncovered tuples are reported as `MachineError::IncompleteDomain`.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Uncovered symbol tuples halt.
    #[default]
    Normal,
    /// Uncovered symbol tuples are errors.
    Strict,
}

impl Machine {
    /// Returns the number of tapes implied by the transitions, if there are any.
    pub fn tape_count(&self) -> Option<usize> {
        self.transitions.first().map(Transition::tape_count)
    }

    /// Returns the distinct states that have outgoing transitions, in first-seen order.
    pub fn domain_states(&self) -> Vec<&str> {
        let mut states: Vec<&str> = Vec::new();
        for transition in &self.transitions {
            if !states.contains(&transition.state.as_str()) {
                states.push(&transition.state);
            }
        }
        states
    }

    /// Returns every transition leaving `state`.
    pub fn transitions_from<'a>(&'a self, state: &'a str) -> impl Iterator<Item = &'a Transition> {
        self.transitions.iter().filter(move |t| t.state == state)
    }

    /// Returns true when the machine accepts in `state`.
    pub fn is_accepting(&self, state: &str) -> bool {
        self.accept_states.iter().any(|s| s == state)
    }
}

/// A single transition function of a k-tape machine:
/// `(state, read[k]) -> (next_state, write[k], directions[k])`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transition {
    /// The state this rule applies in.
    pub state: String,
    /// The symbols under each head.
    pub read: Vec<Symbol>,
    /// The state the machine moves to.
    pub next_state: String,
    /// The symbols written under each head.
    pub write: Vec<Symbol>,
    /// The head movements, one per tape.
    pub directions: Vec<Direction>,
}

impl Transition {
    pub fn new(
        state: impl Into<String>,
        read: Vec<Symbol>,
        next_state: impl Into<String>,
        write: Vec<Symbol>,
        directions: Vec<Direction>,
    ) -> Self {
        Self {
            state: state.into(),
            read,
            next_state: next_state.into(),
            write,
            directions,
        }
    }

    pub fn tape_count(&self) -> usize {
        self.read.len()
    }

    /// Returns true when both rules fire on the same state and symbols.
    pub fn same_domain(&self, other: &Transition) -> bool {
        self.state == other.state && self.read == other.read
    }
}

/// Represents the possible directions a Turing Machine head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Move the head one position to the right.
    Right,
    /// Keep the head in the same position.
    Stay,
}

impl Direction {
    /// Returns the token used for this direction in machine files.
    pub fn as_token(self) -> &'static str {
        match self {
            Direction::Left => "<",
            Direction::Right => ">",
            Direction::Stay => "-",
        }
    }

    /// Parses a direction token. Supports `<`/`L`, `>`/`R` and `-`/`S`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "<" | "L" => Some(Direction::Left),
            ">" | "R" => Some(Direction::Right),
            "-" | "S" => Some(Direction::Stay),
            _ => None,
        }
    }
}

/// A transition of the flattened single-tape machine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlatTransition {
    pub state: State,
    pub read: Symbol,
    pub next_state: State,
    pub write: Symbol,
    pub direction: Direction,
}

impl FlatTransition {
    pub fn new(
        state: State,
        read: Symbol,
        next_state: State,
        write: Symbol,
        direction: Direction,
    ) -> Self {
        Self {
            state,
            read,
            next_state,
            write,
            direction,
        }
    }

    /// Returns the `(state, symbol)` pair this transition fires on.
    pub fn domain(&self) -> (&State, &Symbol) {
        (&self.state, &self.read)
    }

    /// Renders the transition as a k = 1 source-style transition.
    pub fn render(&self) -> Transition {
        Transition {
            state: self.state.to_string(),
            read: vec![self.read.clone()],
            next_state: self.next_state.to_string(),
            write: vec![self.write.clone()],
            directions: vec![self.direction],
        }
    }
}

/// Represents the errors that can occur while loading, validating and flattening machines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MachineError {
    /// Indicates an error during the parsing of a machine description.
    #[error("Machine parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates a structurally malformed source machine.
    #[error("Machine validation error: {0}")]
    ValidationError(String),
    /// Indicates an error related to reading or writing machine files.
    #[error("File error: {0}")]
    FileError(String),
    /// Indicates an invalid flattening configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Two generated transitions fire on the same state and symbol but disagree.
    #[error("Determinism violation: state {state} has conflicting rules for symbol {symbol}")]
    DeterminismViolation { state: String, symbol: Symbol },
    /// A source state leaves a symbol tuple uncovered (strict mode only).
    #[error("State {state} has no rule for symbols {symbols:?}")]
    IncompleteDomain { state: String, symbols: Vec<Symbol> },
    /// A transition still writes over a virtual tape edge after extension safety ran.
    #[error("Unsupported tape extension: {0}")]
    UnsupportedExtension(String),
    /// Two distinct generated states render to the same name.
    #[error("State name collision: {0}")]
    NameCollision(String),
}
