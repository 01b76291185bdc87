//! This module provides functions for analyzing source machines before they are flattened.
//! Structural problems (inconsistent arity, malformed names and symbols, a start state without
//! rules, conflicting rules) are fatal; reachability findings are only reported as lints.

use crate::types::{Machine, MachineError, Symbol};
use std::collections::{HashMap, HashSet};

/// Characters a state name may not contain. Whitespace is rejected as well.
pub const RESERVED_NAME_CHARS: [char; 1] = [','];

/// Represents the problems that can be found during the analysis of a source machine.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisError {
    /// Indicates structural problems (no rules, inconsistent tape counts).
    StructuralError(String),
    /// Indicates a state name that is empty or contains a separator.
    InvalidStateName(String),
    /// Indicates a symbol that is empty or contains a separator.
    InvalidSymbol(String),
    /// Indicates that the initial state has no outgoing rules.
    InvalidStartState(String),
    /// Indicates two rules with the same state and read symbols but different effects.
    ConflictingRules { state: String, read: Vec<Symbol> },
    /// Indicates states with rules that cannot be reached from the initial state.
    UnreachableStates(Vec<String>),
    /// Indicates accept states that no rule ever leads to.
    UnreachedAcceptStates(Vec<String>),
}

impl From<AnalysisError> for MachineError {
    /// Converts an `AnalysisError` into a `MachineError::ValidationError`.
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::StructuralError(msg) => MachineError::ValidationError(msg),
            AnalysisError::InvalidStateName(name) => {
                MachineError::ValidationError(format!("Invalid state name: '{}'", name))
            }
            AnalysisError::InvalidSymbol(symbol) => {
                MachineError::ValidationError(format!("Invalid symbol: '{}'", symbol))
            }
            AnalysisError::InvalidStartState(state) => {
                MachineError::ValidationError(format!("Invalid start state: {}", state))
            }
            AnalysisError::ConflictingRules { state, read } => MachineError::ValidationError(
                format!("Conflicting rules in state {} for symbols {:?}", state, read),
            ),
            AnalysisError::UnreachableStates(states) => MachineError::ValidationError(format!(
                "Unreachable states detected: {:?}",
                states
            )),
            AnalysisError::UnreachedAcceptStates(states) => MachineError::ValidationError(
                format!("Accept states never reached: {:?}", states),
            ),
        }
    }
}

/// Analyzes a source `Machine` for structural errors.
///
/// Returns the first error found, converted into `MachineError::ValidationError`.
pub fn analyze(machine: &Machine) -> Result<(), MachineError> {
    let errors = [
        check_structure,
        check_state_names,
        check_symbols,
        check_valid_start_state,
        check_determinism,
    ]
    .iter()
    .filter_map(|f| f(machine).err())
    .collect::<Vec<_>>();

    if let Some(first_error) = errors.first() {
        return Err(first_error.clone().into());
    }

    Ok(())
}

/// Runs the advisory checks. Findings do not stop flattening; they are logged as warnings.
pub fn lint(machine: &Machine) -> Vec<AnalysisError> {
    let findings: Vec<_> = [check_unreachable_states, check_accept_states]
        .iter()
        .filter_map(|f| f(machine).err())
        .collect();

    for finding in &findings {
        tracing::warn!(machine = %machine.name, "{}", MachineError::from(finding.clone()));
    }

    findings
}

/// Checks that there are rules and that every rule uses the same number of tapes.
fn check_structure(machine: &Machine) -> Result<(), AnalysisError> {
    let Some(tapes) = machine.tape_count() else {
        return Err(AnalysisError::StructuralError(
            "No transitions defined".to_string(),
        ));
    };

    if tapes == 0 {
        return Err(AnalysisError::StructuralError(
            "Transitions must read at least one tape".to_string(),
        ));
    }

    for transition in &machine.transitions {
        if transition.read.len() != tapes
            || transition.write.len() != tapes
            || transition.directions.len() != tapes
        {
            return Err(AnalysisError::StructuralError(format!(
                "Transition in state '{}' has inconsistent tape counts (expected {})",
                transition.state, tapes
            )));
        }
    }

    Ok(())
}

fn check_state_names(machine: &Machine) -> Result<(), AnalysisError> {
    let names = std::iter::once(&machine.initial_state)
        .chain(&machine.accept_states)
        .chain(
            machine
                .transitions
                .iter()
                .flat_map(|t| [&t.state, &t.next_state]),
        );

    for name in names {
        if name.is_empty() || name.contains(RESERVED_NAME_CHARS) || name.contains(char::is_whitespace)
        {
            return Err(AnalysisError::InvalidStateName(name.clone()));
        }
    }

    Ok(())
}

fn check_symbols(machine: &Machine) -> Result<(), AnalysisError> {
    let symbols = machine
        .transitions
        .iter()
        .flat_map(|t| t.read.iter().chain(&t.write));

    for symbol in symbols {
        let text = symbol.as_str();
        if text.is_empty() || text.contains(',') || text.contains(char::is_whitespace) {
            return Err(AnalysisError::InvalidSymbol(text.to_string()));
        }
    }

    Ok(())
}

/// Checks whether the initial state has outgoing rules.
fn check_valid_start_state(machine: &Machine) -> Result<(), AnalysisError> {
    if machine.transitions_from(&machine.initial_state).next().is_none() {
        return Err(AnalysisError::InvalidStartState(
            machine.initial_state.clone(),
        ));
    }

    Ok(())
}

/// Checks that no two rules share a state and read symbols unless they are identical.
fn check_determinism(machine: &Machine) -> Result<(), AnalysisError> {
    let mut seen = HashMap::new();

    for transition in &machine.transitions {
        let domain = (&transition.state, &transition.read);
        match seen.get(&domain) {
            Some(&previous) if previous != transition => {
                return Err(AnalysisError::ConflictingRules {
                    state: transition.state.clone(),
                    read: transition.read.clone(),
                });
            }
            Some(_) => {}
            None => {
                seen.insert(domain, transition);
            }
        }
    }

    Ok(())
}

fn reachable_states(machine: &Machine) -> HashSet<&str> {
    let mut visited = HashSet::new();
    let mut queue = vec![machine.initial_state.as_str()];

    while let Some(state) = queue.pop() {
        if !visited.insert(state) {
            continue;
        }

        for transition in machine.transitions_from(state) {
            if !visited.contains(transition.next_state.as_str()) {
                queue.push(&transition.next_state);
            }
        }
    }

    visited
}

/// Checks for states with rules that no path from the initial state leads to.
fn check_unreachable_states(machine: &Machine) -> Result<(), AnalysisError> {
    let visited = reachable_states(machine);

    let mut unreachable: Vec<String> = machine
        .domain_states()
        .into_iter()
        .filter(|state| !visited.contains(state))
        .map(str::to_string)
        .collect();

    if !unreachable.is_empty() {
        unreachable.sort();
        return Err(AnalysisError::UnreachableStates(unreachable));
    }

    Ok(())
}

/// Checks for accept states that the machine can never enter.
fn check_accept_states(machine: &Machine) -> Result<(), AnalysisError> {
    let visited = reachable_states(machine);

    let mut unreached: Vec<String> = machine
        .accept_states
        .iter()
        .filter(|state| !visited.contains(state.as_str()))
        .cloned()
        .collect();

    if !unreached.is_empty() {
        unreached.sort();
        unreached.dedup();
        return Err(AnalysisError::UnreachedAcceptStates(unreached));
    }

    Ok(())
}
