//! Final assembly of the flattened transition table.

use std::collections::HashMap;

use crate::state::State;
use crate::types::{FlatTransition, MachineError, Symbol};

/// Removes duplicate transitions, keeping the first occurrence of each, and rejects
/// two different transitions firing on the same state and symbol.
///
/// Assembling an already assembled table returns it unchanged.
pub fn assemble(transitions: Vec<FlatTransition>) -> Result<Vec<FlatTransition>, MachineError> {
    let mut seen: HashMap<(State, Symbol), usize> = HashMap::with_capacity(transitions.len());
    let mut table: Vec<FlatTransition> = Vec::with_capacity(transitions.len());

    for transition in transitions {
        let domain = (transition.state.clone(), transition.read.clone());

        match seen.get(&domain) {
            Some(&index) if table[index] == transition => continue,
            Some(_) => {
                return Err(MachineError::DeterminismViolation {
                    state: transition.state.to_string(),
                    symbol: transition.read,
                });
            }
            None => {
                seen.insert(domain, table.len());
                table.push(transition);
            }
        }
    }

    Ok(table)
}
