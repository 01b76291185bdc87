//! The compiler driver: turns a k-tape machine into a single-tape machine.
//!
//! `Flattener::new` validates the source machine and derives everything a run needs
//! (tape count, alphabet, symbol rewrites). `Flattener::flatten` expands every source
//! state through discovery and execution, adds the tape-extension subroutines and
//! assembles the final table.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::alphabet::{rewrite, Alphabet};
use crate::analyzer::{analyze, lint};
use crate::assembly::assemble;
use crate::config::FlattenConfig;
use crate::injection::inject;
use crate::state::{Phase, State};
use crate::types::{FlatTransition, Machine, MachineError, Mode, Symbol, Transition};
use crate::{discovery, execution, safety};

/// Flattens `machine` with `config`. Shorthand for `Flattener::new(..)?.flatten()`.
pub fn flatten(machine: &Machine, config: &FlattenConfig) -> Result<FlattenedMachine, MachineError> {
    Flattener::new(machine, config)?.flatten()
}

#[derive(Debug, Clone)]
pub struct Flattener {
    machine: Machine,
    config: FlattenConfig,
    alphabet: Alphabet,
    tapes: usize,
    rewrites: Vec<(Symbol, Symbol)>,
}

impl Flattener {
    pub fn new(machine: &Machine, config: &FlattenConfig) -> Result<Self, MachineError> {
        config.validate()?;
        analyze(machine)?;
        lint(machine);

        let tapes = machine
            .tape_count()
            .ok_or_else(|| MachineError::ValidationError("No transitions defined".into()))?;

        let mut machine = machine.clone();
        let rewrites = rewrite_symbols(&mut machine, config.iteration);
        let alphabet = Alphabet::from_machine(&machine, config.iteration);

        if let Some(placeholder) = &config.placeholder {
            if alphabet.symbols().contains(placeholder) || rewrite(placeholder, config.iteration).is_some() {
                return Err(MachineError::ConfigError(format!(
                    "placeholder '{placeholder}' clashes with the tape alphabet of {}",
                    machine.name
                )));
            }
        }

        if config.mode == Mode::Strict {
            check_complete_domains(&machine, &alphabet, tapes)?;
        }

        Ok(Self {
            machine,
            config: config.clone(),
            alphabet,
            tapes,
            rewrites,
        })
    }

    pub fn tape_count(&self) -> usize {
        self.tapes
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// The source machine as flattened, with rewritten symbols.
    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    /// Maps an input symbol the way source symbols were rewritten, so input tapes match.
    pub fn rewrite_symbol(&self, symbol: &Symbol) -> Symbol {
        rewrite(symbol, self.config.iteration).unwrap_or_else(|| symbol.clone())
    }

    pub fn flatten(&self) -> Result<FlattenedMachine, MachineError> {
        let start = State::source(self.machine.initial_state.clone());
        let mut transitions = Vec::new();

        let initial_state = match &self.config.placeholder {
            Some(placeholder) => {
                let (entry, pre_pass) = inject(&self.alphabet, &start, placeholder);
                transitions.extend(pre_pass);
                entry
            }
            None => start,
        };

        for state in self.machine.domain_states() {
            let outgoing: Vec<&Transition> = self.machine.transitions_from(state).collect();
            let discovery = discovery::sweep(state, &outgoing, &self.alphabet, self.tapes);

            tracing::debug!(
                state,
                rules = outgoing.len(),
                discovery = discovery.transitions.len(),
                "expanding source state"
            );

            transitions.extend(discovery.transitions);
            for determined in &discovery.determined {
                transitions.extend(execution::sweep(determined, &self.alphabet));
            }
        }

        let transitions = safety::extend(transitions, &self.alphabet, &self.config.safety)?;
        let transitions = assemble(transitions)?;
        let accept_states = self.accept_states(&transitions);

        tracing::info!(
            machine = %self.machine.name,
            tapes = self.tapes,
            symbols = self.alphabet.symbols().len(),
            transitions = transitions.len(),
            "flattened machine"
        );

        Ok(FlattenedMachine {
            name: self.machine.name.clone(),
            initial_state,
            accept_states,
            transitions,
            rewrites: self.rewrites.clone(),
        })
    }

    /// A source machine stops in an accepting state when no rule matches. The flattened
    /// machine stops during discovery of that state, so every undetermined discovery state
    /// of an accepting source state accepts too.
    fn accept_states(&self, transitions: &[FlatTransition]) -> Vec<State> {
        let mut accept: BTreeSet<State> = self
            .machine
            .accept_states
            .iter()
            .map(|name| State::source(name.clone()))
            .collect();

        for transition in transitions {
            for state in [&transition.state, &transition.next_state] {
                let undetermined =
                    *state.phase() == Phase::Discover && state.heads().len() < self.tapes;
                if undetermined && self.machine.is_accepting(state.base()) {
                    accept.insert(state.clone());
                }
            }
        }

        accept.into_iter().collect()
    }
}

/// Rewrites every source symbol that clashes with a reserved token or a head marker.
/// Returns the distinct rewrites applied, ordered by the original symbol.
fn rewrite_symbols(machine: &mut Machine, iteration: u32) -> Vec<(Symbol, Symbol)> {
    let mut rewrites = BTreeMap::new();

    for transition in &mut machine.transitions {
        for symbol in transition.read.iter_mut().chain(transition.write.iter_mut()) {
            if let Some(rewritten) = rewrite(symbol, iteration) {
                rewrites.insert(symbol.clone(), rewritten.clone());
                *symbol = rewritten;
            }
        }
    }

    for (from, to) in &rewrites {
        tracing::warn!(machine = %machine.name, "rewriting symbol {from} to {to}");
    }

    rewrites.into_iter().collect()
}

/// Rejects a source state whose rules leave some tuple of tape symbols uncovered.
fn check_complete_domains(
    machine: &Machine,
    alphabet: &Alphabet,
    tapes: usize,
) -> Result<(), MachineError> {
    let symbols = alphabet.symbols();

    for state in machine.domain_states() {
        let covered: BTreeSet<&[Symbol]> = machine
            .transitions_from(state)
            .map(|t| t.read.as_slice())
            .collect();

        let complete = u32::try_from(tapes)
            .ok()
            .and_then(|k| symbols.len().checked_pow(k))
            .is_some_and(|total| covered.len() >= total);
        if complete {
            continue;
        }

        if let Some(missing) = first_uncovered(symbols, tapes, &covered) {
            return Err(MachineError::IncompleteDomain {
                state: state.to_string(),
                symbols: missing,
            });
        }
    }

    Ok(())
}

/// Walks the symbol tuples in order and returns the first one no rule reads.
fn first_uncovered(
    symbols: &[Symbol],
    tapes: usize,
    covered: &BTreeSet<&[Symbol]>,
) -> Option<Vec<Symbol>> {
    let mut digits = vec![0usize; tapes];

    loop {
        let tuple: Vec<Symbol> = digits.iter().map(|&d| symbols[d].clone()).collect();
        if !covered.contains(tuple.as_slice()) {
            return Some(tuple);
        }

        let position = digits.iter().rposition(|&d| d + 1 < symbols.len())?;
        digits[position] += 1;
        for digit in &mut digits[position + 1..] {
            *digit = 0;
        }
    }
}

/// The result of flattening: a single-tape machine over structured states.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedMachine {
    pub name: String,
    pub initial_state: State,
    pub accept_states: Vec<State>,
    pub transitions: Vec<FlatTransition>,
    /// Source symbols that were renamed before flattening, with their new names.
    pub rewrites: Vec<(Symbol, Symbol)>,
}

impl FlattenedMachine {
    /// Every state that occurs in the table.
    pub fn states(&self) -> BTreeSet<&State> {
        self.transitions
            .iter()
            .flat_map(|t| [&t.state, &t.next_state])
            .chain(std::iter::once(&self.initial_state))
            .collect()
    }

    /// Renders the table into a single-tape `Machine` with plain state names.
    pub fn to_machine(&self) -> Result<Machine, MachineError> {
        let mut names: HashMap<String, &State> = HashMap::new();
        for state in self.states().into_iter().chain(&self.accept_states) {
            let name = state.to_string();
            match names.get(&name) {
                Some(&other) if other != state => {
                    return Err(MachineError::NameCollision(format!(
                        "two different states render as {name}"
                    )));
                }
                Some(_) => {}
                None => {
                    names.insert(name, state);
                }
            }
        }

        Ok(Machine {
            name: self.name.clone(),
            initial_state: self.initial_state.to_string(),
            accept_states: self.accept_states.iter().map(State::to_string).collect(),
            transitions: self.transitions.iter().map(FlatTransition::render).collect(),
        })
    }
}
