//! Phase 1: the rightward discovery sweep.
//!
//! Starting from a source state, the flattened machine walks right across the
//! encoded tape and records the symbol under each virtual head in its state. After
//! k heads the state is determined: it matches exactly one source transition.

use std::collections::BTreeSet;

use crate::alphabet::Alphabet;
use crate::state::{DeterminedState, State};
use crate::types::{Direction, FlatTransition, Symbol, Transition};

/// Everything the discovery sweep produced for one source state.
#[derive(Debug)]
pub struct Discovery<'a> {
    pub transitions: Vec<FlatTransition>,
    pub determined: Vec<DeterminedState<'a>>,
}

/// Builds the discovery states and transitions of source state `state`.
///
/// `outgoing` must hold the source transitions leaving `state`, all with `tapes` heads.
pub fn sweep<'a>(
    state: &str,
    outgoing: &[&'a Transition],
    alphabet: &Alphabet,
    tapes: usize,
) -> Discovery<'a> {
    let mut transitions = Vec::new();

    for level in 0..tapes {
        for undetermined in undetermined_states(state, outgoing, alphabet, level) {
            transitions.extend(scan(&undetermined, alphabet));
            transitions.extend(advance(&undetermined, outgoing, alphabet));
        }
    }

    let determined = determined_states(state, outgoing, alphabet);
    for determined_state in &determined {
        transitions.extend(begin_execution(determined_state, alphabet));
    }

    Discovery {
        transitions,
        determined,
    }
}

/// The marker a source read symbol is discovered as.
fn discovered_marker(symbol: &Symbol, alphabet: &Alphabet) -> Symbol {
    alphabet.marker(symbol)
}

/// The undetermined states after `level` heads, one per distinct prefix of read symbols.
fn undetermined_states(
    state: &str,
    outgoing: &[&Transition],
    alphabet: &Alphabet,
    level: usize,
) -> BTreeSet<State> {
    outgoing
        .iter()
        .map(|transition| {
            transition.read[..level]
                .iter()
                .fold(State::source(state), |acc, symbol| {
                    acc.advance(discovered_marker(symbol, alphabet))
                })
        })
        .collect()
}

/// Source transitions whose first reads agree with the heads `state` has discovered.
fn matching<'a, 'b>(
    state: &'b State,
    outgoing: &'b [&'a Transition],
    alphabet: &'b Alphabet,
) -> impl Iterator<Item = &'a Transition> + 'b {
    outgoing.iter().copied().filter(move |transition| {
        transition
            .read
            .iter()
            .zip(state.heads())
            .all(|(symbol, head)| discovered_marker(symbol, alphabet) == *head)
    })
}

/// Keeps moving right over every cell without a head on it.
fn scan(state: &State, alphabet: &Alphabet) -> Vec<FlatTransition> {
    alphabet
        .unmarked()
        .iter()
        .map(|symbol| {
            FlatTransition::new(
                state.clone(),
                symbol.clone(),
                state.clone(),
                symbol.clone(),
                Direction::Right,
            )
        })
        .collect()
}

/// Records the symbol under the next head. A head resting on a boundary reads as blank.
fn advance(state: &State, outgoing: &[&Transition], alphabet: &Alphabet) -> Vec<FlatTransition> {
    let level = state.heads().len();
    let candidates: BTreeSet<&Symbol> = matching(state, outgoing, alphabet)
        .map(|transition| &transition.read[level])
        .collect();

    let mut transitions = Vec::new();
    for symbol in candidates {
        let marker = discovered_marker(symbol, alphabet);
        let next = state.advance(marker.clone());

        if symbol.is_blank() {
            transitions.push(FlatTransition::new(
                state.clone(),
                alphabet.boundary_marker(),
                next.clone(),
                alphabet.boundary_marker(),
                Direction::Right,
            ));
        }

        transitions.push(FlatTransition::new(
            state.clone(),
            marker.clone(),
            next,
            marker,
            Direction::Right,
        ));
    }

    transitions
}

fn determined_states<'a>(
    state: &str,
    outgoing: &[&'a Transition],
    alphabet: &Alphabet,
) -> Vec<DeterminedState<'a>> {
    outgoing
        .iter()
        .map(|transition| {
            let determined = transition
                .read
                .iter()
                .fold(State::source(state), |acc, symbol| {
                    acc.advance(discovered_marker(symbol, alphabet))
                });
            DeterminedState::new(determined, transition)
        })
        .collect()
}

/// Hands a determined state over to the leftward sweep of its last head.
/// On the tape-end marker the head steps back first, since there is nothing to its right.
fn begin_execution(determined: &DeterminedState, alphabet: &Alphabet) -> Vec<FlatTransition> {
    let state = determined.state();
    let actor = determined.actor(determined.tape_count());

    let mut transitions: Vec<_> = alphabet
        .unmarked()
        .iter()
        .map(|symbol| {
            FlatTransition::new(
                state.clone(),
                symbol.clone(),
                actor.clone(),
                symbol.clone(),
                Direction::Stay,
            )
        })
        .collect();

    transitions.push(FlatTransition::new(
        state.clone(),
        Symbol::tape_end(),
        actor,
        Symbol::tape_end(),
        Direction::Left,
    ));

    transitions
}
