//! Phase 2: the leftward execution sweep.
//!
//! A determined state knows which source transition to apply. The flattened
//! machine sweeps left from the last virtual head to the first, applying each
//! head's write and move, and finally re-enters discovery in the source
//! transition's next state.

use crate::alphabet::Alphabet;
use crate::state::{DeterminedState, State};
use crate::types::{Direction, FlatTransition, Symbol};

/// Builds every execution transition of one determined state.
pub fn sweep(determined: &DeterminedState, alphabet: &Alphabet) -> Vec<FlatTransition> {
    let mut transitions = Vec::new();

    for tape in (1..=determined.tape_count()).rev() {
        transitions.extend(retreat(determined, tape, alphabet));
        transitions.extend(resolve(determined, tape, alphabet));
        transitions.extend(move_head(determined, tape, alphabet));
    }

    transitions.extend(cycle_back(determined, alphabet));
    transitions
}

/// Walks left over every cell without a head until head `tape` shows up.
fn retreat(determined: &DeterminedState, tape: usize, alphabet: &Alphabet) -> Vec<FlatTransition> {
    let actor = determined.actor(tape);

    alphabet
        .unmarked()
        .iter()
        .map(|symbol| {
            FlatTransition::new(
                actor.clone(),
                symbol.clone(),
                actor.clone(),
                symbol.clone(),
                Direction::Left,
            )
        })
        .collect()
}

/// Applies the write of head `tape` on its marker.
///
/// A head that stays keeps its marker and the sweep moves on. A head that moves
/// leaves a plain symbol behind and hands over to the active state, which marks the
/// new position. A blank head may also rest on the boundary closing its tape; that
/// branch keeps the boundary unless a real cell has to appear there, which Phase 3
/// takes care of.
fn resolve(determined: &DeterminedState, tape: usize, alphabet: &Alphabet) -> Vec<FlatTransition> {
    let actor = determined.actor(tape);
    let subscript = determined.subscript(tape).clone();
    let (write, direction) = determined.action(tape);

    let mut transitions = vec![resolve_on(
        determined,
        tape,
        &actor,
        subscript.clone(),
        write.clone(),
        alphabet.marker(write),
    )];

    if subscript == alphabet.blank_marker() {
        let (plain, marked) = if write.is_blank() {
            let plain = match direction {
                Direction::Right => Symbol::blank(),
                _ => Symbol::boundary(),
            };
            (plain, alphabet.boundary_marker())
        } else {
            (write.clone(), alphabet.marker(write))
        };

        transitions.push(resolve_on(
            determined,
            tape,
            &actor,
            alphabet.boundary_marker(),
            plain,
            marked,
        ));
    }

    transitions
}

/// One resolve rule: `plain` is written when the head moves, `marked` when it stays.
fn resolve_on(
    determined: &DeterminedState,
    tape: usize,
    actor: &State,
    read: Symbol,
    plain: Symbol,
    marked: Symbol,
) -> FlatTransition {
    let (_, direction) = determined.action(tape);

    match direction {
        Direction::Stay => FlatTransition::new(
            actor.clone(),
            read,
            determined.after(tape),
            marked,
            Direction::Left,
        ),
        _ => FlatTransition::new(
            actor.clone(),
            read,
            determined.active(tape),
            plain,
            direction,
        ),
    }
}

/// Marks the cell head `tape` moved onto and steps left to continue the sweep.
///
/// A head moving left onto a plain boundary has walked off its tape; no rule is
/// emitted for that here.
fn move_head(
    determined: &DeterminedState,
    tape: usize,
    alphabet: &Alphabet,
) -> Vec<FlatTransition> {
    let (_, direction) = determined.action(tape);
    if direction == Direction::Stay {
        return Vec::new();
    }

    let active = determined.active(tape);
    let next = determined.after(tape);
    let step = if tape > 1 {
        Direction::Left
    } else {
        Direction::Stay
    };

    alphabet
        .unmarked()
        .iter()
        .filter(|symbol| !(symbol.is_boundary() && direction == Direction::Left))
        .map(|symbol| {
            FlatTransition::new(
                active.clone(),
                symbol.clone(),
                next.clone(),
                alphabet.marker(symbol),
                step,
            )
        })
        .collect()
}

/// Closes the simulated step by entering discovery of the next source state.
fn cycle_back(determined: &DeterminedState, alphabet: &Alphabet) -> Vec<FlatTransition> {
    let complete = determined.complete();
    let next = determined.next_source();

    alphabet
        .library()
        .iter()
        .map(|symbol| {
            FlatTransition::new(
                complete.clone(),
                symbol.clone(),
                next.clone(),
                symbol.clone(),
                Direction::Stay,
            )
        })
        .collect()
}
