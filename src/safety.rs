//! Phase 3: tape-extension safety.
//!
//! Virtual tapes only hold the cells they have materialized. When a simulated
//! head must write a real symbol where its tape currently ends, or walks off the
//! left end of its tape, everything to the right is shifted one cell over to make
//! room first. Both cases share one shift-right subroutine, private to the state
//! that needs it.

use std::collections::BTreeSet;

use crate::alphabet::Alphabet;
use crate::config::SafetyConfig;
use crate::state::{ExtendStep, Phase, Side, State};
use crate::types::{Direction, FlatTransition, MachineError, Symbol};

/// Where the machine continues once a shift has made room.
struct Resume {
    state: State,
    write: Symbol,
    direction: Direction,
}

/// Adds the extension subroutines to an assembled transition set.
///
/// Transitions that would overwrite a tape edge are replaced by a branch into the
/// subroutine; states that walk off the left end of a tape get a new boundary rule.
/// Subroutine states are never scanned themselves.
pub fn extend(
    transitions: Vec<FlatTransition>,
    alphabet: &Alphabet,
    safety: &SafetyConfig,
) -> Result<Vec<FlatTransition>, MachineError> {
    let left = if safety.left {
        left_safety(&transitions, alphabet)
    } else {
        Vec::new()
    };

    let (offending, mut kept): (Vec<_>, Vec<_>) = if safety.right {
        transitions
            .into_iter()
            .partition(|t| writes_over_edge(t, alphabet))
    } else {
        (Vec::new(), transitions)
    };

    tracing::debug!(
        right = offending.len(),
        left = left.len(),
        "adding tape-extension subroutines"
    );

    kept.extend(left);
    for transition in &offending {
        kept.extend(right_safety(transition, alphabet));
    }

    if safety.right {
        check_edges(&kept, alphabet)?;
    }

    Ok(kept)
}

/// A transition reading a head that rests on a boundary and writing something other
/// than the boundary back. Anchoring a shift with the return marker is not an edge write.
fn writes_over_edge(transition: &FlatTransition, alphabet: &Alphabet) -> bool {
    let boundary_marker = alphabet.boundary_marker();

    !transition.state.is_extension()
        && transition.read == boundary_marker
        && !transition.write.is_boundary()
        && transition.write != boundary_marker
        && transition.write != Symbol::return_marker()
}

/// Rejects any edge write left behind. Every such write must go through a shift.
fn check_edges(transitions: &[FlatTransition], alphabet: &Alphabet) -> Result<(), MachineError> {
    match transitions.iter().find(|t| writes_over_edge(t, alphabet)) {
        Some(t) => Err(MachineError::UnsupportedExtension(format!(
            "state {} still writes {} over a tape boundary",
            t.state, t.write
        ))),
        None => Ok(()),
    }
}

/// Replaces an edge write with: anchor, shift everything right, come back, then
/// re-run the owner on a fresh blank cell.
fn right_safety(transition: &FlatTransition, alphabet: &Alphabet) -> Vec<FlatTransition> {
    let owner = &transition.state;
    let mut transitions = vec![FlatTransition::new(
        owner.clone(),
        transition.read.clone(),
        owner.extension(Side::Right, ExtendStep::Shift(Symbol::boundary())),
        Symbol::return_marker(),
        Direction::Right,
    )];

    transitions.extend(shift_right(
        owner,
        Side::Right,
        alphabet,
        Resume {
            state: owner.clone(),
            write: alphabet.blank_marker(),
            direction: Direction::Stay,
        },
    ));

    transitions
}

/// Finds the head-placing states that are entered by a left move and have no rule for a
/// boundary, and gives them one: step back right and shift, leaving a blank cell where
/// the head walked off.
fn left_safety(transitions: &[FlatTransition], alphabet: &Alphabet) -> Vec<FlatTransition> {
    let boundary_marker = alphabet.boundary_marker();

    let entered_leftwards: BTreeSet<&State> = transitions
        .iter()
        .filter(|t| t.direction == Direction::Left)
        .map(|t| &t.next_state)
        .filter(|state| matches!(state.phase(), Phase::Active(_)))
        .collect();

    let mut added = Vec::new();
    for state in entered_leftwards {
        let own: Vec<_> = transitions.iter().filter(|t| &t.state == state).collect();

        let guarded = own
            .iter()
            .any(|t| t.read.is_boundary() || t.read == boundary_marker);
        let Some(continuation) = own.first() else {
            continue;
        };
        if guarded {
            continue;
        }

        let realign = state.extension(Side::Left, ExtendStep::Realign);
        for edge in [Symbol::boundary(), boundary_marker.clone()] {
            added.push(FlatTransition::new(
                state.clone(),
                edge.clone(),
                realign.clone(),
                edge,
                Direction::Right,
            ));
        }

        for symbol in alphabet.unmarked() {
            added.push(FlatTransition::new(
                realign.clone(),
                symbol.clone(),
                state.extension(Side::Left, ExtendStep::Shift(symbol.clone())),
                Symbol::return_marker(),
                Direction::Right,
            ));
        }

        added.extend(shift_right(
            state,
            Side::Left,
            alphabet,
            Resume {
                state: continuation.next_state.clone(),
                write: alphabet.blank_marker(),
                direction: continuation.direction,
            },
        ));
    }

    added
}

/// The shared subroutine: relay every symbol one cell right up to the tape end, move the
/// tape end, walk back to the return marker and resume.
fn shift_right(
    owner: &State,
    side: Side,
    alphabet: &Alphabet,
    resume: Resume,
) -> Vec<FlatTransition> {
    let shift = |symbol: &Symbol| owner.extension(side, ExtendStep::Shift(symbol.clone()));
    let back = owner.extension(side, ExtendStep::Return);
    let library = alphabet.library();
    let tape_end = Symbol::tape_end();

    let mut transitions = Vec::new();

    for carried in library {
        for found in library {
            transitions.push(FlatTransition::new(
                shift(carried),
                found.clone(),
                shift(found),
                carried.clone(),
                Direction::Right,
            ));
        }
    }

    // Only a boundary can sit in front of the tape end.
    for carried in [Symbol::boundary(), alphabet.boundary_marker()] {
        transitions.push(FlatTransition::new(
            shift(&carried),
            tape_end.clone(),
            shift(&tape_end),
            carried,
            Direction::Right,
        ));
    }

    transitions.push(FlatTransition::new(
        shift(&tape_end),
        Symbol::blank(),
        back.clone(),
        tape_end,
        Direction::Left,
    ));

    for symbol in library {
        transitions.push(FlatTransition::new(
            back.clone(),
            symbol.clone(),
            back.clone(),
            symbol.clone(),
            Direction::Left,
        ));
    }

    transitions.push(FlatTransition::new(
        back,
        Symbol::return_marker(),
        resume.state,
        resume.write,
        resume.direction,
    ));

    transitions
}
