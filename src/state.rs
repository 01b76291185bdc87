//! States of the flattened machine.
//!
//! A state is a structured key: the source state it belongs to, the virtual-head
//! markers discovered on the way to it, and the phase of the simulated step it
//! takes part in. Keys are compared structurally and rendered to a single name
//! only when the table is written out.

use std::fmt;

use crate::types::{Direction, Symbol, Transition};

/// The part of a simulated step a state belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Sweeping right to discover virtual heads.
    Discover,
    /// Sweeping left, looking for the marker of head `n` (1-based).
    Actor(usize),
    /// Head `n` has moved; the marker still has to be placed.
    Active(usize),
    /// Every head has been served; the step is about to close.
    Complete,
    /// Part of a tape-extension subroutine.
    Extend(Box<Extension>),
    /// Part of the blank-injection pre-pass.
    Inject(InjectStep),
}

/// A tape-extension subroutine state, private to the state that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Extension {
    pub owner: State,
    pub side: Side,
    pub step: ExtendStep,
}

/// Which edge of a virtual tape an extension handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExtendStep {
    /// Step back right onto the cell the head just left.
    Realign,
    /// Relay the carried symbol one cell to the right.
    Shift(Symbol),
    /// Walk back left to the return marker.
    Return,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InjectStep {
    Start,
    Scan,
    Return,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct State {
    base: String,
    heads: Vec<Symbol>,
    phase: Phase,
}

impl State {
    /// The discovery entry of a source state. It renders to the source name unchanged.
    pub fn source(name: impl Into<String>) -> Self {
        Self {
            base: name.into(),
            heads: Vec::new(),
            phase: Phase::Discover,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// The markers discovered so far, one per virtual head.
    pub fn heads(&self) -> &[Symbol] {
        &self.heads
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_source(&self) -> bool {
        self.phase == Phase::Discover && self.heads.is_empty()
    }

    pub fn is_extension(&self) -> bool {
        matches!(self.phase, Phase::Extend(_))
    }

    /// The discovery state reached after reading one more head marker.
    pub fn advance(&self, marker: Symbol) -> Self {
        let mut heads = self.heads.clone();
        heads.push(marker);

        Self {
            base: self.base.clone(),
            heads,
            phase: Phase::Discover,
        }
    }

    fn with_phase(&self, phase: Phase) -> Self {
        Self {
            base: self.base.clone(),
            heads: self.heads.clone(),
            phase,
        }
    }

    /// A state of the tape-extension subroutine owned by `self`.
    pub fn extension(&self, side: Side, step: ExtendStep) -> Self {
        self.with_phase(Phase::Extend(Box::new(Extension {
            owner: self.clone(),
            side,
            step,
        })))
    }

    /// A state of the blank-injection pre-pass in front of `self`.
    pub fn injection(&self, step: InjectStep) -> Self {
        self.with_phase(Phase::Inject(step))
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Phase::Extend(extension) = &self.phase {
            let side = match extension.side {
                Side::Left => 'l',
                Side::Right => 'r',
            };
            write!(f, "{}!{side}", extension.owner)?;
            return match &extension.step {
                ExtendStep::Realign => f.write_str("M"),
                ExtendStep::Shift(symbol) => write!(f, "S[{symbol}]"),
                ExtendStep::Return => f.write_str("R"),
            };
        }

        f.write_str(&self.base)?;
        for head in &self.heads {
            write!(f, "[{head}]")?;
        }

        match &self.phase {
            Phase::Discover | Phase::Extend(_) => Ok(()),
            Phase::Actor(n) => write!(f, ":{n}"),
            Phase::Active(n) => write!(f, ":{n}a"),
            Phase::Complete => f.write_str(":F"),
            Phase::Inject(InjectStep::Start) => f.write_str("!inj"),
            Phase::Inject(InjectStep::Scan) => f.write_str("!inj>"),
            Phase::Inject(InjectStep::Return) => f.write_str("!inj<"),
        }
    }
}

/// A discovery state that knows the symbol under every virtual head, together with the
/// one source transition those symbols select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminedState<'a> {
    state: State,
    transition: &'a Transition,
}

impl<'a> DeterminedState<'a> {
    pub fn new(state: State, transition: &'a Transition) -> Self {
        debug_assert_eq!(state.heads().len(), transition.tape_count());
        Self { state, transition }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn transition(&self) -> &'a Transition {
        self.transition
    }

    pub fn tape_count(&self) -> usize {
        self.transition.tape_count()
    }

    /// The marker discovered for head `tape` (1-based).
    pub fn subscript(&self, tape: usize) -> &Symbol {
        &self.state.heads()[tape - 1]
    }

    /// What the source transition writes on tape `tape` (1-based), and where it moves.
    pub fn action(&self, tape: usize) -> (&'a Symbol, Direction) {
        (
            &self.transition.write[tape - 1],
            self.transition.directions[tape - 1],
        )
    }

    /// Sweeps left looking for head `tape`.
    pub fn actor(&self, tape: usize) -> State {
        self.state.with_phase(Phase::Actor(tape))
    }

    /// Places the marker of head `tape` after it moved.
    pub fn active(&self, tape: usize) -> State {
        self.state.with_phase(Phase::Active(tape))
    }

    pub fn complete(&self) -> State {
        self.state.with_phase(Phase::Complete)
    }

    /// The state that takes over once head `tape` has been served.
    pub fn after(&self, tape: usize) -> State {
        if tape > 1 {
            self.actor(tape - 1)
        } else {
            self.complete()
        }
    }

    /// The discovery entry of the state the source transition leads to.
    pub fn next_source(&self) -> State {
        State::source(self.transition.next_state.clone())
    }
}
