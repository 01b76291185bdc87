//! Blank injection: a pre-pass that lets input tapes spell blanks with a placeholder.
//!
//! The pre-pass anchors cell 0, walks right to the tape end replacing the placeholder
//! (and its marker) with the blank (and its marker), walks back to the anchor, restores
//! the boundary and enters the source start state.

use crate::alphabet::Alphabet;
use crate::state::{InjectStep, State};
use crate::types::{Direction, FlatTransition, Symbol};

/// Builds the pre-pass in front of `start`. The flattened machine starts in the
/// returned state.
pub fn inject(
    alphabet: &Alphabet,
    start: &State,
    placeholder: &Symbol,
) -> (State, Vec<FlatTransition>) {
    let entry = start.injection(InjectStep::Start);
    let scan = start.injection(InjectStep::Scan);
    let back = start.injection(InjectStep::Return);

    let mut transitions = vec![FlatTransition::new(
        entry.clone(),
        Symbol::boundary(),
        scan.clone(),
        Symbol::return_marker(),
        Direction::Right,
    )];

    let replacements = [
        (placeholder.clone(), Symbol::blank()),
        (alphabet.marker(placeholder), alphabet.blank_marker()),
    ];
    for (found, blank) in replacements {
        transitions.push(FlatTransition::new(
            scan.clone(),
            found,
            scan.clone(),
            blank,
            Direction::Right,
        ));
    }

    for symbol in alphabet.library() {
        transitions.push(FlatTransition::new(
            scan.clone(),
            symbol.clone(),
            scan.clone(),
            symbol.clone(),
            Direction::Right,
        ));
    }

    transitions.push(FlatTransition::new(
        scan,
        Symbol::tape_end(),
        back.clone(),
        Symbol::tape_end(),
        Direction::Left,
    ));

    for symbol in alphabet.library() {
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
        start.clone(),
        Symbol::boundary(),
        Direction::Stay,
    ));

    (entry, transitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::symbols;

    fn find<'t>(
        transitions: &'t [FlatTransition],
        state: &str,
        read: &str,
    ) -> Option<&'t FlatTransition> {
        transitions
            .iter()
            .find(|t| t.state.to_string() == state && t.read.as_str() == read)
    }

    #[test]
    fn test_injection_replaces_placeholder() {
        let alphabet = Alphabet::new(symbols(&["_", "a"]), 1);
        let (entry, transitions) = inject(&alphabet, &State::source("q0"), &Symbol::placeholder());

        assert_eq!(entry.to_string(), "q0!inj");

        let anchor = find(&transitions, "q0!inj", "#").unwrap();
        assert_eq!(anchor.write, Symbol::return_marker());

        let plain = find(&transitions, "q0!inj>", "~").unwrap();
        assert_eq!(plain.write.as_str(), "_");
        let marked = find(&transitions, "q0!inj>", "~.1").unwrap();
        assert_eq!(marked.write.as_str(), "_.1");

        let kept = find(&transitions, "q0!inj>", "a.1").unwrap();
        assert_eq!(kept.write.as_str(), "a.1");
    }

    #[test]
    fn test_injection_returns_to_start() {
        let alphabet = Alphabet::new(symbols(&["_", "a"]), 1);
        let (_, transitions) = inject(&alphabet, &State::source("q0"), &Symbol::placeholder());

        let turn = find(&transitions, "q0!inj>", "$").unwrap();
        assert_eq!(turn.direction, Direction::Left);

        let resume = find(&transitions, "q0!inj<", "R").unwrap();
        assert_eq!(resume.next_state, State::source("q0"));
        assert_eq!(resume.write, Symbol::boundary());
        assert_eq!(resume.direction, Direction::Stay);
    }

    #[test]
    fn test_injection_is_deterministic() {
        let alphabet = Alphabet::new(symbols(&["_", "a"]), 1);
        let (_, transitions) = inject(&alphabet, &State::source("q0"), &Symbol::placeholder());
        assert!(crate::assembly::assemble(transitions).is_ok());
    }
}
