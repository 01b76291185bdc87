//! A k-tape simulator for machine descriptions, used by the tests.
//!
//! Tapes grow on demand: moving right past the end appends a blank, and moving left
//! from cell 0 inserts one at the front. Flattened machines run on the same simulator
//! with one tape, which is how their behaviour is checked against the source.

use std::collections::HashMap;

use crate::encoder::Tapes;
use crate::types::{Direction, Machine, Symbol, Transition};

/// The maximum number of steps `run` takes before giving up.
pub const MAX_EXECUTION_STEPS: usize = 200_000;

/// Outcome of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Halt,
}

pub struct TuringMachine<'a> {
    machine: &'a Machine,
    rules: HashMap<(String, Vec<Symbol>), &'a Transition>,
    state: String,
    tapes: Vec<Vec<Symbol>>,
    heads: Vec<usize>,
    step_count: usize,
}

impl<'a> TuringMachine<'a> {
    pub fn new(machine: &'a Machine, input: &Tapes) -> Self {
        let rules = machine
            .transitions
            .iter()
            .map(|t| ((t.state.clone(), t.read.clone()), t))
            .collect();

        Self {
            machine,
            rules,
            state: machine.initial_state.clone(),
            tapes: input.tapes.clone(),
            heads: input.heads.clone(),
            step_count: 0,
        }
    }

    /// Fires the rule matching the current state and the symbols under the heads.
    pub fn step(&mut self) -> Step {
        for (tape, &head) in self.tapes.iter_mut().zip(&self.heads) {
            if head >= tape.len() {
                tape.resize(head + 1, Symbol::blank());
            }
        }

        let read: Vec<Symbol> = self
            .tapes
            .iter()
            .zip(&self.heads)
            .map(|(tape, &head)| tape[head].clone())
            .collect();

        let Some(&transition) = self.rules.get(&(self.state.clone(), read)) else {
            return Step::Halt;
        };

        for (i, (write, direction)) in transition
            .write
            .iter()
            .zip(&transition.directions)
            .enumerate()
        {
            let head = self.heads[i];
            self.tapes[i][head] = write.clone();

            match direction {
                Direction::Left if head == 0 => self.tapes[i].insert(0, Symbol::blank()),
                Direction::Left => self.heads[i] -= 1,
                Direction::Right => {
                    self.heads[i] += 1;
                    if self.heads[i] >= self.tapes[i].len() {
                        self.tapes[i].push(Symbol::blank());
                    }
                }
                Direction::Stay => {}
            }
        }

        self.state = transition.next_state.clone();
        self.step_count += 1;
        Step::Continue
    }

    /// Runs until the machine halts or `max_steps` steps have been taken.
    pub fn run(&mut self, max_steps: usize) -> Step {
        while self.step_count < max_steps {
            if self.step() == Step::Halt {
                return Step::Halt;
            }
        }
        Step::Continue
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn heads(&self) -> &[usize] {
        &self.heads
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn is_accepting(&self) -> bool {
        self.machine.is_accepting(&self.state)
    }

    /// The current tapes and head positions.
    pub fn snapshot(&self) -> Tapes {
        Tapes::new(self.tapes.clone(), self.heads.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlattenConfig;
    use crate::encoder::{decode, encode};
    use crate::flattener::flatten;
    use crate::programs::MachineCatalog;
    use crate::types::symbols;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn tapes(contents: &[(&str, usize)]) -> Tapes {
        let (tapes, heads): (Vec<Vec<Symbol>>, Vec<usize>) = contents
            .iter()
            .map(|(content, head)| {
                let tape = content.chars().map(|c| Symbol::from(c.to_string())).collect();
                (tape, *head)
            })
            .unzip();
        Tapes::new(tapes, heads)
    }

    fn scenario() -> Machine {
        MachineCatalog::get_by_name("Scenario").unwrap()
    }

    fn source_names(machine: &Machine) -> HashSet<String> {
        machine
            .transitions
            .iter()
            .flat_map(|t| [t.state.clone(), t.next_state.clone()])
            .chain(std::iter::once(machine.initial_state.clone()))
            .chain(machine.accept_states.iter().cloned())
            .collect()
    }

    /// Runs `source` for at most `max_steps` steps and its flattening on the encoded input,
    /// checking that every source configuration shows up on the flattened tape the moment
    /// the flattened machine re-enters a source state.
    fn assert_equivalent(source: &Machine, config: &FlattenConfig, input: &Tapes, max_steps: usize) {
        let source_input = match &config.placeholder {
            Some(placeholder) => Tapes::new(
                input
                    .tapes
                    .iter()
                    .map(|tape| {
                        tape.iter()
                            .map(|s| if s == placeholder { Symbol::blank() } else { s.clone() })
                            .collect()
                    })
                    .collect(),
                input.heads.clone(),
            ),
            None => input.clone(),
        };

        let mut source_run = TuringMachine::new(source, &source_input);
        let mut expected = vec![(source_run.state().to_string(), source_run.snapshot().normalized())];
        let mut source_halted = false;
        while expected.len() <= max_steps {
            if source_run.step() == Step::Halt {
                source_halted = true;
                break;
            }
            expected.push((source_run.state().to_string(), source_run.snapshot().normalized()));
        }

        let flat = flatten(source, config).unwrap().to_machine().unwrap();
        let names = source_names(source);
        let cells = encode(input, config.iteration).unwrap();
        let mut flat_run = TuringMachine::new(&flat, &Tapes::new(vec![cells], vec![0]));

        let observe = |run: &TuringMachine| {
            let snapshot = run.snapshot();
            let tapes = decode(&snapshot.tapes[0], config.iteration).unwrap().normalized();
            (run.state().to_string(), tapes)
        };

        let mut observed = Vec::new();
        if names.contains(flat_run.state()) {
            observed.push(observe(&flat_run));
        }

        let mut flat_halted = false;
        while observed.len() < expected.len() && flat_run.step_count() < MAX_EXECUTION_STEPS {
            let was_source = names.contains(flat_run.state());
            if flat_run.step() == Step::Halt {
                flat_halted = true;
                break;
            }
            if !was_source && names.contains(flat_run.state()) {
                observed.push(observe(&flat_run));
            }
        }

        assert_eq!(observed, expected, "{} on {:?}", source.name, input);

        if source_halted {
            if !flat_halted {
                assert_eq!(flat_run.run(MAX_EXECUTION_STEPS), Step::Halt);
            }
            assert!(!names.contains(flat_run.state()) || flat_run.state() == source_run.state());
            assert_eq!(flat_run.is_accepting(), source_run.is_accepting());
        }
    }

    #[test]
    fn test_source_simulation() {
        let machine = MachineCatalog::get_by_name("Copy").unwrap();
        let mut run = TuringMachine::new(&machine, &tapes(&[("ab", 0), ("", 0)]));

        assert_eq!(run.run(100), Step::Halt);
        assert_eq!(run.state(), "done");
        assert!(run.is_accepting());
        assert_eq!(run.step_count(), 3);
        assert_eq!(run.snapshot().normalized().tapes[1], symbols(&["a", "b"]));
        assert_eq!(run.heads(), &[2, 2]);
    }

    #[test]
    fn test_left_move_at_origin_grows_the_tape() {
        let machine = MachineCatalog::get_by_name("Reverse").unwrap();
        let mut run = TuringMachine::new(&machine, &tapes(&[("ab", 0), ("", 0)]));

        assert_eq!(run.run(100), Step::Halt);
        assert_eq!(run.state(), "done");
        assert_eq!(run.snapshot().normalized().tapes[1], symbols(&["_", "b", "a"]));
    }

    #[test]
    fn test_missing_rule_halts() {
        let machine = scenario();
        let mut run = TuringMachine::new(&machine, &tapes(&[("x", 0), ("b", 0)]));
        assert_eq!(run.step(), Step::Halt);
        assert_eq!(run.step_count(), 0);
        assert_eq!(run.state(), "q0");
    }

    #[test]
    fn test_scenario_trace() {
        let flat = flatten(&scenario(), &FlattenConfig::default())
            .unwrap()
            .to_machine()
            .unwrap();
        let cells = symbols(&["#", "a.1", "#", "b.1", "#", "$"]);
        let mut run = TuringMachine::new(&flat, &Tapes::new(vec![cells], vec![0]));

        let mut trace = vec![(run.state().to_string(), run.heads()[0])];
        while run.step() == Step::Continue {
            trace.push((run.state().to_string(), run.heads()[0]));
        }

        let expected = [
            ("q0", 0),
            ("q0", 1),
            ("q0[a.1]", 2),
            ("q0[a.1]", 3),
            ("q0[a.1][b.1]", 4),
            ("q0[a.1][b.1]:2", 4),
            ("q0[a.1][b.1]:2", 3),
            ("q0[a.1][b.1]:1", 2),
            ("q0[a.1][b.1]:1", 1),
            ("q0[a.1][b.1]:1a", 2),
            ("q0[a.1][b.1]:F", 2),
            ("q0", 2),
        ];
        let expected: Vec<(String, usize)> =
            expected.iter().map(|(s, h)| (s.to_string(), *h)).collect();
        assert_eq!(trace, expected);

        assert!(run.is_accepting());
        assert_eq!(
            &run.snapshot().tapes[0][..6],
            symbols(&["#", "a", "#.1", "c.1", "#", "$"]).as_slice()
        );
    }

    #[test]
    fn test_scenario_equivalence() {
        let machine = scenario();
        let config = FlattenConfig::default();
        assert_equivalent(&machine, &config, &tapes(&[("aaa", 0), ("b", 0)]), 10);
        assert_equivalent(&machine, &config, &tapes(&[("a", 1), ("b", 0)]), 10);
        assert_equivalent(&machine, &config, &tapes(&[("", 0), ("", 0)]), 10);
    }

    #[test]
    fn test_catalog_equivalence() {
        let config = FlattenConfig::default();
        let cases = [
            ("Copy", vec![("abba", 0), ("", 0)]),
            ("Copy", vec![("", 0), ("", 0)]),
            ("Reverse", vec![("ab", 0), ("", 0)]),
            ("Reverse", vec![("bab", 0), ("a", 0)]),
            ("Compare", vec![("ab", 0), ("ab", 0)]),
            ("Compare", vec![("ab", 0), ("aa", 0)]),
            ("Compare", vec![("a", 0), ("ab", 0)]),
        ];

        for (name, input) in cases {
            let machine = MachineCatalog::get_by_name(name).unwrap();
            assert_equivalent(&machine, &config, &tapes(&input), 20);
        }
    }

    #[test]
    fn test_equivalence_with_higher_iteration() {
        let config = FlattenConfig {
            iteration: 2,
            ..FlattenConfig::default()
        };
        let machine = MachineCatalog::get_by_name("Reverse").unwrap();
        assert_equivalent(&machine, &config, &tapes(&[("ab", 0), ("", 0)]), 20);
    }

    #[test]
    fn test_equivalence_with_injected_blanks() {
        let config = FlattenConfig {
            placeholder: Some(Symbol::placeholder()),
            ..FlattenConfig::default()
        };
        let machine = MachineCatalog::get_by_name("Copy").unwrap();
        assert_equivalent(&machine, &config, &tapes(&[("a~b", 0), ("~", 0)]), 20);
        assert_equivalent(&machine, &config, &tapes(&[("~a", 0), ("", 0)]), 20);
    }

    #[test]
    fn test_blank_moves_on_empty_tapes() {
        let machine = Machine {
            name: "Wander".to_string(),
            initial_state: "q0".to_string(),
            accept_states: vec!["q3".to_string()],
            transitions: vec![
                Transition::new(
                    "q0",
                    symbols(&["_", "_"]),
                    "q1",
                    symbols(&["_", "x"]),
                    vec![Direction::Left, Direction::Right],
                ),
                Transition::new(
                    "q1",
                    symbols(&["_", "_"]),
                    "q2",
                    symbols(&["x", "_"]),
                    vec![Direction::Stay, Direction::Left],
                ),
                Transition::new(
                    "q2",
                    symbols(&["x", "x"]),
                    "q3",
                    symbols(&["_", "_"]),
                    vec![Direction::Right, Direction::Left],
                ),
            ],
        };

        assert_equivalent(&machine, &FlattenConfig::default(), &tapes(&[("", 0), ("", 0)]), 10);
    }

    const SYMBOLS: [&str; 3] = ["_", "a", "b"];

    type RandomRule = (usize, Vec<&'static str>, usize, Vec<&'static str>, Vec<Direction>);

    fn arb_rules(tape_count: usize) -> impl Strategy<Value = Vec<RandomRule>> {
        let symbol = prop::sample::select(SYMBOLS.to_vec());
        let direction =
            prop::sample::select(vec![Direction::Left, Direction::Right, Direction::Stay]);
        let rule = (
            0..3usize,
            prop::collection::vec(symbol.clone(), tape_count),
            0..4usize,
            prop::collection::vec(symbol, tape_count),
            prop::collection::vec(direction, tape_count),
        );
        prop::collection::vec(rule, 1..12)
    }

    fn arb_input(tape_count: usize) -> impl Strategy<Value = Tapes> {
        let tape = prop::collection::vec(prop::sample::select(SYMBOLS.to_vec()), 0..5)
            .prop_flat_map(|tape| {
                let len = tape.len();
                (Just(tape), 0..=len)
            });

        prop::collection::vec(tape, tape_count).prop_map(|contents| {
            let (tapes, heads): (Vec<Vec<Symbol>>, Vec<usize>) = contents
                .into_iter()
                .map(|(tape, head)| (symbols(&tape), head))
                .unzip();
            Tapes::new(tapes, heads)
        })
    }

    fn build_machine(rules: Vec<RandomRule>) -> Machine {
        let mut transitions: Vec<Transition> = Vec::new();
        for (i, (state, read, next, write, directions)) in rules.into_iter().enumerate() {
            let state = if i == 0 { 0 } else { state };
            let transition = Transition::new(
                format!("q{state}"),
                symbols(&read),
                format!("q{next}"),
                symbols(&write),
                directions,
            );
            if !transitions.iter().any(|t| t.same_domain(&transition)) {
                transitions.push(transition);
            }
        }

        Machine {
            name: "Random".to_string(),
            initial_state: "q0".to_string(),
            accept_states: vec!["q3".to_string()],
            transitions,
        }
    }

    fn arb_case() -> impl Strategy<Value = (Machine, Tapes)> {
        (1..=3usize)
            .prop_flat_map(|tape_count| (arb_rules(tape_count), arb_input(tape_count)))
            .prop_map(|(rules, input)| (build_machine(rules), input))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn flattened_machines_follow_their_source((machine, input) in arb_case()) {
            let used: HashSet<&Symbol> = machine
                .transitions
                .iter()
                .flat_map(|t| t.read.iter().chain(&t.write))
                .collect();
            prop_assume!(input.tapes.iter().flatten().all(|s| s.is_blank() || used.contains(s)));

            assert_equivalent(&machine, &FlattenConfig::default(), &input, 12);
        }
    }
}
