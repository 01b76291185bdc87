//! This module provides the parser for machine descriptions, utilizing the `pest` crate.
//! It defines the grammar for `.tm` files and functions to parse the input into a `Machine` struct.

use crate::{
    analyzer::analyze,
    types::{Direction, Machine, MachineError, Symbol, Transition},
};
use pest::{
    error::{Error, ErrorVariant},
    iterators::Pair,
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;
use std::collections::HashSet;

/// Derives a `PestParser` for the machine grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct MachineParser;

/// Parses the given input string into a `Machine` struct.
///
/// Header lines (`name:`, `init:`, `accept:`) may appear anywhere; every other line is a row.
/// Rows are paired in order into domain and range lines, blank lines only separate them.
/// The parsed machine is validated before being returned.
///
/// # Returns
///
/// * `Ok(Machine)` if the input is successfully parsed and validated.
/// * `Err(MachineError::ParseError)` if there are any syntax errors.
/// * `Err(MachineError::ValidationError)` if the machine fails validation.
pub fn parse(input: &str) -> Result<Machine, MachineError> {
    let root = MachineParser::parse(Rule::machine, input)
        .map_err(|e| MachineError::ParseError(e.into()))?
        .next()
        .ok_or_else(|| MachineError::ValidationError("Empty machine description".into()))?;

    let machine = parse_machine(root)?;

    analyze(&machine)?;

    Ok(machine)
}

/// Parses the top-level structure of a machine description from a `Pair<Rule::machine>`.
fn parse_machine(pair: Pair<Rule>) -> Result<Machine, MachineError> {
    let mut name: Option<String> = None;
    let mut initial_state: Option<String> = None;
    let mut accept_states: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    let mut seen = HashSet::new();

    for p in pair.into_inner() {
        let span = p.as_span();
        let rule = p.as_rule();

        check_unique_rule(rule, span, &mut seen)?;

        match rule {
            Rule::name => name = Some(p.into_inner().as_str().trim().to_string()),
            Rule::init => initial_state = Some(p.into_inner().as_str().to_string()),
            Rule::accept => accept_states = Some(parse_items(p)),
            Rule::row => rows.push(p),
            _ => {} // EOI
        }
    }

    let name = check_required_rule(name, "name")?;
    let initial_state = check_required_rule(initial_state, "init")?;

    if name.is_empty() {
        return Err(MachineError::ValidationError(
            "Machine name must not be empty".into(),
        ));
    }

    Ok(Machine {
        name,
        initial_state,
        accept_states: accept_states.unwrap_or_default(),
        transitions: parse_transitions(rows)?,
    })
}

/// Pairs rows into transitions: a domain line followed by its range line.
fn parse_transitions(rows: Vec<Pair<Rule>>) -> Result<Vec<Transition>, MachineError> {
    let mut transitions = Vec::with_capacity(rows.len() / 2);
    let mut rows = rows.into_iter();

    while let Some(domain) = rows.next() {
        let Some(range) = rows.next() else {
            return Err(parse_error(
                "Domain line without a range line",
                domain.as_span(),
            ));
        };

        transitions.push(parse_transition(domain, range)?);
    }

    Ok(transitions)
}

/// Parses one `state, read_1..k` / `next, write_1..k, move_1..k` pair.
fn parse_transition(domain: Pair<Rule>, range: Pair<Rule>) -> Result<Transition, MachineError> {
    let domain_span = domain.as_span();
    let range_span = range.as_span();
    let domain = parse_items(domain);
    let range = parse_items(range);

    let tapes = domain.len() - 1;
    if tapes == 0 {
        return Err(parse_error(
            "Domain line needs a state and at least one symbol",
            domain_span,
        ));
    }

    if range.len() != 1 + 2 * tapes {
        return Err(parse_error(
            &format!(
                "Range line has {} fields, expected {} for {} tape(s)",
                range.len(),
                1 + 2 * tapes,
                tapes
            ),
            range_span,
        ));
    }

    let directions = range[1 + tapes..]
        .iter()
        .map(|token| {
            Direction::from_token(token).ok_or_else(|| {
                parse_error(&format!("Unsupported direction: {token}"), range_span)
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Transition {
        state: domain[0].clone(),
        read: domain[1..].iter().map(|s| Symbol::new(s.as_str())).collect(),
        next_state: range[0].clone(),
        write: range[1..=tapes]
            .iter()
            .map(|s| Symbol::new(s.as_str()))
            .collect(),
        directions,
    })
}

/// Collects the `item` children of a row or header.
fn parse_items(pair: Pair<Rule>) -> Vec<String> {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::item)
        .map(|p| p.as_str().to_string())
        .collect()
}

/// Creates a `MachineError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> MachineError {
    MachineError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

/// Checks if a header has already been declared.
fn check_unique_rule(
    rule: Rule,
    span: Span,
    seen: &mut HashSet<Rule>,
) -> Result<(), MachineError> {
    if !matches!(rule, Rule::name | Rule::init | Rule::accept) {
        return Ok(());
    };

    if !seen.insert(rule) {
        return Err(parse_error(
            &format!("Duplicate \"{rule:?}:\" declaration"),
            span,
        ));
    }

    Ok(())
}

/// Checks if a required header is present, returning an `Err` if it's missing.
fn check_required_rule<T>(value: Option<T>, name: &str) -> Result<T, MachineError> {
    value.ok_or_else(|| MachineError::ValidationError(format!("Missing '{name}' header")))
}
