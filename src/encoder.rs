//! This module provides the head-position encoder and the layout of k virtual tapes
//! on the single physical tape of a flattened machine.
//!
//! Layout: `# t1 # t2 # ... # tk # $`. The cell under each virtual head holds the
//! marker of its symbol; a head one past the end of its tape marks the boundary
//! that closes that tape.

use crate::types::{MachineError, Symbol};

/// Returns the marker that says "a virtual head is here" for `symbol` at `iteration`.
///
/// Source symbols are rewritten before flattening so that none of them ends with
/// the `.{iteration}` suffix, which keeps markers apart from plain symbols.
pub fn marker_of(symbol: &Symbol, iteration: u32) -> Symbol {
    Symbol::new(format!("{symbol}.{iteration}"))
}

/// Returns the plain symbol behind a marker, or `None` for plain symbols.
pub fn unmark(symbol: &Symbol, iteration: u32) -> Option<Symbol> {
    symbol
        .as_str()
        .strip_suffix(&format!(".{iteration}"))
        .map(Symbol::from)
}

/// The contents and head positions of k virtual tapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tapes {
    pub tapes: Vec<Vec<Symbol>>,
    pub heads: Vec<usize>,
}

impl Tapes {
    pub fn new(tapes: Vec<Vec<Symbol>>, heads: Vec<usize>) -> Self {
        Self { tapes, heads }
    }

    /// Drops trailing blanks so that tapes differing only in materialized blanks compare equal.
    /// Head positions are kept as they are.
    pub fn normalized(&self) -> Self {
        let tapes = self
            .tapes
            .iter()
            .map(|tape| {
                let len = tape.iter().rposition(|s| !s.is_blank()).map_or(0, |i| i + 1);
                tape[..len].to_vec()
            })
            .collect();

        Self {
            tapes,
            heads: self.heads.clone(),
        }
    }
}

/// Encodes k tapes onto one. A head beyond the end of its tape materializes blanks up to it.
pub fn encode(tapes: &Tapes, iteration: u32) -> Result<Vec<Symbol>, MachineError> {
    if tapes.tapes.is_empty() {
        return Err(MachineError::ValidationError(
            "Cannot encode zero tapes".to_string(),
        ));
    }

    if tapes.tapes.len() != tapes.heads.len() {
        return Err(MachineError::ValidationError(format!(
            "Number of head positions ({}) does not match number of tapes ({})",
            tapes.heads.len(),
            tapes.tapes.len()
        )));
    }

    let mut cells = vec![Symbol::boundary()];

    for (tape, &head) in tapes.tapes.iter().zip(&tapes.heads) {
        let mut tape = tape.clone();
        if head > tape.len() {
            tape.resize(head, Symbol::blank());
        }

        for (i, symbol) in tape.iter().enumerate() {
            if symbol.is_reserved() {
                return Err(MachineError::ValidationError(format!(
                    "Tape symbol {symbol} is reserved"
                )));
            }

            cells.push(if i == head {
                marker_of(symbol, iteration)
            } else {
                symbol.clone()
            });
        }

        cells.push(if head == tape.len() {
            marker_of(&Symbol::boundary(), iteration)
        } else {
            Symbol::boundary()
        });
    }

    cells.push(Symbol::tape_end());
    Ok(cells)
}

/// Decodes an encoded tape back into its virtual tapes. Cells after the tape-end marker are ignored.
pub fn decode(cells: &[Symbol], iteration: u32) -> Result<Tapes, MachineError> {
    let boundary_marker = marker_of(&Symbol::boundary(), iteration);

    match cells.first() {
        Some(first) if first.is_boundary() => {}
        _ => {
            return Err(MachineError::ValidationError(
                "Encoded tape must start with a boundary".to_string(),
            ))
        }
    }

    let mut tapes = Vec::new();
    let mut heads = Vec::new();
    let mut tape: Vec<Symbol> = Vec::new();
    let mut head: Option<usize> = None;
    let mut closed = false;

    for cell in &cells[1..] {
        if *cell == Symbol::tape_end() {
            closed = true;
            break;
        }

        if cell.is_boundary() || *cell == boundary_marker {
            if *cell == boundary_marker {
                head = set_head(head, tape.len(), tapes.len())?;
            }
            let position = head.ok_or_else(|| {
                MachineError::ValidationError(format!("Tape {} has no head", tapes.len() + 1))
            })?;
            tapes.push(std::mem::take(&mut tape));
            heads.push(position);
            head = None;
            continue;
        }

        match unmark(cell, iteration) {
            Some(symbol) => {
                head = set_head(head, tape.len(), tapes.len())?;
                tape.push(symbol);
            }
            None => tape.push(cell.clone()),
        }
    }

    if !closed || !tape.is_empty() || head.is_some() {
        return Err(MachineError::ValidationError(
            "Encoded tape must end with a boundary followed by the tape-end marker".to_string(),
        ));
    }

    Ok(Tapes { tapes, heads })
}

fn set_head(
    current: Option<usize>,
    position: usize,
    tape: usize,
) -> Result<Option<usize>, MachineError> {
    if current.is_some() {
        return Err(MachineError::ValidationError(format!(
            "Tape {} has more than one head",
            tape + 1
        )));
    }
    Ok(Some(position))
}
