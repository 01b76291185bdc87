//! The tape alphabet of a flattening run and the one-time rewrite that keeps
//! source symbols clear of reserved tokens and head markers.

use std::collections::BTreeSet;

use crate::encoder::marker_of;
use crate::types::{Machine, Symbol, ESCAPE_CHAR};

/// The symbols a flattened machine works with, derived once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    iteration: u32,
    symbols: Vec<Symbol>,
    unmarked: Vec<Symbol>,
    library: Vec<Symbol>,
}

impl Alphabet {
    /// Collects every symbol read or written by `machine`, plus the blank.
    pub fn from_machine(machine: &Machine, iteration: u32) -> Self {
        let mut symbols = BTreeSet::new();
        symbols.insert(Symbol::blank());

        for transition in &machine.transitions {
            symbols.extend(transition.read.iter().cloned());
            symbols.extend(transition.write.iter().cloned());
        }

        Self::new(symbols.into_iter().collect(), iteration)
    }

    pub fn new(symbols: Vec<Symbol>, iteration: u32) -> Self {
        let mut unmarked = symbols.clone();
        unmarked.push(Symbol::boundary());

        let mut library = unmarked.clone();
        library.extend(unmarked.iter().map(|s| marker_of(s, iteration)));

        Self {
            iteration,
            symbols,
            unmarked,
            library,
        }
    }

    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// The virtual tape symbols, blank included.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Every symbol that can sit on the encoded tape without a head on it.
    pub fn unmarked(&self) -> &[Symbol] {
        &self.unmarked
    }

    /// Unmarked symbols followed by their markers.
    pub fn library(&self) -> &[Symbol] {
        &self.library
    }

    pub fn marker(&self, symbol: &Symbol) -> Symbol {
        marker_of(symbol, self.iteration)
    }

    pub fn blank_marker(&self) -> Symbol {
        self.marker(&Symbol::blank())
    }

    pub fn boundary_marker(&self) -> Symbol {
        self.marker(&Symbol::boundary())
    }
}

/// Returns the symbol a source symbol must be replaced with before flattening at
/// `iteration`, or `None` when it can be used as is.
///
/// Reserved tokens, symbols that look like markers of this iteration and symbols that
/// already carry the escape character are wrapped in escape characters. The map is
/// injective, and a wrapped symbol is neither reserved nor marker-like.
pub fn rewrite(symbol: &Symbol, iteration: u32) -> Option<Symbol> {
    let text = symbol.as_str();
    let marker_like = text.ends_with(&format!(".{iteration}"));

    (symbol.is_reserved() || marker_like || text.starts_with(ESCAPE_CHAR))
        .then(|| Symbol::new(format!("{ESCAPE_CHAR}{text}{ESCAPE_CHAR}")))
}
