//! Renders machines back into the description format read by the parser.

use std::fmt::{self, Write};

use crate::types::Machine;

/// Writes `machine` as a description: headers, then one domain/range pair per transition,
/// separated by blank lines. Directions are always written as `<`, `>` or `-`.
pub fn write(machine: &Machine) -> String {
    let mut out = String::new();
    write_into(&mut out, machine).expect("writing into a String cannot fail");
    out
}

fn write_into(out: &mut impl Write, machine: &Machine) -> fmt::Result {
    writeln!(out, "name: {}", machine.name)?;
    writeln!(out, "init: {}", machine.initial_state)?;
    writeln!(out, "accept: {}", machine.accept_states.join(", "))?;

    for transition in &machine.transitions {
        writeln!(out)?;

        let read: Vec<&str> = transition.read.iter().map(|s| s.as_str()).collect();
        writeln!(out, "{}, {}", transition.state, read.join(", "))?;

        let write: Vec<&str> = transition.write.iter().map(|s| s.as_str()).collect();
        let moves: Vec<&str> = transition
            .directions
            .iter()
            .map(|d| d.as_token())
            .collect();
        writeln!(
            out,
            "{}, {}, {}",
            transition.next_state,
            write.join(", "),
            moves.join(", ")
        )?;
    }

    Ok(())
}
