use crate::parser::parse;
use crate::types::{Machine, MachineError};

// Embedded sample machines
const MACHINE_TEXTS: [&str; 4] = [
    include_str!("../machines/scenario.tm"),
    include_str!("../machines/copy.tm"),
    include_str!("../machines/reverse.tm"),
    include_str!("../machines/compare.tm"),
];

lazy_static::lazy_static! {
    pub static ref MACHINES: Vec<Machine> = MACHINE_TEXTS
        .iter()
        .filter_map(|text| match parse(text) {
            Ok(machine) => Some(machine),
            Err(e) => {
                tracing::error!("Failed to parse embedded machine: {}", e);
                None
            }
        })
        .collect();
}

/// Read-only access to the embedded sample machines.
pub struct MachineCatalog;

impl MachineCatalog {
    /// Get the number of available machines
    pub fn count() -> usize {
        MACHINES.len()
    }

    /// Get a machine by its index
    pub fn get_by_index(index: usize) -> Result<Machine, MachineError> {
        MACHINES.get(index).cloned().ok_or_else(|| {
            MachineError::ValidationError(format!("Machine index {} out of range", index))
        })
    }

    /// Get a machine by its name, ignoring case
    pub fn get_by_name(name: &str) -> Result<Machine, MachineError> {
        MACHINES
            .iter()
            .find(|machine| machine.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| MachineError::ValidationError(format!("Machine '{}' not found", name)))
    }

    /// List all machine names
    pub fn list_names() -> Vec<String> {
        MACHINES.iter().map(|machine| machine.name.clone()).collect()
    }

    pub fn info(index: usize) -> Result<MachineInfo, MachineError> {
        let machine = Self::get_by_index(index)?;

        Ok(MachineInfo {
            index,
            name: machine.name.clone(),
            initial_state: machine.initial_state.clone(),
            tape_count: machine.tape_count().unwrap_or(0),
            state_count: machine.domain_states().len(),
            transition_count: machine.transitions.len(),
        })
    }

    /// Search for machines by name
    pub fn search(query: &str) -> Vec<usize> {
        let query = query.to_lowercase();

        MACHINES
            .iter()
            .enumerate()
            .filter(|(_, machine)| machine.name.to_lowercase().contains(&query))
            .map(|(index, _)| index)
            .collect()
    }

    /// Get the original text of a machine by its index
    pub fn text_by_index(index: usize) -> Result<&'static str, MachineError> {
        MACHINE_TEXTS.get(index).copied().ok_or_else(|| {
            MachineError::ValidationError(format!("Machine text index {} out of range", index))
        })
    }
}

#[derive(Debug, Clone)]
pub struct MachineInfo {
    pub index: usize,
    pub name: String,
    pub initial_state: String,
    pub tape_count: usize,
    pub state_count: usize,
    pub transition_count: usize,
}
