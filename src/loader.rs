//! This module provides the `MachineLoader` struct, responsible for loading machine
//! descriptions from files, strings and directories.

use crate::parser::parse;
use crate::types::{Machine, MachineError, MAX_MACHINE_SIZE};
use std::fs;
use std::path::{Path, PathBuf};

/// File extension of machine descriptions.
pub const MACHINE_EXTENSION: &str = "tm";

/// `MachineLoader` is a utility struct for loading machine descriptions.
pub struct MachineLoader;

impl MachineLoader {
    /// Loads a single machine from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(Machine)` if the file is successfully read and parsed.
    /// * `Err(MachineError::FileError)` if the file cannot be read or is too large.
    /// * `Err(MachineError::ParseError)` if the file content is not a valid machine.
    pub fn load_machine(path: &Path) -> Result<Machine, MachineError> {
        let size = fs::metadata(path)
            .map_err(|e| {
                MachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
            })?
            .len();

        if size > MAX_MACHINE_SIZE as u64 {
            return Err(MachineError::FileError(format!(
                "File {} is {} bytes, the limit is {}",
                path.display(),
                size,
                MAX_MACHINE_SIZE
            )));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            MachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        parse(&content)
    }

    /// Loads a single machine from the provided string content.
    pub fn load_machine_from_string(content: &str) -> Result<Machine, MachineError> {
        if content.len() > MAX_MACHINE_SIZE {
            return Err(MachineError::FileError(format!(
                "Machine description is {} bytes, the limit is {}",
                content.len(),
                MAX_MACHINE_SIZE
            )));
        }

        parse(content)
    }

    /// Loads every machine file (`.tm` extension) from a given directory.
    ///
    /// Directories and other files are skipped. Each element of the result is either the
    /// path and machine of a loaded file, or the error that file produced.
    pub fn load_machines(directory: &Path) -> Vec<Result<(PathBuf, Machine), MachineError>> {
        if !directory.exists() {
            return vec![Err(MachineError::FileError(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(MachineError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut results: Vec<_> = entries
            .filter_map(|entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        return Some(Err(MachineError::FileError(format!(
                            "Failed to read directory entry: {}",
                            e
                        ))))
                    }
                };

                let path = entry.path();

                if path.is_dir() || path.extension().is_none_or(|ext| ext != MACHINE_EXTENSION) {
                    return None;
                }

                match Self::load_machine(&path) {
                    Ok(machine) => Some(Ok((path, machine))),
                    Err(e) => Some(Err(MachineError::FileError(format!(
                        "Failed to load machine from {}: {}",
                        path.display(),
                        e
                    )))),
                }
            })
            .collect();

        // Directory order is platform dependent.
        results.sort_by(|a, b| match (a, b) {
            (Ok((a, _)), Ok((b, _))) => a.cmp(b),
            (Ok(_), Err(_)) => std::cmp::Ordering::Less,
            (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
            (Err(_), Err(_)) => std::cmp::Ordering::Equal,
        });

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const VALID: &str = "name: Test Machine\ninit: start\n\nstart, a, b\nstop, b, b, >, -\n";

    #[test]
    fn test_load_valid_machine() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.tm");

        let mut file = File::create(&file_path).unwrap();
        file.write_all(VALID.as_bytes()).unwrap();

        let machine = MachineLoader::load_machine(&file_path).unwrap();
        assert_eq!(machine.name, "Test Machine");
        assert_eq!(machine.initial_state, "start");
        assert_eq!(machine.tape_count(), Some(2));
    }

    #[test]
    fn test_load_invalid_machine() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("invalid.tm");

        let mut file = File::create(&file_path).unwrap();
        file.write_all(b"This is not a valid machine").unwrap();

        assert!(MachineLoader::load_machine(&file_path).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let result = MachineLoader::load_machine(Path::new("does/not/exist.tm"));
        assert!(matches!(result, Err(MachineError::FileError(_))));
    }

    #[test]
    fn test_load_oversized_string() {
        let content = "x".repeat(MAX_MACHINE_SIZE + 1);
        let result = MachineLoader::load_machine_from_string(&content);
        assert!(matches!(result, Err(MachineError::FileError(_))));
    }

    #[test]
    fn test_load_machines_from_directory() {
        let dir = tempdir().unwrap();

        let mut valid_file = File::create(dir.path().join("valid.tm")).unwrap();
        valid_file.write_all(VALID.as_bytes()).unwrap();

        let mut invalid_file = File::create(dir.path().join("invalid.tm")).unwrap();
        invalid_file.write_all(b"This is not a valid machine").unwrap();

        let mut ignored_file = File::create(dir.path().join("ignored.txt")).unwrap();
        ignored_file.write_all(b"This file should be ignored").unwrap();

        let results = MachineLoader::load_machines(dir.path());
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn test_load_machines_missing_directory() {
        let results = MachineLoader::load_machines(Path::new("no/such/dir"));
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }
}
