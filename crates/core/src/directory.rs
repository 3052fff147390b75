//! Read-only access to patient snapshots.

use crate::error::{SchedulingError, SchedulingResult};
use crate::models::Patient;
use std::fs;
use std::path::{Path, PathBuf};

/// Source of the patients a generation run considers.
pub trait PatientDirectory: Send + Sync {
    /// All patients, in a stable order.
    fn patients(&self) -> SchedulingResult<Vec<Patient>>;
}

/// A fixed list of patients.
#[derive(Clone, Debug, Default)]
pub struct InMemoryPatientDirectory {
    patients: Vec<Patient>,
}

impl InMemoryPatientDirectory {
    pub fn new(patients: Vec<Patient>) -> Self {
        Self { patients }
    }
}

impl PatientDirectory for InMemoryPatientDirectory {
    fn patients(&self) -> SchedulingResult<Vec<Patient>> {
        Ok(self.patients.clone())
    }
}

/// Patients read from a JSON array on every call, so edits to the file are picked up by the
/// next run. A missing file is an empty directory.
#[derive(Clone, Debug)]
pub struct JsonFilePatientDirectory {
    path: PathBuf,
}

impl JsonFilePatientDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PatientDirectory for JsonFilePatientDirectory {
    fn patients(&self) -> SchedulingResult<Vec<Patient>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %self.path.display(), "patient file not found");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(SchedulingError::FileRead {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&text).map_err(SchedulingError::Deserialization)
    }
}
