use care_ids::ReminderId;

/// Errors raised by the collaborator adapters and configuration around the scheduling engine.
///
/// The offset calculator, time resolver and reminder generator never return these: malformed
/// inputs there degrade to defaults instead.
#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to create data directory: {0}")]
    DataDirCreation(std::io::Error),
    #[error("failed to read {path}: {source}", path = path.display())]
    FileRead {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}", path = path.display())]
    FileWrite {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize records: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize records: {0}")]
    Deserialization(serde_json::Error),
    #[error("reminder store lock was poisoned")]
    StoreLockPoisoned,
    #[error("reminder not found: {0}")]
    UnknownReminder(ReminderId),

    #[error("invalid vocabulary value: {0}")]
    Types(#[from] care_types::TypesError),
    #[error("invalid reminder id: {0}")]
    Id(#[from] care_ids::IdError),
}

pub type SchedulingResult<T> = std::result::Result<T, SchedulingError>;
