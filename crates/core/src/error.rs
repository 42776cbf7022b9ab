/// Errors returned by the `eps-core` crate.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Patient {patient_id} not found. Available: {}", .available.join(", "))]
    UnknownPatient {
        patient_id: String,
        /// All known bundle keys, sorted, for the error detail.
        available: Vec<String>,
    },
    #[error("failed to read bundle file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to deserialize bundle: {0}")]
    Deserialization(serde_json::Error),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
