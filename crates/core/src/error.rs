#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to read terminology dictionary {}: {source}", .path.display())]
    TerminologyRead {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse terminology dictionary {}: {source}", .path.display())]
    TerminologyParse {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize bundle: {0}")]
    Serialization(serde_json::Error),

    #[error("FHIR error: {0}")]
    Fhir(#[from] fhir::FhirError),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
