use thiserror::Error;

/// Pipeline error taxonomy. Every variant is terminal for the job that hit
/// it; retry happens below this layer (provider transport) or not at all.
#[derive(Error, Debug)]
pub enum EsgError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Malformed generation output: {0}")]
    MalformedGeneration(String),

    #[error("Schema validation error: {0}")]
    SchemaValidation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
