use thiserror::Error;

/// Errors that abort a flatten or annotate run.
///
/// Absence of a ClinVar record and malformed input lines are not errors;
/// they are handled where they occur and never reach this type.
#[derive(Debug, Error)]
pub enum Error {
    /// A required file or external tool is missing or unusable.
    #[error("{0}")]
    Configuration(String),
    /// A record or table violates the row contract.
    #[error("{0}")]
    Validation(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("htslib error: {0}")]
    Htslib(#[from] rust_htslib::errors::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn missing_file(kind: &str, path: &std::path::Path) -> Self {
        Error::Configuration(format!("{} not found: {}", kind, path.display()))
    }
}
