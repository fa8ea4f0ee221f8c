//! Types d'erreurs pour podplaylist

/// Erreurs de la file de lecture et de son API
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unknown playlist operation: {0}")]
    UnknownOperation(String),

    #[error("Invalid parameters for '{0}': {1}")]
    InvalidParams(String, #[source] serde_json::Error),

    #[error("Device error: {0}")]
    Device(#[from] podcontrol::ControlError),

    #[error("Library error: {0}")]
    Library(#[from] std::io::Error),
}

/// Type Result spécialisé pour podplaylist
pub type Result<T> = std::result::Result<T, Error>;
