use thiserror::Error;

/// Erreurs de la couche de contrôle du device
#[derive(Error, Debug)]
pub enum ControlError {
    #[error("Device connection error: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Device RPC '{0}' failed: {1}")]
    Rpc(String, String),

    #[error("Malformed device response: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("Device closed the connection")]
    ConnectionClosed,

    #[error("Missing '{0}' field in device response")]
    MissingField(&'static str),

    #[error("Invalid '{0}' value: {1}")]
    BadValue(&'static str, String),

    #[error("Device handshake rejected")]
    HandshakeRejected,
}

/// Type Result spécialisé pour podcontrol
pub type Result<T> = std::result::Result<T, ControlError>;
