//! Error types for pulplug

/// Error type for pulplug operations
#[derive(Debug, thiserror::Error)]
pub enum PulplugError {
    #[error("{0} is not implemented")]
    Unimplemented(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The request was cancelled before the provider finished; carries the RPC name
    #[error("{0} was cancelled")]
    Cancelled(String),

    #[error("gRPC error: {0}")]
    GrpcError(Box<tonic::Status>),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    TransportError(#[from] tonic::transport::Error),

    #[error("{0}")]
    Custom(String),
}

/// Result type alias for pulplug operations
pub type Result<T> = std::result::Result<T, PulplugError>;

impl PulplugError {
    /// Shorthand for the default body of every provider RPC
    pub fn unimplemented(method: &str) -> Self {
        PulplugError::Unimplemented(method.to_string())
    }

    pub fn is_unimplemented(&self) -> bool {
        match self {
            PulplugError::Unimplemented(_) => true,
            PulplugError::GrpcError(status) => status.code() == tonic::Code::Unimplemented,
            _ => false,
        }
    }
}

impl From<String> for PulplugError {
    fn from(s: String) -> Self {
        PulplugError::Custom(s)
    }
}

impl From<&str> for PulplugError {
    fn from(s: &str) -> Self {
        PulplugError::Custom(s.to_string())
    }
}

impl From<tonic::Status> for PulplugError {
    fn from(status: tonic::Status) -> Self {
        PulplugError::GrpcError(Box::new(status))
    }
}

impl From<PulplugError> for tonic::Status {
    fn from(err: PulplugError) -> Self {
        match err {
            PulplugError::Unimplemented(method) => {
                tonic::Status::unimplemented(format!("{} is not implemented", method))
            }
            PulplugError::InvalidConfiguration(msg) => tonic::Status::invalid_argument(msg),
            err @ PulplugError::Cancelled(_) => tonic::Status::cancelled(err.to_string()),
            PulplugError::GrpcError(status) => *status,
            other => tonic::Status::internal(other.to_string()),
        }
    }
}
