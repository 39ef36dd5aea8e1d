use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Error: {0}")]
    Anyhow(#[from] anyhow::Error),

    #[error("Malformed dataset: {0}")]
    MalformedDataset(String),

    #[error("Integrity check failed: {0}")]
    IntegrityMismatch(String),

    #[error("Network unavailable")]
    NetworkUnavailable,

    #[error("Scheduling failed: {0}")]
    Scheduling(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

impl AppError {
    pub fn malformed_dataset<S: Into<String>>(msg: S) -> Self {
        Self::MalformedDataset(msg.into())
    }

    pub fn integrity_mismatch<S: Into<String>>(msg: S) -> Self {
        Self::IntegrityMismatch(msg.into())
    }

    pub fn scheduling<S: Into<String>>(msg: S) -> Self {
        Self::Scheduling(msg.into())
    }

    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub fn operation_failed<S: Into<String>>(msg: S) -> Self {
        Self::OperationFailed(msg.into())
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn permission_denied<S: Into<String>>(msg: S) -> Self {
        Self::PermissionDenied(msg.into())
    }

    /// Errors worth retrying on the next attempt of a bounded retry loop.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect() || e.status().map_or(true, |s| s.is_server_error()),
            Self::NetworkUnavailable | Self::Scheduling(_) | Self::Database(_) => true,
            Self::OperationFailed(msg) => {
                let msg = msg.to_lowercase();
                msg.contains("timeout") || msg.contains("temporar") || msg.contains("unavailable")
            }
            _ => false,
        }
    }

    pub fn is_pii_safe(&self) -> bool {
        match self {
            Self::Database(_) | Self::Network(_) | Self::Anyhow(_) | Self::Serialization(_) => false,
            Self::MalformedDataset(_) | Self::IntegrityMismatch(_) | Self::NetworkUnavailable
            | Self::Scheduling(_) | Self::InvalidInput(_) | Self::Config(_)
            | Self::OperationFailed(_) | Self::NotFound(_)
            | Self::PermissionDenied(_) => true,
        }
    }

    pub fn to_safe_string(&self) -> String {
        if self.is_pii_safe() {
            self.to_string()
        } else {
            match self {
                Self::Database(_) => "Database operation failed".to_string(),
                Self::Network(_) => "Network request failed".to_string(),
                Self::Serialization(_) => "Stored data could not be read".to_string(),
                Self::Anyhow(_) => "Operation failed".to_string(),
                _ => self.to_string(),
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
