use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{message}")]
    Gateway { status: u16, message: String },

    #[error("{0}")]
    Validation(String),

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl AppError {
    /// A 401/403 from the gateway is the only way a stale or tampered
    /// session ever shows up; the client never inspects the token itself.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, AppError::Gateway { status, .. } if *status == 401 || *status == 403)
    }
}

pub(crate) fn require_field(name: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", name)));
    }
    Ok(())
}
