use axum::http::StatusCode;
use thiserror::Error;

/// Errors raised while serving a proxy request
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Unknown action")]
    UnknownAction,

    #[error("Missing {0} param")]
    MissingParam(&'static str),

    #[error("Supabase request failed: {} {}", .status.as_u16(), .body)]
    Upstream { status: StatusCode, body: String },

    #[error("Supabase request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid Supabase response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ProxyError {
    /// HTTP status reported to the caller
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::UnknownAction | ProxyError::MissingParam(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream { status, .. } => *status,
            ProxyError::Transport(_) | ProxyError::Decode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client input errors answer with `{"message": ..}`, everything else with `{"error": ..}`
    pub fn is_client_error(&self) -> bool {
        matches!(self, ProxyError::UnknownAction | ProxyError::MissingParam(_))
    }
}
