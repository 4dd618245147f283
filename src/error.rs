use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by the payroll engine and its store.
#[derive(Debug, Error)]
pub enum PayrollError {
    /// Rejected before any computation begins.
    #[error("{0}")]
    Validation(String),

    #[error("payroll period {year}-{month:02} is already locked")]
    Conflict { year: i32, month: u32 },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    /// A transaction could not be completed atomically and was rolled back.
    #[error("integrity violation: {0}")]
    Integrity(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl PayrollError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: u64) -> Self {
        Self::NotFound { entity, id }
    }
}

impl ResponseError for PayrollError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Integrity(_) | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            Self::Database(e) => {
                tracing::error!(error = %e, "Database error");
                "Internal Server Error".to_string()
            }
            Self::Integrity(reason) => {
                tracing::error!(reason = %reason, "Payroll transaction rolled back");
                self.to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}
