use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use strum_macros::{AsRefStr, Display};
use thiserror::Error;

/// The collaborators a read or write can fail against.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Store {
    Generic,
    Leave,
    EarlyDeparture,
    Lateness,
    Directory,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{store} source unavailable: {cause}")]
    SourceUnavailable {
        store: Store,
        #[source]
        cause: sqlx::Error,
    },

    #[error("request {0} not found")]
    NotFound(String),

    #[error("{0}")]
    Invalid(String),
}

impl EngineError {
    pub fn unavailable(store: Store) -> impl FnOnce(sqlx::Error) -> Self {
        move |cause| EngineError::SourceUnavailable { store, cause }
    }
}

impl ResponseError for EngineError {
    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::SourceUnavailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Invalid(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            EngineError::SourceUnavailable { store, cause } => {
                tracing::error!(error = %cause, store = %store, "Source unavailable");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}
