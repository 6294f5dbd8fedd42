//! Error responses shared by the API handlers.

use axum::{http::StatusCode, Json};
use serde::Serialize;
use tracing::warn;
use turnos_core::{BackendError, CacheError, TransitionError, ValidationError};

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler error: status plus JSON body.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub fn not_found(what: &str, id: &str) -> ApiError {
    error(StatusCode::NOT_FOUND, format!("{} not found: {}", what, id))
}

pub fn validation(e: ValidationError) -> ApiError {
    error(StatusCode::BAD_REQUEST, e.to_string())
}

/// Backend failures keep their message. Client errors reported by the
/// backend keep their status; everything else is a bad gateway.
pub fn backend(e: BackendError) -> ApiError {
    let status = e
        .status()
        .filter(|s| (400..500).contains(s))
        .and_then(|s| StatusCode::from_u16(s).ok())
        .unwrap_or(StatusCode::BAD_GATEWAY);

    if status == StatusCode::BAD_GATEWAY {
        warn!(error = %e, "Backend request failed");
    }

    let message = match e {
        BackendError::Api { message, .. } => message,
        other => other.to_string(),
    };
    error(status, message)
}

/// Transitions rejected locally, before the backend is involved.
pub fn cache(e: CacheError) -> ApiError {
    match e {
        CacheError::TicketNotFound(id) => not_found("Ticket", &id),
        CacheError::Transition(e @ TransitionError::InvalidTransition { .. }) => {
            error(StatusCode::CONFLICT, e.to_string())
        }
        CacheError::Transition(e @ TransitionError::MissingTable { .. }) => {
            error(StatusCode::BAD_REQUEST, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turnos_core::{TicketStatus, TransitionKind};

    #[test]
    fn test_backend_client_error_passes_through() {
        let (status, Json(body)) = backend(BackendError::api(409, "Este número de mesa ya está en uso"));
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.error, "Este número de mesa ya está en uso");
    }

    #[test]
    fn test_backend_server_error_is_bad_gateway() {
        let (status, Json(body)) = backend(BackendError::api(500, "boom"));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.error, "boom");

        let (status, _) = backend(BackendError::Timeout);
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_invalid_transition_is_conflict() {
        let (status, _) = cache(CacheError::Transition(TransitionError::InvalidTransition {
            ticket_id: "t1".to_string(),
            from: TicketStatus::Completed,
            transition: TransitionKind::Cancel,
        }));
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = cache(CacheError::TicketNotFound("t9".to_string()));
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
