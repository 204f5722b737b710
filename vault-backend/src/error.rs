//! Error types for the vault backend

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use yield_vault::{ErrorKind, VaultError};

/// Backend error types
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid proof: {0}")]
    InvalidProof(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API key may not act as signer {0}")]
    SignerNotAllowed(String),

    #[error(transparent)]
    Vault(#[from] VaultError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl BackendError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            BackendError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            BackendError::InvalidAddress(_) => (StatusCode::BAD_REQUEST, "INVALID_ADDRESS"),
            BackendError::InvalidProof(_) => (StatusCode::BAD_REQUEST, "INVALID_PROOF"),
            BackendError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            BackendError::SignerNotAllowed(_) => (StatusCode::FORBIDDEN, "SIGNER_NOT_ALLOWED"),
            BackendError::Vault(VaultError::VaultNotFound(_)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            }
            BackendError::Vault(err) if err.is_retryable() => {
                (StatusCode::CONFLICT, "RETRY_LATER")
            }
            BackendError::Vault(err) => match err.kind() {
                ErrorKind::InputValidation => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
                ErrorKind::Authorization => (StatusCode::FORBIDDEN, "UNAUTHORIZED"),
                ErrorKind::StatePrecondition => (StatusCode::CONFLICT, "PRECONDITION_FAILED"),
                ErrorKind::ExternalCall => (StatusCode::BAD_GATEWAY, "EXTERNAL_CALL_FAILED"),
                ErrorKind::Arithmetic => (StatusCode::UNPROCESSABLE_ENTITY, "ARITHMETIC_ERROR"),
            },
        }
    }
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, code, "Request rejected");
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}

/// Result type alias for backend operations
pub type Result<T> = std::result::Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;
    use yield_vault::Role;

    #[test]
    fn test_vault_errors_map_by_kind() {
        let cases = [
            (VaultError::ZeroAmount, StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            (
                VaultError::MissingRole(Role::Executor),
                StatusCode::FORBIDDEN,
                "UNAUTHORIZED",
            ),
            (
                VaultError::AlreadyClaimed,
                StatusCode::CONFLICT,
                "PRECONDITION_FAILED",
            ),
            (
                VaultError::ProviderFailure("down".into()),
                StatusCode::BAD_GATEWAY,
                "EXTERNAL_CALL_FAILED",
            ),
            (
                VaultError::MathOverflow,
                StatusCode::UNPROCESSABLE_ENTITY,
                "ARITHMETIC_ERROR",
            ),
            (VaultError::VaultNotFound(3), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (
                VaultError::TransactionLocked { eta: 10 },
                StatusCode::CONFLICT,
                "RETRY_LATER",
            ),
        ];

        for (err, status, code) in cases {
            assert_eq!(BackendError::from(err).status_and_code(), (status, code));
        }
    }

    #[test]
    fn test_foreign_signer_is_forbidden() {
        let err = BackendError::SignerNotAllowed("alice".into());
        assert_eq!(
            err.status_and_code(),
            (StatusCode::FORBIDDEN, "SIGNER_NOT_ALLOWED")
        );
    }

    #[test]
    fn test_vault_error_message_passes_through() {
        let err = BackendError::from(VaultError::InsufficientShares);
        assert_eq!(err.to_string(), "Insufficient shares balance");
    }
}
