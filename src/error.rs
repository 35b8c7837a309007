use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use ledger::LedgerError;
use sea_orm::DbErr;
use thiserror::Error;
use tracing::{error, warn};

use crate::schemas::ErrorResponse;
use crate::session::IdentityError;

/// Where unauthenticated clients are sent to sign in.
pub const LOGIN_LOCATION: &str = "/auth?mode=login";

/// Error returned by HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl ApiError {
    /// HTTP status and stable error code of this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            ApiError::Ledger(err) => ledger_status(err),
            ApiError::Identity(err) => match err {
                IdentityError::PasswordMismatch => (StatusCode::BAD_REQUEST, "PASSWORD_MISMATCH"),
                IdentityError::WeakPassword(_) => (StatusCode::BAD_REQUEST, "WEAK_PASSWORD"),
                IdentityError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
                IdentityError::EmailTaken(_) => (StatusCode::CONFLICT, "EMAIL_TAKEN"),
                IdentityError::Hashing(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
                IdentityError::Ledger(err) => ledger_status(err),
                IdentityError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            },
        }
    }
}

fn ledger_status(err: &LedgerError) -> (StatusCode, &'static str) {
    match err {
        LedgerError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
        LedgerError::ProfileNotFound(_) => (StatusCode::NOT_FOUND, "PROFILE_NOT_FOUND"),
        LedgerError::TaskNotFound(_) => (StatusCode::NOT_FOUND, "TASK_NOT_FOUND"),
        LedgerError::TaskAlreadyCompleted { .. } => (StatusCode::CONFLICT, "TASK_ALREADY_COMPLETED"),
        LedgerError::AlreadyReferred(_) => (StatusCode::CONFLICT, "ALREADY_REFERRED"),
        LedgerError::BelowMinimum { .. } => (StatusCode::BAD_REQUEST, "BELOW_MINIMUM"),
        LedgerError::InsufficientBalance { .. } => (StatusCode::BAD_REQUEST, "INSUFFICIENT_BALANCE"),
        LedgerError::InvalidAmount(_) => (StatusCode::BAD_REQUEST, "INVALID_AMOUNT"),
        LedgerError::MissingPaymentEmail => (StatusCode::BAD_REQUEST, "MISSING_PAYMENT_EMAIL"),
        LedgerError::WithdrawalNotFound(_) => (StatusCode::NOT_FOUND, "WITHDRAWAL_NOT_FOUND"),
        LedgerError::InvalidWithdrawalTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
        LedgerError::EmailTaken(_) => (StatusCode::CONFLICT, "EMAIL_TAKEN"),
        LedgerError::Conflict { .. } => (StatusCode::CONFLICT, "CONFLICT"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected with {}: {}", code, self);
        }

        // Internal details stay in the logs.
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = Json(ErrorResponse::new(code, message));

        match self {
            ApiError::Unauthenticated => {
                (status, [(header::LOCATION, LOGIN_LOCATION)], body).into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}
