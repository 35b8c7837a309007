use rust_decimal::Decimal;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Error types for the ledger flows
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Profile {0} not found")]
    ProfileNotFound(i32),

    /// The task does not exist or is no longer active
    #[error("Task {0} not found")]
    TaskNotFound(i32),

    #[error("Task {task_id} was already completed by user {user_id}")]
    TaskAlreadyCompleted { user_id: i32, task_id: i32 },

    #[error("Profile {0} has already been referred")]
    AlreadyReferred(i32),

    #[error("Withdrawal of {amount} is below the minimum of {minimum}")]
    BelowMinimum { amount: Decimal, minimum: Decimal },

    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: Decimal, available: Decimal },

    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),

    #[error("A payout email address is required")]
    MissingPaymentEmail,

    #[error("Withdrawal {0} not found")]
    WithdrawalNotFound(i32),

    #[error("Withdrawal {id} cannot move from {from} to {to}")]
    InvalidWithdrawalTransition {
        id: i32,
        from: &'static str,
        to: &'static str,
    },

    #[error("Email {0} is already registered")]
    EmailTaken(String),

    /// Another writer changed the row between our read and our write
    #[error("Concurrent update of {entity} {id}")]
    Conflict { entity: &'static str, id: i32 },
}

/// Returns true when the database refused a write because of a unique index.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Type alias for Result with LedgerError
pub type Result<T> = std::result::Result<T, LedgerError>;
