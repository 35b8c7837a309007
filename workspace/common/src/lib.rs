//! Transport-layer types of the rewards API.
//! Request bodies carry their own validation rules; responses mirror the
//! stored records without internal columns such as password hashes or
//! version counters.

mod auth;
mod money;
mod profile;
mod tasks;
mod withdrawals;

pub use auth::{LoginRequest, SessionDto, SignupRequest, SignupResponse};
pub use money::format_usd;
pub use profile::{DashboardDto, ProfileDto, ReferralDto, UpdateProfileRequest};
pub use tasks::{TaskCompletionDto, TaskDto};
pub use withdrawals::{CreateWithdrawalRequest, WithdrawalDto};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Generic API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success flag
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ErrorResponse {
    /// Human readable error message
    pub error: String,
    /// Stable machine readable error code, e.g. `INSUFFICIENT_BALANCE`
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            success: false,
        }
    }
}
