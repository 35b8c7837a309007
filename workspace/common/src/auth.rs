use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::ProfileDto;

/// Request body for creating an account
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct SignupRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    pub confirm_password: String,
    /// Defaults to the part of the email before `@`
    #[validate(length(min = 1, max = 64))]
    pub username: Option<String>,
    /// Referral code; falls back to the `referral_code` cookie
    pub referral_code: Option<String>,
}

/// Request body for signing in
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// An active session
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SessionDto {
    /// Bearer token for the `Authorization` header
    pub token: String,
    pub user_id: i32,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignupResponse {
    pub session: SessionDto,
    pub profile: ProfileDto,
    /// True when a referral code was applied and the referrer credited
    pub referral_applied: bool,
}
