use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for a payout
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateWithdrawalRequest {
    #[schema(value_type = String)]
    pub amount: Decimal,
    #[validate(email)]
    pub paypal_email: String,
}

/// Withdrawal response model
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct WithdrawalDto {
    pub id: i32,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub paypal_email: String,
    /// One of `pending`, `completed`, `rejected`
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}
