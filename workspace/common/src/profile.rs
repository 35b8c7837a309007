use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Profile response model
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ProfileDto {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub referral_code: String,
    /// Link to share, e.g. `https://rewards.example.com/ref/K7Q2M9XA`
    pub referral_link: String,
    pub referred_by: Option<i32>,
    #[schema(value_type = String)]
    pub total_balance: Decimal,
    #[schema(value_type = String)]
    pub total_earned: Decimal,
    pub referral_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Request body for updating the profile
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, Default)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: Option<String>,
}

/// A referral made by the current user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ReferralDto {
    pub id: i32,
    pub referred_id: i32,
    pub referred_username: Option<String>,
    #[schema(value_type = String)]
    pub bonus: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Overview shown on the dashboard
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct DashboardDto {
    pub username: String,
    #[schema(value_type = String)]
    pub total_balance: Decimal,
    #[schema(value_type = String)]
    pub total_earned: Decimal,
    pub referral_count: i32,
    pub completed_tasks: u64,
    /// Prize draw entries earned through referrals
    pub prize_draw_entries: i32,
    pub prize_draw_unlocked: bool,
    /// Referrals still needed to unlock the prize draw
    pub referrals_until_unlock: i32,
    pub referral_link: String,
}
