use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Task response model
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct TaskDto {
    pub id: i32,
    pub title: String,
    pub description: String,
    #[schema(value_type = String)]
    pub reward_amount: Decimal,
    /// One of `video`, `quiz`, `survey`, `social`, `other`
    pub task_type: String,
    pub task_url: String,
    /// Whether the current user already completed the task
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct TaskCompletionDto {
    pub task_id: i32,
    #[schema(value_type = String)]
    pub earnings: Decimal,
    #[schema(value_type = String)]
    pub total_balance: Decimal,
    #[schema(value_type = String)]
    pub total_earned: Decimal,
    pub completed_at: DateTime<Utc>,
}
