use common::{
    DashboardDto, LoginRequest, ProfileDto, ReferralDto, SessionDto, SignupRequest,
    SignupResponse, TaskCompletionDto, TaskDto, UpdateProfileRequest, WithdrawalDto,
    CreateWithdrawalRequest,
};
use model::entities::task;
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

pub use common::{ApiResponse, ErrorResponse};

use crate::config::Settings;
use crate::session::SessionStore;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Cache for the task catalogue
    pub cache: Cache<String, CachedData>,
    /// Identity service
    pub sessions: SessionStore,
    pub settings: Arc<Settings>,
}

/// Cached data types
#[derive(Clone, Debug)]
pub enum CachedData {
    ActiveTasks(Vec<task::Model>),
}

pub const ACTIVE_TASKS_KEY: &str = "active_tasks";

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::signup,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::auth::current_session,
        crate::handlers::auth::referral_redirect,
        crate::handlers::profile::get_profile,
        crate::handlers::profile::update_profile,
        crate::handlers::profile::get_referrals,
        crate::handlers::dashboard::get_dashboard,
        crate::handlers::tasks::get_tasks,
        crate::handlers::tasks::complete_task,
        crate::handlers::withdrawals::get_withdrawals,
        crate::handlers::withdrawals::create_withdrawal,
    ),
    components(
        schemas(
            ApiResponse<SignupResponse>,
            ApiResponse<SessionDto>,
            ApiResponse<ProfileDto>,
            ApiResponse<Vec<ReferralDto>>,
            ApiResponse<DashboardDto>,
            ApiResponse<Vec<TaskDto>>,
            ApiResponse<TaskCompletionDto>,
            ApiResponse<Vec<WithdrawalDto>>,
            ApiResponse<WithdrawalDto>,
            ErrorResponse,
            HealthResponse,
            SignupRequest,
            LoginRequest,
            SignupResponse,
            SessionDto,
            ProfileDto,
            UpdateProfileRequest,
            ReferralDto,
            DashboardDto,
            TaskDto,
            TaskCompletionDto,
            CreateWithdrawalRequest,
            WithdrawalDto,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Signup, login and sessions"),
        (name = "profile", description = "Profile and referrals"),
        (name = "dashboard", description = "Earnings overview"),
        (name = "tasks", description = "Paid tasks"),
        (name = "withdrawals", description = "Payout requests"),
    ),
    info(
        title = "RewardCore API",
        description = "Rewards and referral service: tasks, referral bonuses and payouts",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_token",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}
