use axum::{extract::State, response::Json};
use common::DashboardDto;
use ledger::{profile::find_profile, task::count_completed};
use tracing::{debug, instrument};

use crate::error::ApiError;
use crate::gate::AuthSession;
use crate::helpers::converters::dashboard_to_dto;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Earnings, referral stats and prize draw progress
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    tag = "dashboard",
    security(("session_token" = [])),
    responses(
        (status = 200, description = "Dashboard retrieved successfully", body = ApiResponse<DashboardDto>),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 404, description = "Profile not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, auth), fields(account_id = auth.account_id()))]
pub async fn get_dashboard(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<ApiResponse<DashboardDto>>, ApiError> {
    let profile = find_profile(&state.db, auth.account_id()).await?;
    let completed = count_completed(&state.db, auth.account_id()).await?;
    debug!(
        "Profile {} has {} referrals and {} completed tasks",
        profile.id, profile.referral_count, completed
    );

    Ok(Json(ApiResponse::ok(
        dashboard_to_dto(profile, completed, &state.settings),
        "Dashboard retrieved successfully",
    )))
}
