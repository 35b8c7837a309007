use axum::{extract::State, response::Json};
use common::{ProfileDto, ReferralDto, UpdateProfileRequest};
use ledger::{profile::find_profile, referral::list_referrals};
use model::entities::profile;
use sea_orm::{ActiveModelTrait, IntoActiveModel, Set};
use tracing::{debug, info, instrument, trace};

use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::gate::AuthSession;
use crate::helpers::converters::{profile_to_dto, referral_to_dto};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Get the signed-in user's profile
#[utoipa::path(
    get,
    path = "/api/v1/profile",
    tag = "profile",
    security(("session_token" = [])),
    responses(
        (status = 200, description = "Profile retrieved successfully", body = ApiResponse<ProfileDto>),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 404, description = "Profile not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, auth), fields(account_id = auth.account_id()))]
pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<ApiResponse<ProfileDto>>, ApiError> {
    trace!("Entering get_profile function");
    let model = find_profile(&state.db, auth.account_id()).await?;
    Ok(Json(ApiResponse::ok(
        profile_to_dto(model, &state.settings.public_base_url),
        "Profile retrieved successfully",
    )))
}

/// Update the signed-in user's profile
#[utoipa::path(
    put,
    path = "/api/v1/profile",
    tag = "profile",
    security(("session_token" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated successfully", body = ApiResponse<ProfileDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
#[instrument(skip(state, auth, request), fields(account_id = auth.account_id()))]
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthSession,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<ProfileDto>>, ApiError> {
    trace!("Entering update_profile function");
    let model = find_profile(&state.db, auth.account_id()).await?;

    let Some(username) = request.username.map(|name| name.trim().to_string()) else {
        debug!("Nothing to update");
        return Ok(Json(ApiResponse::ok(
            profile_to_dto(model, &state.settings.public_base_url),
            "Profile unchanged",
        )));
    };
    if username.is_empty() {
        return Err(ApiError::Validation("Username must not be blank".to_string()));
    }

    // Only the name changes here; balance columns are owned by the ledger.
    let mut active: profile::ActiveModel = model.into_active_model();
    active.username = Set(username);
    let updated = active.update(&state.db).await?;
    info!("Profile {} renamed to {}", updated.id, updated.username);

    Ok(Json(ApiResponse::ok(
        profile_to_dto(updated, &state.settings.public_base_url),
        "Profile updated successfully",
    )))
}

/// List the users referred by the signed-in user
#[utoipa::path(
    get,
    path = "/api/v1/profile/referrals",
    tag = "profile",
    security(("session_token" = [])),
    responses(
        (status = 200, description = "Referrals retrieved successfully", body = ApiResponse<Vec<ReferralDto>>),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
#[instrument(skip(state, auth), fields(account_id = auth.account_id()))]
pub async fn get_referrals(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<ApiResponse<Vec<ReferralDto>>>, ApiError> {
    let referrals = list_referrals(&state.db, auth.account_id()).await?;
    debug!("Found {} referrals", referrals.len());
    let data = referrals.into_iter().map(referral_to_dto).collect();
    Ok(Json(ApiResponse::ok(data, "Referrals retrieved successfully")))
}
