use axum::{extract::State, http::StatusCode, response::Json};
use common::{CreateWithdrawalRequest, WithdrawalDto, format_usd};
use ledger::withdrawal::{WithdrawalRequest, list_withdrawals, request_withdrawal};
use tracing::{debug, info, instrument, trace};

use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::gate::AuthSession;
use crate::helpers::converters::withdrawal_to_dto;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// List the signed-in user's withdrawals, newest first
#[utoipa::path(
    get,
    path = "/api/v1/withdrawals",
    tag = "withdrawals",
    security(("session_token" = [])),
    responses(
        (status = 200, description = "Withdrawals retrieved successfully", body = ApiResponse<Vec<WithdrawalDto>>),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
#[instrument(skip(state, auth), fields(account_id = auth.account_id()))]
pub async fn get_withdrawals(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<ApiResponse<Vec<WithdrawalDto>>>, ApiError> {
    let withdrawals = list_withdrawals(&state.db, auth.account_id()).await?;
    debug!("Found {} withdrawals", withdrawals.len());
    let data = withdrawals.into_iter().map(withdrawal_to_dto).collect();
    Ok(Json(ApiResponse::ok(data, "Withdrawals retrieved successfully")))
}

/// Request a payout
#[utoipa::path(
    post,
    path = "/api/v1/withdrawals",
    tag = "withdrawals",
    security(("session_token" = [])),
    request_body = CreateWithdrawalRequest,
    responses(
        (status = 201, description = "Withdrawal requested", body = ApiResponse<WithdrawalDto>),
        (status = 400, description = "Below minimum, over balance or invalid request", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
#[instrument(skip(state, auth, request), fields(account_id = auth.account_id(), amount = %request.amount))]
pub async fn create_withdrawal(
    State(state): State<AppState>,
    auth: AuthSession,
    ValidatedJson(request): ValidatedJson<CreateWithdrawalRequest>,
) -> Result<(StatusCode, Json<ApiResponse<WithdrawalDto>>), ApiError> {
    trace!("Entering create_withdrawal function");
    let receipt = request_withdrawal(
        &state.db,
        auth.account_id(),
        WithdrawalRequest {
            amount: request.amount,
            paypal_email: request.paypal_email,
        },
        &state.settings.reward_policy(),
    )
    .await?;
    info!(
        "Withdrawal {} of {} requested, balance now {}",
        receipt.withdrawal.id,
        format_usd(receipt.withdrawal.amount),
        format_usd(receipt.profile.total_balance)
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            withdrawal_to_dto(receipt.withdrawal),
            "Withdrawal requested successfully",
        )),
    ))
}
