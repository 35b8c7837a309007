use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Json, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use common::{LoginRequest, SessionDto, SignupRequest, SignupResponse};
use ledger::{profile::normalize_referral_code, referral::ReferralOutcome};
use tracing::{debug, info, instrument, trace};

use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::gate::{AuthSession, SESSION_COOKIE};
use crate::helpers::converters::{profile_to_dto, session_to_dto};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use crate::session::SignUp;

/// Cookie holding the code of a referral link until the visitor signs up.
pub const REFERRAL_COOKIE: &str = "referral_code";
pub const SIGNUP_LOCATION: &str = "/auth?mode=signup";

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn removal(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

/// Create an account
///
/// A referral code in the body takes precedence over the one remembered
/// from a referral link.
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<SignupResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, jar, request), fields(email = %request.email))]
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(request): ValidatedJson<SignupRequest>,
) -> Result<(StatusCode, CookieJar, Json<ApiResponse<SignupResponse>>), ApiError> {
    trace!("Entering signup function");
    let referral_code = request
        .referral_code
        .filter(|code| !code.trim().is_empty())
        .or_else(|| jar.get(REFERRAL_COOKIE).map(|cookie| cookie.value().to_string()));
    debug!("Pending referral code: {:?}", referral_code);

    let signed_up = state
        .sessions
        .sign_up(SignUp {
            email: request.email,
            password: request.password,
            confirm_password: request.confirm_password,
            username: request.username,
            referral_code,
        })
        .await?;

    let referral_applied = matches!(
        signed_up.registration.referral,
        Some(ReferralOutcome::Credited { .. })
    );
    info!(
        "Account {} created, referral applied: {}",
        signed_up.registration.account.id, referral_applied
    );

    let jar = jar
        .remove(removal(REFERRAL_COOKIE))
        .add(session_cookie(signed_up.session.token.clone()));
    let response = ApiResponse::ok(
        SignupResponse {
            session: session_to_dto(signed_up.session),
            profile: profile_to_dto(signed_up.registration.profile, &state.settings.public_base_url),
            referral_applied,
        },
        "Account created successfully",
    );
    Ok((StatusCode::CREATED, jar, Json(response)))
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = ApiResponse<SessionDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
#[instrument(skip(state, jar, request), fields(email = %request.email))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<SessionDto>>), ApiError> {
    trace!("Entering login function");
    let session = state.sessions.sign_in(&request.email, &request.password).await?;
    let jar = jar.add(session_cookie(session.token.clone()));
    Ok((jar, Json(ApiResponse::ok(session_to_dto(session), "Signed in successfully"))))
}

/// Sign out of the current session
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "auth",
    security(("session_token" = [])),
    responses(
        (status = 204, description = "Signed out"),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
#[instrument(skip(state, auth, jar), fields(account_id = auth.account_id()))]
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthSession,
    jar: CookieJar,
) -> Result<(StatusCode, CookieJar), ApiError> {
    trace!("Entering logout function");
    state.sessions.sign_out(auth.token()).await?;
    Ok((StatusCode::NO_CONTENT, jar.remove(removal(SESSION_COOKIE))))
}

/// Get the current session
#[utoipa::path(
    get,
    path = "/api/v1/auth/session",
    tag = "auth",
    security(("session_token" = [])),
    responses(
        (status = 200, description = "Current session", body = ApiResponse<SessionDto>),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
#[instrument(skip(auth), fields(account_id = auth.account_id()))]
pub async fn current_session(auth: AuthSession) -> Json<ApiResponse<SessionDto>> {
    Json(ApiResponse::ok(session_to_dto(auth.0), "Session retrieved successfully"))
}

/// Follow a referral link
///
/// Remembers the code in a cookie and sends the visitor to the signup page.
#[utoipa::path(
    get,
    path = "/ref/{code}",
    tag = "auth",
    params(
        ("code" = String, Path, description = "Referral code"),
    ),
    responses(
        (status = 303, description = "Redirect to signup")
    )
)]
#[instrument(skip(jar))]
pub async fn referral_redirect(Path(code): Path<String>, jar: CookieJar) -> (CookieJar, Redirect) {
    let code = normalize_referral_code(&code);
    debug!("Remembering referral code {}", code);
    let cookie = Cookie::build((REFERRAL_COOKIE, code))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    (jar.add(cookie), Redirect::to(SIGNUP_LOCATION))
}
