use crate::handlers::{
    auth::{current_session, login, logout, referral_redirect, signup},
    dashboard::get_dashboard,
    health::health_check,
    profile::{get_profile, get_referrals, update_profile},
    tasks::{complete_task, get_tasks},
    withdrawals::{create_withdrawal, get_withdrawals},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Referral links
        .route("/ref/:code", get(referral_redirect))
        // Auth routes
        .route("/api/v1/auth/signup", post(signup))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/logout", post(logout))
        .route("/api/v1/auth/session", get(current_session))
        // Profile routes
        .route("/api/v1/profile", get(get_profile).put(update_profile))
        .route("/api/v1/profile/referrals", get(get_referrals))
        .route("/api/v1/dashboard", get(get_dashboard))
        // Task routes
        .route("/api/v1/tasks", get(get_tasks))
        .route("/api/v1/tasks/:task_id/complete", post(complete_task))
        // Withdrawal routes
        .route("/api/v1/withdrawals", get(get_withdrawals).post(create_withdrawal))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
