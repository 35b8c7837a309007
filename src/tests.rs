#[cfg(test)]
mod integration_tests {
    use crate::schemas::{ApiResponse, AppState, ErrorResponse};
    use crate::test_utils::test_utils::{init_test_tracing, setup_test_app};
    use axum::http::{
        HeaderValue, StatusCode,
        header::{AUTHORIZATION, COOKIE, LOCATION, SET_COOKIE},
    };
    use axum_test::TestServer;
    use common::{
        DashboardDto, ProfileDto, ReferralDto, SessionDto, SignupRequest, SignupResponse,
        TaskCompletionDto, TaskDto, WithdrawalDto,
    };
    use model::entities::{profile, withdrawal};
    use rust_decimal::Decimal;
    use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, PaginatorTrait, Set};
    use serde_json::json;

    async fn test_server() -> (TestServer, AppState) {
        let _ = init_test_tracing();
        let (app, state) = setup_test_app().await;
        (TestServer::new(app).unwrap(), state)
    }

    fn signup_request(email: &str) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
            username: None,
            referral_code: None,
        }
    }

    fn bearer(token: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
    }

    fn set_cookies(response: &axum_test::TestResponse) -> Vec<String> {
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|value| value.to_str().unwrap().to_string())
            .collect()
    }

    async fn sign_up(server: &TestServer, request: &SignupRequest) -> SignupResponse {
        let response = server.post("/api/v1/auth/signup").json(request).await;
        if response.status_code() != StatusCode::CREATED {
            println!("Error response: {}", response.text());
            panic!("Expected 201 Created, got {}", response.status_code());
        }
        let body: ApiResponse<SignupResponse> = response.json();
        body.data
    }

    async fn load_profile(state: &AppState, id: i32) -> profile::Model {
        profile::Entity::find_by_id(id)
            .one(&state.db)
            .await
            .unwrap()
            .unwrap()
    }

    /// Gives a profile a known referral code and balance, bypassing the ledger.
    async fn set_profile_state(state: &AppState, id: i32, code: &str, balance: Decimal, referrals: i32) {
        let mut active = load_profile(state, id).await.into_active_model();
        active.referral_code = Set(code.to_string());
        active.total_balance = Set(balance);
        active.total_earned = Set(balance);
        active.referral_count = Set(referrals);
        active.update(&state.db).await.unwrap();
    }

    #[tokio::test]
    async fn test_health_check() {
        let (server, _) = test_server().await;

        let response = server.get("/health").await;

        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(body["database"], "connected");
    }

    #[tokio::test]
    async fn test_signup_creates_profile_and_session() {
        let (server, state) = test_server().await;

        let response = server
            .post("/api/v1/auth/signup")
            .json(&signup_request("Jane@Example.com"))
            .await;

        response.assert_status(StatusCode::CREATED);
        let cookies = set_cookies(&response);
        let body: ApiResponse<SignupResponse> = response.json();
        assert!(body.success);
        assert_eq!(body.message, "Account created successfully");

        let signed_up = body.data;
        assert!(!signed_up.referral_applied);
        assert_eq!(signed_up.session.email, "jane@example.com");
        assert_eq!(signed_up.profile.username, "jane");
        assert_eq!(signed_up.profile.total_balance, Decimal::ZERO);
        assert_eq!(signed_up.profile.referral_code.len(), 8);
        assert_eq!(
            signed_up.profile.referral_link,
            format!("http://localhost:3000/ref/{}", signed_up.profile.referral_code)
        );
        assert!(
            cookies
                .iter()
                .any(|c| c.starts_with(&format!("session_token={}", signed_up.session.token)))
        );

        let referrals = model::entities::referral::Entity::find().count(&state.db).await.unwrap();
        assert_eq!(referrals, 0);
    }

    #[tokio::test]
    async fn test_signup_validation_errors() {
        let (server, _) = test_server().await;

        let mut mismatch = signup_request("a@b.com");
        mismatch.confirm_password = "secret2".to_string();
        let response = server.post("/api/v1/auth/signup").json(&mismatch).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "PASSWORD_MISMATCH");
        assert!(!body.success);

        let mut weak = signup_request("a@b.com");
        weak.password = "abc".to_string();
        weak.confirm_password = "abc".to_string();
        let response = server.post("/api/v1/auth/signup").json(&weak).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "WEAK_PASSWORD");

        let response = server
            .post("/api/v1/auth/signup")
            .json(&signup_request("not-an-email"))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "VALIDATION_ERROR");
        assert!(body.error.contains("email"));
    }

    #[tokio::test]
    async fn test_unreadable_bodies_use_error_envelope() {
        let (server, _) = test_server().await;

        let response = server
            .post("/api/v1/auth/signup")
            .json(&json!({ "email": "a@b.com" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "VALIDATION_ERROR");
        assert!(body.error.contains("password"));
        assert!(!body.success);

        let signed_up = sign_up(&server, &signup_request("a@b.com")).await;
        let response = server
            .post("/api/v1/withdrawals")
            .add_header(AUTHORIZATION, bearer(&signed_up.session.token))
            .json(&json!({ "paypal_email": "a@b.com" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "VALIDATION_ERROR");
        assert!(body.error.contains("amount"));
    }

    #[tokio::test]
    async fn test_signup_duplicate_email() {
        let (server, _) = test_server().await;
        sign_up(&server, &signup_request("a@b.com")).await;

        let response = server
            .post("/api/v1/auth/signup")
            .json(&signup_request("a@b.com"))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn test_signup_with_referral_code_credits_referrer() {
        let (server, state) = test_server().await;
        let referrer = sign_up(&server, &signup_request("referrer@b.com")).await;
        set_profile_state(&state, referrer.profile.id, "ABC123", Decimal::new(100, 2), 2).await;

        let mut request = signup_request("friend@b.com");
        request.referral_code = Some("ABC123".to_string());
        let referred = sign_up(&server, &request).await;

        assert!(referred.referral_applied);
        assert_eq!(referred.profile.referred_by, Some(referrer.profile.id));

        let updated = load_profile(&state, referrer.profile.id).await;
        assert_eq!(updated.referral_count, 3);
        assert_eq!(updated.total_balance, Decimal::new(120, 2));
        assert_eq!(updated.total_earned, Decimal::new(120, 2));

        let response = server
            .get("/api/v1/profile/referrals")
            .add_header(AUTHORIZATION, bearer(&referrer.session.token))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<ReferralDto>> = response.json();
        assert_eq!(body.data.len(), 1);
        assert_eq!(body.data[0].referred_id, referred.profile.id);
        assert_eq!(body.data[0].referred_username.as_deref(), Some("friend"));
        assert_eq!(body.data[0].bonus, Decimal::new(20, 2));
    }

    #[tokio::test]
    async fn test_unknown_referral_code_does_not_block_signup() {
        let (server, state) = test_server().await;

        let mut request = signup_request("friend@b.com");
        request.referral_code = Some("NOPE0000".to_string());
        let referred = sign_up(&server, &request).await;

        assert!(!referred.referral_applied);
        assert_eq!(referred.profile.referred_by, None);
        let referrals = model::entities::referral::Entity::find().count(&state.db).await.unwrap();
        assert_eq!(referrals, 0);
    }

    #[tokio::test]
    async fn test_referral_link_cookie_flow() {
        let (server, state) = test_server().await;
        let referrer = sign_up(&server, &signup_request("referrer@b.com")).await;
        let code = referrer.profile.referral_code.clone();

        let response = server.get(&format!("/ref/{}", code.to_lowercase())).await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/auth?mode=signup");
        let cookie = set_cookies(&response)
            .into_iter()
            .find(|c| c.starts_with("referral_code="))
            .expect("referral cookie");
        assert!(cookie.starts_with(&format!("referral_code={}", code)));

        let response = server
            .post("/api/v1/auth/signup")
            .add_header(COOKIE, HeaderValue::from_str(&format!("referral_code={}", code)).unwrap())
            .json(&signup_request("friend@b.com"))
            .await;
        response.assert_status(StatusCode::CREATED);

        // The pending code is cleared once used.
        let cookies = set_cookies(&response);
        assert!(cookies.iter().any(|c| c.starts_with("referral_code=;")));
        let body: ApiResponse<SignupResponse> = response.json();
        assert!(body.data.referral_applied);

        let updated = load_profile(&state, referrer.profile.id).await;
        assert_eq!(updated.referral_count, 1);
        assert_eq!(updated.total_balance, Decimal::new(20, 2));
    }

    #[tokio::test]
    async fn test_protected_endpoints_require_session() {
        let (server, _) = test_server().await;

        for path in [
            "/api/v1/profile",
            "/api/v1/profile/referrals",
            "/api/v1/dashboard",
            "/api/v1/tasks",
            "/api/v1/withdrawals",
            "/api/v1/auth/session",
        ] {
            let response = server.get(path).await;
            response.assert_status(StatusCode::UNAUTHORIZED);
            assert_eq!(response.headers()[LOCATION], "/auth?mode=login");
            let body: ErrorResponse = response.json();
            assert_eq!(body.code, "UNAUTHENTICATED", "path {}", path);
        }

        let response = server
            .get("/api/v1/profile")
            .add_header(AUTHORIZATION, bearer("not-a-real-token"))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        let response = server.post("/api/v1/tasks/1/complete").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_session_cookie_is_accepted() {
        let (server, _) = test_server().await;
        let signed_up = sign_up(&server, &signup_request("a@b.com")).await;

        let response = server
            .get("/api/v1/auth/session")
            .add_header(
                COOKIE,
                HeaderValue::from_str(&format!("session_token={}", signed_up.session.token)).unwrap(),
            )
            .await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<SessionDto> = response.json();
        assert_eq!(body.data.user_id, signed_up.profile.id);
        assert_eq!(body.data.email, "a@b.com");
    }

    #[tokio::test]
    async fn test_login_and_logout() {
        let (server, _) = test_server().await;
        sign_up(&server, &signup_request("a@b.com")).await;

        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({ "email": "a@b.com", "password": "wrong-one" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "INVALID_CREDENTIALS");

        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({ "email": "a@b.com", "password": "secret1" }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<SessionDto> = response.json();
        let token = body.data.token;

        server
            .get("/api/v1/profile")
            .add_header(AUTHORIZATION, bearer(&token))
            .await
            .assert_status(StatusCode::OK);

        server
            .post("/api/v1/auth/logout")
            .add_header(AUTHORIZATION, bearer(&token))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        server
            .get("/api/v1/profile")
            .add_header(AUTHORIZATION, bearer(&token))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_update_profile_username() {
        let (server, _) = test_server().await;
        let signed_up = sign_up(&server, &signup_request("a@b.com")).await;

        let response = server
            .put("/api/v1/profile")
            .add_header(AUTHORIZATION, bearer(&signed_up.session.token))
            .json(&json!({ "username": "  Rewards Fan " }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<ProfileDto> = response.json();
        assert_eq!(body.data.username, "Rewards Fan");
        assert_eq!(body.data.total_balance, Decimal::ZERO);

        let response = server
            .put("/api/v1/profile")
            .add_header(AUTHORIZATION, bearer(&signed_up.session.token))
            .json(&json!({ "username": "   " }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_tasks_are_listed_by_reward() {
        let (server, _) = test_server().await;
        let signed_up = sign_up(&server, &signup_request("a@b.com")).await;

        let response = server
            .get("/api/v1/tasks")
            .add_header(AUTHORIZATION, bearer(&signed_up.session.token))
            .await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<TaskDto>> = response.json();
        let titles: Vec<&str> = body.data.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Weekly survey", "Watch the intro video"]);
        assert!(body.data.iter().all(|t| !t.completed));
        assert_eq!(body.data[0].task_type, "survey");
    }

    #[tokio::test]
    async fn test_complete_task_once() {
        let (server, state) = test_server().await;
        let signed_up = sign_up(&server, &signup_request("a@b.com")).await;
        let token = signed_up.session.token.clone();

        let tasks: ApiResponse<Vec<TaskDto>> = server
            .get("/api/v1/tasks")
            .add_header(AUTHORIZATION, bearer(&token))
            .await
            .json();
        let survey = tasks.data[0].clone();

        let response = server
            .post(&format!("/api/v1/tasks/{}/complete", survey.id))
            .add_header(AUTHORIZATION, bearer(&token))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<TaskCompletionDto> = response.json();
        assert_eq!(body.data.earnings, Decimal::new(50, 2));
        assert_eq!(body.data.total_balance, Decimal::new(50, 2));
        assert_eq!(body.data.total_earned, Decimal::new(50, 2));

        let response = server
            .post(&format!("/api/v1/tasks/{}/complete", survey.id))
            .add_header(AUTHORIZATION, bearer(&token))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "TASK_ALREADY_COMPLETED");

        let profile = load_profile(&state, signed_up.profile.id).await;
        assert_eq!(profile.total_balance, Decimal::new(50, 2));

        let tasks: ApiResponse<Vec<TaskDto>> = server
            .get("/api/v1/tasks")
            .add_header(AUTHORIZATION, bearer(&token))
            .await
            .json();
        let completed: Vec<bool> = tasks.data.iter().map(|t| t.completed).collect();
        assert_eq!(completed, vec![true, false]);
    }

    #[tokio::test]
    async fn test_complete_unknown_or_inactive_task() {
        let (server, _) = test_server().await;
        let signed_up = sign_up(&server, &signup_request("a@b.com")).await;

        // Task 3 is the retired quiz seeded by the test state.
        for task_id in [3, 999] {
            let response = server
                .post(&format!("/api/v1/tasks/{}/complete", task_id))
                .add_header(AUTHORIZATION, bearer(&signed_up.session.token))
                .await;
            response.assert_status(StatusCode::NOT_FOUND);
            let body: ErrorResponse = response.json();
            assert_eq!(body.code, "TASK_NOT_FOUND");
        }
    }

    #[tokio::test]
    async fn test_withdrawal_debits_balance() {
        let (server, state) = test_server().await;
        let signed_up = sign_up(&server, &signup_request("a@b.com")).await;
        let code = signed_up.profile.referral_code.clone();
        set_profile_state(&state, signed_up.profile.id, &code, Decimal::new(500, 2), 0).await;

        let response = server
            .post("/api/v1/withdrawals")
            .add_header(AUTHORIZATION, bearer(&signed_up.session.token))
            .json(&json!({ "amount": "3.00", "paypal_email": "a@b.com" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<WithdrawalDto> = response.json();
        assert_eq!(body.data.amount, Decimal::new(300, 2));
        assert_eq!(body.data.status, "pending");
        assert_eq!(body.data.processed_at, None);

        let profile = load_profile(&state, signed_up.profile.id).await;
        assert_eq!(profile.total_balance, Decimal::new(200, 2));
        assert_eq!(profile.total_earned, Decimal::new(500, 2));

        let response = server
            .get("/api/v1/withdrawals")
            .add_header(AUTHORIZATION, bearer(&signed_up.session.token))
            .await;
        let body: ApiResponse<Vec<WithdrawalDto>> = response.json();
        assert_eq!(body.data.len(), 1);
        assert_eq!(body.data[0].paypal_email, "a@b.com");
    }

    #[tokio::test]
    async fn test_withdrawal_rejections_create_nothing() {
        let (server, state) = test_server().await;
        let signed_up = sign_up(&server, &signup_request("a@b.com")).await;
        let code = signed_up.profile.referral_code.clone();
        set_profile_state(&state, signed_up.profile.id, &code, Decimal::new(500, 2), 0).await;

        let cases = [
            (json!({ "amount": "1.99", "paypal_email": "a@b.com" }), "BELOW_MINIMUM"),
            (json!({ "amount": "5.01", "paypal_email": "a@b.com" }), "INSUFFICIENT_BALANCE"),
            (json!({ "amount": "-3", "paypal_email": "a@b.com" }), "INVALID_AMOUNT"),
            (json!({ "amount": "2.00005", "paypal_email": "a@b.com" }), "INVALID_AMOUNT"),
        ];
        for (request, code) in cases {
            let response = server
                .post("/api/v1/withdrawals")
                .add_header(AUTHORIZATION, bearer(&signed_up.session.token))
                .json(&request)
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
            let body: ErrorResponse = response.json();
            assert_eq!(body.code, code);
        }

        let response = server
            .post("/api/v1/withdrawals")
            .add_header(AUTHORIZATION, bearer(&signed_up.session.token))
            .json(&json!({ "amount": "3.00", "paypal_email": "" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "VALIDATION_ERROR");

        let stored = withdrawal::Entity::find().count(&state.db).await.unwrap();
        assert_eq!(stored, 0);
        let profile = load_profile(&state, signed_up.profile.id).await;
        assert_eq!(profile.total_balance, Decimal::new(500, 2));
    }

    #[tokio::test]
    async fn test_dashboard_reports_progress() {
        let (server, state) = test_server().await;
        let signed_up = sign_up(&server, &signup_request("a@b.com")).await;
        let code = signed_up.profile.referral_code.clone();
        set_profile_state(&state, signed_up.profile.id, &code, Decimal::new(150, 2), 2).await;

        server
            .post("/api/v1/tasks/1/complete")
            .add_header(AUTHORIZATION, bearer(&signed_up.session.token))
            .await
            .assert_status(StatusCode::OK);

        let response = server
            .get("/api/v1/dashboard")
            .add_header(AUTHORIZATION, bearer(&signed_up.session.token))
            .await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<DashboardDto> = response.json();
        let dashboard = body.data;
        assert_eq!(dashboard.total_balance, Decimal::new(155, 2));
        assert_eq!(dashboard.completed_tasks, 1);
        assert_eq!(dashboard.referral_count, 2);
        assert_eq!(dashboard.prize_draw_entries, 10);
        assert!(!dashboard.prize_draw_unlocked);
        assert_eq!(dashboard.referrals_until_unlock, 3);
    }
}
