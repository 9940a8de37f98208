mod common;

use chrono::Utc;
use common::*;
use jsonwebtoken::{EncodingKey, Header, encode};
use portal_auth::domain_model::LegacyId;
use portal_auth::infra_memory::LoginUserRow;
use serde_json::json;
use warp::http::StatusCode;

fn token_with(key: &[u8], exp_offset_secs: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = json!({
        "userId": "2",
        "cpf": CPF,
        "name": "jdoe",
        "active": true,
        "iat": now - 7200,
        "exp": now + exp_offset_secs,
    });
    encode(&Header::default(), &claims, &EncodingKey::from_secret(key)).unwrap()
}

#[tokio::test]
async fn registered_user_logs_in_and_token_carries_allocated_id() {
    let app = app();

    let reply = app.register(CPF, "jdoe", "pass123").await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.body["success"], true);
    assert_eq!(reply.body["data"]["loginId"], "2");
    assert_eq!(reply.body["data"]["cpf"], CPF);

    let reply = app.login("11144477735", "pass123").await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    let data = &reply.body["data"];
    assert_eq!(data["user"]["id"], "2");
    assert_eq!(data["user"]["cpf"], CPF);
    assert_eq!(data["user"]["name"], "jdoe");
    assert_eq!(data["user"]["active"], true);
    assert!(data["expiresAt"].is_string());

    let token = data["token"].as_str().unwrap();
    let reply = app.get_with_token("/api/verify", token).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["userId"], "2");
    assert_eq!(reply.body["data"]["cpf"], CPF);

    let row = app.store.login_user(LegacyId(2)).unwrap();
    assert!(row.last_login.is_some());
}

#[tokio::test]
async fn login_accepts_the_legacy_field_name() {
    let app = app();
    app.register(CPF, "jdoe", "pass123").await;

    let reply = app
        .post("/api/login", &json!({ "cpf": CPF, "password": "pass123" }))
        .await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn legacy_checksum_rows_verify() {
    let app = app();
    app.store
        .add_login_user(LoginUserRow::new("8", CPF, "legacy", " 972D361 "))
        .unwrap();

    let reply = app.login(CPF, "123456").await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    assert_eq!(reply.body["data"]["user"]["id"], "8");
}

#[tokio::test]
async fn wrong_password_and_unknown_cpf_look_the_same() {
    let app = app();
    app.register(CPF, "jdoe", "pass123").await;

    let wrong = app.login(CPF, "nope").await;
    let unknown = app.login(OTHER_CPF, "pass123").await;

    for reply in [&wrong, &unknown] {
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.body["success"], false);
        assert_eq!(reply.body["error"], "invalid credentials");
        assert_eq!(reply.body["code"], "INVALID_CREDENTIALS");
    }
    assert_eq!(wrong.body, unknown.body);
}

#[tokio::test]
async fn blank_stored_password_never_matches() {
    let app = app();
    app.store
        .add_login_user(LoginUserRow::new("9", CPF, "blank", "   "))
        .unwrap();

    let reply = app.login(CPF, "anything").await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn corrupt_argon2_row_is_rejected_as_bad_credentials() {
    let app = app();
    app.store
        .add_login_user(LoginUserRow::new("9", CPF, "broken", "$argon2id$v=19$truncated"))
        .unwrap();

    let reply = app.login(CPF, "pass123").await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn inactive_account_gets_its_own_message() {
    let app = app();
    app.store
        .add_login_user(LoginUserRow::new("7", CPF, "old", "972D361").status("."))
        .unwrap();

    let reply = app.login(CPF, "123456").await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["code"], "ACCOUNT_INACTIVE");
    assert_ne!(reply.body["error"], "invalid credentials");
}

#[tokio::test]
async fn unknown_status_code_is_rejected_generically() {
    let app = app();
    app.store
        .add_login_user(LoginUserRow::new("7", CPF, "odd", "972D361").status("?"))
        .unwrap();

    let reply = app.login(CPF, "123456").await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn missing_fields_and_bad_cpf_are_bad_requests() {
    let app = app();

    let reply = app.post("/api/login", &json!({ "cpfCnpj": CPF })).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["code"], "INVALID_INPUT");

    let reply = app.login("111.444.777-36", "pass123").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sixth_failed_attempt_is_rate_limited_per_client() {
    let app = app();
    app.register(CPF, "jdoe", "pass123").await;
    let body = json!({ "cpfCnpj": CPF, "password": "wrong" });

    for _ in 0..5 {
        let reply = app.post_from(client(20), "/api/login", &body).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    }
    let reply = app.post_from(client(20), "/api/login", &body).await;
    assert_eq!(reply.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(reply.body["code"], "RATE_LIMITED");
    assert!(reply.headers.contains_key("retry-after"));

    let reply = app.post_from(client(21), "/api/login", &body).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn successful_logins_do_not_use_up_the_window() {
    let app = app();
    app.register(CPF, "jdoe", "pass123").await;

    for _ in 0..8 {
        let reply = app.login(CPF, "pass123").await;
        assert_eq!(reply.status, StatusCode::OK);
    }
}

#[tokio::test]
async fn failed_last_login_update_does_not_fail_login() {
    let app = app();
    app.register(CPF, "jdoe", "pass123").await;
    app.store.fail_last_login(true);

    let reply = app.login(CPF, "pass123").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(app.store.login_user(LegacyId(2)).unwrap().last_login.is_none());
}

#[tokio::test]
async fn protected_routes_reject_bad_tokens() {
    let app = app();

    let reply = app.get("/api/verify").await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["code"], "TOKEN_MISSING");

    let reply = app
        .send(
            warp::test::request()
                .path("/api/verify")
                .remote_addr(client(1))
                .header("authorization", "Token abc"),
        )
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["code"], "TOKEN_MALFORMED");

    let reply = app.get_with_token("/api/verify", "not.a.jwt").await;
    assert_eq!(reply.body["code"], "TOKEN_INVALID");

    let reply = app
        .get_with_token("/api/verify", &token_with(b"some-other-key", 3600))
        .await;
    assert_eq!(reply.body["code"], "TOKEN_INVALID");

    let reply = app
        .get_with_token("/api/verify", &token_with(SIGNING_KEY, -60))
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["code"], "TOKEN_EXPIRED");
}

#[tokio::test]
async fn profile_and_logout_use_the_token_identity() {
    let app = app();
    let token = app.registered_token().await;

    let reply = app.get_with_token("/api/profile", &token).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["id"], "2");
    assert!(reply.body["data"]["createdOn"].is_string());
    assert!(reply.body["data"]["lastLogin"].is_string());

    let reply = app
        .send(
            warp::test::request()
                .method("POST")
                .path("/api/logout")
                .remote_addr(client(1))
                .header("authorization", format!("Bearer {}", token)),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["message"], "logged out");
}

#[tokio::test]
async fn health_unknown_routes_and_headers() {
    let app = app();

    let reply = app.get("/api/health").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["status"], "ok");
    assert_eq!(reply.body["data"]["database"], "memory");
    assert_eq!(reply.headers["x-content-type-options"], "nosniff");

    let reply = app.get("/api/nowhere").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["code"], "NOT_FOUND");
}
