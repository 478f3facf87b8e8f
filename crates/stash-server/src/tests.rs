//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use stash_core::db::Database;
use tower::ServiceExt;

fn setup_test_app() -> Router {
    let db = Database::in_memory().unwrap();
    let config = ServerConfig {
        require_auth: false,
        allowed_origins: vec![],
        ..Default::default()
    };
    create_router(db, config)
}

fn setup_auth_app() -> Router {
    let db = Database::in_memory().unwrap();
    create_router(db, ServerConfig::default())
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

// ========== Auth Tests ==========

#[tokio::test]
async fn test_protected_route_requires_auth() {
    let app = setup_auth_app();

    let response = app.oneshot(get("/api/savings/goals")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_login_and_me() {
    let app = setup_auth_app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/register",
            serde_json::json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "correct horse"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let token = json["token"].as_str().unwrap().to_string();
    assert_eq!(json["user"]["username"], "alice");
    // The password hash never appears in API output
    assert!(json["user"].get("password_hash").is_none());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["username"], "alice");
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = setup_auth_app();

    app.clone()
        .oneshot(post_json(
            "/api/auth/register",
            serde_json::json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "correct horse"
            }),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(post_json(
            "/api/auth/login",
            serde_json::json!({ "username": "alice", "password": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let app = setup_auth_app();

    let register = serde_json::json!({
        "username": "alice",
        "email": "alice@example.com",
        "password": "correct horse"
    });

    app.clone()
        .oneshot(post_json("/api/auth/register", register.clone()))
        .await
        .unwrap();

    let response = app
        .oneshot(post_json("/api/auth/register", register))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ========== Category Tests ==========

#[tokio::test]
async fn test_category_crud() {
    let app = setup_test_app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/categories",
            serde_json::json!({ "name": "Groceries", "icon": "shopping-cart" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["name"], "Groceries");
    assert_eq!(json["color"], "#3B82F6");
    let id = json["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(get(&format!("/api/categories/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get("/api/categories/9999"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_category_summary() {
    let app = setup_test_app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/categories",
            serde_json::json!({ "name": "Dining" }),
        ))
        .await
        .unwrap();
    let id = get_body_json(response).await["id"].as_i64().unwrap();

    let response = app
        .oneshot(get(&format!("/api/categories/{}/summary", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["total"], 0.0);
    assert_eq!(json["count"], 0);
    assert_eq!(json["average"], 0.0);
}

// ========== Transaction Tests ==========

#[tokio::test]
async fn test_transaction_validation() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/transactions",
            serde_json::json!({
                "category_id": null,
                "transaction_type": "expense",
                "amount": -5.0,
                "date": "2026-08-01",
                "description": "bad"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_transaction_summary_includes_breakdown() {
    let app = setup_test_app();

    app.clone()
        .oneshot(post_json(
            "/api/transactions",
            serde_json::json!({
                "category_id": null,
                "transaction_type": "income",
                "amount": 1000.0,
                "date": chrono::Utc::now().date_naive().to_string(),
                "description": "salary"
            }),
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(post_json(
            "/api/transactions",
            serde_json::json!({
                "category_id": null,
                "transaction_type": "expense",
                "amount": 400.0,
                "date": chrono::Utc::now().date_naive().to_string(),
                "description": "rent"
            }),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(get("/api/transactions/summary"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["income"], 1000.0);
    assert_eq!(json["expenses"], 400.0);
    assert_eq!(json["net"], 600.0);
    assert_eq!(json["by_category"][0]["category_name"], "Uncategorized");
    assert_eq!(json["by_category"][0]["percentage"], 100.0);
}

// ========== Savings Goal Tests ==========

async fn create_goal(app: &Router, target: f64) -> i64 {
    let target_date = (chrono::Utc::now().date_naive() + chrono::Duration::days(180)).to_string();
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/savings/goals",
            serde_json::json!({
                "name": "Vacation",
                "target_amount": target,
                "target_date": target_date
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    get_body_json(response).await["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_goal_carries_metrics() {
    let app = setup_test_app();
    let id = create_goal(&app, 1000.0).await;

    let response = app
        .oneshot(get(&format!("/api/savings/goals/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["status"], "active");
    assert_eq!(json["metrics"]["progress_percentage"], 0.0);
    assert_eq!(json["metrics"]["remaining_amount"], 1000.0);
    assert!(json["metrics"]["risk_level"].is_string());
}

#[tokio::test]
async fn test_deposit_completes_goal() {
    let app = setup_test_app();
    let id = create_goal(&app, 1000.0).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/savings/transactions",
            serde_json::json!({
                "goal_id": id,
                "effect": "deposit",
                "amount": 1000.0
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["goal"]["status"], "completed");
    assert_eq!(json["goal"]["current_amount"], 1000.0);

    let response = app
        .oneshot(get("/api/savings/achievements"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["achievements"].as_array().unwrap().len(), 1);
    assert_eq!(json["achievements"][0]["achievement_type"], "goal_completed");
    assert_eq!(json["total_points"], 100);
}

#[tokio::test]
async fn test_goal_pause_and_resume() {
    let app = setup_test_app();
    let id = create_goal(&app, 500.0).await;

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/savings/goals/{}/pause", id),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(get_body_json(response).await["status"], "paused");

    let response = app
        .oneshot(post_json(
            &format!("/api/savings/goals/{}/resume", id),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(get_body_json(response).await["status"], "active");
}

// ========== Rule Tests ==========

#[tokio::test]
async fn test_rule_execution_posts_auto_save() {
    let app = setup_test_app();
    let goal_id = create_goal(&app, 10000.0).await;

    app.clone()
        .oneshot(post_json(
            "/api/transactions",
            serde_json::json!({
                "category_id": null,
                "transaction_type": "income",
                "amount": 2000.0,
                "date": chrono::Utc::now().date_naive().to_string(),
                "description": "salary"
            }),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/savings/rules",
            serde_json::json!({
                "goal_id": goal_id,
                "name": "Ten percent",
                "rule_type": "percentage_income",
                "percentage": 10.0
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let rule_id = get_body_json(response).await["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/savings/rules/{}/execute", rule_id),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["outcome"], "posted");
    assert_eq!(json["transaction"]["effect"], "auto_save");
    assert_eq!(json["transaction"]["amount"], 200.0);
    assert_eq!(json["goal"]["current_amount"], 200.0);
}

#[tokio::test]
async fn test_run_due_rules_sweep() {
    let app = setup_test_app();
    let goal_id = create_goal(&app, 10000.0).await;

    app.clone()
        .oneshot(post_json(
            "/api/savings/rules",
            serde_json::json!({
                "goal_id": goal_id,
                "name": "Fifty a month",
                "rule_type": "fixed_amount",
                "fixed_amount": 50.0
            }),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(post_json("/api/savings/rules/run", serde_json::json!({})))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["due"], 1);
    assert_eq!(json["executed"], 1);

    // The rule is now scheduled out, a second sweep finds nothing
    let response = app
        .oneshot(post_json("/api/savings/rules/run", serde_json::json!({})))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["due"], 0);
}

// ========== Dashboard Tests ==========

#[tokio::test]
async fn test_dashboard_aggregates() {
    let app = setup_test_app();
    let goal_id = create_goal(&app, 1000.0).await;

    app.clone()
        .oneshot(post_json(
            "/api/savings/transactions",
            serde_json::json!({
                "goal_id": goal_id,
                "effect": "deposit",
                "amount": 150.0
            }),
        ))
        .await
        .unwrap();

    let response = app.oneshot(get("/api/savings/dashboard")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["total_saved"], 150.0);
    assert_eq!(json["active_goals"], 1);
    // No ledger income this month, so the rate guard kicks in
    assert_eq!(json["monthly_savings_rate"], 0.0);
}

// ========== Withdrawal Floor ==========

#[tokio::test]
async fn test_withdrawal_floors_at_zero() {
    let app = setup_test_app();
    let goal_id = create_goal(&app, 1000.0).await;

    app.clone()
        .oneshot(post_json(
            "/api/savings/transactions",
            serde_json::json!({ "goal_id": goal_id, "effect": "deposit", "amount": 50.0 }),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(post_json(
            "/api/savings/transactions",
            serde_json::json!({ "goal_id": goal_id, "effect": "withdrawal", "amount": 80.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["goal"]["current_amount"], 0.0);
}

// ========== Goal-Scoped Ledger Routes ==========

#[tokio::test]
async fn test_goal_scoped_transactions() {
    let app = setup_test_app();
    let goal_id = create_goal(&app, 1000.0).await;
    let other_id = create_goal(&app, 500.0).await;

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/savings/goals/{}/transactions", goal_id),
            serde_json::json!({ "effect": "deposit", "amount": 75.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(get_body_json(response).await["goal"]["current_amount"], 75.0);

    // Listing is scoped to the goal in the path
    let response = app
        .clone()
        .oneshot(get(&format!(
            "/api/savings/goals/{}/transactions",
            goal_id
        )))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);

    let response = app
        .oneshot(get(&format!(
            "/api/savings/goals/{}/transactions",
            other_id
        )))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert!(json.as_array().unwrap().is_empty());
}
