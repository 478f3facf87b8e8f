//! Stash Web Server
//!
//! Axum-based REST API for the Stash personal finance backend.
//!
//! Security features:
//! - Session-token authentication (secure by default, use --no-auth for local dev)
//! - Ownership scoping on every query (cross-user access reads as not-found)
//! - Restrictive CORS policy
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use stash_core::db::{AuthUser, Database};

mod handlers;

/// Username assigned when the server runs with authentication disabled
const LOCAL_DEV_USER: &str = "local";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Whether authentication is required (secure by default)
    pub require_auth: bool,
    /// Allowed CORS origins (empty = same-origin only in production)
    pub allowed_origins: Vec<String>,
    /// Session lifetime handed out by login
    pub session_ttl_days: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            allowed_origins: vec![],
            session_ttl_days: 30,
        }
    }
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
}

/// Authentication middleware - resolves the session token to a user
///
/// The Authorization header carries `Bearer <token>`; the token is an opaque
/// session id minted by login, stored hashed. The resolved [`AuthUser`] is
/// attached to the request for handlers to consume.
///
/// With `--no-auth` a shared "local" account backs every request, so the
/// ownership scoping in the core keeps working unchanged.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "));

    if let Some(token) = token {
        match state.db.authenticate(token) {
            Ok(Some(user)) => {
                request.extensions_mut().insert(user);
                return next.run(request).await;
            }
            Ok(None) => {}
            Err(e) => {
                error!(error = %e, "Session lookup failed");
                return AppError::internal("An internal error occurred").into_response();
            }
        }
    }

    if !state.config.require_auth {
        match local_dev_user(&state.db) {
            Ok(user) => {
                request.extensions_mut().insert(user);
                return next.run(request).await;
            }
            Err(e) => {
                error!(error = %e, "Failed to resolve local dev user");
                return AppError::internal("An internal error occurred").into_response();
            }
        }
    }

    warn!(path = %request.uri().path(), "Unauthorized request - no valid session");
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "Authentication required"
        })),
    )
        .into_response()
}

/// Find or create the shared no-auth account
fn local_dev_user(db: &Database) -> stash_core::Result<AuthUser> {
    if let Some(user) = db
        .list_users()?
        .into_iter()
        .find(|u| u.username == LOCAL_DEV_USER)
    {
        return Ok(AuthUser {
            id: user.id,
            username: user.username,
        });
    }

    let user = db.create_user(
        LOCAL_DEV_USER,
        "local@localhost",
        &stash_core::db::Database::random_password(),
    )?;
    Ok(AuthUser {
        id: user.id,
        username: user.username,
    })
}

/// Success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Create the application router
pub fn create_router(db: Database, config: ServerConfig) -> Router {
    let state = Arc::new(AppState {
        db,
        config: config.clone(),
    });

    // Register and login stay outside the auth middleware
    let public_routes = Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login));

    let protected_routes = Router::new()
        // Auth
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/me", get(handlers::get_me))
        // Categories
        .route(
            "/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/categories/:id",
            get(handlers::get_category)
                .put(handlers::update_category)
                .delete(handlers::delete_category),
        )
        .route("/categories/:id/summary", get(handlers::category_summary))
        // Ledger transactions
        .route(
            "/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route("/transactions/summary", get(handlers::transaction_summary))
        .route(
            "/transactions/:id",
            get(handlers::get_transaction)
                .put(handlers::update_transaction)
                .delete(handlers::delete_transaction),
        )
        // Budgets
        .route(
            "/budgets",
            get(handlers::list_budgets).post(handlers::create_budget),
        )
        .route(
            "/budgets/:id",
            get(handlers::get_budget)
                .put(handlers::update_budget)
                .delete(handlers::delete_budget),
        )
        // Reports
        .route(
            "/reports",
            get(handlers::list_reports).post(handlers::generate_report),
        )
        .route(
            "/reports/:id",
            get(handlers::get_report).delete(handlers::delete_report),
        )
        // Savings goals
        .route(
            "/savings/goals",
            get(handlers::list_goals).post(handlers::create_goal),
        )
        .route(
            "/savings/goals/:id",
            get(handlers::get_goal)
                .put(handlers::update_goal)
                .delete(handlers::delete_goal),
        )
        .route("/savings/goals/:id/pause", post(handlers::pause_goal))
        .route("/savings/goals/:id/resume", post(handlers::resume_goal))
        .route("/savings/goals/:id/cancel", post(handlers::cancel_goal))
        .route(
            "/savings/goals/:id/transactions",
            get(handlers::list_goal_transactions).post(handlers::post_goal_savings),
        )
        // Savings ledger
        .route(
            "/savings/transactions",
            get(handlers::list_savings_transactions).post(handlers::post_savings),
        )
        // Auto-save rules
        .route(
            "/savings/rules",
            get(handlers::list_rules).post(handlers::create_rule),
        )
        .route(
            "/savings/rules/:id",
            get(handlers::get_rule)
                .put(handlers::update_rule)
                .delete(handlers::delete_rule),
        )
        .route(
            "/savings/rules/:id/activate",
            post(handlers::activate_rule),
        )
        .route(
            "/savings/rules/:id/deactivate",
            post(handlers::deactivate_rule),
        )
        .route("/savings/rules/:id/execute", post(handlers::execute_rule))
        .route("/savings/rules/run", post(handlers::run_due_rules))
        // Recommendations
        .route(
            "/savings/recommendations",
            get(handlers::list_recommendations),
        )
        .route(
            "/savings/recommendations/refresh",
            post(handlers::refresh_recommendations),
        )
        .route(
            "/savings/recommendations/:id/read",
            post(handlers::mark_recommendation_read),
        )
        // Insights
        .route("/savings/insights", get(handlers::list_insights))
        .route(
            "/savings/insights/refresh",
            post(handlers::refresh_insights),
        )
        .route(
            "/savings/insights/:id/archive",
            post(handlers::archive_insight),
        )
        // Achievements
        .route("/savings/achievements", get(handlers::list_achievements))
        // Reminders
        .route(
            "/savings/reminders",
            get(handlers::list_reminders).post(handlers::create_reminder),
        )
        .route(
            "/savings/reminders/:id",
            axum::routing::delete(handlers::delete_reminder),
        )
        .route(
            "/savings/reminders/:id/deactivate",
            post(handlers::deactivate_reminder),
        )
        // Simulations
        .route(
            "/savings/simulations",
            get(handlers::list_simulations).post(handlers::run_simulation),
        )
        // Dashboard
        .route("/savings/dashboard", get(handlers::get_dashboard))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = public_routes.merge(protected_routes);

    // Build CORS layer
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'self'; frame-ancestors 'none'"),
        ))
}

/// Start the server
pub async fn serve(db: Database, host: &str, port: u16) -> anyhow::Result<()> {
    serve_with_config(db, host, port, ServerConfig::default()).await
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    db: Database,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if !config.require_auth {
        warn!("Authentication disabled - do not expose to network!");
    }

    match db.prune_sessions() {
        Ok(count) if count > 0 => {
            info!("Pruned {} expired session(s)", count);
        }
        Ok(_) => {}
        Err(e) => {
            warn!("Failed to prune expired sessions: {}", e);
        }
    }

    let app = create_router(db, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn unauthorized(msg: &str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn conflict(msg: &str) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<stash_core::Error> for AppError {
    fn from(err: stash_core::Error) -> Self {
        match err {
            stash_core::Error::NotFound(what) => Self::not_found(&format!("{} not found", what)),
            stash_core::Error::Validation(msg) => Self::bad_request(&msg),
            stash_core::Error::InvalidCredentials => Self::unauthorized("Invalid credentials"),
            err => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                // Return generic message to client
                message: "An internal error occurred".to_string(),
                // Keep full error for logging
                internal: Some(err.into()),
            },
        }
    }
}

#[cfg(test)]
mod tests;
