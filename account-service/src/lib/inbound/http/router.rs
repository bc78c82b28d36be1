use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::admin::admin;
use super::handlers::authenticate::authenticate;
use super::handlers::create_user::create_user;
use super::handlers::get_me::get_me;
use super::handlers::get_user::get_user;
use super::handlers::list_users::list_users;
use super::handlers::refresh_token::refresh_token;
use super::handlers::update_user::update_user;
use super::middleware::authenticate as auth_middleware;
use super::middleware::require_role;
use super::middleware::AuthGuard;
use super::middleware::AuthOptions;
use super::rate_limit::rate_limit;
use super::rate_limit::RateLimiter;
use crate::config::RateLimitConfig;
use crate::domain::authentication::ports::AuthServicePort;
use crate::domain::user::models::Role;
use crate::domain::user::ports::UserServicePort;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserServicePort>,
    pub auth_service: Arc<dyn AuthServicePort>,
    pub login_limiter: RateLimiter,
    pub refresh_limiter: RateLimiter,
}

impl AppState {
    pub fn new(
        user_service: Arc<dyn UserServicePort>,
        auth_service: Arc<dyn AuthServicePort>,
        rate_limit: &RateLimitConfig,
    ) -> Self {
        Self {
            user_service,
            auth_service,
            login_limiter: RateLimiter::new(rate_limit.login_max_requests, rate_limit.window()),
            refresh_limiter: RateLimiter::new(
                rate_limit.refresh_max_requests,
                rate_limit.window(),
            ),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let account_guard = AuthGuard::new(
        state.clone(),
        AuthOptions {
            force_email_verified: false,
        },
    );
    let admin_guard = AuthGuard::new(state.clone(), AuthOptions::default());

    let login_routes = Router::new()
        .route("/api/auth", post(authenticate))
        .route_layer(middleware::from_fn_with_state(
            state.login_limiter.clone(),
            rate_limit,
        ));

    let refresh_routes = Router::new()
        .route("/api/auth/refresh-token", post(refresh_token))
        .route_layer(middleware::from_fn_with_state(
            state.refresh_limiter.clone(),
            rate_limit,
        ));

    let public_routes = Router::new().route("/api/users", post(create_user));

    let account_routes = Router::new()
        .route("/api/users/me", get(get_me))
        .route("/api/users/:user_id", get(get_user).put(update_user))
        .route_layer(middleware::from_fn_with_state(
            account_guard.clone(),
            auth_middleware,
        ));

    // Layers run outermost first: the role gate needs the user resolved by the guard.
    let user_admin_routes = Router::new()
        .route("/api/users", get(list_users))
        .route_layer(middleware::from_fn_with_state(Role::Admin, require_role))
        .route_layer(middleware::from_fn_with_state(
            account_guard,
            auth_middleware,
        ));

    let admin_routes = Router::new()
        .route("/api/admin", get(admin))
        .route_layer(middleware::from_fn_with_state(Role::Admin, require_role))
        .route_layer(middleware::from_fn_with_state(
            admin_guard,
            auth_middleware,
        ));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(login_routes)
        .merge(refresh_routes)
        .merge(public_routes)
        .merge(account_routes)
        .merge(user_admin_routes)
        .merge(admin_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
