//! Axum router configuration with middleware.
//!
//! Routes: `/auth/*` (public), `/chat/*` (bearer token), `/health`,
//! `/api/info`, and a JSON 404 fallback.
//! Middleware, outermost first: trace, CORS, body limit, development error
//! detail, production security headers, general rate limit. The auth and
//! chat groups each carry their own rate limit on top.

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use axum::{Router, middleware};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use supportdesk_types::config::AppConfig;

use crate::http::error::expose_internal_detail;
use crate::http::handlers;
use crate::http::middleware::rate_limit::{self, GroupLimiter};
use crate::http::middleware::security_headers::security_headers;
use crate::state::AppState;

const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let limiters = state.limiters.clone();

    let auth_routes = with_limit(
        Router::new()
            .route("/signup", post(handlers::auth::signup))
            .route("/login", post(handlers::auth::login)),
        limiters.auth.as_ref(),
    );

    let chat_routes = with_limit(
        Router::new()
            .route("/send", post(handlers::chat::send_message))
            .route("/history", get(handlers::chat::history))
            .route("/new", post(handlers::chat::new_chat))
            .route(
                "/{id}",
                get(handlers::chat::get_chat).delete(handlers::chat::delete_chat),
            ),
        limiters.chat.as_ref(),
    );

    let mut router = Router::new()
        .nest("/auth", auth_routes)
        .nest("/chat", chat_routes)
        .route("/health", get(handlers::system::health))
        .route("/api/info", get(handlers::system::info))
        .fallback(handlers::system::not_found);

    if let Some(general) = limiters.general.as_ref() {
        router = router.layer(middleware::from_fn_with_state(
            general.clone(),
            rate_limit::enforce,
        ));
    }
    if state.config.environment.is_production() {
        router = router.layer(middleware::from_fn(security_headers));
    }
    if state.config.environment.is_development() {
        router = router.layer(middleware::from_fn(expose_internal_detail));
    }

    router
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn with_limit(
    routes: Router<AppState>,
    limiter: Option<&std::sync::Arc<GroupLimiter>>,
) -> Router<AppState> {
    match limiter {
        Some(limiter) => routes.route_layer(middleware::from_fn_with_state(
            limiter.clone(),
            rate_limit::enforce,
        )),
        None => routes,
    }
}

/// Credentialed CORS for the configured origins. Credentials rule out
/// wildcards, so methods and headers are listed explicitly.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors
        .origins_for(config.environment)
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
