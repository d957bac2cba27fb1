//! Per-client-IP rate limiting with `governor`.
//!
//! Three independent limiter groups: `general` covers every request, `auth`
//! the `/auth` routes, `chat` the `/chat` routes. A rule of `max` requests
//! per `window_secs` becomes a GCRA quota that replenishes one request every
//! `window / max` with a burst of `max`, so a client can spend the whole
//! quota at once and then regains it gradually.
//!
//! Clients are keyed by peer address. `X-Forwarded-For` is only read when
//! `trust_proxy` is set, since any caller can send it.

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

use supportdesk_types::config::{Environment, RateLimitConfig, RateLimitRule};

use crate::http::error::ErrorBody;

/// How often idle client entries are dropped from every limiter.
pub const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// One rate-limited route group.
pub struct GroupLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
    message: &'static str,
    trust_proxy: bool,
}

impl GroupLimiter {
    pub fn new(rule: RateLimitRule, message: &'static str, trust_proxy: bool) -> Self {
        Self {
            limiter: RateLimiter::keyed(quota_for(rule)),
            message,
            trust_proxy,
        }
    }

    /// Count one request from `client`. `Err` carries the wait until the
    /// next request would be allowed.
    pub fn check(&self, client: &str) -> Result<(), Duration> {
        self.limiter
            .check_key(&client.to_string())
            .map_err(|not_until| not_until.wait_time_from(DefaultClock::default().now()))
    }

    /// Drop clients whose quota has fully replenished. Returns how many
    /// are still tracked.
    pub fn prune(&self) -> usize {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        self.limiter.len()
    }
}

/// Convert a fixed-window rule into a GCRA quota.
pub fn quota_for(rule: RateLimitRule) -> Quota {
    let max = NonZeroU32::new(rule.max).unwrap_or(NonZeroU32::MIN);
    let window = Duration::from_secs(rule.window_secs.max(1));
    Quota::with_period(window / max.get())
        .unwrap_or_else(|| Quota::per_second(max))
        .allow_burst(max)
}

/// The limiter groups, or `None` for a group when limiting is disabled.
pub struct RateLimiters {
    pub general: Option<Arc<GroupLimiter>>,
    pub auth: Option<Arc<GroupLimiter>>,
    pub chat: Option<Arc<GroupLimiter>>,
}

impl RateLimiters {
    pub fn from_config(config: &RateLimitConfig, environment: Environment) -> Self {
        if config.is_disabled(environment) {
            tracing::info!("Rate limiting disabled (SKIP_RATE_LIMIT)");
            return Self::disabled();
        }
        if config.trust_proxy {
            tracing::info!("Rate limiting keys on X-Forwarded-For (TRUST_PROXY)");
        }
        let trust_proxy = config.trust_proxy;
        Self {
            general: Some(Arc::new(GroupLimiter::new(
                config.general_for(environment),
                "Too many requests, please try again later",
                trust_proxy,
            ))),
            auth: Some(Arc::new(GroupLimiter::new(
                config.auth_for(environment),
                "Too many authentication attempts, please try again later",
                trust_proxy,
            ))),
            chat: Some(Arc::new(GroupLimiter::new(
                config.chat_for(environment),
                "Too many messages, please slow down",
                trust_proxy,
            ))),
        }
    }

    pub fn disabled() -> Self {
        Self {
            general: None,
            auth: None,
            chat: None,
        }
    }

    fn groups(&self) -> impl Iterator<Item = &Arc<GroupLimiter>> {
        [&self.general, &self.auth, &self.chat].into_iter().flatten()
    }

    /// Prune every group once.
    pub fn prune(&self) {
        for group in self.groups() {
            let tracked = group.prune();
            tracing::debug!(tracked, "Pruned rate limiter state");
        }
    }

    /// Prune every `every` until the runtime shuts down.
    pub fn spawn_pruner(self: Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.prune();
            }
        })
    }
}

/// Client address for limiting: the peer from `ConnectInfo`, or the first
/// `X-Forwarded-For` hop when the server sits behind a trusted proxy.
pub fn client_key(req: &Request, trust_proxy: bool) -> String {
    if trust_proxy {
        if let Some(forwarded) = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
        {
            return forwarded.to_string();
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// `from_fn_with_state` middleware enforcing one limiter group.
pub async fn enforce(
    State(group): State<Arc<GroupLimiter>>,
    req: Request,
    next: Next,
) -> Response {
    let client = client_key(&req, group.trust_proxy);
    match group.check(&client) {
        Ok(()) => next.run(req).await,
        Err(wait) => {
            tracing::warn!(client = %client, path = %req.uri().path(), "Rate limit exceeded");
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ErrorBody::new("Rate limit exceeded", group.message)),
            )
                .into_response();
            let retry_after = wait.as_secs().max(1).to_string();
            if let Ok(value) = HeaderValue::from_str(&retry_after) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            response
        }
    }
}
