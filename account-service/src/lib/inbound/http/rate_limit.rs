//! Fixed-window rate limiting keyed by client address and path.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use axum::extract::ConnectInfo;
use axum::extract::Request;
use axum::extract::State;
use axum::middleware::Next;
use axum::response::Response;
use parking_lot::Mutex;

use super::errors::ApiError;

/// Request counter shared by every clone.
#[derive(Clone)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    entries: Arc<Mutex<HashMap<String, WindowEntry>>>,
}

struct WindowEntry {
    count: u32,
    window_start: Instant,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Count one request for `key`.
    ///
    /// Returns the time until the window resets when the limit is exceeded.
    pub fn check(&self, key: &str) -> Result<(), Duration> {
        let mut entries = self.entries.lock();
        let now = Instant::now();

        let entry = entries.entry(key.to_string()).or_insert(WindowEntry {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) >= self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;

        if entry.count > self.max_requests {
            Err((entry.window_start + self.window).saturating_duration_since(now))
        } else {
            Ok(())
        }
    }

    /// Drop windows that have already ended.
    pub fn cleanup(&self) -> usize {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.window_start) < self.window);
        before - entries.len()
    }
}

/// Rate limiting middleware.
///
/// Keys on the peer address when the server was started with connect info,
/// so every request without it shares one bucket.
pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let key = format!("{}{}", client, req.uri().path());

    if let Err(retry_after) = limiter.check(&key) {
        tracing::warn!(
            client = %client,
            path = %req.uri().path(),
            retry_after_secs = retry_after.as_secs(),
            "Rate limit exceeded"
        );
        // Round up so clients never retry inside the window.
        let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
        return Err(ApiError::too_many_requests(secs));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::header;
    use axum::http::StatusCode;
    use axum::middleware;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    use super::*;

    #[test]
    fn test_allows_up_to_limit() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));

        for _ in 0..3 {
            assert!(limiter.check("127.0.0.1/api/auth").is_ok());
        }

        let retry_after = limiter.check("127.0.0.1/api/auth").unwrap_err();
        assert!(retry_after <= Duration::from_secs(60));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));

        assert!(limiter.check("10.0.0.1/api/auth").is_ok());
        assert!(limiter.check("10.0.0.2/api/auth").is_ok());
        assert!(limiter.check("10.0.0.1/api/auth/refresh-token").is_ok());
        assert!(limiter.check("10.0.0.1/api/auth").is_err());
    }

    #[test]
    fn test_window_resets() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20));

        assert!(limiter.check("key").is_ok());
        assert!(limiter.check("key").is_err());

        std::thread::sleep(Duration::from_millis(30));
        assert!(limiter.check("key").is_ok());
    }

    #[test]
    fn test_cleanup_drops_finished_windows() {
        let limiter = RateLimiter::new(5, Duration::from_millis(10));
        limiter.check("a").unwrap();
        limiter.check("b").unwrap();

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(limiter.cleanup(), 2);
    }

    #[tokio::test]
    async fn test_middleware_rejects_with_retry_after() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let app = Router::new()
            .route("/api/auth", get(|| async { "ok" }))
            .route_layer(middleware::from_fn_with_state(limiter, rate_limit));

        let request = || {
            axum::http::Request::builder()
                .uri("/api/auth")
                .body(Body::empty())
                .unwrap()
        };

        let first = app.clone().oneshot(request()).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app.oneshot(request()).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry_after: u64 = second
            .headers()
            .get(header::RETRY_AFTER)
            .unwrap()
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!(retry_after >= 59 && retry_after <= 60);
    }
}
