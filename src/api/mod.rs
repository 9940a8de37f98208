mod error;
mod handler;
mod rate_limit;
mod router;

pub use error::{ApiErrorCode, recover_error};
pub use handler::ApiResponse;
pub use rate_limit::RateLimiter;
pub use router::routes;

use crate::server::Server;
use std::convert::Infallible;
use std::sync::Arc;
use uuid::Uuid;
use warp::Filter;
use warp::http::header::{HeaderMap, HeaderName, HeaderValue};

/// The complete HTTP surface: `/api` routes, global rate limit, error
/// envelope, security headers, CORS and request spans.
pub fn service(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone {
    let expose_details = server.expose_error_details;

    let global_limit = router::with_rate_limit(server.global_limiter.clone())
        .map(|_client: String| ())
        .untuple_one();

    let api = warp::path("api")
        .and(global_limit)
        .and(routes(server.clone()))
        .with(cors(&server.cors_origins))
        .recover(move |err| recover_error(err, expose_details));

    api.with(warp::reply::with::headers(security_headers()))
        .with(warp::trace(|info| {
            tracing::info_span!(
                "request",
                id = %Uuid::new_v4(),
                method = %info.method(),
                path = %info.path(),
            )
        }))
}

fn security_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    let pairs = [
        ("x-content-type-options", "nosniff"),
        ("x-frame-options", "DENY"),
        ("strict-transport-security", "max-age=31536000; includeSubDomains"),
        ("referrer-policy", "no-referrer"),
        ("content-security-policy", "default-src 'self'"),
    ];
    for (name, value) in pairs {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    headers
}

fn cors(origins: &[String]) -> warp::cors::Builder {
    let builder = warp::cors()
        .allow_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_headers(vec!["content-type", "authorization"]);
    if origins.iter().any(|o| o == "*") {
        builder.allow_any_origin()
    } else {
        builder
            .allow_credentials(true)
            .allow_origins(origins.iter().map(String::as_str))
    }
}

/// `scheme://host[:port]` with nothing after it, the only shape CORS accepts.
pub fn validate_origin(origin: &str) -> anyhow::Result<()> {
    if origin == "*" {
        return Ok(());
    }
    let uri: warp::http::Uri = origin
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid CORS origin {:?}: {}", origin, e))?;
    let bare = uri.scheme().is_some()
        && uri.authority().is_some()
        && uri.path_and_query().is_none_or(|p| p.as_str().is_empty() || p.as_str() == "/")
        && !origin.ends_with('/');
    if bare {
        Ok(())
    } else {
        Err(anyhow::anyhow!("invalid CORS origin {:?}", origin))
    }
}
