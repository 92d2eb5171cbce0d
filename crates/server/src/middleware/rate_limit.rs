//! Rate limiting middleware using governor and `tower_governor`.
//!
//! Two limiter profiles:
//! - `auth_rate_limiter`: login/registration brute-force protection (~10/min)
//! - `otp_rate_limiter`: OTP dispatch, the most abusable endpoint (~2/min)

use std::sync::Arc;

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};

/// Rate limiter layer type for Axum.
///
/// Uses `SmartIpKeyExtractor` so the limiter keys on the real client IP
/// behind proxies (standard forwarding headers first, peer address last).
pub type RateLimiterLayer =
    GovernorLayer<SmartIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for auth endpoints: ~10 requests per minute per IP.
///
/// Configuration: 1 request every 6 seconds (replenish), burst of 5.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers, which are always accepted by `GovernorConfigBuilder`.
#[must_use]
pub fn auth_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(SmartIpKeyExtractor)
        .per_second(6) // Replenish 1 token every 6 seconds (~10/minute)
        .burst_size(5) // Allow burst of 5 requests
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Create rate limiter for OTP dispatch: ~2 requests per minute per IP.
///
/// Configuration: 1 request every 30 seconds (replenish), burst of 3.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers, which are always accepted by `GovernorConfigBuilder`.
#[must_use]
pub fn otp_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(SmartIpKeyExtractor)
        .per_second(30) // Replenish 1 token every 30 seconds (~2/minute)
        .burst_size(3) // Allow burst of 3 requests
        .finish()
        .expect("rate limiter config with per_second(30) and burst_size(3) is valid");
    GovernorLayer::new(Arc::new(config))
}
