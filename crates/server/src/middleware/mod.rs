//! HTTP middleware and extractors.
//!
//! - [`auth`] - Bearer-token extractors (`RequireUser`, `RequireAdmin`)
//! - [`rate_limit`] - Governor layers for the auth and OTP endpoints

pub mod auth;
pub mod rate_limit;

pub use auth::{CurrentUser, RequireAdmin, RequireUser};
pub use rate_limit::{auth_rate_limiter, otp_rate_limiter};
