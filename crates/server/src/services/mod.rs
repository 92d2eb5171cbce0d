//! External-service clients and in-process services.
//!
//! Each client wraps one outbound integration behind a typed interface:
//!
//! - [`token`] - HS256 bearer-token signing and verification
//! - [`payment`] - Payment gateway (order creation, signature verification)
//! - [`shipping`] - Shipping provider (rate quotes, shipment creation)
//! - [`sms`] - SMS provider used by the OTP service
//! - [`mailer`] - Outbound SMTP mail
//! - [`otp`] - One-time-code issuance and verification over both channels

pub mod mailer;
pub mod otp;
pub mod payment;
pub mod shipping;
pub mod sms;
pub mod token;

pub use mailer::Mailer;
pub use otp::OtpService;
pub use payment::PaymentClient;
pub use shipping::ShippingClient;
pub use sms::SmsClient;
pub use token::TokenSigner;
