//! HTTP route handlers for the storefront and admin surfaces.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness check
//! GET  /health/ready                - DB readiness check
//!
//! # Auth
//! POST /auth/register               - Create account, returns bearer token
//! POST /auth/login                  - Login, returns bearer token
//! POST /auth/admin/login            - Admin credential login
//!
//! # Catalog
//! GET  /products                    - Product listing (?category=&page=&per_page=)
//! GET  /products/{id}               - Product detail
//! GET  /products/{id}/reviews       - Reviews for a product
//! POST /products/{id}/reviews       - Create review               [user]
//! GET  /slider                      - Homepage slider images
//!
//! # Cart
//! GET  /cart                        - Current cart with totals    [user]
//! POST /cart/lines                  - Add/merge a line            [user]
//! PUT  /cart/lines/{id}             - Increment/decrement a line  [user]
//! DELETE /cart/lines/{id}           - Remove a line               [user]
//!
//! # OTP
//! POST /otp/send                    - Send SMS code       [rate limited]
//! POST /otp/verify                  - Verify SMS code
//! POST /otp/email/send              - Send email code     [rate limited]
//! POST /otp/email/verify            - Verify email code
//!
//! # Checkout & orders
//! POST /shipping/estimate           - Rate quote                  [user]
//! POST /orders                      - Create order (checkout)     [user]
//! POST /orders/verify-payment       - Payment signature callback  [user]
//! GET  /orders                      - Caller's order history      [user]
//! POST /contact                     - Contact form relay
//!
//! # Admin (admin role claim required)
//! GET    /admin/orders              - All orders
//! PUT    /admin/orders/{id}         - Status transition
//! POST   /admin/orders/{id}/ship    - Register shipment with provider
//! POST   /admin/products            - Create product
//! PUT    /admin/products/{id}       - Update product
//! DELETE /admin/products/{id}       - Delete product
//! POST   /admin/slider              - Add slider image
//! DELETE /admin/slider/{id}         - Remove slider image
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod contact;
pub mod orders;
pub mod otp;
pub mod products;
pub mod reviews;
pub mod shipping;
pub mod slider;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::middleware::{auth_rate_limiter, otp_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/admin/login", post(auth::admin_login))
        .layer(auth_rate_limiter())
}

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route(
            "/{id}/reviews",
            get(reviews::index).post(reviews::create),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/lines", post(cart::add_line))
        .route(
            "/lines/{id}",
            put(cart::update_line).delete(cart::remove_line),
        )
}

/// Create the OTP routes router. Dispatch endpoints are rate limited;
/// verification is not (failures are already single-use-safe).
pub fn otp_routes() -> Router<AppState> {
    let dispatch = Router::new()
        .route("/send", post(otp::send_sms))
        .route("/email/send", post(otp::send_email))
        .layer(otp_rate_limiter());

    Router::new()
        .route("/verify", post(otp::verify_sms))
        .route("/email/verify", post(otp::verify_email))
        .merge(dispatch)
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::create_order).get(orders::mine))
        .route("/verify-payment", post(checkout::verify_payment))
}

/// Create all routes for the server.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .route("/slider", get(slider::index))
        .nest("/cart", cart_routes())
        .nest("/otp", otp_routes())
        .route("/shipping/estimate", post(shipping::estimate))
        .nest("/orders", order_routes())
        .route("/contact", post(contact::send))
        .nest("/admin", admin::routes())
}
