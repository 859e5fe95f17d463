//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Embedded app headers (per-shop CSP `frame-ancestors`)
//! 5. Session layer (tower-sessions with `PostgreSQL` store)

pub mod request_id;
pub mod security_headers;
pub mod session;
pub mod shop_auth;

pub use request_id::request_id_middleware;
pub use security_headers::embedded_app_headers_middleware;
pub use session::create_session_layer;
pub use shop_auth::{RequireShop, ShopAuthRejection};
