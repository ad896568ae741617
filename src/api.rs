//! HTTP surface. Handlers stay thin: extract, call into `records`, wrap the
//! result in the `{success, ...}` envelope.

mod auth;
mod envelope;
mod handlers;
mod router;

pub use auth::{Auth, JsonBody};
pub use router::build_router;
