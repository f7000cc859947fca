pub mod health;
pub mod prime;

use axum::Router;

use crate::state::AppState;

/// Build the public route tree.
///
/// ```text
/// GET  /          ?n=<integer> | ?key=<handle>
/// POST /          same as GET
/// ```
///
/// `/health` is mounted separately by the router builder.
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(prime::router())
}
