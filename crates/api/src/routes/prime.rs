use axum::routing::get;
use axum::Router;

use crate::handlers::prime;
use crate::state::AppState;

/// Prime routes mounted at the root.
///
/// ```text
/// GET  /   -> check_prime
/// POST /   -> check_prime
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(prime::check_prime).post(prime::check_prime))
}
