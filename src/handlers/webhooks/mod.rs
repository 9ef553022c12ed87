pub mod identity;

pub use identity::handle_identity_webhook;

use axum::{routing::post, Router};

use crate::db::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/webhook/identity", post(handle_identity_webhook))
}
