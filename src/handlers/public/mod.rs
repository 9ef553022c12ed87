pub mod branding;

pub use branding::{get_branding, subdomain_from_host};

use axum::{routing::get, Router};

use crate::db::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/branding", get(get_branding))
        .route("/health", get(health))
}

async fn health() -> &'static str {
    "OK"
}
