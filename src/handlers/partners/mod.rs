pub mod quotes;

pub use quotes::{create_quote, update_pricing_config};

use axum::{
    routing::{post, put},
    Router,
};

use crate::db::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/partner/quote", post(create_quote))
        .route("/partner/{org_id}/pricing", put(update_pricing_config))
}
