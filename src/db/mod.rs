mod from_row;
pub mod queries;
mod schema;

pub use from_row::{query_all, query_one, FromRow};
pub use schema::init_db;

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::crm::HubSpotClient;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// Shared secret for identity-provider webhook signatures
    pub webhook_secret: String,
    /// CRM client; None skips contact/deal creation (dev/test)
    pub hubspot: Option<Arc<HubSpotClient>>,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}
