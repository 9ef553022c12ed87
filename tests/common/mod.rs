//! Test utilities and fixtures for integration tests

#![allow(dead_code)]

use axum::Router;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

pub use voyager_partners::db::{init_db, queries, AppState};
pub use voyager_partners::handlers;
pub use voyager_partners::models::*;

/// Shared secret used by webhook tests: whsec_ prefix + base64 key,
/// matching the identity provider's secret format.
pub const TEST_WEBHOOK_SECRET: &str = "whsec_dGVzdC1zZWNyZXQta2V5LWZvci13ZWJob29rcw==";

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Create an AppState for testing with an in-memory database.
/// Pool size 1 so every handler call sees the same in-memory database.
pub fn create_test_app_state() -> AppState {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }

    AppState {
        db: pool,
        webhook_secret: TEST_WEBHOOK_SECRET.to_string(),
        hubspot: None,
    }
}

/// Full application router over a fresh test state
pub fn test_app(state: AppState) -> Router {
    Router::new()
        .merge(handlers::public::router())
        .merge(handlers::webhooks::router())
        .merge(handlers::partners::router())
        .with_state(state)
}

/// Create a test user synced from the identity provider
pub fn create_test_user(conn: &Connection, external_id: &str, name: &str, email: &str) -> User {
    let input = UpsertUser {
        external_id: external_id.to_string(),
        display_name: name.to_string(),
        email: email.to_string(),
        avatar: String::new(),
    };
    queries::upsert_user(conn, &input).expect("Failed to create test user")
}

/// Create a test organization
pub fn create_test_org(
    conn: &Connection,
    external_id: &str,
    name: &str,
    subdomain: &str,
) -> Organization {
    let input = CreateOrganization {
        external_id: external_id.to_string(),
        name: name.to_string(),
        subdomain: subdomain.to_string(),
    };
    queries::upsert_organization(conn, &input).expect("Failed to create test organization")
}

/// Switch an organization to referral pricing with the given rate
pub fn make_referral(conn: &Connection, org_id: &str, commission_rate: f64) {
    let input = UpdateOrganizationPricing {
        pricing_type: Some(PricingType::Referral),
        commission_rate: Some(commission_rate),
        ..Default::default()
    };
    queries::update_organization_pricing(conn, org_id, &input)
        .expect("Failed to update test pricing");
}

/// Get the current timestamp
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Compute a valid identity webhook signature header ("v1,<base64>")
pub fn sign_webhook(secret: &str, msg_id: &str, timestamp: &str, payload: &[u8]) -> String {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let key_b64 = secret.strip_prefix("whsec_").unwrap_or(secret);
    let key = BASE64.decode(key_b64).expect("valid base64 secret");
    let mut mac = HmacSha256::new_from_slice(&key).expect("HMAC can take key of any size");
    mac.update(format!("{}.{}.", msg_id, timestamp).as_bytes());
    mac.update(payload);
    format!("v1,{}", BASE64.encode(mac.finalize().into_bytes()))
}
