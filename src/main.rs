use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::sync::Arc;

use voyager_partners::config::Config;
use voyager_partners::crm::HubSpotClient;
use voyager_partners::db::{create_pool, init_db, queries, AppState};
use voyager_partners::handlers;
use voyager_partners::models::{
    CreateOrganization, PricingType, UpdateOrganizationPricing, UpsertUser,
};

#[derive(Parser, Debug)]
#[command(name = "voyager-partners")]
#[command(about = "Partner portal backend: pricing, identity sync, and CRM handoff")]
struct Cli {
    /// Seed the database with dev data (a user, a partner org, a membership)
    #[arg(long)]
    seed: bool,
}

/// Seeds the database with dev data for local testing.
/// Creates: one user, one referral partner organization, and the membership.
/// Only runs in dev mode and when the database is empty.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    let existing = queries::list_organizations(&conn).expect("Failed to list organizations");
    if !existing.is_empty() {
        tracing::info!("Database already has data, skipping seed");
        return;
    }

    tracing::info!("============================================");
    tracing::info!("SEEDING DEV DATA");
    tracing::info!("============================================");

    let user = queries::upsert_user(
        &conn,
        &UpsertUser {
            external_id: "user_dev".to_string(),
            display_name: "Dev User".to_string(),
            email: "dev@voyager.local".to_string(),
            avatar: String::new(),
        },
    )
    .expect("Failed to seed dev user");
    tracing::info!("User: {} ({})", user.display_name, user.email);

    let org = queries::upsert_organization(
        &conn,
        &CreateOrganization {
            external_id: "org_dev".to_string(),
            name: "Dev Partner".to_string(),
            subdomain: "devpartner".to_string(),
        },
    )
    .expect("Failed to seed dev organization");

    queries::update_organization_pricing(
        &conn,
        &org.id,
        &UpdateOrganizationPricing {
            pricing_type: Some(PricingType::Referral),
            commission_rate: Some(0.25),
            ..Default::default()
        },
    )
    .expect("Failed to set dev pricing");

    queries::add_org_member(&conn, &org.id, &user.id).expect("Failed to seed membership");

    tracing::info!("Organization: {} (subdomain: {})", org.name, org.subdomain);
    tracing::info!("============================================");
    tracing::info!("DEV DATA SEEDED SUCCESSFULLY");
    tracing::info!("============================================");

    println!();
    println!("--- COPY FROM HERE ---");
    println!("  user_id: {}", user.id);
    println!("  org_id: {}", org.id);
    println!("  branding_host: devpartner.localhost:3000");
    println!("--- END COPY ---");
    println!();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voyager_partners=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let hubspot = config
        .hubspot
        .as_ref()
        .map(|cfg| Arc::new(HubSpotClient::new(cfg)));
    if hubspot.is_none() {
        tracing::info!("HubSpot disabled (no HUBSPOT_API_KEY): quotes will not create deals");
    }

    let state = AppState {
        db: db_pool,
        webhook_secret: config.webhook_secret.clone(),
        hubspot,
    };

    // Seed dev data if --seed flag is passed (only in dev mode)
    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set VOYAGER_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    let app = Router::new()
        // Public endpoints (no auth)
        .merge(handlers::public::router())
        // Identity provider webhooks (signature auth)
        .merge(handlers::webhooks::router())
        // Partner API
        .merge(handlers::partners::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Voyager partners server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
