use std::env;

use crate::crm::HubSpotConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub base_url: String,
    /// Signing secret shared with the identity provider (whsec_... format)
    pub webhook_secret: String,
    /// HubSpot credentials; None disables deal creation (dev/test)
    pub hubspot: Option<HubSpotConfig>,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("VOYAGER_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let base_url =
            env::var("BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));

        // HubSpot is optional: without an API key the quote endpoint still
        // prices quotes, it just skips contact/deal creation.
        let hubspot = env::var("HUBSPOT_API_KEY").ok().map(|api_key| HubSpotConfig {
            api_key,
            pipeline_id: env::var("HUBSPOT_PIPELINE_ID")
                .unwrap_or_else(|_| "default".to_string()),
            stage_id: env::var("HUBSPOT_STAGE_ID")
                .unwrap_or_else(|_| "appointmentscheduled".to_string()),
        });

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "voyager.db".to_string()),
            base_url,
            webhook_secret: env::var("IDENTITY_WEBHOOK_SECRET")
                .unwrap_or_else(|_| "whsec_dev".to_string()),
            hubspot,
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
