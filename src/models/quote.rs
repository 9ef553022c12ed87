use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::pricing::PriceQuote;

/// A configured feature line on a quote (name/value pair).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteFeature {
    pub name: String,
    pub value: String,
}

/// Quote request built by the partner dashboard. Partner identity comes
/// in as explicit ids - the handler loads the session user/org and derives
/// the PartnerContext from them.
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub user_id: String,
    #[serde(default)]
    pub org_id: Option<String>,
    pub base_price: f64,
    pub tier: String,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub features: Vec<QuoteFeature>,
    #[serde(default)]
    pub commission_items: Vec<String>,
    #[serde(default)]
    pub project_details: String,
    #[serde(default)]
    pub immersion_link: String,
}

impl QuoteRequest {
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(AppError::BadRequest("user_id is required".into()));
        }
        if self.base_price < 0.0 || !self.base_price.is_finite() {
            return Err(AppError::BadRequest(
                "base_price must be a non-negative number".into(),
            ));
        }
        if self.tier.trim().is_empty() {
            return Err(AppError::BadRequest("tier is required".into()));
        }
        Ok(())
    }
}

/// Response for a priced (and optionally CRM-submitted) quote.
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub quote: PriceQuote,
    pub brand_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<String>,
}
