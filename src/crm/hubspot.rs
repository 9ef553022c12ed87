//! HubSpot deal creation for partner quotes.
//!
//! Two calls per quote: look up or create the contact by email, then
//! create a deal associated with it. No compensation is attempted when
//! deal creation fails after the contact was created.

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::QuoteFeature;

const HUBSPOT_API_BASE: &str = "https://api.hubapi.com";

/// HubSpot association type id for deal-to-contact.
const DEAL_TO_CONTACT_ASSOCIATION: u32 = 3;

#[derive(Debug, Clone, Deserialize)]
pub struct HubSpotConfig {
    pub api_key: String,
    pub pipeline_id: String,
    pub stage_id: String,
}

/// Everything a deal record carries, pre-rendered to CRM-friendly strings.
#[derive(Debug, Clone)]
pub struct DealRequest {
    pub name: String,
    pub amount: f64,
    pub tier: String,
    pub pricing_type: String,
    pub feature_summary: String,
    pub commission_summary: String,
    pub project_details: String,
    pub project_link: String,
    pub brand_source: String,
    pub contact_id: String,
}

/// Newline-joined "name: value" feature lines.
pub fn summarize_features(features: &[QuoteFeature]) -> String {
    features
        .iter()
        .map(|f| format!("{}: {}", f.name, f.value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Newline-joined commission items, or the literal "None" when empty.
pub fn summarize_commission_items(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join("\n")
    }
}

#[derive(Debug, Deserialize)]
struct ObjectResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<ObjectResponse>,
}

#[derive(Debug, Clone)]
pub struct HubSpotClient {
    client: Client,
    api_key: String,
    pipeline_id: String,
    stage_id: String,
}

impl HubSpotClient {
    pub fn new(config: &HubSpotConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            pipeline_id: config.pipeline_id.clone(),
            stage_id: config.stage_id.clone(),
        }
    }

    /// Look up a contact by email, creating it when absent. Returns the
    /// contact id.
    pub async fn upsert_contact(&self, email: &str) -> Result<String> {
        let search = json!({
            "filterGroups": [{
                "filters": [{
                    "propertyName": "email",
                    "operator": "EQ",
                    "value": email,
                }]
            }],
            "limit": 1,
        });

        let response = self
            .client
            .post(format!(
                "{}/crm/v3/objects/contacts/search",
                HUBSPOT_API_BASE
            ))
            .bearer_auth(&self.api_key)
            .json(&search)
            .send()
            .await
            .map_err(|e| AppError::Crm(format!("contact search failed: {}", e)))?;

        if response.status().is_success() {
            let found: SearchResponse = response
                .json()
                .await
                .map_err(|e| AppError::Crm(format!("invalid contact search response: {}", e)))?;
            if let Some(contact) = found.results.into_iter().next() {
                return Ok(contact.id);
            }
        } else {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Crm(format!(
                "contact search failed: {}",
                error_text
            )));
        }

        let create = json!({
            "properties": { "email": email }
        });

        let response = self
            .client
            .post(format!("{}/crm/v3/objects/contacts", HUBSPOT_API_BASE))
            .bearer_auth(&self.api_key)
            .json(&create)
            .send()
            .await
            .map_err(|e| AppError::Crm(format!("contact create failed: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Crm(format!(
                "contact create failed: {}",
                error_text
            )));
        }

        let created: ObjectResponse = response
            .json()
            .await
            .map_err(|e| AppError::Crm(format!("invalid contact response: {}", e)))?;
        Ok(created.id)
    }

    /// Create a deal and associate it with the contact. Returns the deal id.
    pub async fn create_deal(&self, deal: &DealRequest) -> Result<String> {
        let body = json!({
            "properties": {
                "dealname": deal.name,
                "pipeline": self.pipeline_id,
                "dealstage": self.stage_id,
                "amount": format!("{}", deal.amount),
                "configuration_tier": deal.tier,
                "configuration_type": deal.pricing_type,
                "feature_summary": deal.feature_summary,
                "commission_summary": deal.commission_summary,
                "project_details": deal.project_details,
                "project_link": deal.project_link,
                "brand_source": deal.brand_source,
            },
            "associations": [{
                "to": { "id": deal.contact_id },
                "types": [{
                    "associationCategory": "HUBSPOT_DEFINED",
                    "associationTypeId": DEAL_TO_CONTACT_ASSOCIATION,
                }]
            }]
        });

        let response = self
            .client
            .post(format!("{}/crm/v3/objects/deals", HUBSPOT_API_BASE))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Crm(format!("deal create failed: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Crm(format!("deal create failed: {}", error_text)));
        }

        let created: ObjectResponse = response
            .json()
            .await
            .map_err(|e| AppError::Crm(format!("invalid deal response: {}", e)))?;

        tracing::info!(
            "HubSpot deal created: deal_id={}, contact_id={}, amount={}",
            created.id,
            deal.contact_id,
            deal.amount
        );

        Ok(created.id)
    }
}
