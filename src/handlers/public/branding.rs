//! Subdomain-based branding resolution.
//!
//! The white-label frontend asks who it is before any session exists: it
//! sends the Host it was served on and gets back the partner's branding,
//! or the platform defaults when the host is the main site.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::models::{
    OrganizationBranding, DEFAULT_PRIMARY_COLOR, DEFAULT_SECONDARY_COLOR, PLATFORM_BRAND,
};

/// Hostnames (leftmost label) that never resolve to a partner.
const RESERVED_SUBDOMAINS: &[&str] = &[PLATFORM_BRAND, "www", "localhost"];

/// Extract the partner subdomain from a Host header value.
///
/// Strips any port, takes the leftmost dot-separated label, and treats
/// reserved labels (the platform's own hosts) as no subdomain at all.
pub fn subdomain_from_host(host: &str) -> Option<String> {
    let host = host.split(':').next().unwrap_or(host).trim();
    let label = host.split('.').next().unwrap_or_default();
    if label.is_empty() {
        return None;
    }
    let label = label.to_ascii_lowercase();
    if RESERVED_SUBDOMAINS.contains(&label.as_str()) {
        return None;
    }
    Some(label)
}

#[derive(Debug, Deserialize)]
pub struct BrandingQuery {
    pub host: String,
}

/// Branding payload. `organization` is None on the platform's own hosts,
/// where the default colors apply.
#[derive(Debug, Serialize)]
pub struct BrandingResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<OrganizationBranding>,
    pub primary_color: String,
    pub secondary_color: String,
}

/// GET /branding?host=acme.voyager.example
///
/// Unknown subdomains are a 404 so the frontend can show its own error
/// page instead of silently falling back to platform branding.
pub async fn get_branding(
    State(state): State<AppState>,
    Query(query): Query<BrandingQuery>,
) -> Result<Json<BrandingResponse>> {
    let Some(subdomain) = subdomain_from_host(&query.host) else {
        return Ok(Json(BrandingResponse {
            organization: None,
            primary_color: DEFAULT_PRIMARY_COLOR.to_string(),
            secondary_color: DEFAULT_SECONDARY_COLOR.to_string(),
        }));
    };

    let conn = state.db.get()?;
    let org = queries::get_organization_by_subdomain(&conn, &subdomain)?
        .ok_or_else(|| AppError::NotFound(format!("no organization for subdomain '{}'", subdomain)))?;

    let branding = OrganizationBranding::from(org);
    let primary_color = branding.primary_color.clone();
    let secondary_color = branding.secondary_color.clone();
    Ok(Json(BrandingResponse {
        organization: Some(branding),
        primary_color,
        secondary_color,
    }))
}
