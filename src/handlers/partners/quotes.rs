//! Partner quote submission.
//!
//! Prices the configuration through the pricing engine, then pushes a
//! contact and deal into the CRM when a client is configured. Pricing
//! always succeeds even when the CRM is down; the CRM ids are simply
//! absent from the response.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::crm::{summarize_commission_items, summarize_features, DealRequest};
use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::models::{PartnerContext, QuoteRequest, QuoteResponse, UpdateOrganizationPricing};
use crate::pricing::calculate_partner_price;

/// POST /partner/quote
pub async fn create_quote(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>> {
    request.validate()?;

    let (user, org) = {
        let conn = state.db.get()?;
        let user = queries::get_user_by_id(&conn, &request.user_id)?
            .ok_or_else(|| AppError::NotFound(format!("user '{}' not found", request.user_id)))?;
        let org = match &request.org_id {
            Some(org_id) => Some(
                queries::get_organization_by_id(&conn, org_id)?.ok_or_else(|| {
                    AppError::NotFound(format!("organization '{}' not found", org_id))
                })?,
            ),
            None => None,
        };
        (user, org)
    };

    let partner = PartnerContext::from_session(&user, org.as_ref());
    let quote = calculate_partner_price(request.base_price, Some(&partner), request.quantity);

    tracing::info!(
        "Quote priced: partner={}, tier={}, price={}, commission={}",
        partner.brand_source,
        request.tier,
        quote.price,
        quote.commission
    );

    let mut contact_id = None;
    let mut deal_id = None;

    if let Some(hubspot) = &state.hubspot {
        let commission_summary = if quote.commission > 0.0 {
            format!(
                "{}\nCommission: {:.2}",
                summarize_commission_items(&request.commission_items),
                quote.commission
            )
        } else {
            summarize_commission_items(&request.commission_items)
        };

        let deal = DealRequest {
            name: format!("{} - {}", partner.brand_source, request.tier),
            amount: quote.price,
            tier: request.tier.clone(),
            pricing_type: partner.config.pricing_type.to_string(),
            feature_summary: summarize_features(&request.features),
            commission_summary,
            project_details: request.project_details.clone(),
            project_link: request.immersion_link.clone(),
            brand_source: partner.brand_source.clone(),
            contact_id: String::new(),
        };

        // CRM failures degrade the response rather than failing the quote.
        match hubspot.upsert_contact(&partner.email).await {
            Ok(id) => {
                let deal = DealRequest {
                    contact_id: id.clone(),
                    ..deal
                };
                match hubspot.create_deal(&deal).await {
                    Ok(did) => deal_id = Some(did),
                    Err(e) => tracing::error!("Deal creation failed: {}", e),
                }
                contact_id = Some(id);
            }
            Err(e) => tracing::error!("Contact upsert failed: {}", e),
        }
    }

    Ok(Json(QuoteResponse {
        quote,
        brand_source: partner.brand_source,
        contact_id,
        deal_id,
    }))
}

/// PUT /partner/{org_id}/pricing
///
/// Ops surface for partner pricing terms. Identity webhooks never touch
/// these columns.
pub async fn update_pricing_config(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
    Json(input): Json<UpdateOrganizationPricing>,
) -> Result<StatusCode> {
    input.validate()?;

    let conn = state.db.get()?;
    queries::get_organization_by_id(&conn, &org_id)?
        .ok_or_else(|| AppError::NotFound(format!("organization '{}' not found", org_id)))?;

    queries::update_organization_pricing(&conn, &org_id, &input)?;
    Ok(StatusCode::NO_CONTENT)
}
