//! Identity-provider webhook reconciler.
//!
//! Keeps local User and Organization records consistent with lifecycle
//! events from the external identity/org-management provider. Every event
//! is authenticated before any store access, then applied as an idempotent
//! upsert keyed on the provider's id, so at-least-once delivery is safe.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::models::{CreateOrganization, UpdateOrganizationProfile, UpsertUser, UserType};

type HmacSha256 = Hmac<Sha256>;

/// Result type for webhook operations: plain status plus a short message.
pub type WebhookResult = (StatusCode, &'static str);

/// Maximum age of a webhook timestamp before it's rejected (in seconds).
const WEBHOOK_TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// Clock skew tolerance for timestamps from the future (in seconds).
const WEBHOOK_FUTURE_SKEW_SECS: i64 = 60;

/// Verify an identity-provider webhook signature.
///
/// The signed content is `"{msg_id}.{timestamp}.{body}"`, MACed with the
/// shared secret (base64 payload after an optional `whsec_` prefix). The
/// signature header carries one or more space-separated `v1,<base64>`
/// entries; verification succeeds when any of them matches.
pub fn verify_webhook_signature(
    secret: &str,
    msg_id: &str,
    timestamp: &str,
    signature_header: &str,
    payload: &[u8],
) -> Result<bool> {
    let ts: i64 = timestamp
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid webhook timestamp".into()))?;

    let now = chrono::Utc::now().timestamp();
    let age = now - ts;

    if age > WEBHOOK_TIMESTAMP_TOLERANCE_SECS {
        tracing::warn!(
            "Identity webhook rejected: timestamp too old (age={}s, max={}s)",
            age,
            WEBHOOK_TIMESTAMP_TOLERANCE_SECS
        );
        return Ok(false);
    }

    if age < -WEBHOOK_FUTURE_SKEW_SECS {
        tracing::warn!(
            "Identity webhook rejected: timestamp in the future (age={}s)",
            age
        );
        return Ok(false);
    }

    let key_b64 = secret.strip_prefix("whsec_").unwrap_or(secret);
    let key = BASE64
        .decode(key_b64)
        .map_err(|_| AppError::Internal("Invalid webhook secret".into()))?;

    let mut mac = HmacSha256::new_from_slice(&key)
        .map_err(|_| AppError::Internal("Invalid webhook secret".into()))?;
    mac.update(msg_id.as_bytes());
    mac.update(b".");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = BASE64.encode(mac.finalize().into_bytes());
    let expected_bytes = expected.as_bytes();

    // The header may list several versioned signatures (key rotation).
    for entry in signature_header.split_whitespace() {
        let Some(sig) = entry.strip_prefix("v1,") else {
            continue;
        };
        // Constant-time comparison; signature length is not secret.
        if sig.len() == expected_bytes.len()
            && bool::from(sig.as_bytes().ct_eq(expected_bytes))
        {
            return Ok(true);
        }
    }

    Ok(false)
}

// ============ Event payloads ============

#[derive(Debug, serde::Deserialize)]
struct IdentityEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: serde_json::Value,
}

#[derive(Debug, serde::Deserialize)]
struct UserPayload {
    id: String,
    first_name: Option<String>,
    last_name: Option<String>,
    #[serde(default)]
    email_addresses: Vec<EmailAddressPayload>,
    image_url: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct EmailAddressPayload {
    email_address: String,
}

#[derive(Debug, serde::Deserialize)]
struct OrganizationPayload {
    id: String,
    name: String,
    /// Provider slug, used as the white-label routing subdomain
    slug: String,
}

#[derive(Debug, serde::Deserialize)]
struct MembershipPayload {
    organization: MembershipOrgRef,
    public_user_data: MembershipUserRef,
}

#[derive(Debug, serde::Deserialize)]
struct MembershipOrgRef {
    id: String,
}

#[derive(Debug, serde::Deserialize)]
struct MembershipUserRef {
    user_id: String,
}

/// Trimmed "first last", defaulting to "User" when both parts are blank.
pub fn display_name_from(first: Option<&str>, last: Option<&str>) -> String {
    let name = format!(
        "{} {}",
        first.unwrap_or_default().trim(),
        last.unwrap_or_default().trim()
    );
    let name = name.trim();
    if name.is_empty() {
        "User".to_string()
    } else {
        name.to_string()
    }
}

impl UserPayload {
    fn into_upsert(self) -> UpsertUser {
        let display_name =
            display_name_from(self.first_name.as_deref(), self.last_name.as_deref());
        let email = self
            .email_addresses
            .into_iter()
            .next()
            .map(|e| e.email_address)
            .unwrap_or_default();
        UpsertUser {
            external_id: self.id,
            display_name,
            email,
            avatar: self.image_url.unwrap_or_default(),
        }
    }
}

// ============ Header extraction ============

fn extract_header<'a>(
    headers: &'a HeaderMap,
    name: &'static str,
) -> std::result::Result<&'a str, WebhookResult> {
    headers
        .get(name)
        .ok_or((StatusCode::BAD_REQUEST, "Missing webhook header"))?
        .to_str()
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid webhook header"))
}

// ============ Event application ============

fn apply_user_upsert(state: &AppState, data: serde_json::Value) -> WebhookResult {
    let payload: UserPayload = match serde_json::from_value(data) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!("Failed to parse user payload: {}", e);
            return (StatusCode::BAD_REQUEST, "Invalid user payload");
        }
    };

    let conn = match state.db.get() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("DB connection error: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    };

    let input = payload.into_upsert();
    match queries::upsert_user(&conn, &input) {
        Ok(user) => {
            tracing::info!(
                "User synced: external_id={}, display_name={}",
                user.external_id,
                user.display_name
            );
            (StatusCode::OK, "OK")
        }
        Err(e) => {
            tracing::error!("Failed to upsert user {}: {}", input.external_id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}

fn apply_organization_created(state: &AppState, data: serde_json::Value) -> WebhookResult {
    let payload: OrganizationPayload = match serde_json::from_value(data) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!("Failed to parse organization payload: {}", e);
            return (StatusCode::BAD_REQUEST, "Invalid organization payload");
        }
    };

    let conn = match state.db.get() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("DB connection error: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    };

    let input = CreateOrganization {
        external_id: payload.id,
        name: payload.name,
        subdomain: payload.slug,
    };
    match queries::upsert_organization(&conn, &input) {
        Ok(org) => {
            tracing::info!(
                "Organization synced: external_id={}, subdomain={}",
                org.external_id,
                org.subdomain
            );
            (StatusCode::OK, "OK")
        }
        Err(AppError::Conflict(msg)) => {
            tracing::warn!("Organization create conflict: {}", msg);
            (StatusCode::CONFLICT, "Subdomain already in use")
        }
        Err(e) => {
            tracing::error!("Failed to upsert organization {}: {}", input.external_id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}

fn apply_organization_updated(state: &AppState, data: serde_json::Value) -> WebhookResult {
    let payload: OrganizationPayload = match serde_json::from_value(data) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!("Failed to parse organization payload: {}", e);
            return (StatusCode::BAD_REQUEST, "Invalid organization payload");
        }
    };

    let conn = match state.db.get() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("DB connection error: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    };

    let input = UpdateOrganizationProfile {
        name: payload.name,
        subdomain: payload.slug,
    };
    // Updates never implicitly create: unknown external id is a 404.
    match queries::update_organization_profile(&conn, &payload.id, &input) {
        Ok(Some(org)) => {
            tracing::info!(
                "Organization updated: external_id={}, subdomain={}",
                org.external_id,
                org.subdomain
            );
            (StatusCode::OK, "OK")
        }
        Ok(None) => {
            tracing::warn!("Organization not found for update: {}", payload.id);
            (StatusCode::NOT_FOUND, "Organization not found")
        }
        Err(AppError::Conflict(msg)) => {
            tracing::warn!("Organization update conflict: {}", msg);
            (StatusCode::CONFLICT, "Subdomain already in use")
        }
        Err(e) => {
            tracing::error!("Failed to update organization {}: {}", payload.id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}

fn apply_membership(state: &AppState, data: serde_json::Value, created: bool) -> WebhookResult {
    let payload: MembershipPayload = match serde_json::from_value(data) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!("Failed to parse membership payload: {}", e);
            return (StatusCode::BAD_REQUEST, "Invalid membership payload");
        }
    };

    let conn = match state.db.get() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("DB connection error: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    };

    // Membership events can arrive before the user/org sync - acknowledge
    // and let the provider's ordering sort itself out on the next event.
    let org = match queries::get_organization_by_external_id(&conn, &payload.organization.id) {
        Ok(Some(o)) => o,
        Ok(None) => {
            tracing::warn!(
                "Membership event for unknown organization: {}",
                payload.organization.id
            );
            return (StatusCode::OK, "Organization not yet synced");
        }
        Err(e) => {
            tracing::error!("DB error: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    };

    let user = match queries::get_user_by_external_id(&conn, &payload.public_user_data.user_id) {
        Ok(Some(u)) => u,
        Ok(None) => {
            tracing::warn!(
                "Membership event for unknown user: {}",
                payload.public_user_data.user_id
            );
            return (StatusCode::OK, "User not yet synced");
        }
        Err(e) => {
            tracing::error!("DB error: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    };

    let result = if created {
        queries::add_org_member(&conn, &org.id, &user.id)
            .and_then(|_| queries::set_user_type(&conn, &user.id, UserType::OrganizationMember))
    } else {
        queries::remove_org_member(&conn, &org.id, &user.id)
    };

    match result {
        Ok(_) => {
            tracing::info!(
                "Membership {}: org={}, user={}",
                if created { "added" } else { "removed" },
                org.external_id,
                user.external_id
            );
            (StatusCode::OK, "OK")
        }
        Err(e) => {
            tracing::error!("Failed to apply membership event: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}

/// Axum handler for identity-provider webhooks.
///
/// Rejects before touching the store unless all three authenticity headers
/// are present and the signature verifies. Unrecognized event types are
/// acknowledged without action for forward compatibility.
pub async fn handle_identity_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let msg_id = match extract_header(&headers, "webhook-id") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let timestamp = match extract_header(&headers, "webhook-timestamp") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let signature = match extract_header(&headers, "webhook-signature") {
        Ok(v) => v,
        Err(e) => return e,
    };

    match verify_webhook_signature(&state.webhook_secret, msg_id, timestamp, signature, &body) {
        Ok(true) => {}
        Ok(false) => return (StatusCode::UNAUTHORIZED, "Invalid signature"),
        Err(e) => {
            tracing::error!("Signature verification error: {}", e);
            return (StatusCode::BAD_REQUEST, "Signature verification failed");
        }
    }

    let event: IdentityEvent = match serde_json::from_slice(&body) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to parse identity webhook: {}", e);
            return (StatusCode::BAD_REQUEST, "Invalid JSON");
        }
    };

    match event.event_type.as_str() {
        "user.created" | "user.updated" => apply_user_upsert(&state, event.data),
        "organization.created" => apply_organization_created(&state, event.data),
        "organization.updated" => apply_organization_updated(&state, event.data),
        "organizationMembership.created" => apply_membership(&state, event.data, true),
        "organizationMembership.deleted" => apply_membership(&state, event.data, false),
        _ => (StatusCode::OK, "Event ignored"),
    }
}
