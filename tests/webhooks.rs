//! Identity webhook tests: signature verification and event reconciliation.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::json;
use tower::ServiceExt;

use common::*;
use voyager_partners::handlers::webhooks::identity::verify_webhook_signature;

// ============ Signature verification ============

fn current_timestamp() -> String {
    now().to_string()
}

/// 10 minutes ago - beyond the 5-minute tolerance
fn old_timestamp() -> String {
    (now() - 600).to_string()
}

#[test]
fn test_valid_signature() {
    let payload = b"{\"type\":\"user.created\"}";
    let timestamp = current_timestamp();
    let signature = sign_webhook(TEST_WEBHOOK_SECRET, "msg_1", &timestamp, payload);

    let result =
        verify_webhook_signature(TEST_WEBHOOK_SECRET, "msg_1", &timestamp, &signature, payload)
            .expect("Verification should not error");

    assert!(result, "Valid signature should be accepted");
}

#[test]
fn test_invalid_signature() {
    let payload = b"{\"type\":\"user.created\"}";
    let timestamp = current_timestamp();
    // Sign with a different secret
    let signature = sign_webhook("whsec_d3Jvbmctc2VjcmV0", "msg_1", &timestamp, payload);

    let result =
        verify_webhook_signature(TEST_WEBHOOK_SECRET, "msg_1", &timestamp, &signature, payload)
            .expect("Verification should not error");

    assert!(!result, "Signature from wrong secret should be rejected");
}

#[test]
fn test_modified_payload_rejected() {
    let original = b"{\"type\":\"user.created\"}";
    let modified = b"{\"type\":\"user.created\",\"hacked\":true}";
    let timestamp = current_timestamp();
    let signature = sign_webhook(TEST_WEBHOOK_SECRET, "msg_1", &timestamp, original);

    let result =
        verify_webhook_signature(TEST_WEBHOOK_SECRET, "msg_1", &timestamp, &signature, modified)
            .expect("Verification should not error");

    assert!(!result, "Modified payload should be rejected");
}

#[test]
fn test_different_msg_id_rejected() {
    let payload = b"{}";
    let timestamp = current_timestamp();
    let signature = sign_webhook(TEST_WEBHOOK_SECRET, "msg_1", &timestamp, payload);

    let result =
        verify_webhook_signature(TEST_WEBHOOK_SECRET, "msg_2", &timestamp, &signature, payload)
            .expect("Verification should not error");

    assert!(!result, "Message id is part of the signed content");
}

#[test]
fn test_old_timestamp_rejected() {
    let payload = b"{}";
    let timestamp = old_timestamp();
    let signature = sign_webhook(TEST_WEBHOOK_SECRET, "msg_1", &timestamp, payload);

    let result =
        verify_webhook_signature(TEST_WEBHOOK_SECRET, "msg_1", &timestamp, &signature, payload)
            .expect("Verification should not error");

    assert!(!result, "Old timestamp should be rejected (replay prevention)");
}

#[test]
fn test_non_numeric_timestamp_errors() {
    let payload = b"{}";
    let signature = sign_webhook(TEST_WEBHOOK_SECRET, "msg_1", "not-a-number", payload);

    let result = verify_webhook_signature(
        TEST_WEBHOOK_SECRET,
        "msg_1",
        "not-a-number",
        &signature,
        payload,
    );

    assert!(result.is_err(), "Unparseable timestamp should error");
}

#[test]
fn test_multiple_signature_entries() {
    let payload = b"{}";
    let timestamp = current_timestamp();
    let good = sign_webhook(TEST_WEBHOOK_SECRET, "msg_1", &timestamp, payload);
    // Rotation: an unrelated entry before the matching one
    let header = format!("v1,Zm9vYmFyYmF6 {}", good);

    let result =
        verify_webhook_signature(TEST_WEBHOOK_SECRET, "msg_1", &timestamp, &header, payload)
            .expect("Verification should not error");

    assert!(result, "Any matching entry should verify");
}

// ============ Endpoint dispatch ============

/// Deliver a signed event to the webhook endpoint
async fn deliver(app: Router, msg_id: &str, event: &serde_json::Value) -> StatusCode {
    let payload = serde_json::to_vec(event).unwrap();
    let timestamp = current_timestamp();
    let signature = sign_webhook(TEST_WEBHOOK_SECRET, msg_id, &timestamp, &payload);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook/identity")
                .header("webhook-id", msg_id)
                .header("webhook-timestamp", timestamp)
                .header("webhook-signature", signature)
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();

    response.status()
}

fn user_event(event_type: &str, external_id: &str, first: &str, last: &str) -> serde_json::Value {
    json!({
        "type": event_type,
        "data": {
            "id": external_id,
            "first_name": first,
            "last_name": last,
            "email_addresses": [{ "email_address": "person@example.com" }],
            "image_url": "https://img.example.com/a.png",
        }
    })
}

fn org_event(event_type: &str, external_id: &str, name: &str, slug: &str) -> serde_json::Value {
    json!({
        "type": event_type,
        "data": { "id": external_id, "name": name, "slug": slug }
    })
}

fn membership_event(event_type: &str, org_external: &str, user_external: &str) -> serde_json::Value {
    json!({
        "type": event_type,
        "data": {
            "organization": { "id": org_external },
            "public_user_data": { "user_id": user_external },
        }
    })
}

#[tokio::test]
async fn test_missing_headers_rejected() {
    let state = create_test_app_state();
    let app = test_app(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook/identity")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bad_signature_never_touches_store() {
    let state = create_test_app_state();
    let app = test_app(state.clone());

    let payload = serde_json::to_vec(&user_event("user.created", "user_x", "Eve", "")).unwrap();
    let timestamp = current_timestamp();
    let signature = sign_webhook("whsec_d3Jvbmctc2VjcmV0", "msg_1", &timestamp, &payload);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook/identity")
                .header("webhook-id", "msg_1")
                .header("webhook-timestamp", timestamp)
                .header("webhook-signature", signature)
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let conn = state.db.get().unwrap();
    assert!(queries::get_user_by_external_id(&conn, "user_x")
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_user_created_and_updated() {
    let state = create_test_app_state();

    let status = deliver(
        test_app(state.clone()),
        "msg_1",
        &user_event("user.created", "user_1", "Ada", "Lovelace"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    {
        let conn = state.db.get().unwrap();
        let user = queries::get_user_by_external_id(&conn, "user_1")
            .unwrap()
            .expect("user synced");
        assert_eq!(user.display_name, "Ada Lovelace");
        assert_eq!(user.email, "person@example.com");
        assert_eq!(user.user_type, UserType::Individual);
    }

    // user.updated recomputes the display name on the same row
    let status = deliver(
        test_app(state.clone()),
        "msg_2",
        &user_event("user.updated", "user_1", "Ada", "King"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let conn = state.db.get().unwrap();
    let users = queries::list_users(&conn).unwrap();
    assert_eq!(users.len(), 1, "Update must not create a second row");
    assert_eq!(users[0].display_name, "Ada King");
}

#[tokio::test]
async fn test_user_with_no_name_defaults() {
    let state = create_test_app_state();

    let event = json!({
        "type": "user.created",
        "data": { "id": "user_blank", "first_name": null, "last_name": "  " }
    });
    let status = deliver(test_app(state.clone()), "msg_1", &event).await;
    assert_eq!(status, StatusCode::OK);

    let conn = state.db.get().unwrap();
    let user = queries::get_user_by_external_id(&conn, "user_blank")
        .unwrap()
        .expect("user synced");
    assert_eq!(user.display_name, "User");
    assert_eq!(user.email, "");
}

#[tokio::test]
async fn test_organization_created_idempotent() {
    let state = create_test_app_state();

    for msg_id in ["msg_1", "msg_2"] {
        let status = deliver(
            test_app(state.clone()),
            msg_id,
            &org_event("organization.created", "org_1", "Acme", "acme"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let conn = state.db.get().unwrap();
    let orgs = queries::list_organizations(&conn).unwrap();
    assert_eq!(orgs.len(), 1, "Duplicate delivery must not duplicate the org");
    assert_eq!(orgs[0].subdomain, "acme");
    assert_eq!(orgs[0].primary_color, DEFAULT_PRIMARY_COLOR);
    assert_eq!(orgs[0].pricing_type, PricingType::WhiteLabel);
}

#[tokio::test]
async fn test_organization_updated_unknown_is_404() {
    let state = create_test_app_state();

    let status = deliver(
        test_app(state.clone()),
        "msg_1",
        &org_event("organization.updated", "org_ghost", "Ghost", "ghost"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "Update must never implicitly create");

    let conn = state.db.get().unwrap();
    assert!(queries::list_organizations(&conn).unwrap().is_empty());
}

#[tokio::test]
async fn test_organization_updated_renames() {
    let state = create_test_app_state();

    deliver(
        test_app(state.clone()),
        "msg_1",
        &org_event("organization.created", "org_1", "Acme", "acme"),
    )
    .await;

    // Record a pricing override, then rename: the override must survive
    {
        let conn = state.db.get().unwrap();
        let org = queries::get_organization_by_external_id(&conn, "org_1")
            .unwrap()
            .unwrap();
        make_referral(&conn, &org.id, 0.3);
    }

    let status = deliver(
        test_app(state.clone()),
        "msg_2",
        &org_event("organization.updated", "org_1", "Acme Corp", "acmecorp"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let conn = state.db.get().unwrap();
    let org = queries::get_organization_by_external_id(&conn, "org_1")
        .unwrap()
        .unwrap();
    assert_eq!(org.name, "Acme Corp");
    assert_eq!(org.subdomain, "acmecorp");
    assert_eq!(org.pricing_type, PricingType::Referral);
    assert_eq!(org.commission_rate, Some(0.3));
}

#[tokio::test]
async fn test_membership_lifecycle() {
    let state = create_test_app_state();

    deliver(
        test_app(state.clone()),
        "msg_1",
        &user_event("user.created", "user_1", "Ada", "Lovelace"),
    )
    .await;
    deliver(
        test_app(state.clone()),
        "msg_2",
        &org_event("organization.created", "org_1", "Acme", "acme"),
    )
    .await;

    let status = deliver(
        test_app(state.clone()),
        "msg_3",
        &membership_event("organizationMembership.created", "org_1", "user_1"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (org_id, user_id) = {
        let conn = state.db.get().unwrap();
        let org = queries::get_organization_by_external_id(&conn, "org_1")
            .unwrap()
            .unwrap();
        let user = queries::get_user_by_external_id(&conn, "user_1")
            .unwrap()
            .unwrap();
        assert_eq!(user.user_type, UserType::OrganizationMember);
        let members = queries::list_org_members(&conn, &org.id).unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].user_id, user.id);
        (org.id, user.id)
    };

    // Re-delivery is a no-op
    deliver(
        test_app(state.clone()),
        "msg_4",
        &membership_event("organizationMembership.created", "org_1", "user_1"),
    )
    .await;
    {
        let conn = state.db.get().unwrap();
        assert_eq!(queries::list_org_members(&conn, &org_id).unwrap().len(), 1);
    }

    let status = deliver(
        test_app(state.clone()),
        "msg_5",
        &membership_event("organizationMembership.deleted", "org_1", "user_1"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let conn = state.db.get().unwrap();
    assert!(queries::list_org_members(&conn, &org_id).unwrap().is_empty());
    // User row survives removal
    assert!(queries::get_user_by_id(&conn, &user_id).unwrap().is_some());
}

#[tokio::test]
async fn test_membership_before_sync_is_acknowledged() {
    let state = create_test_app_state();

    // Neither org nor user exist yet: acknowledge, don't fail the delivery
    let status = deliver(
        test_app(state.clone()),
        "msg_1",
        &membership_event("organizationMembership.created", "org_x", "user_x"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_event_acknowledged() {
    let state = create_test_app_state();

    let event = json!({ "type": "session.created", "data": {} });
    let status = deliver(test_app(state), "msg_1", &event).await;
    assert_eq!(status, StatusCode::OK);
}
