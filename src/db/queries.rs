use chrono::Utc;
use rusqlite::{params, types::Value, Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::*;

use super::from_row::{
    query_all, query_one, FromRow, ORGANIZATION_COLS, ORG_MEMBER_COLS, USER_COLS,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

/// Detect a UNIQUE constraint violation so callers can surface it as a
/// conflict instead of a generic database error.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Builder for dynamic UPDATE statements with optional fields.
struct UpdateBuilder {
    table: &'static str,
    id: String,
    fields: Vec<(&'static str, Value)>,
}

impl UpdateBuilder {
    fn new(table: &'static str, id: &str) -> Self {
        Self {
            table,
            id: id.to_string(),
            fields: Vec::new(),
        }
    }

    fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    fn set_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    fn execute(mut self, conn: &Connection) -> Result<bool> {
        if self.fields.is_empty() {
            return Ok(false);
        }
        self.fields.push(("updated_at", now().into()));
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.id.into());
        let sql = format!("UPDATE {} SET {} WHERE id = ?", self.table, sets.join(", "));
        let affected = conn.execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(affected > 0)
    }
}

// ============ Users ============

/// Upsert a user keyed on the identity provider's id.
///
/// user.created and user.updated take the same path: re-delivery of either
/// overwrites the synced fields and leaves user_type/is_reseller alone, so
/// duplicate deliveries can never produce duplicate rows.
pub fn upsert_user(conn: &Connection, input: &UpsertUser) -> Result<User> {
    let sql = format!(
        "INSERT INTO users (id, external_id, display_name, email, avatar, user_type, is_reseller, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?7)
         ON CONFLICT(external_id) DO UPDATE SET
             display_name = excluded.display_name,
             email = excluded.email,
             avatar = excluded.avatar,
             updated_at = excluded.updated_at
         RETURNING {}",
        USER_COLS
    );
    let user = conn.query_row(
        &sql,
        params![
            gen_id(),
            &input.external_id,
            &input.display_name,
            &input.email,
            &input.avatar,
            UserType::Individual.as_str(),
            now(),
        ],
        User::from_row,
    )?;
    Ok(user)
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
        &[&id],
    )
}

pub fn get_user_by_external_id(conn: &Connection, external_id: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE external_id = ?1", USER_COLS),
        &[&external_id],
    )
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM users ORDER BY created_at DESC",
            USER_COLS
        ),
        &[],
    )
}

pub fn set_user_type(conn: &Connection, id: &str, user_type: UserType) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE users SET user_type = ?1, updated_at = ?2 WHERE id = ?3",
        params![user_type.as_str(), now(), id],
    )?;
    Ok(affected > 0)
}

pub fn set_user_reseller(conn: &Connection, id: &str, is_reseller: bool) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE users SET is_reseller = ?1, updated_at = ?2 WHERE id = ?3",
        params![is_reseller as i32, now(), id],
    )?;
    Ok(affected > 0)
}

// ============ Organizations ============

/// Upsert an organization keyed on the identity provider's id.
///
/// First delivery creates the record with default branding and white-label
/// pricing; re-delivery refreshes name/subdomain only. One SQL statement,
/// so concurrent duplicate deliveries cannot race into two rows.
pub fn upsert_organization(conn: &Connection, input: &CreateOrganization) -> Result<Organization> {
    let sql = format!(
        "INSERT INTO organizations (id, external_id, name, subdomain, logo, primary_color, secondary_color, pricing_type, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, '', ?5, ?6, ?7, ?8, ?8)
         ON CONFLICT(external_id) DO UPDATE SET
             name = excluded.name,
             subdomain = excluded.subdomain,
             updated_at = excluded.updated_at
         RETURNING {}",
        ORGANIZATION_COLS
    );
    conn.query_row(
        &sql,
        params![
            gen_id(),
            &input.external_id,
            &input.name,
            &input.subdomain,
            DEFAULT_PRIMARY_COLOR,
            DEFAULT_SECONDARY_COLOR,
            PricingType::WhiteLabel.as_str(),
            now(),
        ],
        Organization::from_row,
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!("subdomain '{}' is already in use", input.subdomain))
        } else {
            e.into()
        }
    })
}

pub fn get_organization_by_id(conn: &Connection, id: &str) -> Result<Option<Organization>> {
    query_one(
        conn,
        &format!("SELECT {} FROM organizations WHERE id = ?1", ORGANIZATION_COLS),
        &[&id],
    )
}

pub fn get_organization_by_external_id(
    conn: &Connection,
    external_id: &str,
) -> Result<Option<Organization>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM organizations WHERE external_id = ?1",
            ORGANIZATION_COLS
        ),
        &[&external_id],
    )
}

/// Exact-match subdomain lookup for white-label branding.
pub fn get_organization_by_subdomain(
    conn: &Connection,
    subdomain: &str,
) -> Result<Option<Organization>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM organizations WHERE subdomain = ?1",
            ORGANIZATION_COLS
        ),
        &[&subdomain],
    )
}

pub fn list_organizations(conn: &Connection) -> Result<Vec<Organization>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM organizations ORDER BY created_at DESC",
            ORGANIZATION_COLS
        ),
        &[],
    )
}

/// Apply organization.updated: name and subdomain only.
/// Returns None when no organization has this external id - the caller
/// surfaces that as not-found, never as an implicit create.
pub fn update_organization_profile(
    conn: &Connection,
    external_id: &str,
    input: &UpdateOrganizationProfile,
) -> Result<Option<Organization>> {
    let sql = format!(
        "UPDATE organizations SET name = ?1, subdomain = ?2, updated_at = ?3
         WHERE external_id = ?4
         RETURNING {}",
        ORGANIZATION_COLS
    );
    conn.query_row(
        &sql,
        params![&input.name, &input.subdomain, now(), external_id],
        Organization::from_row,
    )
    .optional()
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!("subdomain '{}' is already in use", input.subdomain))
        } else {
            e.into()
        }
    })
}

/// Update a partner's pricing configuration (ops surface, not webhooks).
pub fn update_organization_pricing(
    conn: &Connection,
    id: &str,
    input: &UpdateOrganizationPricing,
) -> Result<bool> {
    UpdateBuilder::new("organizations", id)
        .set_opt(
            "pricing_type",
            input.pricing_type.map(|t| t.as_str().to_string()),
        )
        .set_opt("tier1", input.tier1)
        .set_opt("tier2", input.tier2)
        .set_opt("tier3", input.tier3)
        .set_opt("unit1", input.unit1)
        .set_opt("unit2", input.unit2)
        .set_opt("commission_rate", input.commission_rate)
        .execute(conn)
}

// ============ Organization members ============

/// Link a user into an organization. Idempotent: re-delivered membership
/// events land on the existing row.
pub fn add_org_member(conn: &Connection, org_id: &str, user_id: &str) -> Result<OrgMember> {
    conn.execute(
        "INSERT INTO org_members (id, org_id, user_id, created_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(org_id, user_id) DO NOTHING",
        params![gen_id(), org_id, user_id, now()],
    )?;
    let member = query_one(
        conn,
        &format!(
            "SELECT {} FROM org_members WHERE org_id = ?1 AND user_id = ?2",
            ORG_MEMBER_COLS
        ),
        &[&org_id, &user_id],
    )?
    .ok_or_else(|| AppError::Internal("membership row missing after upsert".into()))?;
    Ok(member)
}

pub fn remove_org_member(conn: &Connection, org_id: &str, user_id: &str) -> Result<bool> {
    let affected = conn.execute(
        "DELETE FROM org_members WHERE org_id = ?1 AND user_id = ?2",
        params![org_id, user_id],
    )?;
    Ok(affected > 0)
}

pub fn list_org_members(conn: &Connection, org_id: &str) -> Result<Vec<OrgMember>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM org_members WHERE org_id = ?1 ORDER BY created_at",
            ORG_MEMBER_COLS
        ),
        &[&org_id],
    )
}
