//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to
/// rusqlite errors instead of panicking on corrupt values.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const USER_COLS: &str =
    "id, external_id, display_name, email, avatar, user_type, is_reseller, created_at, updated_at";

pub const ORGANIZATION_COLS: &str = "id, external_id, name, subdomain, logo, primary_color, secondary_color, pricing_type, tier1, tier2, tier3, unit1, unit2, commission_rate, created_at, updated_at";

pub const ORG_MEMBER_COLS: &str = "id, org_id, user_id, created_at";

// ============ FromRow Implementations ============

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            external_id: row.get(1)?,
            display_name: row.get(2)?,
            email: row.get(3)?,
            avatar: row.get(4)?,
            user_type: parse_enum(row, 5, "user_type")?,
            is_reseller: row.get::<_, i32>(6)? != 0,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}

impl FromRow for Organization {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Organization {
            id: row.get(0)?,
            external_id: row.get(1)?,
            name: row.get(2)?,
            subdomain: row.get(3)?,
            logo: row.get(4)?,
            primary_color: row.get(5)?,
            secondary_color: row.get(6)?,
            pricing_type: parse_enum(row, 7, "pricing_type")?,
            tier1: row.get(8)?,
            tier2: row.get(9)?,
            tier3: row.get(10)?,
            unit1: row.get(11)?,
            unit2: row.get(12)?,
            commission_rate: row.get(13)?,
            created_at: row.get(14)?,
            updated_at: row.get(15)?,
        })
    }
}

impl FromRow for OrgMember {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(OrgMember {
            id: row.get(0)?,
            org_id: row.get(1)?,
            user_id: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}
