use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Users mirrored from the identity provider.
        -- external_id is the provider's id and the sync idempotency key.
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            external_id TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL,
            email TEXT NOT NULL DEFAULT '',
            avatar TEXT NOT NULL DEFAULT '',
            user_type TEXT NOT NULL DEFAULT 'individual'
                CHECK (user_type IN ('individual', 'organization-member')),
            is_reseller INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_users_external ON users(external_id);

        -- Partner organizations. Subdomain uniqueness is enforced here:
        -- branding resolution assumes at most one match per slug.
        CREATE TABLE IF NOT EXISTS organizations (
            id TEXT PRIMARY KEY,
            external_id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            subdomain TEXT NOT NULL UNIQUE,
            logo TEXT NOT NULL DEFAULT '',
            primary_color TEXT NOT NULL,
            secondary_color TEXT NOT NULL,
            pricing_type TEXT NOT NULL DEFAULT 'white-label'
                CHECK (pricing_type IN ('white-label', 'referral')),
            tier1 REAL,
            tier2 REAL,
            tier3 REAL,
            unit1 REAL,
            unit2 REAL,
            commission_rate REAL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_organizations_external ON organizations(external_id);
        CREATE INDEX IF NOT EXISTS idx_organizations_subdomain ON organizations(subdomain);

        -- Organization membership (org references users; no back-pointer)
        CREATE TABLE IF NOT EXISTS org_members (
            id TEXT PRIMARY KEY,
            org_id TEXT NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at INTEGER NOT NULL,
            UNIQUE(org_id, user_id)
        );
        CREATE INDEX IF NOT EXISTS idx_org_members_org ON org_members(org_id);
        CREATE INDEX IF NOT EXISTS idx_org_members_user ON org_members(user_id);
        "#,
    )?;
    Ok(())
}
