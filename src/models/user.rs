use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Whether a user is a standalone individual or belongs to a partner org.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserType {
    Individual,
    OrganizationMember,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Individual => "individual",
            UserType::OrganizationMember => "organization-member",
        }
    }
}

impl FromStr for UserType {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "individual" => Ok(UserType::Individual),
            "organization-member" => Ok(UserType::OrganizationMember),
            _ => Err(()),
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User record mirrored from the identity provider.
/// `external_id` is the provider's id and the idempotency key for sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub external_id: String,
    pub display_name: String,
    pub email: String,
    pub avatar: String,
    pub user_type: UserType,
    pub is_reseller: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Fields recomputed from every user.created / user.updated event.
/// Both events take the same upsert path; `user_type` and `is_reseller`
/// keep their stored values on re-delivery.
#[derive(Debug, Clone)]
pub struct UpsertUser {
    pub external_id: String,
    pub display_name: String,
    pub email: String,
    pub avatar: String,
}
