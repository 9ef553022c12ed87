use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Brand colors applied to organizations that have not uploaded their own.
pub const DEFAULT_PRIMARY_COLOR: &str = "#E79023";
pub const DEFAULT_SECONDARY_COLOR: &str = "#a6620c";

/// Partner business model. White-label partners resell at their own price;
/// referral partners earn a commission on platform-billed deals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PricingType {
    WhiteLabel,
    Referral,
}

impl PricingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingType::WhiteLabel => "white-label",
            PricingType::Referral => "referral",
        }
    }
}

impl FromStr for PricingType {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "white-label" => Ok(PricingType::WhiteLabel),
            "referral" => Ok(PricingType::Referral),
            _ => Err(()),
        }
    }
}

impl fmt::Display for PricingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Organization record mirrored from the identity provider, plus the
/// partner pricing configuration managed on our side.
///
/// Pricing overrides are optional; absent values fall back to platform
/// defaults when a PartnerContext is derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub external_id: String,
    pub name: String,
    /// White-label routing slug (acme in acme.voyager.example). Unique.
    pub subdomain: String,
    pub logo: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub pricing_type: PricingType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier1: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier3: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit1: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<f64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for the organization.created upsert.
#[derive(Debug, Clone)]
pub struct CreateOrganization {
    pub external_id: String,
    pub name: String,
    pub subdomain: String,
}

/// Input for organization.updated - only name and subdomain move.
#[derive(Debug, Clone)]
pub struct UpdateOrganizationProfile {
    pub name: String,
    pub subdomain: String,
}

/// Partner pricing settings, managed via the ops surface (not webhooks).
#[derive(Debug, Default, Deserialize)]
pub struct UpdateOrganizationPricing {
    pub pricing_type: Option<PricingType>,
    pub tier1: Option<f64>,
    pub tier2: Option<f64>,
    pub tier3: Option<f64>,
    pub unit1: Option<f64>,
    pub unit2: Option<f64>,
    pub commission_rate: Option<f64>,
}

impl UpdateOrganizationPricing {
    pub fn validate(&self) -> Result<()> {
        if let Some(rate) = self.commission_rate {
            if !(0.0..=1.0).contains(&rate) {
                return Err(AppError::BadRequest(
                    "commission_rate must be between 0 and 1".into(),
                ));
            }
        }
        for (field, value) in [
            ("tier1", self.tier1),
            ("tier2", self.tier2),
            ("tier3", self.tier3),
            ("unit1", self.unit1),
            ("unit2", self.unit2),
        ] {
            if let Some(v) = value {
                if v < 0.0 {
                    return Err(AppError::BadRequest(format!(
                        "{} must be non-negative",
                        field
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Public branding view served to the white-label frontend before a
/// session exists. No pricing configuration leaks through here.
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationBranding {
    pub id: String,
    pub name: String,
    pub subdomain: String,
    pub logo: String,
    pub primary_color: String,
    pub secondary_color: String,
}

impl From<Organization> for OrganizationBranding {
    fn from(o: Organization) -> Self {
        Self {
            id: o.id,
            name: o.name,
            subdomain: o.subdomain,
            logo: o.logo,
            primary_color: o.primary_color,
            secondary_color: o.secondary_color,
        }
    }
}

/// Membership link: Organization references Users by id.
#[derive(Debug, Clone, Serialize)]
pub struct OrgMember {
    pub id: String,
    pub org_id: String,
    pub user_id: String,
    pub created_at: i64,
}
