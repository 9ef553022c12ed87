use serde::Serialize;

use crate::models::{Organization, PricingType, User};
use crate::pricing::{
    DEFAULT_COMMISSION_RATE, DEFAULT_TIER1, DEFAULT_TIER2, DEFAULT_TIER3, DEFAULT_UNIT1,
    DEFAULT_UNIT2,
};

/// Attribution fallback when neither a user nor an org name is available.
pub const PLATFORM_BRAND: &str = "voyager";

/// Organization id stand-in for users quoting without an organization.
pub const DEFAULT_PARTNER_ID: &str = "default";

/// Fully resolved pricing numbers - org overrides with platform defaults
/// filling every gap, so the pricing engine never sees an absent value.
#[derive(Debug, Clone, Serialize)]
pub struct PartnerPricing {
    pub tier1: f64,
    pub tier2: f64,
    pub tier3: f64,
    pub unit1: f64,
    pub unit2: f64,
    pub commission_rate: f64,
}

impl Default for PartnerPricing {
    fn default() -> Self {
        Self {
            tier1: DEFAULT_TIER1,
            tier2: DEFAULT_TIER2,
            tier3: DEFAULT_TIER3,
            unit1: DEFAULT_UNIT1,
            unit2: DEFAULT_UNIT2,
            commission_rate: DEFAULT_COMMISSION_RATE,
        }
    }
}

impl PartnerPricing {
    /// Resolve an organization's overrides against platform defaults.
    pub fn resolve(org: Option<&Organization>) -> Self {
        let defaults = Self::default();
        match org {
            Some(org) => Self {
                tier1: org.tier1.unwrap_or(defaults.tier1),
                tier2: org.tier2.unwrap_or(defaults.tier2),
                tier3: org.tier3.unwrap_or(defaults.tier3),
                unit1: org.unit1.unwrap_or(defaults.unit1),
                unit2: org.unit2.unwrap_or(defaults.unit2),
                commission_rate: org.commission_rate.unwrap_or(defaults.commission_rate),
            },
            None => defaults,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PartnerConfig {
    pub pricing_type: PricingType,
    pub pricing: PartnerPricing,
}

/// Session-derived partner view. Never persisted - always recomputed from
/// the current (user, organization) pair plus defaults, and passed into
/// the pricing engine explicitly rather than read from ambient state.
#[derive(Debug, Clone, Serialize)]
pub struct PartnerContext {
    pub name: String,
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub email: String,
    /// CRM attribution string: "<user> @ <org>", falling back to the org
    /// name, then the user name, then the platform brand.
    pub brand_source: String,
    pub config: PartnerConfig,
}

impl PartnerContext {
    pub fn from_session(user: &User, org: Option<&Organization>) -> Self {
        let org_name = org.map(|o| o.name.trim().to_string()).unwrap_or_default();
        let user_name = user.display_name.trim().to_string();

        let brand_source = match (user_name.is_empty(), org_name.is_empty()) {
            (false, false) => format!("{} @ {}", user_name, org_name),
            (true, false) => org_name.clone(),
            (false, true) => user_name.clone(),
            (true, true) => PLATFORM_BRAND.to_string(),
        };

        Self {
            name: if org_name.is_empty() {
                user_name.clone()
            } else {
                org_name
            },
            id: org
                .map(|o| o.id.clone())
                .unwrap_or_else(|| DEFAULT_PARTNER_ID.to_string()),
            user_id: user.id.clone(),
            user_name,
            email: user.email.clone(),
            brand_source,
            config: PartnerConfig {
                pricing_type: org.map(|o| o.pricing_type).unwrap_or(PricingType::WhiteLabel),
                pricing: PartnerPricing::resolve(org),
            },
        }
    }
}
