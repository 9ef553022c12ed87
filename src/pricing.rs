//! Partner pricing engine.
//!
//! Both partner models share one cost basis (base price plus per-unit
//! add-ons) and diverge only in how that basis maps to what the client
//! pays and what the partner receives. Keeping the total shared and
//! branching at the final mapping avoids duplicating the unit-tier logic.

use serde::Serialize;

use crate::models::{PartnerContext, PricingType};

/// Platform default per-unit add-on rates (currency units per unit).
pub const DEFAULT_UNIT1: f64 = 1.5;
pub const DEFAULT_UNIT2: f64 = 2.5;

/// Base prices above this threshold get the higher per-unit allowance.
pub const UNIT_TIER_THRESHOLD: f64 = 1000.0;

/// Default referral commission when a partner has no configured rate.
pub const DEFAULT_COMMISSION_RATE: f64 = 0.2;

/// Platform default tier base prices.
pub const DEFAULT_TIER1: f64 = 500.0;
pub const DEFAULT_TIER2: f64 = 1000.0;
pub const DEFAULT_TIER3: f64 = 2500.0;

/// Outcome of a pricing computation.
///
/// For white-label partners `client_price` is intentionally unset: the
/// partner sets their own resale price and `partner_price` is what they
/// owe upstream. For referral partners the platform bills `client_price`
/// and the partner earns `partner_price` (the commission).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceQuote {
    pub price: f64,
    pub commission: f64,
    pub client_price: Option<f64>,
    pub partner_price: f64,
    pub is_white_label: bool,
}

/// Compute the total price and commission for a partner quote.
///
/// `quantity` counts add-on units (NFC tags). No partner context means
/// no markup is computed: the base price passes through untouched.
/// Never errors; absent configuration resolves to platform defaults.
pub fn calculate_partner_price(
    base_price: f64,
    partner: Option<&PartnerContext>,
    quantity: u32,
) -> PriceQuote {
    let Some(partner) = partner else {
        return PriceQuote {
            price: base_price,
            commission: 0.0,
            client_price: Some(base_price),
            partner_price: base_price,
            is_white_label: false,
        };
    };

    let pricing = &partner.config.pricing;
    let unit_rate = if base_price >= UNIT_TIER_THRESHOLD {
        pricing.unit2
    } else {
        pricing.unit1
    };

    let mut total = base_price;
    if quantity > 0 {
        total += f64::from(quantity) * unit_rate;
    }

    match partner.config.pricing_type {
        PricingType::Referral => {
            let commission = total * pricing.commission_rate;
            PriceQuote {
                price: total,
                commission,
                client_price: Some(total),
                partner_price: commission,
                is_white_label: false,
            }
        }
        PricingType::WhiteLabel => PriceQuote {
            price: total,
            commission: 0.0,
            client_price: None,
            partner_price: total,
            is_white_label: true,
        },
    }
}
