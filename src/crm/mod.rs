mod hubspot;

pub use hubspot::{
    summarize_commission_items, summarize_features, DealRequest, HubSpotClient, HubSpotConfig,
};
