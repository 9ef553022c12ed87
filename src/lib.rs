//! Voyager Partners - partner pricing and identity sync for the Voyager platform
//!
//! This library provides the core functionality for the Voyager partner backend,
//! including the pricing/commission engine, the identity-provider webhook
//! reconciler, white-label branding resolution, and HubSpot deal creation.

pub mod config;
pub mod crm;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod pricing;
