pub mod partners;
pub mod public;
pub mod webhooks;
