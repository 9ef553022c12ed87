pub mod organization;
pub mod partner;
pub mod quote;
pub mod user;

pub use organization::*;
pub use partner::*;
pub use quote::*;
pub use user::*;
