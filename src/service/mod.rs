//! Service Module
//!
//! The user lookup façade placed in front of the active `Database`.

mod limiter;
mod user;

pub use limiter::{CooldownLimiter, RATE_LIMIT_WINDOW};
pub use user::UserLookupService;
