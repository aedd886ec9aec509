/// Data models for site accounts
pub mod user;

pub use user::{User, UserStatus};
