/// HTTP request handlers
pub mod health;
pub mod site;

pub use health::health_check;
pub use site::{
    contact, error, index, login, logout, not_found, request_password_reset, resend_verification_email,
    reset_password, signup, verify_email,
};
