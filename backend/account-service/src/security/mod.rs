/// Security primitives: password hashing and one-time tokens
pub mod password;
pub mod token;

pub use password::{hash_password, verify_password};
