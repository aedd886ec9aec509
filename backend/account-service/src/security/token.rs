/// Random keys and one-time tokens.
///
/// One-time tokens have the shape `<random>_<unix timestamp>`; the suffix
/// records when the token was issued so expiry can be checked without a
/// separate column.
use rand::{distributions::Alphanumeric, Rng};

const TOKEN_RANDOM_LEN: usize = 32;

/// Random alphanumeric string of the given length.
pub fn generate_random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Key used to validate "remember me" sessions.
pub fn generate_auth_key() -> String {
    generate_random_string(32)
}

pub fn generate_timestamped_token() -> String {
    format!(
        "{}_{}",
        generate_random_string(TOKEN_RANDOM_LEN),
        chrono::Utc::now().timestamp()
    )
}

/// Issue time encoded in a timestamped token.
pub fn token_timestamp(token: &str) -> Option<i64> {
    let (random, ts) = token.rsplit_once('_')?;
    if random.is_empty() {
        return None;
    }
    ts.parse().ok()
}

/// Whether the token shape is one this service issues.
pub fn is_well_formed(token: &str) -> bool {
    token.len() <= 255
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        && token_timestamp(token).is_some()
}

pub fn is_token_fresh(token: &str, expire_secs: i64, now: i64) -> bool {
    match token_timestamp(token) {
        Some(issued) => issued + expire_secs >= now,
        None => false,
    }
}
