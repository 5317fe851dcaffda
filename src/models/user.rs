// src/models/user.rs
//! Demo user identities of the form `user_<n>_<k>`.
//!
//! `n` is picked at random once per install; `k` is bumped every time a new
//! user is requested. Storing the current identity is the host's job.

use rand::Rng;

/// Upper bound (exclusive) for the random part of a generated user id.
const USER_NUMBER_RANGE: u32 = 99_999;

/// Creates the first identity for a fresh install, e.g. `user_4821_0`.
pub fn generate_user_id() -> String {
    let n = rand::thread_rng().gen_range(0..USER_NUMBER_RANGE);
    format!("user_{n}_0")
}

/// Increments the counter after the last `_`.
///
/// Returns `None` if `current` has no `_` or the suffix is not a number.
pub fn next_user_id(current: &str) -> Option<String> {
    let (prefix, counter) = current.rsplit_once('_')?;
    let counter: u64 = counter.parse().ok()?;
    Some(format!("{prefix}_{}", counter.checked_add(1)?))
}
