//! Run naming - random human-readable names and collision-free suffixes

use std::collections::HashSet;
use std::hash::BuildHasher;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::{Error, Result};

/// Tree nouns used for generated run names.
pub const TREE_NAMES: [&str; 12] = [
    "oak", "maple", "pine", "beech", "willow", "birch", "spruce", "cypress", "cedar", "hemlock",
    "poplar", "redwood",
];

/// Adjectives used for generated run names.
pub const POSITIVE_ADJECTIVES: [&str; 10] = [
    "lush",
    "majestic",
    "vibrant",
    "verdant",
    "beautiful",
    "sturdy",
    "abundant",
    "tall",
    "shady",
    "hardy",
];

/// Generate a run name like `lush-oak-3`, where the suffix is
/// `existing.len() + 1`.
///
/// The result is not guaranteed to be unique; pass it through
/// [`make_unique`].
#[must_use]
pub fn generate_random_name<S: AsRef<str>>(existing: &[S]) -> String {
    generate_random_name_with(&mut rand::thread_rng(), existing.len())
}

/// [`generate_random_name`] with a caller-supplied RNG and existing-name
/// count.
#[must_use]
pub fn generate_random_name_with<R: Rng + ?Sized>(rng: &mut R, existing_count: usize) -> String {
    let tree = TREE_NAMES.choose(rng).copied().unwrap_or("oak");
    let adjective = POSITIVE_ADJECTIVES.choose(rng).copied().unwrap_or("lush");
    format!("{adjective}-{tree}-{}", existing_count + 1)
}

/// Return `name` if unused, otherwise bump its numeric `-N` suffix (or
/// append `-1`) until it no longer collides.
///
/// Every candidate has a strictly larger suffix than the previous one, so
/// the loop ends after at most `existing.len()` bumps.
#[must_use]
pub fn make_unique<S: BuildHasher>(name: &str, existing: &HashSet<String, S>) -> String {
    let mut candidate = name.to_string();
    while existing.contains(&candidate) {
        candidate = bump_suffix(&candidate);
    }
    candidate
}

fn bump_suffix(name: &str) -> String {
    let mut parts: Vec<String> = name.split('-').map(str::to_string).collect();
    match parts.last_mut() {
        Some(last) if is_decimal(last) => *last = increment_decimal(last),
        _ => parts.push("1".to_string()),
    }
    parts.join("-")
}

fn is_decimal(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Add one to a decimal string of any length, dropping leading zeros.
fn increment_decimal(digits: &str) -> String {
    let trimmed = digits.trim_start_matches('0');
    let mut out: Vec<u8> = if trimmed.is_empty() {
        vec![b'0']
    } else {
        trimmed.bytes().collect()
    };
    for digit in out.iter_mut().rev() {
        if *digit == b'9' {
            *digit = b'0';
        } else {
            *digit += 1;
            return String::from_utf8_lossy(&out).into_owned();
        }
    }
    out.insert(0, b'1');
    String::from_utf8_lossy(&out).into_owned()
}

/// Validate a run name before it is used as a directory name.
///
/// # Errors
///
/// Returns `Error::Config` for empty names, `.`/`..`, and names containing
/// path separators or control characters.
pub fn check_run_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Config("run name must not be empty".to_string()));
    }
    if name == "." || name == ".." {
        return Err(Error::Config(format!("run name '{name}' is reserved")));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| matches!(c, '/' | '\\') || c.is_control())
    {
        return Err(Error::Config(format!(
            "run name '{}' contains forbidden character {bad:?}",
            name.escape_debug()
        )));
    }
    Ok(())
}
