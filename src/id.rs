use rand::{distr::Alphanumeric, Rng};

/// Generates a prefixed random identifier such as `bk_x7Gq2LmP0a`.
///
/// Identifiers are alphanumeric after the prefix so they never contain
/// the `:` separator used by composite index keys.
pub fn new_id(prefix: &str) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(char::from)
        .collect();
    format!("{prefix}_{suffix}")
}
