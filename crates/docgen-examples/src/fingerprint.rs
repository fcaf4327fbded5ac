//! Content fingerprints for example sources.
//!
//! The fingerprint is the deduplication key for compilation: textually
//! identical examples (after normalization) share one compiled bundle.

use sha2::{Digest, Sha256};

/// Number of hex characters kept from the digest.
const FINGERPRINT_LEN: usize = 16;

/// Normalize example source before hashing.
///
/// Line endings become `\n`, trailing whitespace is removed from every line
/// and leading and trailing blank lines are dropped.
#[must_use]
pub fn normalize_source(source: &str) -> String {
    let lines: Vec<&str> = source
        .split('\n')
        .map(|line| line.trim_end_matches(['\r', ' ', '\t']))
        .collect();

    let start = lines.iter().position(|line| !line.is_empty());
    let end = lines.iter().rposition(|line| !line.is_empty());
    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end].join("\n"),
        _ => String::new(),
    }
}

/// Compute the fingerprint of an example source.
///
/// SHA-256 of the normalized source, hex encoded and truncated to 16
/// characters.
///
/// ```
/// use docgen_examples::fingerprint;
///
/// assert_eq!(fingerprint("a\r\nb  \n"), fingerprint("\na\nb"));
/// assert_eq!(fingerprint("a").len(), 16);
/// ```
#[must_use]
pub fn fingerprint(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_source(source).as_bytes());
    let mut hash = hex::encode(hasher.finalize());
    hash.truncate(FINGERPRINT_LEN);
    hash
}
