//! Correlation ID chaining for cross-service request tracing.
//!
//! Each outbound request carries an `x-request-id` header holding a
//! comma-separated chain of identifiers, one appended per hop. Receiving
//! services parse this header, so the joined format is a wire contract.

use rand::Rng;
use reqwest::header::HeaderName;

/// Header carrying the comma-separated correlation chain.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Header identifying the acting user, propagated unchanged across hops.
pub const USER_IDENTITY_HEADER: HeaderName = HeaderName::from_static("x-user-identity");

const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890";

const DEFAULT_ID_LENGTH: usize = 20;

/// Generates a random identifier of `length` characters from the fixed
/// alphabet. Not deterministic; collision-resistant in practice only.
pub(crate) fn new_request_id(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Builds the outgoing correlation chain from an optional upstream chain.
///
/// With no upstream chain the result is a single fresh 20-character segment.
/// Otherwise a new segment half the length of the chain's first segment is
/// appended, leaving all prior segments untouched.
pub(crate) fn chain_value(upstream: Option<&str>) -> String {
    let upstream = match upstream {
        Some(chain) if !chain.is_empty() => chain,
        _ => return new_request_id(DEFAULT_ID_LENGTH),
    };

    // First segment runs to the first comma, when that comma sits past the
    // second character; a leading or degenerate comma falls back to the
    // whole string.
    let mut added_len = upstream.len() / 2;
    if let Some(comma) = upstream.find(',') {
        if comma > 1 {
            added_len = comma / 2;
        }
    }
    format!("{upstream},{}", new_request_id(added_len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_id_has_requested_length_and_alphabet() {
        let id = new_request_id(20);
        assert_eq!(id.len(), 20);
        assert!(id.bytes().all(|b| ID_ALPHABET.contains(&b)));
    }

    #[test]
    fn fresh_chain_is_single_default_length_segment() {
        let chain = chain_value(None);
        assert_eq!(chain.len(), DEFAULT_ID_LENGTH);
        assert!(!chain.contains(','));

        let chain = chain_value(Some(""));
        assert_eq!(chain.len(), DEFAULT_ID_LENGTH);
    }

    #[test]
    fn appended_segment_is_half_the_first_segment() {
        let chain = chain_value(Some("call1234"));
        assert!(chain.starts_with("call1234,"));
        assert_eq!(chain.len(), "call1234,".len() + 4);
    }

    #[test]
    fn first_comma_bounds_the_first_segment() {
        let chain = chain_value(Some("abcdef,xyz"));
        assert!(chain.starts_with("abcdef,xyz,"));
        // first segment "abcdef" has length 6, so the new segment has 3
        assert_eq!(chain.len(), "abcdef,xyz,".len() + 3);
    }

    #[test]
    fn degenerate_comma_position_falls_back_to_whole_length() {
        // comma at position 1 is not a usable segment boundary
        let chain = chain_value(Some("a,bcdef"));
        assert!(chain.starts_with("a,bcdef,"));
        assert_eq!(chain.len(), "a,bcdef,".len() + "a,bcdef".len() / 2);
    }

    #[test]
    fn repeated_builds_yield_same_length_different_values() {
        let first = chain_value(Some("call1234"));
        let second = chain_value(Some("call1234"));
        assert_eq!(first.len(), second.len());

        let a = new_request_id(20);
        let b = new_request_id(20);
        assert_ne!(a, b);
    }
}
