//! Slug encoding helpers for event detail URLs.
//!
//! Event detail pages are addressed by a single path segment that is both
//! human-readable and uniquely resolvable. The segment is built from the
//! event title and the record identifier issued by the document store:
//!
//! ```text
//! combined = normalize(title) + "-" + record_id
//! ```
//!
//! The intended usage is:
//!
//! - When rendering a link to an event, compute the combined slug via
//!   [`encode`] from the event title and its store identifier.
//! - When a request for `/events/classes-workshops/{segment}` arrives,
//!   recover the identifier via [`decode`] and pass it to the event lookup
//!   unchanged. The lookup, not the codec, decides whether the key exists.
//!
//! Record identifiers are recognised purely by shape: 24 hexadecimal
//! characters (a 12-byte key). [`decode`] inspects the final
//! hyphen-delimited segment and, when it does not look like an identifier,
//! returns the entire input string instead. That fallback keeps links from
//! before the identifier-suffix scheme resolving: those old segments are
//! themselves the lookup key, and the downstream lookup reports "not found"
//! for anything that no longer exists.
//!
//! Both directions are pure functions over strings. They never fail, never
//! allocate shared state, and are safe to call from any number of tasks
//! concurrently.

/// Number of hex characters in a document-store record identifier.
const RECORD_ID_HEX_LEN: usize = 24;

/// Whether `segment` has the shape of a store record identifier.
///
/// The check is purely structural: exactly [`RECORD_ID_HEX_LEN`] ASCII hex
/// digits, either case. The store issues lowercase identifiers, but decoded
/// case is preserved and callers lowercase before using the value as a
/// lookup key.
pub fn is_record_id(segment: &str) -> bool {
    segment.len() == RECORD_ID_HEX_LEN && segment.chars().all(|c| c.is_ascii_hexdigit())
}

/// Normalize display text into a URL slug.
///
/// - Lowercases the input.
/// - Drops every character that is not alphanumeric, whitespace, an
///   underscore, or a hyphen.
/// - Collapses each run of whitespace, underscores, and hyphens into a
///   single hyphen.
/// - Trims leading and trailing hyphens.
///
/// The result may be empty when the input contains no letters or digits.
/// Total over all string input and idempotent.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();

    let mut slug = String::with_capacity(lowered.len());
    let mut pending_separator = false;

    for c in lowered.chars() {
        if c.is_whitespace() || c == '_' || c == '-' {
            pending_separator = true;
        } else if c.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        }
        // Everything else (punctuation, symbols) is dropped without
        // producing a separator.
    }

    slug
}

/// Build the combined slug for an event link.
///
/// `id` is appended verbatim after a hyphen; it is not validated here. An
/// empty or all-punctuation `name` yields `"-" + id`, which is odd-looking
/// but decodes correctly.
pub fn encode(name: &str, id: &str) -> String {
    let mut combined = normalize(name);
    combined.push('-');
    combined.push_str(id);
    combined
}

/// Recover the record identifier from a combined slug.
///
/// Splits on hyphens and inspects the final segment. If it has the record
/// identifier shape it is returned unchanged (case preserved). Otherwise
/// the whole input is returned unchanged, so links that predate the
/// identifier-suffix scheme keep resolving as their own lookup key.
///
/// The return value is therefore not guaranteed to be a valid identifier,
/// only to be *some* lookup key; a miss is reported by the lookup, never
/// here.
pub fn decode(combined: &str) -> String {
    match combined.rsplit('-').next() {
        Some(tail) if is_record_id(tail) => tail.to_string(),
        _ => combined.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "507f1f77bcf86cd799439011";

    #[test]
    fn round_trip_preserves_identifier() {
        for name in ["Watercolor Basics", "Kids' Clay Camp", "", "  ", "---"] {
            assert_eq!(decode(&encode(name, ID)), ID, "name = {:?}", name);
        }
    }

    #[test]
    fn normalize_collapses_punctuation_and_whitespace() {
        assert_eq!(normalize("Art  Camp: Summer '25!"), "art-camp-summer-25");
    }

    #[test]
    fn normalize_is_idempotent() {
        for s in [
            "Art  Camp: Summer '25!",
            "already-a-slug",
            "__under_scored__",
            "",
            "Añejo Glaze Night",
        ] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "input = {:?}", s);
        }
    }

    #[test]
    fn normalize_treats_underscores_as_separators() {
        assert_eq!(normalize("open_studio_friday"), "open-studio-friday");
    }

    #[test]
    fn normalize_strips_leading_and_trailing_separators() {
        assert_eq!(normalize("  -- Paint & Sip -- "), "paint-sip");
    }

    #[test]
    fn decode_preserves_identifier_case() {
        let mixed = "ABCDEF0123456789ABCDEF01";
        assert_eq!(decode(&format!("anything-{}", mixed)), mixed);
    }

    #[test]
    fn decode_falls_back_to_whole_input_for_legacy_slugs() {
        assert_eq!(
            decode("some-legacy-slug-without-id"),
            "some-legacy-slug-without-id"
        );
    }

    #[test]
    fn decode_rejects_wrong_length_trailing_token() {
        // 4 hex chars is not an identifier; the whole input is the key.
        assert_eq!(decode("name-1234"), "name-1234");
    }

    #[test]
    fn decode_rejects_non_hex_trailing_token_of_right_length() {
        // Correct length, but 'z' is not hex.
        let tail = "z07f1f77bcf86cd79943901z";
        let combined = format!("pottery-{}", tail);
        assert_eq!(decode(&combined), combined);
    }

    #[test]
    fn decode_of_empty_input_is_empty() {
        assert_eq!(decode(""), "");
    }

    #[test]
    fn encode_with_degenerate_name_keeps_leading_hyphen() {
        let combined = encode("", ID);
        assert_eq!(combined, format!("-{}", ID));
        assert_eq!(decode(&combined), ID);
    }

    #[test]
    fn decode_of_bare_identifier_returns_it() {
        assert_eq!(decode(ID), ID);
    }

    #[test]
    fn is_record_id_shape_checks() {
        assert!(is_record_id(ID));
        assert!(is_record_id("ABCDEF0123456789ABCDEF01"));
        assert!(!is_record_id("1234"));
        assert!(!is_record_id(""));
        assert!(!is_record_id("507f1f77bcf86cd79943901")); // 23 chars
        assert!(!is_record_id("507f1f77bcf86cd7994390111")); // 25 chars
        assert!(!is_record_id("g07f1f77bcf86cd799439011")); // non-hex
    }
}
