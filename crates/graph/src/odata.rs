//! OData expression and path helpers.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

// Unreserved characters (RFC 3986) stay as-is so ids remain readable in logs.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Quote a string literal for a `$filter` expression.
///
/// Single quotes are doubled, which is how OData escapes them inside a literal.
pub fn literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// `startswith(a,'text') or startswith(b,'text') ...` over the given fields.
pub fn startswith_any(fields: &[&str], text: &str) -> String {
    let text = literal(text);
    fields
        .iter()
        .map(|field| format!("startswith({field},{text})"))
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Percent-encode a caller-supplied id for use as one path segment.
pub fn segment(id: &str) -> String {
    utf8_percent_encode(id, SEGMENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startswith_over_two_fields() {
        assert_eq!(
            startswith_any(&["deviceName", "emailAddress"], "LAP"),
            "startswith(deviceName,'LAP') or startswith(emailAddress,'LAP')"
        );
    }

    #[test]
    fn quotes_are_doubled() {
        assert_eq!(literal("O'Brien"), "'O''Brien'");
        assert_eq!(
            startswith_any(&["displayName"], "x') or true or ('"),
            "startswith(displayName,'x'') or true or (''')"
        );
    }

    #[test]
    fn segment_keeps_guids() {
        let id = "3f2504e0-4f89-11d3-9a0c-0305e82c3301";
        assert_eq!(segment(id), id);
    }

    #[test]
    fn segment_escapes_separators() {
        assert_eq!(segment("../users?x"), "..%2Fusers%3Fx");
    }
}
