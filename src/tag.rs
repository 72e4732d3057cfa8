//! Struct tag parsing
//!
//! A struct tag is a sequence of `key:"value"` pairs separated by whitespace,
//! e.g. `json:"id,omitempty" xml:"id"`. Parsing stops silently at the first
//! malformed pair.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static KEY_VALUE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^(\w+):"((?:\\.|[^"\\])*)""#).unwrap());

static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s+").unwrap());

/// Parse a raw struct tag into a key → value map.
pub fn parse(tag: &str) -> BTreeMap<String, String> {
    let tag = tag.trim_matches('`');
    let mut result = BTreeMap::new();
    let mut cursor = 0;

    while cursor < tag.len() {
        let rest = &tag[cursor..];

        if let Some(captures) = KEY_VALUE_REGEX.captures(rest) {
            cursor += captures[0].len();
            result.insert(captures[1].to_string(), captures[2].to_string());
            continue;
        }

        if let Some(m) = WHITESPACE_REGEX.find(rest) {
            cursor += m.end();
            continue;
        }

        break;
    }

    result
}

/// The tag namespace that names properties for a content type.
///
/// Content types without a namespace (`text/plain`, binary payloads) name
/// properties after their fields.
pub fn namespace_for(content_type: &str) -> Option<&'static str> {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match media_type.as_str() {
        "" | "application/json" => Some("json"),
        "application/xml" | "text/xml" => Some("xml"),
        "multipart/form-data" | "application/x-www-form-urlencoded" => Some("form"),
        other if other.ends_with("+json") => Some("json"),
        other if other.ends_with("+xml") => Some("xml"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_multiple_pairs() {
        let tags = parse(r#"json:"id,omitempty" xml:"id" form:"user_id""#);
        assert_eq!(tags.len(), 3);
        assert_eq!(tags["json"], "id,omitempty");
        assert_eq!(tags["xml"], "id");
        assert_eq!(tags["form"], "user_id");
    }

    #[test]
    fn test_parse_trims_backticks() {
        let tags = parse(r#"`json:"name"`"#);
        assert_eq!(tags["json"], "name");
    }

    #[test]
    fn test_parse_escaped_quote() {
        let tags = parse(r#"doc:"say \"hi\"" json:"x""#);
        assert_eq!(tags["doc"], r#"say \"hi\""#);
        assert_eq!(tags["json"], "x");
    }

    #[test]
    fn test_parse_stops_at_malformed_pair() {
        let tags = parse(r#"json:"a" broken xml:"b""#);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags["json"], "a");
    }

    #[test]
    fn test_namespace_for_content_type() {
        assert_eq!(namespace_for("application/json"), Some("json"));
        assert_eq!(namespace_for("application/json; charset=utf-8"), Some("json"));
        assert_eq!(namespace_for(""), Some("json"));
        assert_eq!(namespace_for("application/problem+json"), Some("json"));
        assert_eq!(namespace_for("text/xml"), Some("xml"));
        assert_eq!(namespace_for("multipart/form-data"), Some("form"));
        assert_eq!(namespace_for("text/plain"), None);
        assert_eq!(namespace_for("application/octet-stream"), None);
    }
}
