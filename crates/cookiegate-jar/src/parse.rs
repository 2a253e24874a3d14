//! Cookie string parsing

use percent_encoding::percent_decode_str;

/// Split a raw cookie string into decoded name/value pairs.
///
/// Pairs without `=`, with an empty name or with an empty value are
/// skipped. A repeated name keeps its first position and its last value.
pub fn parse_cookie_header(raw: &str) -> Vec<(String, String)> {
    let mut cookies: Vec<(String, String)> = Vec::new();

    for segment in raw.split(';') {
        let Some((name, value)) = segment.split_once('=') else {
            continue;
        };

        let name = name.trim();
        let value = value.trim();
        if name.is_empty() || value.is_empty() {
            continue;
        }

        let decoded = match percent_decode_str(value).decode_utf8() {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => value.to_string(),
        };

        match cookies.iter_mut().find(|(existing, _)| existing == name) {
            Some(entry) => entry.1 = decoded,
            None => cookies.push((name.to_string(), decoded)),
        }
    }

    cookies
}

/// Name of a raw `name=value` segment, if it is a well-formed pair
pub(crate) fn segment_name(segment: &str) -> Option<&str> {
    let (name, value) = segment.split_once('=')?;
    let name = name.trim();
    if name.is_empty() || value.trim().is_empty() {
        return None;
    }
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let cookies = parse_cookie_header("_ga=GA1.2.3; theme=dark;lang=en");
        assert_eq!(
            cookies,
            vec![
                ("_ga".to_string(), "GA1.2.3".to_string()),
                ("theme".to_string(), "dark".to_string()),
                ("lang".to_string(), "en".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_skips_malformed_pairs() {
        let cookies = parse_cookie_header("novalue; =orphan; empty=; ok=1; ;");
        assert_eq!(cookies, vec![("ok".to_string(), "1".to_string())]);
        assert!(parse_cookie_header("").is_empty());
    }

    #[test]
    fn test_parse_decodes_values() {
        let cookies = parse_cookie_header("pref=a%20b%3Dc; token=x=y=z");
        assert_eq!(cookies[0].1, "a b=c");
        // Only the first '=' separates name from value
        assert_eq!(cookies[1].1, "x=y=z");
    }

    #[test]
    fn test_parse_keeps_raw_on_invalid_utf8() {
        let cookies = parse_cookie_header("bin=%FF%FE");
        assert_eq!(cookies[0].1, "%FF%FE");
    }

    #[test]
    fn test_duplicate_names_last_value_wins() {
        let cookies = parse_cookie_header("a=1; b=2; a=3");
        assert_eq!(
            cookies,
            vec![
                ("a".to_string(), "3".to_string()),
                ("b".to_string(), "2".to_string()),
            ]
        );
    }
}
