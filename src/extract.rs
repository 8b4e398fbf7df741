//! Pure text-derivation helpers for post payloads
//!
//! Everything here is stateless: hashtag scanning, naive domain extraction
//! and whitespace/quote sanitization for delimited storage.

/// Extract hashtags from post text.
///
/// Returns every `#`-prefixed run of word characters in order of appearance.
/// No deduplication and no case folding; aggregation lowercases on its side.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c != '#' {
            continue;
        }
        let mut tag = String::new();
        while let Some(&(_, next)) = chars.peek() {
            if next.is_alphanumeric() || next == '_' {
                tag.push(next);
                chars.next();
            } else {
                break;
            }
        }
        if !tag.is_empty() {
            tags.push(tag);
        }
    }

    tags
}

/// Extract the authority component from a URL.
///
/// Splits on `/` and takes the third segment (the part after the scheme's
/// double slash). Deliberately naive: anything without at least three
/// segments yields the `"unknown"` sentinel.
pub fn extract_domain(url: &str) -> String {
    match url.split('/').nth(2) {
        Some(domain) if !domain.is_empty() => domain.to_string(),
        _ => "unknown".to_string(),
    }
}

/// Clean text for delimited-format storage.
///
/// Collapses whitespace runs to a single space, trims the ends and doubles
/// embedded quote characters. Absent input yields an empty string.
pub fn sanitize_text(text: Option<&str>) -> String {
    let Some(text) = text else {
        return String::new();
    };

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.replace('"', "\"\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashtags_in_order_with_duplicates() {
        let tags = extract_hashtags("check #rust and #Rust plus #rust again");
        assert_eq!(tags, vec!["rust", "Rust", "rust"]);
    }

    #[test]
    fn test_hashtag_stops_at_non_word_char() {
        assert_eq!(extract_hashtags("#hello, world #foo!"), vec!["hello", "foo"]);
        assert_eq!(extract_hashtags("no tags here"), Vec::<String>::new());
        // Bare '#' contributes nothing
        assert_eq!(extract_hashtags("# #"), Vec::<String>::new());
    }

    #[test]
    fn test_domain_extraction() {
        assert_eq!(extract_domain("https://example.com/post/1"), "example.com");
        assert_eq!(extract_domain("http://sub.site.org"), "sub.site.org");
        assert_eq!(extract_domain("not-a-url"), "unknown");
        assert_eq!(extract_domain(""), "unknown");
        assert_eq!(extract_domain("https://"), "unknown");
    }

    #[test]
    fn test_sanitize_collapses_and_escapes() {
        assert_eq!(sanitize_text(Some("  hello \n\t world  ")), "hello world");
        assert_eq!(sanitize_text(Some(r#"say "hi""#)), r#"say ""hi"""#);
        assert_eq!(sanitize_text(None), "");
        assert_eq!(sanitize_text(Some("")), "");
    }
}
