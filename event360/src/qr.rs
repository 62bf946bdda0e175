//! Ticket QR markup handling.
//!
//! The backend renders the ticket QR as an HTML `<img>` fragment with the
//! image URL in its `src` attribute, HTML-escaped. Older backends returned
//! the bare URL instead. Both shapes are accepted here; anything else is
//! treated as no QR at all and the receipt renders without the image.

/// Extract the QR image URL from ticket markup.
///
/// Returns the `src` attribute of the first image tag with `&amp;`
/// unescaped back to `&`, or the payload itself when it is already a bare
/// URL. Malformed or empty markup yields `None`.
#[must_use]
pub fn extract_qr_url(markup: &str) -> Option<String> {
    let trimmed = markup.trim();
    if trimmed.is_empty() {
        return None;
    }

    if !trimmed.contains('<')
        && (trimmed.starts_with("http://") || trimmed.starts_with("https://"))
    {
        return Some(unescape(trimmed));
    }

    let captures = regex::Regex::new(r#"src\s*=\s*["']([^"']+)["']"#)
        .ok()?
        .captures(trimmed)?;
    Some(unescape(captures.get(1)?.as_str()))
}

fn unescape(url: &str) -> String {
    url.replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn extracts_src_from_image_markup() {
        let markup = r#"<img src="https://qr.example/t?id=42&amp;size=m" alt="ticket">"#;
        assert_eq!(
            extract_qr_url(markup),
            Some("https://qr.example/t?id=42&size=m".to_string())
        );
    }

    #[test]
    fn accepts_single_quoted_attributes() {
        let markup = "<img src='https://qr.example/t/9' />";
        assert_eq!(
            extract_qr_url(markup),
            Some("https://qr.example/t/9".to_string())
        );
    }

    #[test]
    fn accepts_whitespace_around_the_equals_sign() {
        let markup = r#"<img src = "https://qr.example/t/1">"#;
        assert_eq!(
            extract_qr_url(markup),
            Some("https://qr.example/t/1".to_string())
        );
    }

    #[test]
    fn passes_bare_urls_through() {
        assert_eq!(
            extract_qr_url("https://qr.example/t/7?a=1&amp;b=2"),
            Some("https://qr.example/t/7?a=1&b=2".to_string())
        );
    }

    #[test]
    fn rejects_markup_without_a_src_attribute() {
        assert_eq!(extract_qr_url("<img alt=\"ticket\">"), None);
        assert_eq!(extract_qr_url("<p>no image here</p>"), None);
    }

    #[test]
    fn rejects_empty_and_blank_payloads() {
        assert_eq!(extract_qr_url(""), None);
        assert_eq!(extract_qr_url("   \n "), None);
    }

    #[test]
    fn rejects_non_url_plain_text() {
        assert_eq!(extract_qr_url("not a url"), None);
    }

    proptest! {
        #[test]
        fn never_panics_and_never_returns_empty(markup in ".*") {
            if let Some(url) = extract_qr_url(&markup) {
                prop_assert!(!url.is_empty());
            }
        }
    }
}
