//! Candidate URL normalization.

use url::Url;

/// Strip the query string and fragment from a candidate URL.
///
/// Scheme, credentials, host, port and path are preserved. Input that does not
/// parse as an absolute URL is returned unchanged.
pub fn normalize(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.into()
        }
        Err(_) => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_query_and_fragment() {
        assert_eq!(
            normalize("https://cdn.example.com/img/123.jpg?w=300&cb=99#top"),
            "https://cdn.example.com/img/123.jpg"
        );
    }

    #[test]
    fn test_keeps_port_and_path() {
        assert_eq!(
            normalize("http://images.example.com:8080/a/b/c.png?token=abc"),
            "http://images.example.com:8080/a/b/c.png"
        );
    }

    #[test]
    fn test_without_query_is_unchanged() {
        let url = "https://cdn.example.com/img/123.jpg";
        assert_eq!(normalize(url), url);
    }

    #[test]
    fn test_malformed_is_returned_unchanged() {
        for input in ["not a url", "", "/relative/path.jpg?x=1", "http://[::1"] {
            assert_eq!(normalize(input), input);
        }
    }

    #[test]
    fn test_idempotent() {
        let urls = [
            "https://cdn.example.com/img/123.jpg?w=300",
            "HTTPS://Example.COM/Path/Image.JPG?x=1#frag",
            "http://example.com",
            "https://example.com/a%20b.png?q",
            "garbage ::",
        ];
        for url in urls {
            let once = normalize(url);
            assert_eq!(normalize(&once), once, "not idempotent for {url}");
        }
    }
}
