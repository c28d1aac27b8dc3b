//! Utility functions and helpers.

pub mod http;
pub mod throttle;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Extract the domain from a URL string.
pub fn get_domain(url_str: &str) -> Option<String> {
    Url::parse(url_str)
        .ok()
        .and_then(|u| u.host_str().map(|s| s.to_string()))
}

/// Whether two URLs point at the same site. Case and a leading `www.`
/// are ignored.
pub fn same_host(a: &Url, b: &Url) -> bool {
    match (a.host_str(), b.host_str()) {
        (Some(x), Some(y)) => bare_host(x) == bare_host(y),
        _ => false,
    }
}

/// An absolute http(s) URL with a host.
pub fn is_valid_url(raw: &str) -> bool {
    let raw = raw.trim();
    if raw.is_empty() {
        return false;
    }
    Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some_and(|h| !h.is_empty()))
        .unwrap_or(false)
}

fn bare_host(host: &str) -> String {
    let lower = host.to_lowercase();
    match lower.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://brand.example.com/shop/list.html").unwrap();
        assert_eq!(
            resolve_url(&base, "banner/winter.jpg"),
            "https://brand.example.com/shop/banner/winter.jpg"
        );
        assert_eq!(
            resolve_url(&base, "//cdn.example.net/a.png"),
            "https://cdn.example.net/a.png"
        );
        assert_eq!(resolve_url(&base, "/sale"), "https://brand.example.com/sale");
    }

    #[test]
    fn test_get_domain() {
        assert_eq!(
            get_domain("https://shop.brand.example.com:8443/sale"),
            Some("shop.brand.example.com".to_string())
        );
        assert_eq!(get_domain("not a url"), None);
    }

    #[test]
    fn test_same_host() {
        let a = Url::parse("https://www.Brand.example.com/").unwrap();
        let b = Url::parse("https://brand.example.com/sale").unwrap();
        let c = Url::parse("https://shop.brand.example.com/").unwrap();
        assert!(same_host(&a, &b));
        assert!(!same_host(&a, &c));
    }

    #[test]
    fn test_is_valid_url() {
        assert!(is_valid_url("https://brand.example.com"));
        assert!(is_valid_url(" http://brand.example.com/sale "));
        assert!(!is_valid_url(""));
        assert!(!is_valid_url("brand.example.com"));
        assert!(!is_valid_url("ftp://brand.example.com"));
        assert!(!is_valid_url("mailto:shop@brand.example.com"));
    }
}
