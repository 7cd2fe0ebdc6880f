use http::header::{CACHE_CONTROL, EXPIRES, PRAGMA};
use http::{HeaderName, HeaderValue};
use url::Url;

/// Cookie carrying the state token between the login redirect and the callback.
pub const STATE_COOKIE_NAME: &str = "oauthstate";

pub struct Utilities;

impl Utilities {
    pub fn login_path(route_prefix: &str) -> String {
        format!("{}/login", route_prefix)
    }

    pub fn callback_path(route_prefix: &str) -> String {
        format!("{}/callback", route_prefix)
    }

    pub fn logout_path(route_prefix: &str) -> String {
        format!("{}/logout", route_prefix)
    }

    /// Headers keeping intermediate caches from storing auth responses.
    pub fn no_cache_headers() -> [(HeaderName, HeaderValue); 3] {
        [
            (
                CACHE_CONTROL,
                HeaderValue::from_static("no-cache, no-store, must-revalidate, max-age=0"),
            ),
            (EXPIRES, HeaderValue::from_static("0")),
            (PRAGMA, HeaderValue::from_static("no-cache")),
        ]
    }

    /// Root-relative paths and absolute http(s) URLs are accepted as redirect targets.
    pub fn is_valid_redirect_target(target: &str) -> bool {
        if target.starts_with('/') {
            return !target.starts_with("//");
        }

        match Url::parse(target) {
            Ok(url) => matches!(url.scheme(), "http" | "https") && url.has_host(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_paths() {
        assert_eq!(Utilities::login_path("/auth/google"), "/auth/google/login");
        assert_eq!(
            Utilities::callback_path("/auth/google"),
            "/auth/google/callback"
        );
        assert_eq!(Utilities::logout_path("/auth/google"), "/auth/google/logout");
    }

    #[test]
    fn test_valid_redirect_targets() {
        assert!(Utilities::is_valid_redirect_target("/"));
        assert!(Utilities::is_valid_redirect_target("/auth/google/login"));
        assert!(Utilities::is_valid_redirect_target(
            "https://www.google.com/accounts/Logout?continue=http://localhost:8080/"
        ));
        assert!(Utilities::is_valid_redirect_target("http://localhost:8080/bye"));
    }

    #[test]
    fn test_invalid_redirect_targets() {
        assert!(!Utilities::is_valid_redirect_target(""));
        assert!(!Utilities::is_valid_redirect_target("dashboard"));
        assert!(!Utilities::is_valid_redirect_target("//evil.example"));
        assert!(!Utilities::is_valid_redirect_target("javascript:alert(1)"));
        assert!(!Utilities::is_valid_redirect_target("ftp://files.example/x"));
    }

    #[test]
    fn test_no_cache_headers() {
        let headers = Utilities::no_cache_headers();
        assert_eq!(headers[0].0, CACHE_CONTROL);
        assert!(headers[0].1.to_str().unwrap().contains("no-store"));
        assert_eq!(headers[2].1, "no-cache");
    }
}
