//! CSRF state tokens for the authorization handshake.
//!
//! The token is drawn from the operating system RNG, written to the
//! `oauthstate` cookie and echoed back by the provider as the `state` query
//! parameter. It only correlates the outbound redirect with the callback.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use oauth2::CsrfToken;
use rand::rngs::OsRng;
use rand::RngCore;
use time::{Duration, OffsetDateTime};
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};

use crate::utilities::STATE_COOKIE_NAME;

/// Bytes of entropy per token.
pub const STATE_TOKEN_BYTES: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum StateTokenError {
    #[error("the operating system random source failed: {0}")]
    Entropy(#[from] rand::Error),
}

/// Draws a fresh URL-safe token. Fails rather than fall back to a weaker source.
pub fn generate() -> Result<String, StateTokenError> {
    let mut bytes = [0u8; STATE_TOKEN_BYTES];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Generates a token and binds it to the response as the state cookie,
/// replacing any token issued earlier.
pub fn issue(cookies: &Cookies, secure: bool) -> Result<CsrfToken, StateTokenError> {
    let state = generate()?;

    let cookie = Cookie::build((STATE_COOKIE_NAME, state.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .expires(OffsetDateTime::now_utc() + Duration::days(365))
        .build();
    cookies.add(cookie);

    Ok(CsrfToken::new(state))
}

/// Reads the state cookie and schedules its removal, so a token is only ever checked once.
///
/// An empty cookie counts as missing: it would otherwise match an absent `state` parameter.
pub fn take(cookies: &Cookies) -> Option<String> {
    let value = cookies.get(STATE_COOKIE_NAME)?.value().to_string();
    cookies.remove(Cookie::build((STATE_COOKIE_NAME, "")).path("/").build());
    Some(value).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_is_url_safe() {
        let token = generate().unwrap();
        // 16 bytes, unpadded base64
        assert_eq!(token.len(), 22);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_token_decodes_to_full_entropy() {
        let token = generate().unwrap();
        let bytes = URL_SAFE_NO_PAD.decode(token).unwrap();
        assert_eq!(bytes.len(), STATE_TOKEN_BYTES);
    }

    #[test]
    fn test_tokens_are_unique() {
        let tokens: HashSet<String> = (0..1000).map(|_| generate().unwrap()).collect();
        assert_eq!(tokens.len(), 1000);
    }
}
