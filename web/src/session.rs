use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "session";

/// Thirty days, in seconds.
const SESSION_MAX_AGE: u64 = 30 * 24 * 60 * 60;

fn mac_for(secret: &str, email: &str) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(email.as_bytes());
    mac
}

/// `email|hex(hmac-sha256(secret, email))`.
pub fn issue(secret: &str, email: &str) -> String {
    let signature = hex::encode(mac_for(secret, email).finalize().into_bytes());
    format!("{}|{}", email, signature)
}

/// Returns the email when the value carries a valid signature.
pub fn verify(secret: &str, value: &str) -> Option<String> {
    let (email, signature) = value.rsplit_once('|')?;
    let raw = hex::decode(signature).ok()?;
    mac_for(secret, email).verify_slice(&raw).ok()?;
    Some(email.to_string())
}

/// Full Set-Cookie value establishing a signed session.
pub fn session_cookie(secret: &str, email: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        issue(secret, email),
        SESSION_MAX_AGE
    )
}

/// Set-Cookie value that removes the session.
pub fn clear_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; Max-Age=0", SESSION_COOKIE)
}

/// Verified email from the request's Cookie header, if any. Absent or
/// tampered cookies mean anonymous.
pub fn email_from_headers(secret: &str, headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(COOKIE)?.to_str().ok()?;
    for pair in raw.split(';') {
        let pair = pair.trim();
        if let Some(value) = pair.strip_prefix(&format!("{}=", SESSION_COOKIE)) {
            return verify(secret, value);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn round_trip_recovers_the_email() {
        let value = issue("secret", "a@b.com");
        assert_eq!(verify("secret", &value), Some("a@b.com".to_string()));
    }

    #[test]
    fn tampered_email_is_rejected() {
        let value = issue("secret", "a@b.com");
        let forged = value.replacen("a@b.com", "admin@b.com", 1);
        assert_eq!(verify("secret", &forged), None);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let value = issue("secret", "a@b.com");
        assert_eq!(verify("other-secret", &value), None);
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(verify("secret", "nonsense"), None);
        assert_eq!(verify("secret", "a@b.com|nothex"), None);
    }

    #[test]
    fn email_is_read_from_cookie_header() {
        let mut headers = HeaderMap::new();
        let cookie = format!("other=1; {}={}", SESSION_COOKIE, issue("secret", "a@b.com"));
        headers.insert(COOKIE, HeaderValue::from_str(&cookie).unwrap());
        assert_eq!(
            email_from_headers("secret", &headers),
            Some("a@b.com".to_string())
        );
    }

    #[test]
    fn missing_cookie_means_anonymous() {
        let headers = HeaderMap::new();
        assert_eq!(email_from_headers("secret", &headers), None);
    }
}
