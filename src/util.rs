use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// `name/version (+repository)`, sent on every request
#[must_use]
pub fn user_agent() -> HeaderValue {
    HeaderValue::from_static(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION"),
        " (+",
        env!("CARGO_PKG_REPOSITORY"),
        ")"
    ))
}

/// Builds a client carrying the crate user agent on top of `headers`
///
/// # Errors
/// When the TLS backend cannot be initialized
pub fn init_http_client(
    mut headers: HeaderMap,
    timeout: Duration,
) -> reqwest::Result<reqwest::Client> {
    headers.insert(USER_AGENT, user_agent());

    reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(timeout)
        .build()
}

/// Masks a secret for log output, keeping only its last four characters
#[must_use]
pub fn redact(secret: &str) -> String {
    let len = secret.chars().count();
    if len <= 8 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(len - 4).collect();
    format!("****{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_names_the_crate() {
        let ua = user_agent();
        let ua = ua.to_str().unwrap();
        assert!(ua.starts_with(concat!("gist-m3u/", env!("CARGO_PKG_VERSION"))));
        assert!(ua.ends_with(")"));
    }

    #[test]
    fn redact_hides_short_secrets_entirely() {
        assert_eq!(redact("abc"), "****");
        assert_eq!(redact("ghp_0123456789abcdef"), "****cdef");
    }
}
