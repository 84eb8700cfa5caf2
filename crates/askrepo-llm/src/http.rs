//! Shared HTTP client construction for consistent timeout and TLS configuration.

use std::time::Duration;

/// Create a shared HTTP client with standard askrepo configuration.
///
/// Config: 30s connect timeout, 60s request timeout, rustls TLS,
/// `askrepo/{version}` user-agent, redirect limit 10.
///
/// # Panics
///
/// Panics if the client cannot be constructed (unreachable in practice).
#[must_use]
pub fn default_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .timeout(Duration::from_secs(60))
        .user_agent(concat!("askrepo/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .expect("default HTTP client construction must not fail")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_client_builds() {
        let _client = default_client();
    }
}
