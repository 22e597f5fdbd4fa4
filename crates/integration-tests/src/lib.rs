//! Integration tests for Punchcard.
//!
//! # Running Tests
//!
//! The end-to-end tests talk to a running server and are `#[ignore]`d by
//! default:
//!
//! ```bash
//! # Terminal 1: run the server against a scratch database
//! PUNCHCARD_DATABASE_URL=sqlite:/tmp/punchcard-test.db \
//!     cargo run -p punchcard-cli -- migrate
//! PUNCHCARD_DATABASE_URL=sqlite:/tmp/punchcard-test.db \
//!     cargo run -p punchcard-server
//!
//! # Terminal 2: run the ignored tests
//! cargo test -p punchcard-integration-tests -- --ignored
//! ```
//!
//! Set `PUNCHCARD_TEST_BASE_URL` to point the tests at a different server.

#![cfg_attr(not(test), forbid(unsafe_code))]

use reqwest::Client;

/// Shared context for end-to-end tests.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
}

impl TestContext {
    /// Build a context with a cookie-keeping client.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be constructed; test-only code.
    #[must_use]
    pub fn new() -> Self {
        let base_url = std::env::var("PUNCHCARD_TEST_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());
        let client = Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("failed to build HTTP client");
        Self { client, base_url }
    }

    /// Absolute URL for a server path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A username unlikely to collide across test runs.
#[must_use]
pub fn unique_username(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("{prefix}{secs}{nanos}")
}
