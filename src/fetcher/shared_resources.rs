//! Process-wide HTTP client
//!
//! `reqwest::Client` pools connections internally; sharing one instance keeps
//! keep-alive connections to the catalog API warm across every stream and
//! every level of the hierarchy.

use once_cell::sync::Lazy;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Time allowed to establish a TCP/TLS connection
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Idle pooled connections are dropped after this long
const HTTP_POOL_IDLE_TIMEOUT_SECS: u64 = 90;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Shared client. The overall request timeout is applied per request from
/// run configuration, so only the connect timeout is fixed here.
pub static GLOBAL_HTTP_CLIENT: Lazy<Arc<Client>> = Lazy::new(|| {
    Arc::new(
        Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .pool_idle_timeout(Duration::from_secs(HTTP_POOL_IDLE_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                panic!("FATAL: Failed to build HTTP client: {e}. Check system TLS configuration.")
            }),
    )
});

/// Get the shared HTTP client
pub fn global_http_client() -> Arc<Client> {
    GLOBAL_HTTP_CLIENT.clone()
}
