//! API server configuration

use serde::Deserialize;

/// Configuration for the HTTP API
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ApiConfig {
    /// Address to bind the API server
    ///
    /// Common values:
    /// - `[::]:3001` (IPv6 any address)
    /// - `127.0.0.1:3001` (localhost only)
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Upper bound on handling one request, in seconds
    ///
    /// A campaign that outlives this keeps running; only the response is lost.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Largest accepted request body, in bytes
    ///
    /// Attachments travel base64-encoded inside the JSON body, so this has to
    /// leave room for several 10 MiB attachments.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_listen_address() -> String {
    "[::]:3001".to_string()
}

const fn default_request_timeout_secs() -> u64 {
    900
}

const fn default_max_body_bytes() -> usize {
    64 * 1024 * 1024
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            request_timeout_secs: default_request_timeout_secs(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}
