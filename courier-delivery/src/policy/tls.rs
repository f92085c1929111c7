//! Provider-aware TLS parameters.
//!
//! The host in a [`TransportConfig`] decides how the session is secured:
//!
//! - Port 465 always means implicit TLS
//! - Consumer providers get implicit TLS with strict certificate checks
//! - Business providers get an opportunistic STARTTLS upgrade
//! - Anything else gets STARTTLS (required when `use_tls` is set) and
//!   tolerates self-signed certificates
//!
//! TLS 1.2 is the minimum protocol version everywhere.

use courier_common::TransportConfig;
use serde::{Deserialize, Serialize};

/// Port conventionally used for SMTP over implicit TLS.
pub const IMPLICIT_TLS_PORT: u16 = 465;

/// How a session negotiates encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsMode {
    /// TLS from the first byte.
    Implicit,

    /// Plaintext greeting, then a STARTTLS upgrade.
    ///
    /// When `required` is false the session continues in plaintext if the
    /// server does not offer STARTTLS.
    StartTls { required: bool },
}

/// Lowest protocol version the session will negotiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum MinTlsVersion {
    #[default]
    Tls12,
    Tls13,
}

/// Which table, if any, a host was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Consumer,
    Business,
    Unrecognised,
}

/// Resolved parameters for opening one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportParameters {
    pub mode: TlsMode,
    pub min_version: MinTlsVersion,
    pub accept_invalid_certs: bool,
    pub provider: ProviderKind,
}

/// Classifies SMTP hosts and picks TLS parameters for them.
///
/// Both tables hold domain suffixes: `gmail.com` matches `smtp.gmail.com`
/// and `gmail.com` itself, but not `notgmail.com`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsPolicyResolver {
    #[serde(default = "defaults::consumer")]
    pub consumer: Vec<String>,

    #[serde(default = "defaults::business")]
    pub business: Vec<String>,

    #[serde(default)]
    pub min_version: MinTlsVersion,
}

impl Default for TlsPolicyResolver {
    fn default() -> Self {
        Self {
            consumer: defaults::consumer(),
            business: defaults::business(),
            min_version: MinTlsVersion::default(),
        }
    }
}

impl TlsPolicyResolver {
    /// Classify `host` against the provider tables.
    #[must_use]
    pub fn classify(&self, host: &str) -> ProviderKind {
        let host = host.trim().trim_end_matches('.').to_ascii_lowercase();

        if matches_any(&host, &self.consumer) {
            ProviderKind::Consumer
        } else if matches_any(&host, &self.business) {
            ProviderKind::Business
        } else {
            ProviderKind::Unrecognised
        }
    }

    /// Resolve the parameters for a session to `config.host`.
    #[must_use]
    pub fn resolve(&self, config: &TransportConfig) -> TransportParameters {
        let provider = self.classify(&config.host);

        let (mode, accept_invalid_certs) = match provider {
            ProviderKind::Consumer => (TlsMode::Implicit, false),
            ProviderKind::Business => (TlsMode::StartTls { required: false }, false),
            ProviderKind::Unrecognised => (
                TlsMode::StartTls {
                    required: config.use_tls,
                },
                true,
            ),
        };

        let mode = if config.port == IMPLICIT_TLS_PORT {
            TlsMode::Implicit
        } else {
            mode
        };

        TransportParameters {
            mode,
            min_version: self.min_version,
            accept_invalid_certs,
            provider,
        }
    }
}

fn matches_any(host: &str, suffixes: &[String]) -> bool {
    suffixes.iter().any(|suffix| {
        let suffix = suffix.trim_start_matches('.');
        host == suffix
            || host
                .strip_suffix(suffix)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

mod defaults {
    pub fn consumer() -> Vec<String> {
        ["gmail.com", "googlemail.com", "yahoo.com", "icloud.com", "me.com", "aol.com"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    pub fn business() -> Vec<String> {
        ["office365.com", "outlook.com"]
            .into_iter()
            .map(String::from)
            .collect()
    }
}
