//! SMTP transport configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ValidationError, address::validate_email};

/// Everything needed to talk to one SMTP provider.
///
/// Supplied fresh for every send and never mutated by the delivery code.
/// The password is redacted from the `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub from_email: String,
    #[serde(default)]
    pub from_name: String,
    #[serde(default, rename = "useTLS", alias = "useTls")]
    pub use_tls: bool,
}

impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .field("use_tls", &self.use_tls)
            .finish()
    }
}

impl TransportConfig {
    /// Check that the configuration is usable before any connection attempt.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.host.trim().is_empty() {
            return Err(ValidationError::InvalidTransportConfig(
                "host is required".to_string(),
            ));
        }

        if self.port == 0 {
            return Err(ValidationError::InvalidTransportConfig(
                "port must be between 1 and 65535".to_string(),
            ));
        }

        validate_email(&self.from_email)?;

        Ok(())
    }

    /// Whether credentials should be presented to the server.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty()
    }

    /// The `From` mailbox, with the display name when one is set.
    #[must_use]
    pub fn sender(&self) -> String {
        if self.from_name.trim().is_empty() {
            self.from_email.clone()
        } else {
            format!("\"{}\" <{}>", self.from_name.replace('"', ""), self.from_email)
        }
    }

    /// Copy of this configuration with the password blanked out.
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            password: String::new(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> TransportConfig {
        TransportConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: "mailer".to_string(),
            password: "hunter2".to_string(),
            from_email: "news@example.com".to_string(),
            from_name: "Example News".to_string(),
            use_tls: true,
        }
    }

    #[test]
    fn test_validate_ok() {
        assert_eq!(config().validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_empty_host() {
        let config = TransportConfig {
            host: "  ".to_string(),
            ..config()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidTransportConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_port_zero() {
        let config = TransportConfig { port: 0, ..config() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_sender() {
        let config = TransportConfig {
            from_email: "nobody".to_string(),
            ..config()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidEmail("nobody".to_string()))
        );
    }

    #[test]
    fn test_debug_redacts_password() {
        let debug = format!("{:?}", config());
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_sender_formatting() {
        assert_eq!(config().sender(), "\"Example News\" <news@example.com>");

        let config = TransportConfig {
            from_name: String::new(),
            ..config()
        };
        assert_eq!(config.sender(), "news@example.com");
    }

    #[test]
    fn test_deserialize_wire_format() {
        let json = r#"{
            "host": "smtp.gmail.com",
            "port": 465,
            "username": "me@gmail.com",
            "password": "app-password",
            "fromEmail": "me@gmail.com",
            "fromName": "Me",
            "useTLS": true
        }"#;

        let config: TransportConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.host, "smtp.gmail.com");
        assert_eq!(config.port, 465);
        assert!(config.use_tls);
        assert_eq!(config.from_name, "Me");
    }
}
