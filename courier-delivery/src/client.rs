//! The delivery client: verified sessions, bounded retries, one message.

use std::{future::Future, sync::Arc, time::Duration};

use courier_common::{Message, TransportConfig, internal, outgoing};
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::{
    error::{DeliveryError, TransportError},
    policy::{RetryPolicy, TlsPolicyResolver, TransportParameters, retry::defaults},
    transport::{Session, SmtpTransport, Transport},
};

/// Sends single messages with verification and retry.
///
/// Each call to [`DeliveryClient::send`] owns the sessions it opens; nothing
/// is pooled or shared between calls.
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryClient {
    /// Policy for opening and verifying a session.
    #[serde(default = "defaults::verification")]
    pub verify: RetryPolicy,

    /// Policy for transmitting the message.
    #[serde(default = "defaults::send")]
    pub send: RetryPolicy,

    /// Provider tables used to pick TLS parameters.
    #[serde(default)]
    pub providers: TlsPolicyResolver,

    #[serde(skip, default = "default_transport")]
    transport: Arc<dyn Transport>,
}

fn default_transport() -> Arc<dyn Transport> {
    Arc::new(SmtpTransport)
}

impl Default for DeliveryClient {
    fn default() -> Self {
        Self {
            verify: RetryPolicy::verification(),
            send: RetryPolicy::send(),
            providers: TlsPolicyResolver::default(),
            transport: default_transport(),
        }
    }
}

impl DeliveryClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the transport sessions are opened with.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Replace both retry policies.
    #[must_use]
    pub const fn with_policies(mut self, verify: RetryPolicy, send: RetryPolicy) -> Self {
        self.verify = verify;
        self.send = send;
        self
    }

    /// Deliver `message` using `config`, returning its message identifier.
    ///
    /// A verified session is obtained first, under the `verify` policy. The
    /// send is then attempted under the `send` policy; the session is closed
    /// straight after every attempt and a fresh verified session is opened
    /// before a retry.
    ///
    /// # Errors
    ///
    /// - [`DeliveryError::Validation`] if `config` is unusable
    /// - [`DeliveryError::Configuration`] if a session cannot be opened
    /// - [`DeliveryError::ConnectionFailed`] if no session could be verified
    /// - [`DeliveryError::SendFailed`] if every send attempt failed
    #[instrument(level = "debug", skip_all, fields(to = %message.to, host = %config.host))]
    pub async fn send(
        &self,
        config: &TransportConfig,
        message: &Message,
    ) -> Result<String, DeliveryError> {
        config.validate()?;
        let parameters = self.providers.resolve(config);

        let mut session = self.connect(config, &parameters).await?;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let result = with_timeout(self.send.timeout(), session.send(message)).await;
            session.close().await;

            let cause = match result {
                Ok(message_id) => {
                    outgoing!(
                        level = INFO,
                        to = %message.to,
                        message_id = %message_id,
                        attempt,
                        "Message sent"
                    );
                    return Ok(message_id);
                }
                Err(cause) => cause,
            };

            if self.send.is_final_attempt(attempt) {
                return Err(DeliveryError::SendFailed {
                    attempts: attempt,
                    cause,
                });
            }

            warn!(
                to = %message.to,
                attempt,
                remaining = self.send.remaining_attempts(attempt),
                error = %cause,
                "Send attempt failed, retrying on a fresh session"
            );

            session = self
                .open_verified(config, &parameters)
                .await
                .map_err(|cause| DeliveryError::SendFailed {
                    attempts: attempt,
                    cause,
                })?;

            tokio::time::sleep(self.send.delay_after(attempt)).await;
        }
    }

    /// Obtain a verified session under the verification policy.
    ///
    /// Every failed session is closed before backing off.
    async fn connect(
        &self,
        config: &TransportConfig,
        parameters: &TransportParameters,
    ) -> Result<Box<dyn Session>, DeliveryError> {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.open_verified(config, parameters).await {
                Ok(session) => {
                    internal!(attempt, "Session verified");
                    return Ok(session);
                }
                Err(TransportError::Configuration(reason)) => {
                    return Err(DeliveryError::Configuration(reason));
                }
                Err(cause) if self.verify.is_final_attempt(attempt) => {
                    return Err(DeliveryError::ConnectionFailed {
                        attempts: attempt,
                        cause,
                    });
                }
                Err(cause) => {
                    let delay = self.verify.delay_after(attempt);
                    warn!(
                        host = %config.host,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %cause,
                        "Connection verification failed"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Open one session and verify it once, closing it if verification fails.
    async fn open_verified(
        &self,
        config: &TransportConfig,
        parameters: &TransportParameters,
    ) -> Result<Box<dyn Session>, TransportError> {
        let mut session = self.transport.open(config, parameters).await?;

        match with_timeout(self.verify.timeout(), session.verify()).await {
            Ok(()) => Ok(session),
            Err(e) => {
                session.close().await;
                Err(e)
            }
        }
    }
}

async fn with_timeout<T>(
    limit: Duration,
    operation: impl Future<Output = Result<T, TransportError>>,
) -> Result<T, TransportError> {
    tokio::time::timeout(limit, operation)
        .await
        .unwrap_or(Err(TransportError::Timeout(limit)))
}
