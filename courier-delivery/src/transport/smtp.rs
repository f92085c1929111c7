//! SMTP sessions backed by `lettre`.

use async_trait::async_trait;
use courier_common::{Body, Message, TransportConfig, outgoing};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
    message::{
        Attachment as AttachmentPart, Mailbox, MultiPart, SinglePart, header::ContentType,
    },
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters, TlsVersion},
    },
};

use super::{Session, Transport, generate_message_id};
use crate::{
    error::TransportError,
    policy::{MinTlsVersion, TlsMode, TransportParameters},
};

/// Production transport: one `lettre` SMTP client per session.
#[derive(Debug, Default, Clone, Copy)]
pub struct SmtpTransport;

#[async_trait]
impl Transport for SmtpTransport {
    async fn open(
        &self,
        config: &TransportConfig,
        parameters: &TransportParameters,
    ) -> Result<Box<dyn Session>, TransportError> {
        let sender = sender_mailbox(config)?;

        let tls = tls_parameters(&config.host, parameters)?;
        let tls = match parameters.mode {
            TlsMode::Implicit => Tls::Wrapper(tls),
            TlsMode::StartTls { required: true } => Tls::Required(tls),
            TlsMode::StartTls { required: false } => Tls::Opportunistic(tls),
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            .port(config.port)
            .tls(tls);

        if config.has_credentials() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        outgoing!(
            level = DEBUG,
            host = %config.host,
            port = config.port,
            mode = ?parameters.mode,
            provider = ?parameters.provider,
            "Opening SMTP session"
        );

        Ok(Box::new(SmtpSession {
            transport: Some(builder.build()),
            sender,
        }))
    }
}

/// The `From` mailbox for `config`, display name included when set.
fn sender_mailbox(config: &TransportConfig) -> Result<Mailbox, TransportError> {
    config
        .sender()
        .parse()
        .map_err(|e| TransportError::Configuration(format!("sender address: {e}")))
}

fn tls_parameters(
    host: &str,
    parameters: &TransportParameters,
) -> Result<TlsParameters, TransportError> {
    let version = match parameters.min_version {
        MinTlsVersion::Tls12 => TlsVersion::Tlsv12,
        MinTlsVersion::Tls13 => TlsVersion::Tlsv13,
    };

    TlsParameters::builder(host.to_string())
        .dangerous_accept_invalid_certs(parameters.accept_invalid_certs)
        .set_min_tls_version(version)
        .build()
        .map_err(|e| TransportError::Configuration(format!("TLS parameters: {e}")))
}

/// A `lettre` client plus the sender it sends as.
///
/// `lettre` connects on demand, so closing drops the client and with it any
/// connection it still holds.
pub struct SmtpSession {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    sender: Mailbox,
}

impl SmtpSession {
    fn transport(&self) -> Result<&AsyncSmtpTransport<Tokio1Executor>, TransportError> {
        self.transport
            .as_ref()
            .ok_or_else(|| TransportError::Connection("session already closed".to_string()))
    }
}

#[async_trait]
impl Session for SmtpSession {
    async fn verify(&mut self) -> Result<(), TransportError> {
        if self.transport()?.test_connection().await? {
            Ok(())
        } else {
            Err(TransportError::Verification(
                "server did not accept the connection".to_string(),
            ))
        }
    }

    async fn send(&mut self, message: &Message) -> Result<String, TransportError> {
        let message_id = generate_message_id(&self.sender.email.to_string());
        let email = build_message(&self.sender, message, message_id.clone())?;

        let response = self.transport()?.send(email).await?;
        outgoing!(
            level = DEBUG,
            to = %message.to,
            code = %response.code(),
            "Message accepted"
        );

        Ok(message_id)
    }

    async fn close(&mut self) {
        if self.transport.take().is_some() {
            outgoing!("SMTP session closed");
        }
    }
}

/// Render `message` as a MIME message from `sender`.
///
/// # Errors
///
/// If an address or attachment content type cannot be parsed, or `lettre`
/// rejects the assembled message.
pub fn build_message(
    sender: &Mailbox,
    message: &Message,
    message_id: String,
) -> Result<lettre::Message, TransportError> {
    let to = message
        .to
        .parse::<Mailbox>()
        .map_err(|e| TransportError::Build(format!("recipient address: {e}")))?;

    let builder = lettre::Message::builder()
        .from(sender.clone())
        .to(to)
        .subject(message.subject.clone())
        .message_id(Some(message_id));

    let body = match &message.body {
        Body::Text(text) => SinglePart::plain(text.clone()),
        Body::Html(html) => SinglePart::html(html.clone()),
    };

    let built = if message.attachments.is_empty() {
        builder.singlepart(body)
    } else {
        let mut parts = MultiPart::mixed().singlepart(body);
        for attachment in &message.attachments {
            let content_type = ContentType::parse(attachment.mime_type()).map_err(|e| {
                TransportError::Build(format!("{}: content type: {e}", attachment.filename))
            })?;
            parts = parts.singlepart(
                AttachmentPart::new(attachment.filename.clone())
                    .body(attachment.content.to_vec(), content_type),
            );
        }
        builder.multipart(parts)
    };

    built.map_err(|e| TransportError::Build(e.to_string()))
}
