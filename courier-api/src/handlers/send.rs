//! Single message send endpoint

use axum::{Json, extract::State};
use courier_common::{Attachment, Message, MessageDraft, TransportConfig, ValidationError};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, extract::Payload, state::AppState};

#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    #[serde(default)]
    pub config: Option<TransportConfig>,
    pub message: OutgoingMessage,
}

/// Message as submitted by the client
#[derive(Debug, Deserialize)]
pub struct OutgoingMessage {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub campaign: Option<String>,
    #[serde(default)]
    pub attachments: Vec<AttachmentPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentPayload {
    pub filename: String,
    pub content: String,
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(default)]
    pub content_type: Option<String>,
}

fn default_encoding() -> String {
    "base64".to_string()
}

impl OutgoingMessage {
    /// Decode attachments, validate the content and address it
    ///
    /// # Errors
    ///
    /// The first [`ValidationError`] found.
    pub fn into_message(self) -> Result<Message, ValidationError> {
        let attachments = self
            .attachments
            .into_iter()
            .map(|payload| {
                let mut attachment =
                    Attachment::from_base64(payload.filename, &payload.content, &payload.encoding)?;
                attachment.content_type = payload.content_type;
                Ok(attachment)
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        let draft = MessageDraft {
            subject: self.subject,
            text: self.text,
            html: self.html,
            campaign: self.campaign.unwrap_or_default(),
            attachments,
        };

        Message::from_draft(&self.to, &draft)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailResponse {
    pub success: bool,
    pub message_id: String,
}

/// `POST /api/send-email`
pub async fn send_email(
    State(state): State<AppState>,
    Payload(request): Payload<SendEmailRequest>,
) -> Result<Json<SendEmailResponse>, ApiError> {
    let config = request
        .config
        .ok_or(ValidationError::MissingTransportConfig)?;
    config.validate()?;

    let message = request.message.into_message()?;
    let message_id = state.processor.client().send(&config, &message).await?;

    Ok(Json(SendEmailResponse {
        success: true,
        message_id,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use courier_common::Body;

    use super::*;

    fn outgoing() -> OutgoingMessage {
        OutgoingMessage {
            to: "alice@example.com".to_string(),
            subject: "Hello".to_string(),
            text: Some("Hi".to_string()),
            html: None,
            campaign: None,
            attachments: Vec::new(),
        }
    }

    #[test]
    fn test_into_message() {
        let message = outgoing().into_message().unwrap();
        assert_eq!(message.to, "alice@example.com");
        assert_eq!(message.body, Body::Text("Hi".to_string()));
        assert_eq!(message.campaign, None);
    }

    #[test]
    fn test_attachment_decoding() {
        let mut outgoing = outgoing();
        outgoing.attachments.push(AttachmentPayload {
            filename: "hello.txt".to_string(),
            content: "aGVsbG8=".to_string(),
            encoding: default_encoding(),
            content_type: Some("text/plain".to_string()),
        });

        let message = outgoing.into_message().unwrap();
        assert_eq!(&*message.attachments[0].content, b"hello");
        assert_eq!(message.attachments[0].mime_type(), "text/plain");
    }

    #[test]
    fn test_unknown_encoding_rejected() {
        let mut outgoing = outgoing();
        outgoing.attachments.push(AttachmentPayload {
            filename: "hello.txt".to_string(),
            content: "hello".to_string(),
            encoding: "quoted-printable".to_string(),
            content_type: None,
        });

        assert!(matches!(
            outgoing.into_message(),
            Err(ValidationError::InvalidAttachment { .. })
        ));
    }

    #[test]
    fn test_invalid_recipient_rejected() {
        let mut outgoing = outgoing();
        outgoing.to = "not-an-email".to_string();

        assert_eq!(
            outgoing.into_message().unwrap_err(),
            ValidationError::InvalidEmail("not-an-email".to_string())
        );
    }
}
