//! Outgoing message types
//!
//! A campaign starts life as a [`MessageDraft`], which is what the composer
//! stores and what arrives over the wire. Validating a draft produces a
//! [`MessageTemplate`], and the template is stamped out into one
//! [`Message`] per recipient.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize, Serializer};

use crate::{ValidationError, address::validate_email};

/// Largest attachment accepted, in bytes (10 MiB).
pub const MAX_ATTACHMENT_SIZE: usize = 10 * 1024 * 1024;

/// The single body representation of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Text(String),
    Html(String),
}

/// A file attached to a message.
///
/// Content is shared behind an `Arc` since the same attachment is handed to
/// every recipient in a campaign.
/// Deserializes from the same `{filename, content, encoding, contentType}`
/// shape the send endpoint accepts, through [`Attachment::from_base64`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "EncodedAttachment")]
pub struct Attachment {
    pub filename: String,
    #[serde(serialize_with = "encode_content")]
    pub content: Arc<[u8]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl Attachment {
    /// Create an attachment, enforcing [`MAX_ATTACHMENT_SIZE`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAttachment`] when the filename is
    /// empty or the content is too large.
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Result<Self, ValidationError> {
        let attachment = Self {
            filename: filename.into(),
            content: Arc::from(content),
            content_type: None,
        };
        attachment.validate()?;
        Ok(attachment)
    }

    /// Decode an attachment from its wire representation.
    ///
    /// Only the `base64` encoding tag is understood.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAttachment`] for an unknown encoding,
    /// undecodable content, or content over the size ceiling.
    pub fn from_base64(
        filename: impl Into<String>,
        content: &str,
        encoding: &str,
    ) -> Result<Self, ValidationError> {
        let filename = filename.into();

        if !encoding.eq_ignore_ascii_case("base64") {
            return Err(ValidationError::InvalidAttachment {
                filename,
                reason: format!("unsupported encoding '{encoding}'"),
            });
        }

        // Cheap upper bound before decoding anything
        if content.len() / 4 * 3 > MAX_ATTACHMENT_SIZE + 3 {
            return Err(too_large(filename));
        }

        let decoded = STANDARD
            .decode(content.trim())
            .map_err(|e| ValidationError::InvalidAttachment {
                filename: filename.clone(),
                reason: format!("content is not valid base64: {e}"),
            })?;

        Self::new(filename, decoded)
    }

    /// Size of the decoded content in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// The MIME type to label this attachment with.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        self.content_type
            .as_deref()
            .unwrap_or("application/octet-stream")
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.filename.trim().is_empty() {
            return Err(ValidationError::InvalidAttachment {
                filename: self.filename.clone(),
                reason: "filename is required".to_string(),
            });
        }

        if self.size() > MAX_ATTACHMENT_SIZE {
            return Err(too_large(self.filename.clone()));
        }

        Ok(())
    }
}

fn too_large(filename: String) -> ValidationError {
    ValidationError::InvalidAttachment {
        filename,
        reason: format!("exceeds the {} MiB limit", MAX_ATTACHMENT_SIZE / (1024 * 1024)),
    }
}

fn encode_content<S: Serializer>(content: &Arc<[u8]>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(content))
}

/// Wire form of an [`Attachment`]
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EncodedAttachment {
    filename: String,
    content: String,
    #[serde(default = "default_encoding")]
    encoding: String,
    #[serde(default)]
    content_type: Option<String>,
}

fn default_encoding() -> String {
    "base64".to_string()
}

impl TryFrom<EncodedAttachment> for Attachment {
    type Error = ValidationError;

    fn try_from(encoded: EncodedAttachment) -> Result<Self, Self::Error> {
        let mut attachment =
            Self::from_base64(encoded.filename, &encoded.content, &encoded.encoding)?;
        attachment.content_type = encoded.content_type;
        Ok(attachment)
    }
}

/// Unvalidated message content as composed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDraft {
    #[serde(default)]
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default)]
    pub campaign: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl MessageDraft {
    /// Validate the draft into a template.
    ///
    /// Blank bodies count as absent. The campaign label is optional here;
    /// the orchestrator insists on one separately.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for a missing subject, a missing or
    /// ambiguous body, or an invalid attachment.
    pub fn validate(&self) -> Result<MessageTemplate, ValidationError> {
        if self.subject.trim().is_empty() {
            return Err(ValidationError::MissingSubject);
        }

        let text = self.text.as_ref().filter(|t| !t.trim().is_empty());
        let html = self.html.as_ref().filter(|h| !h.trim().is_empty());

        let body = match (text, html) {
            (Some(text), None) => Body::Text(text.clone()),
            (None, Some(html)) => Body::Html(html.clone()),
            (Some(_), Some(_)) => return Err(ValidationError::AmbiguousBody),
            (None, None) => return Err(ValidationError::MissingBody),
        };

        for attachment in &self.attachments {
            attachment.validate()?;
        }

        let campaign = Some(self.campaign.trim())
            .filter(|c| !c.is_empty())
            .map(ToString::to_string);

        Ok(MessageTemplate {
            subject: self.subject.clone(),
            body,
            campaign,
            attachments: self.attachments.clone(),
        })
    }
}

/// Validated message content, not yet addressed to anyone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    pub subject: String,
    pub body: Body,
    pub campaign: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl MessageTemplate {
    /// Address a copy of this template to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidEmail`] if `to` is not a valid address.
    pub fn address_to(&self, to: &str) -> Result<Message, ValidationError> {
        Ok(Message {
            to: validate_email(to)?,
            subject: self.subject.clone(),
            body: self.body.clone(),
            campaign: self.campaign.clone(),
            attachments: self.attachments.clone(),
        })
    }
}

/// A message ready for delivery to a single recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub to: String,
    pub subject: String,
    pub body: Body,
    pub campaign: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl Message {
    /// Validate a draft and address it in one step.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found in the draft or address.
    pub fn from_draft(to: &str, draft: &MessageDraft) -> Result<Self, ValidationError> {
        draft.validate()?.address_to(to)
    }
}
