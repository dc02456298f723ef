//! User-submitted content: plain text or a structured text+media payload.
//!
//! Structured content is sent to the transport unchanged; the transcript
//! shows a derived display string where media parts render as markdown.

use serde::{Deserialize, Serialize};

/// Reference to an uploaded image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    #[serde(rename = "fileName", skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

/// One part of a structured submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageRef },
    Video { video: String },
    Other { kind: String },
}

impl ContentPart {
    fn is_text(&self) -> bool {
        matches!(self, ContentPart::Text { .. })
    }

    /// Markdown rendering for a media part (never called for text parts).
    fn media_markdown(&self) -> String {
        match self {
            ContentPart::Text { .. } => String::new(),
            ContentPart::ImageUrl { image_url } => {
                let name = image_url.file_name.as_deref().unwrap_or("image");
                format!("\n![{}]({})", name, image_url.url)
            }
            ContentPart::Video { video } => format!("\n[Video]({})", video),
            ContentPart::Other { kind } => format!("\n[{} attachment]", kind),
        }
    }
}

/// What the user submitted: plain text or structured parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserContent {
    Text(String),
    Structured { content: Vec<ContentPart> },
}

impl UserContent {
    pub fn text(s: impl Into<String>) -> Self {
        UserContent::Text(s.into())
    }

    /// Display projection shown as the human turn's text.
    ///
    /// Text parts joined by spaces, then a newline-joined markdown list of
    /// media parts. Plain text passes through unchanged.
    pub fn display_text(&self) -> String {
        match self {
            UserContent::Text(s) => s.clone(),
            UserContent::Structured { content } => {
                let text = content
                    .iter()
                    .filter_map(|p| match p {
                        ContentPart::Text { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join(" ");

                let media = content
                    .iter()
                    .filter(|p| !p.is_text())
                    .map(|p| p.media_markdown())
                    .collect::<Vec<_>>()
                    .join("\n");

                if media.is_empty() {
                    text
                } else {
                    format!("{}\n{}", text, media)
                }
            }
        }
    }

    /// Wire payload: the submission exactly as received, no projection.
    pub fn to_payload(&self) -> serde_json::Value {
        // Both variants serialize infallibly (strings and tagged structs).
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
