//! Gmail v1 REST resources, trimmed to the fields the auto-responder reads.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::{Deserialize, Serialize};

/// System label id for the inbox.
pub const INBOX_LABEL: &str = "INBOX";

/// Gmail returns body data as base64url, sometimes padded, sometimes not.
const BODY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A user label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub name: String,
}

/// Body of a `labels.create` request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLabel {
    pub name: String,
    pub label_list_visibility: String,
    pub message_list_visibility: String,
}

impl NewLabel {
    /// A label shown both in the label list and on messages.
    pub fn visible(name: &str) -> Self {
        Self {
            name: name.to_string(),
            label_list_visibility: "labelShow".into(),
            message_list_visibility: "show".into(),
        }
    }
}

/// Filter for `messages.list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageQuery {
    pub label_ids: Vec<String>,
    pub q: String,
    pub max_results: usize,
}

impl MessageQuery {
    /// Unread messages in the inbox, at most `max_results`.
    pub fn unread_inbox(max_results: usize) -> Self {
        Self {
            label_ids: vec![INBOX_LABEL.to_string()],
            q: "is:unread".into(),
            max_results,
        }
    }
}

/// Id pair returned by `messages.list` and `messages.send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    pub id: String,
    #[serde(default)]
    pub thread_id: Option<String>,
}

/// Body of a `messages.modify` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelChange {
    pub add_label_ids: Vec<String>,
    pub remove_label_ids: Vec<String>,
}

impl LabelChange {
    /// Tag with `label_id` and drop the message out of the inbox.
    pub fn archive_into(label_id: &str) -> Self {
        Self {
            add_label_ids: vec![label_id.to_string()],
            remove_label_ids: vec![INBOX_LABEL.to_string()],
        }
    }
}

/// Body of a `messages.send` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    /// Base64url-encoded RFC 5322 message.
    pub raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

impl RawMessage {
    /// Encode a complete RFC 5322 message for submission.
    pub fn encode(rfc5322: &str, thread_id: Option<String>) -> Self {
        Self {
            raw: base64::engine::general_purpose::URL_SAFE.encode(rfc5322.as_bytes()),
            thread_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePartBody {
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub size: u64,
}

/// One node of the MIME tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub body: MessagePartBody,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

impl MessagePart {
    /// Depth-first search for the first `text/plain` node.
    fn find_plain_text(&self) -> Option<&MessagePart> {
        if self.mime_type.eq_ignore_ascii_case("text/plain") {
            return Some(self);
        }
        self.parts.iter().find_map(MessagePart::find_plain_text)
    }
}

/// A message fetched with `format=full`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub label_ids: Vec<String>,
    #[serde(default)]
    pub payload: MessagePart,
}

impl Message {
    /// Value of the first top-level header called `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.payload
            .headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Decoded text of the first `text/plain` part, or empty when there is none.
    ///
    /// Undecodable data is treated the same as a missing part.
    pub fn plain_text_body(&self) -> String {
        self.payload
            .find_plain_text()
            .and_then(|part| part.body.data.as_deref())
            .and_then(|data| BODY_ENGINE.decode(data.trim()).ok())
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    }
}
