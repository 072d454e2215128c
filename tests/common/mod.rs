//! In-memory stand-ins for the mail provider and the authenticator.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::Engine;

use inbox_autoreply::error::{AuthError, GmailError};
use inbox_autoreply::gmail::types::{Header, MessagePartBody};
use inbox_autoreply::gmail::{
    Authenticator, INBOX_LABEL, Label, LabelChange, MailClient, Message, MessagePart,
    MessageQuery, MessageRef, NewLabel, RawMessage,
};

#[derive(Default)]
struct MailboxState {
    labels: Vec<Label>,
    messages: Vec<Message>,
    sent: Vec<RawMessage>,
    modified: Vec<(String, LabelChange)>,
    create_label_calls: usize,
    get_calls: usize,
    fail_create_status: Option<u16>,
    fail_modify: bool,
    fail_get_for: Option<String>,
    overfill_listing: bool,
    hide_labels_on_list: bool,
}

/// Fake mailbox that behaves like the provider for the calls we make.
#[derive(Default)]
pub struct FakeMailbox {
    state: Mutex<MailboxState>,
}

impl FakeMailbox {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_message(&self, message: Message) {
        self.state.lock().unwrap().messages.push(message);
    }

    pub fn add_label(&self, id: &str, name: &str) {
        self.state.lock().unwrap().labels.push(Label {
            id: id.into(),
            name: name.into(),
        });
    }

    /// Make `labels.create` fail with a non-conflict status.
    pub fn fail_create_with(&self, status: u16) {
        self.state.lock().unwrap().fail_create_status = Some(status);
    }

    pub fn fail_modify(&self) {
        self.state.lock().unwrap().fail_modify = true;
    }

    pub fn fail_get_for(&self, id: &str) {
        self.state.lock().unwrap().fail_get_for = Some(id.to_string());
    }

    /// Ignore `maxResults` when listing, like a misbehaving server.
    pub fn overfill_listing(&self) {
        self.state.lock().unwrap().overfill_listing = true;
    }

    /// Report conflicts on create but leave the label out of `labels.list`.
    pub fn hide_labels_on_list(&self) {
        self.state.lock().unwrap().hide_labels_on_list = true;
    }

    pub fn create_label_calls(&self) -> usize {
        self.state.lock().unwrap().create_label_calls
    }

    pub fn get_calls(&self) -> usize {
        self.state.lock().unwrap().get_calls
    }

    pub fn sent(&self) -> Vec<RawMessage> {
        self.state.lock().unwrap().sent.clone()
    }

    /// Sent messages decoded back to RFC 5322 text.
    pub fn sent_texts(&self) -> Vec<String> {
        self.sent()
            .iter()
            .map(|m| {
                let bytes = base64::engine::general_purpose::URL_SAFE
                    .decode(&m.raw)
                    .expect("raw is base64url");
                String::from_utf8(bytes).expect("raw is utf-8")
            })
            .collect()
    }

    pub fn modified(&self) -> Vec<(String, LabelChange)> {
        self.state.lock().unwrap().modified.clone()
    }

    pub fn labels_of(&self, id: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .messages
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.label_ids.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MailClient for FakeMailbox {
    async fn list_labels(&self) -> Result<Vec<Label>, GmailError> {
        let state = self.state.lock().unwrap();
        if state.hide_labels_on_list {
            return Ok(Vec::new());
        }
        Ok(state.labels.clone())
    }

    async fn create_label(&self, label: &NewLabel) -> Result<Label, GmailError> {
        let mut state = self.state.lock().unwrap();
        state.create_label_calls += 1;
        if let Some(status) = state.fail_create_status {
            return Err(GmailError::Status {
                operation: "labels.create".into(),
                status,
                body: "boom".into(),
            });
        }
        if state.labels.iter().any(|l| l.name == label.name) {
            return Err(GmailError::Conflict {
                resource: "labels.create".into(),
            });
        }
        let created = Label {
            id: format!("Label_{}", state.labels.len() + 1),
            name: label.name.clone(),
        };
        state.labels.push(created.clone());
        Ok(created)
    }

    async fn list_messages(&self, query: &MessageQuery) -> Result<Vec<MessageRef>, GmailError> {
        let state = self.state.lock().unwrap();
        let unread_only = query.q.contains("is:unread");
        let matching = state.messages.iter().filter(|m| {
            query.label_ids.iter().all(|l| m.label_ids.contains(l))
                && (!unread_only || m.label_ids.iter().any(|l| l == "UNREAD"))
        });
        let limit = if state.overfill_listing {
            usize::MAX
        } else {
            query.max_results
        };
        Ok(matching
            .take(limit)
            .map(|m| MessageRef {
                id: m.id.clone(),
                thread_id: m.thread_id.clone(),
            })
            .collect())
    }

    async fn get_message(&self, id: &str) -> Result<Message, GmailError> {
        let mut state = self.state.lock().unwrap();
        state.get_calls += 1;
        if state.fail_get_for.as_deref() == Some(id) {
            return Err(GmailError::Status {
                operation: "messages.get".into(),
                status: 500,
                body: "backend error".into(),
            });
        }
        state
            .messages
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| GmailError::Status {
                operation: "messages.get".into(),
                status: 404,
                body: "not found".into(),
            })
    }

    async fn modify_message(&self, id: &str, change: &LabelChange) -> Result<(), GmailError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_modify {
            return Err(GmailError::Status {
                operation: "messages.modify".into(),
                status: 503,
                body: "unavailable".into(),
            });
        }
        state.modified.push((id.to_string(), change.clone()));
        if let Some(message) = state.messages.iter_mut().find(|m| m.id == id) {
            message
                .label_ids
                .retain(|l| !change.remove_label_ids.contains(l));
            message.label_ids.extend(change.add_label_ids.iter().cloned());
        }
        Ok(())
    }

    async fn send_message(&self, message: &RawMessage) -> Result<MessageRef, GmailError> {
        let mut state = self.state.lock().unwrap();
        state.sent.push(message.clone());
        Ok(MessageRef {
            id: format!("sent-{}", state.sent.len()),
            thread_id: message.thread_id.clone(),
        })
    }
}

/// Authenticator handing out a shared fake mailbox, or failing.
pub struct FakeAuthenticator {
    mailbox: Option<Arc<FakeMailbox>>,
    panics: bool,
}

impl FakeAuthenticator {
    pub fn with(mailbox: Arc<FakeMailbox>) -> Arc<Self> {
        Arc::new(Self {
            mailbox: Some(mailbox),
            panics: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            mailbox: None,
            panics: false,
        })
    }

    /// Panics inside `authenticate`, killing the task that called it.
    pub fn panicking() -> Arc<Self> {
        Arc::new(Self {
            mailbox: None,
            panics: true,
        })
    }
}

#[async_trait]
impl Authenticator for FakeAuthenticator {
    async fn authenticate(&self) -> Result<Arc<dyn MailClient>, AuthError> {
        if self.panics {
            panic!("authenticator blew up");
        }
        match &self.mailbox {
            Some(mailbox) => Ok(Arc::clone(mailbox) as Arc<dyn MailClient>),
            None => Err(AuthError::RefreshFailed("invalid_grant".into())),
        }
    }
}

fn header(name: &str, value: &str) -> Header {
    Header {
        name: name.into(),
        value: value.into(),
    }
}

/// An unread inbox message with a multipart/alternative body.
pub fn unread_message(id: &str, from: &str, subject: &str, body: &str) -> Message {
    message_with_headers(
        id,
        vec![header("From", from), header("Subject", subject)],
        body,
    )
}

/// An unread inbox message that is itself a reply.
pub fn unread_reply(id: &str, from: &str, subject: &str, body: &str) -> Message {
    message_with_headers(
        id,
        vec![
            header("From", from),
            header("Subject", subject),
            header("In-Reply-To", "<original@example.com>"),
        ],
        body,
    )
}

/// An unread inbox message with only the given headers.
pub fn message_with_headers(id: &str, headers: Vec<Header>, body: &str) -> Message {
    let encoded = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(body);
    Message {
        id: id.into(),
        thread_id: Some(format!("thread-{id}")),
        label_ids: vec![INBOX_LABEL.into(), "UNREAD".into()],
        payload: MessagePart {
            mime_type: "multipart/alternative".into(),
            headers,
            body: MessagePartBody::default(),
            parts: vec![
                MessagePart {
                    mime_type: "text/plain".into(),
                    body: MessagePartBody {
                        data: Some(encoded),
                        size: body.len() as u64,
                    },
                    ..Default::default()
                },
                MessagePart {
                    mime_type: "text/html".into(),
                    body: MessagePartBody {
                        data: Some(
                            base64::engine::general_purpose::URL_SAFE_NO_PAD
                                .encode(format!("<p>{body}</p>")),
                        ),
                        size: body.len() as u64 + 7,
                    },
                    ..Default::default()
                },
            ],
        },
    }
}

pub fn sender_header(value: &str) -> Header {
    header("From", value)
}

pub fn subject_header(value: &str) -> Header {
    header("Subject", value)
}
