//! Mail provider abstraction and the Gmail implementation of it.

pub mod auth;
pub mod client;
pub mod types;

pub use auth::{Authenticator, FileAuthenticator, TokenSource};
pub use client::GmailClient;
pub use types::{
    INBOX_LABEL, Label, LabelChange, Message, MessagePart, MessageQuery, MessageRef, NewLabel,
    RawMessage,
};

use async_trait::async_trait;

use crate::error::GmailError;

/// Authenticated capability to read, label and send mail for one account.
///
/// All calls act on the authenticated user. Implementations must be cheap to
/// share across tasks.
#[async_trait]
pub trait MailClient: Send + Sync {
    async fn list_labels(&self) -> Result<Vec<Label>, GmailError>;

    /// Create a label. Returns [`GmailError::Conflict`] if the name is taken.
    async fn create_label(&self, label: &NewLabel) -> Result<Label, GmailError>;

    async fn list_messages(&self, query: &MessageQuery) -> Result<Vec<MessageRef>, GmailError>;

    /// Fetch headers and the full MIME tree of one message.
    async fn get_message(&self, id: &str) -> Result<Message, GmailError>;

    async fn modify_message(&self, id: &str, change: &LabelChange) -> Result<(), GmailError>;

    async fn send_message(&self, message: &RawMessage) -> Result<MessageRef, GmailError>;
}
