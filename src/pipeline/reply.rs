//! Sends the canned reply and archives the handled message.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::error::GmailError;
use crate::gmail::{Label, LabelChange, MailClient, Message, RawMessage};

/// Body of every auto-reply.
pub const REPLY_BODY: &str = "Thank you for your email. I'm currently unavailable and will reply to you soon.\r\n\
Note: This is an auto-generated message. Please do not reply to this email.\r\n";

/// What happened to one candidate message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Reply sent and message archived under the managed label.
    Replied { recipient: String },
    /// Reply sent, but moving the message out of the inbox failed.
    RepliedRelabelFailed { recipient: String, reason: String },
    /// The message already carries an `In-Reply-To` header.
    AlreadyReplied,
    /// This process already replied to the message.
    AlreadyProcessed,
    /// A header needed to address the reply is missing.
    Malformed { missing: &'static str },
}

/// Compose the RFC 5322 reply to `original`.
///
/// Returns the name of the first missing header when `From` or `Subject`
/// is absent.
pub fn compose_reply(original: &Message) -> Result<ComposedReply, &'static str> {
    let to = original.header("From").ok_or("From")?;
    let subject = original.header("Subject").ok_or("Subject")?;

    let rfc5322 = format!(
        "To: {to}\r\n\
         Subject: Re: {subject}\r\n\
         Content-Type: text/plain; charset=\"UTF-8\"\r\n\
         Content-Transfer-Encoding: 7bit\r\n\
         \r\n\
         {REPLY_BODY}"
    );

    Ok(ComposedReply {
        recipient: to.to_string(),
        rfc5322,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedReply {
    pub recipient: String,
    pub rfc5322: String,
}

/// Replies to matched messages and relabels them.
pub struct ReplyWorker {
    client: Arc<dyn MailClient>,
    label: Label,
    processed: Mutex<HashSet<String>>,
}

impl ReplyWorker {
    pub fn new(client: Arc<dyn MailClient>, label: Label) -> Self {
        Self {
            client,
            label,
            processed: Mutex::new(HashSet::new()),
        }
    }

    fn already_processed(&self, message_id: &str) -> bool {
        self.processed
            .lock()
            .map(|set| set.contains(message_id))
            .unwrap_or(false)
    }

    fn mark_processed(&self, message_id: &str) {
        if let Ok(mut set) = self.processed.lock() {
            set.insert(message_id.to_string());
        }
    }

    /// Handle one matched message.
    ///
    /// Fetch and send failures propagate; a failed relabel is reported in the
    /// outcome instead.
    pub async fn process(&self, message_id: &str) -> Result<ReplyOutcome, GmailError> {
        if self.already_processed(message_id) {
            debug!(message_id, "Already replied in this process, skipping");
            return Ok(ReplyOutcome::AlreadyProcessed);
        }

        let message = self.client.get_message(message_id).await?;

        if message.header("In-Reply-To").is_some() {
            debug!(message_id, "Message is itself a reply, skipping");
            return Ok(ReplyOutcome::AlreadyReplied);
        }

        let reply = match compose_reply(&message) {
            Ok(reply) => reply,
            Err(missing) => {
                warn!(message_id, missing, "Cannot address reply, skipping message");
                return Ok(ReplyOutcome::Malformed { missing });
            }
        };

        self.client
            .send_message(&RawMessage::encode(&reply.rfc5322, message.thread_id.clone()))
            .await?;
        self.mark_processed(message_id);
        info!("Replied to the email - {}", reply.recipient);

        let change = LabelChange::archive_into(&self.label.id);
        match self.client.modify_message(message_id, &change).await {
            Ok(()) => Ok(ReplyOutcome::Replied {
                recipient: reply.recipient,
            }),
            Err(e) => {
                warn!(message_id, error = %e, "Reply sent but relabel failed");
                Ok(ReplyOutcome::RepliedRelabelFailed {
                    recipient: reply.recipient,
                    reason: e.to_string(),
                })
            }
        }
    }
}
