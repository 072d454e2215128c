//! Finds unread inbox messages that contain a trigger phrase.

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::debug;

use crate::error::GmailError;
use crate::gmail::{MailClient, MessageQuery};
use crate::pipeline::keywords::KeywordSet;

/// Keyword verdict for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub message_id: String,
    pub has_keywords: bool,
}

/// Lists a bounded page of unread inbox mail and filters it by keyword.
pub struct InboxScanner {
    client: Arc<dyn MailClient>,
    keywords: Arc<KeywordSet>,
    page_size: usize,
}

impl InboxScanner {
    pub fn new(client: Arc<dyn MailClient>, keywords: Arc<KeywordSet>, page_size: usize) -> Self {
        Self {
            client,
            keywords,
            page_size,
        }
    }

    /// Matching candidates, at most `page_size`, in listing order.
    ///
    /// Messages are fetched concurrently; one failed fetch fails the scan.
    pub async fn scan(&self) -> Result<Vec<MatchResult>, GmailError> {
        let mut refs = self
            .client
            .list_messages(&MessageQuery::unread_inbox(self.page_size))
            .await?;
        refs.truncate(self.page_size);

        let results = try_join_all(refs.iter().map(|r| async move {
            let message = self.client.get_message(&r.id).await?;
            let body = message.plain_text_body();
            Ok::<_, GmailError>(MatchResult {
                message_id: r.id.clone(),
                has_keywords: self.keywords.matches(&body),
            })
        }))
        .await?;

        let listed = results.len();
        let matched: Vec<MatchResult> = results.into_iter().filter(|m| m.has_keywords).collect();
        debug!(listed, matched = matched.len(), "Inbox scan complete");
        Ok(matched)
    }
}
