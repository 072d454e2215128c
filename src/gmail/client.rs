//! Gmail v1 REST client over `reqwest`.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::GmailError;
use crate::gmail::auth::TokenSource;
use crate::gmail::{Label, LabelChange, MailClient, Message, MessageQuery, MessageRef, NewLabel, RawMessage};

pub const DEFAULT_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

#[derive(Debug, Deserialize)]
struct LabelList {
    #[serde(default)]
    labels: Vec<Label>,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

/// Gmail client bound to one account.
pub struct GmailClient {
    http: reqwest::Client,
    tokens: Arc<TokenSource>,
    api_base: String,
}

impl GmailClient {
    pub fn new(http: reqwest::Client, tokens: Arc<TokenSource>, api_base: String) -> Self {
        Self {
            http,
            tokens,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.api_base)
    }

    /// Authorized request builder for `path` under the user root.
    async fn request(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder, GmailError> {
        let token = self.tokens.access_token().await?;
        Ok(self
            .http
            .request(method, self.url(path))
            .bearer_auth(token.expose_secret()))
    }

    /// Send the request and map non-success statuses onto [`GmailError`].
    async fn execute(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, GmailError> {
        let resp = request.send().await.map_err(|e| GmailError::Http {
            operation: operation.to_string(),
            reason: e.to_string(),
        })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        if status == StatusCode::CONFLICT {
            return Err(GmailError::Conflict {
                resource: operation.to_string(),
            });
        }
        tracing::warn!(operation, status = status.as_u16(), "Gmail API request failed");
        Err(GmailError::Status {
            operation: operation.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, GmailError> {
        self.execute(operation, request)
            .await?
            .json()
            .await
            .map_err(|e| GmailError::Decode {
                operation: operation.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl MailClient for GmailClient {
    async fn list_labels(&self) -> Result<Vec<Label>, GmailError> {
        let request = self.request(Method::GET, "labels").await?;
        let list: LabelList = self.execute_json("labels.list", request).await?;
        Ok(list.labels)
    }

    async fn create_label(&self, label: &NewLabel) -> Result<Label, GmailError> {
        let request = self.request(Method::POST, "labels").await?.json(label);
        self.execute_json("labels.create", request).await
    }

    async fn list_messages(&self, query: &MessageQuery) -> Result<Vec<MessageRef>, GmailError> {
        let mut params: Vec<(&str, String)> = query
            .label_ids
            .iter()
            .map(|id| ("labelIds", id.clone()))
            .collect();
        params.push(("q", query.q.clone()));
        params.push(("maxResults", query.max_results.to_string()));

        let request = self.request(Method::GET, "messages").await?.query(&params);
        let list: MessageList = self.execute_json("messages.list", request).await?;
        Ok(list.messages)
    }

    async fn get_message(&self, id: &str) -> Result<Message, GmailError> {
        let request = self
            .request(Method::GET, &format!("messages/{id}"))
            .await?
            .query(&[("format", "full")]);
        self.execute_json("messages.get", request).await
    }

    async fn modify_message(&self, id: &str, change: &LabelChange) -> Result<(), GmailError> {
        let request = self
            .request(Method::POST, &format!("messages/{id}/modify"))
            .await?
            .json(change);
        self.execute("messages.modify", request).await?;
        Ok(())
    }

    async fn send_message(&self, message: &RawMessage) -> Result<MessageRef, GmailError> {
        let request = self.request(Method::POST, "messages/send").await?.json(message);
        self.execute_json("messages.send", request).await
    }
}
