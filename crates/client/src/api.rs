// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Request/response API used for snapshots, sends and read receipts.
//!
//! [`MessagingApi`] is the seam; [`HttpApi`] talks to the real server with
//! reqwest and a bearer credential.

use std::future::Future;
use std::pin::Pin;

use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use courier_core::{ConversationRecord, User, UserId, WireMessage};

/// Error type for API calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request did not complete (connect, timeout, bad URL).
    #[error("request failed: {0}")]
    Request(String),

    /// The server rejected the credential.
    #[error("credential rejected by the API")]
    Unauthorized,

    /// The server answered with a non-success status.
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),
}

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Boxed future returned by [`MessagingApi`] methods.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = ApiResult<T>> + Send + 'a>>;

/// The request/response side of the messaging backend.
pub trait MessagingApi: Send + Sync {
    /// Fetch one page of the conversation with `peer`.
    fn conversation<'a>(
        &'a self,
        peer: &'a UserId,
        page: u32,
        page_size: u32,
    ) -> ApiFuture<'a, Vec<WireMessage>>;

    /// Fetch all conversation summaries of the local user.
    fn conversations(&self) -> ApiFuture<'_, Vec<ConversationRecord>>;

    /// Search users by name.
    fn search_users<'a>(&'a self, query: &'a str) -> ApiFuture<'a, Vec<User>>;

    /// Send a message; the server answers with the stored message.
    fn send_message<'a>(
        &'a self,
        recipient: &'a UserId,
        content: &'a str,
    ) -> ApiFuture<'a, WireMessage>;

    /// Mark everything `peer` sent to the local user as read.
    fn mark_read<'a>(&'a self, peer: &'a UserId) -> ApiFuture<'a, ()>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageRequest<'a> {
    recipient_id: &'a UserId,
    content: &'a str,
}

/// HTTP implementation of [`MessagingApi`].
pub struct HttpApi {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        HttpApi {
            base_url: base_url.into(),
            token: token.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Build an endpoint URL below the base, escaping each segment.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::Request(format!("invalid api url '{}': {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Request(format!("api url '{}' cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute(&self, request: RequestBuilder) -> ApiResult<Response> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(ApiError::Status {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    async fn execute_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        self.execute(request)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

impl MessagingApi for HttpApi {
    fn conversation<'a>(
        &'a self,
        peer: &'a UserId,
        page: u32,
        page_size: u32,
    ) -> ApiFuture<'a, Vec<WireMessage>> {
        Box::pin(async move {
            let url = self.endpoint(&["messages", "conversation", peer.as_str()])?;
            let request = self
                .client
                .get(url)
                .query(&[("page", page), ("pageSize", page_size)]);
            self.execute_json(request).await
        })
    }

    fn conversations(&self) -> ApiFuture<'_, Vec<ConversationRecord>> {
        Box::pin(async move {
            let url = self.endpoint(&["messages", "conversations"])?;
            self.execute_json(self.client.get(url)).await
        })
    }

    fn search_users<'a>(&'a self, query: &'a str) -> ApiFuture<'a, Vec<User>> {
        Box::pin(async move {
            let url = self.endpoint(&["users", "search"])?;
            let request = self.client.get(url).query(&[("query", query)]);
            self.execute_json(request).await
        })
    }

    fn send_message<'a>(
        &'a self,
        recipient: &'a UserId,
        content: &'a str,
    ) -> ApiFuture<'a, WireMessage> {
        Box::pin(async move {
            let url = self.endpoint(&["messages"])?;
            let body = SendMessageRequest {
                recipient_id: recipient,
                content,
            };
            self.execute_json(self.client.post(url).json(&body)).await
        })
    }

    fn mark_read<'a>(&'a self, peer: &'a UserId) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            let url = self.endpoint(&["messages", "mark-read", peer.as_str()])?;
            self.execute(self.client.put(url)).await?;
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
