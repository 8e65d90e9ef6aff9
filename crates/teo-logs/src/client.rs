// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Signed transport for Tencent Cloud API actions.

use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::api::{Action, ApiErrorBody, Service};
use crate::config::Credential;
use crate::signer::{sign_action, SignError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to sign request: {0}")]
    Sign(#[from] SignError),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to parse API response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("API error {code}: {message} (request id {request_id})")]
    Provider {
        code: String,
        message: String,
        request_id: String,
    },
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResponseEnvelope {
    response: Value,
}

/// Creates the HTTP client shared by API calls and chunk downloads.
pub fn create_http_client() -> Result<Client, ApiError> {
    Ok(Client::builder().use_rustls_tls().build()?)
}

/// Sends signed actions and unwraps the `{"Response": ...}` envelope.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    credential: Credential,
    /// Replaces `https://<service host>/` as the request target. The signed
    /// `Host` header still names the service host.
    endpoint: Option<String>,
}

impl ApiClient {
    pub fn new(client: Client, credential: Credential) -> Self {
        Self {
            client,
            credential,
            endpoint: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    fn url<A: Action>(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://{}/", A::Service::HOST),
        }
    }

    pub async fn call<A: Action>(&self, action: &A) -> Result<A::Response, ApiError> {
        self.call_at(action, Utc::now().timestamp()).await
    }

    /// Like [`ApiClient::call`], signing with the given Unix timestamp.
    pub async fn call_at<A: Action>(
        &self,
        action: &A,
        timestamp: i64,
    ) -> Result<A::Response, ApiError> {
        let signed = sign_action(action, &self.credential, timestamp)?;
        let url = self.url::<A>();
        debug!("Calling {} at {url}", A::ACTION);

        let response = self
            .client
            .post(&url)
            .headers(signed.headers)
            .body(signed.body)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;
        if status != StatusCode::OK {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let envelope: ResponseEnvelope = serde_json::from_slice(&body)?;
        parse_response::<A>(envelope.response)
    }
}

fn parse_response<A: Action>(response: Value) -> Result<A::Response, ApiError> {
    if let Some(error) = response.get("Error") {
        let ApiErrorBody { code, message } = serde_json::from_value(error.clone())?;
        let request_id = response
            .get("RequestId")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(ApiError::Provider {
            code,
            message,
            request_id,
        });
    }
    Ok(serde_json::from_value(response)?)
}
