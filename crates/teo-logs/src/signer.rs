// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! TC3-HMAC-SHA256 request signing.
//!
//! Every call to the Tencent Cloud API is a JSON `POST /` carrying an
//! `Authorization` header derived from the payload, the target host and
//! action, and the request timestamp. The server recomputes the same value
//! and rejects the request on any mismatch, so every byte built here
//! (field order, newlines, casing) is part of the wire contract.
//!
//! ```text
//! canonical request  = POST \n / \n \n <canonical headers> \n <signed headers> \n hex(sha256(payload))
//! string to sign     = TC3-HMAC-SHA256 \n <timestamp> \n <date>/<service>/tc3_request \n hex(sha256(canonical))
//! signing key        = HMAC(HMAC(HMAC("TC3" + key, date), service), "tc3_request")
//! signature          = hex(HMAC(signing key, string to sign))
//! ```

use chrono::DateTime;
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, HOST};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::api::{Action, Service};
use crate::config::Credential;

pub const ALGORITHM: &str = "TC3-HMAC-SHA256";
pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";
pub const SIGNED_HEADERS: &str = "content-type;host;x-tc-action";
const TERMINATOR: &str = "tc3_request";

pub const X_TC_ACTION: &str = "X-TC-Action";
pub const X_TC_TIMESTAMP: &str = "X-TC-Timestamp";
pub const X_TC_VERSION: &str = "X-TC-Version";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum SignError {
    #[error("timestamp {0} is outside the representable date range")]
    Timestamp(i64),
    #[error("failed to serialize request payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("value for header {0} contains characters not allowed in HTTP headers")]
    InvalidHeader(&'static str),
}

/// Everything the signature depends on, apart from the credential.
#[derive(Debug, Clone, Copy)]
pub struct SigningInput<'a> {
    pub service: &'a str,
    pub host: &'a str,
    pub action: &'a str,
    pub version: &'a str,
    pub payload: &'a str,
    pub timestamp: i64,
}

/// A JSON body together with the headers authenticating it.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub headers: HeaderMap,
    pub body: String,
}

fn sha256_hex(data: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(data.as_ref()))
}

fn hmac_sha256(key: impl AsRef<[u8]>, data: impl AsRef<[u8]>) -> [u8; 32] {
    // HMAC accepts keys of any length, new_from_slice cannot fail here
    #[allow(clippy::expect_used)]
    let mut mac = HmacSha256::new_from_slice(key.as_ref()).expect("HMAC can take key of any size");
    mac.update(data.as_ref());
    mac.finalize().into_bytes().into()
}

/// UTC calendar date of a Unix timestamp, formatted `YYYY-MM-DD`.
pub fn utc_date(timestamp: i64) -> Result<String, SignError> {
    DateTime::from_timestamp(timestamp, 0)
        .map(|datetime| datetime.format("%Y-%m-%d").to_string())
        .ok_or(SignError::Timestamp(timestamp))
}

pub fn credential_scope(date: &str, service: &str) -> String {
    format!("{date}/{service}/{TERMINATOR}")
}

pub fn canonical_request(input: &SigningInput<'_>) -> String {
    let canonical_headers = format!(
        "content-type:{CONTENT_TYPE_JSON}\nhost:{}\nx-tc-action:{}\n",
        input.host,
        input.action.to_ascii_lowercase()
    );
    let hashed_payload = sha256_hex(input.payload);
    [
        "POST",
        "/",
        "",
        canonical_headers.as_str(),
        SIGNED_HEADERS,
        hashed_payload.as_str(),
    ]
    .join("\n")
}

pub fn string_to_sign(input: &SigningInput<'_>, scope: &str) -> String {
    let timestamp = input.timestamp.to_string();
    let hashed_canonical_request = sha256_hex(canonical_request(input));
    [
        ALGORITHM,
        timestamp.as_str(),
        scope,
        hashed_canonical_request.as_str(),
    ]
    .join("\n")
}

/// Lower-case hex signature for `input`.
pub fn signature(secret_key: &str, input: &SigningInput<'_>) -> Result<String, SignError> {
    let date = utc_date(input.timestamp)?;
    let scope = credential_scope(&date, input.service);

    let secret_date = hmac_sha256(format!("TC3{secret_key}"), &date);
    let secret_service = hmac_sha256(secret_date, input.service);
    let secret_signing = hmac_sha256(secret_service, TERMINATOR);

    Ok(hex::encode(hmac_sha256(
        secret_signing,
        string_to_sign(input, &scope),
    )))
}

/// Value of the `Authorization` header.
pub fn authorization(credential: &Credential, input: &SigningInput<'_>) -> Result<String, SignError> {
    let date = utc_date(input.timestamp)?;
    let scope = credential_scope(&date, input.service);
    let signature = signature(credential.secret_key(), input)?;
    Ok(format!(
        "{ALGORITHM} Credential={}/{scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
        credential.secret_id()
    ))
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, SignError> {
    HeaderValue::from_str(value).map_err(|_| SignError::InvalidHeader(name))
}

/// Full header set authenticating `input`.
pub fn build_headers(credential: &Credential, input: &SigningInput<'_>) -> Result<HeaderMap, SignError> {
    let authorization = authorization(credential, input)?;

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, header_value("Authorization", &authorization)?);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
    headers.insert(HOST, header_value("Host", input.host)?);
    headers.insert(
        HeaderName::from_static("x-tc-action"),
        header_value(X_TC_ACTION, input.action)?,
    );
    headers.insert(
        HeaderName::from_static("x-tc-timestamp"),
        header_value(X_TC_TIMESTAMP, &input.timestamp.to_string())?,
    );
    headers.insert(
        HeaderName::from_static("x-tc-version"),
        header_value(X_TC_VERSION, input.version)?,
    );
    Ok(headers)
}

/// Serializes `action` and signs it for its service.
pub fn sign_action<A: Action>(
    action: &A,
    credential: &Credential,
    timestamp: i64,
) -> Result<SignedRequest, SignError> {
    let body = serde_json::to_string(action)?;
    let input = SigningInput {
        service: A::Service::SERVICE,
        host: A::Service::HOST,
        action: A::ACTION,
        version: A::Service::VERSION,
        payload: &body,
        timestamp,
    };
    let headers = build_headers(credential, &input)?;
    Ok(SignedRequest { headers, body })
}
