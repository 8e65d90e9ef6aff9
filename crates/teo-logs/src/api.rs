// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Typed descriptions of Tencent Cloud API services and actions.

use chrono::{FixedOffset, NaiveDate, TimeZone};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

/// A Tencent Cloud API family, identified by its signing service name.
pub trait Service {
    const SERVICE: &'static str;
    const HOST: &'static str;
    const VERSION: &'static str;
}

/// A single API action. The implementing type is the JSON request body.
pub trait Action: Serialize {
    type Service: Service;
    type Response: DeserializeOwned;
    const ACTION: &'static str;
}

/// Tencent Cloud EdgeOne.
#[derive(Debug, Clone, Copy)]
pub struct EdgeOne;

impl Service for EdgeOne {
    const SERVICE: &'static str = "teo";
    const HOST: &'static str = "teo.tencentcloudapi.com";
    const VERSION: &'static str = "2022-09-01";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DownloadL7Logs {
    pub start_time: String,
    pub end_time: String,
    pub zone_ids: Vec<String>,
    pub domains: Vec<String>,
    pub limit: u32,
    pub offset: u32,
}

impl Action for DownloadL7Logs {
    type Service = EdgeOne;
    type Response = DownloadL7LogsResponse;
    const ACTION: &'static str = "DownloadL7Logs";
}

fn iso8601(date: NaiveDate, offset: &FixedOffset, hour: u32, min: u32) -> String {
    date.and_hms_opt(hour, min, 0)
        .and_then(|naive| offset.from_local_datetime(&naive).single())
        .map(|datetime| datetime.format("%Y-%m-%dT%H:%M:%S%:z").to_string())
        // fixed offsets have no gaps or folds, kept for completeness only
        .unwrap_or_else(|| format!("{}T{hour:02}:{min:02}:00{offset}", date.format("%Y-%m-%d")))
}

impl DownloadL7Logs {
    /// Query covering `00:00:00` to `23:59:00` of `date` in `offset`, first page only.
    pub fn for_day(date: NaiveDate, offset: &FixedOffset, zone_id: &str, limit: u32) -> Self {
        Self {
            start_time: iso8601(date, offset, 0, 0),
            end_time: iso8601(date, offset, 23, 59),
            zone_ids: vec![zone_id.to_string()],
            domains: Vec::new(),
            limit,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DownloadL7LogsResponse {
    pub total_count: u32,
    #[serde(default)]
    pub data: Vec<ChunkDescriptor>,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// Error body the API returns (with HTTP 200) in place of a result.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

/// One downloadable log file, as listed by `DownloadL7Logs`.
///
/// Kept as a raw JSON object so fields the provider adds later are carried
/// into the archive unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkDescriptor(Map<String, Value>);

pub const URL_FIELD: &str = "Url";
pub const DECOMPRESSED_SIZE_FIELD: &str = "DecompressedSize";

impl ChunkDescriptor {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Signed, time-limited download link.
    pub fn url(&self) -> Option<&str> {
        self.0.get(URL_FIELD).and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Drops the download link and records the decompressed size, turning the
    /// descriptor into the metadata stored in front of the log text.
    pub fn into_metadata(mut self, decompressed_size: u64) -> Self {
        self.0
            .insert(DECOMPRESSED_SIZE_FIELD.to_string(), Value::from(decompressed_size));
        self.0.shift_remove(URL_FIELD);
        self
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}
