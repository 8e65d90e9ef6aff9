// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Helpers shared by the integration tests

use chrono::NaiveDate;
use flate2::{write::GzEncoder, Compression};
use serde_json::{json, Value};
use std::io::{Read, Write};
use std::path::Path;
use teo_logs::{ApiClient, Config, Credential, Exporter, LogAssembler, LogFetcher};
use xz2::read::XzDecoder;

pub const ZONE_ID: &str = "zone-abc";

pub fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date")
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("gzip write");
    encoder.finish().expect("gzip finish")
}

pub fn unxz(data: &[u8]) -> String {
    let mut decompressed = String::new();
    XzDecoder::new(data)
        .read_to_string(&mut decompressed)
        .expect("valid xz archive");
    decompressed
}

/// `DownloadL7Logs` response body listing one chunk per url.
pub fn list_response(total_count: u32, urls: &[String]) -> String {
    let data: Vec<Value> = urls
        .iter()
        .enumerate()
        .map(|(i, url)| {
            json!({
                "Domain": "www.example.com",
                "Area": "mainland",
                "LogPacketName": format!("chunk-{i}"),
                "Url": url,
                "LogTime": 1709222400 + i as u64 * 3600,
                "LogStartTime": "2024-03-01T00:00:00+08:00",
                "LogEndTime": "2024-03-01T01:00:00+08:00",
                "Size": 100 + i
            })
        })
        .collect();
    json!({
        "Response": {
            "TotalCount": total_count,
            "Data": data,
            "RequestId": "6a2f8e4c-0000-4000-8000-000000000000"
        }
    })
    .to_string()
}

pub fn config(output_dir: &Path) -> Config {
    let mut config = Config::new(
        Credential::new("AKIDexample", "secretexample"),
        ZONE_ID,
        date(),
    );
    config.output_dir = output_dir.to_path_buf();
    config
}

/// Exporter talking to `server_url` instead of the real API host.
pub fn exporter(config: &Config, server_url: &str) -> Exporter {
    let http = reqwest::Client::new();
    let api = ApiClient::new(http.clone(), config.credential.clone())
        .with_endpoint(format!("{server_url}/"));
    Exporter::from_parts(
        config,
        LogFetcher::new(api, config.utc_offset, config.limit),
        LogAssembler::new(http).with_preset(6),
    )
}
