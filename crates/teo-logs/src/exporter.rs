// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::info;

use crate::assembler::LogAssembler;
use crate::client::{create_http_client, ApiClient};
use crate::config::Config;
use crate::error::ExportError;
use crate::fetcher::LogFetcher;
use crate::writer::{ensure_available, write_archive};

/// Runs list → download → compress → write for one zone, day by day.
#[derive(Debug, Clone)]
pub struct Exporter {
    fetcher: LogFetcher,
    assembler: LogAssembler,
    zone_id: String,
    output_dir: PathBuf,
}

impl Exporter {
    pub fn new(config: &Config) -> Result<Self, ExportError> {
        let http = create_http_client()?;
        let api = ApiClient::new(http.clone(), config.credential.clone());
        Ok(Self::from_parts(
            config,
            LogFetcher::new(api, config.utc_offset, config.limit),
            LogAssembler::new(http),
        ))
    }

    pub fn from_parts(config: &Config, fetcher: LogFetcher, assembler: LogAssembler) -> Self {
        Self {
            fetcher,
            assembler,
            zone_id: config.zone_id.clone(),
            output_dir: config.output_dir.clone(),
        }
    }

    /// Exports a single day and returns the path of the new archive.
    pub async fn export_day(&self, date: NaiveDate) -> Result<PathBuf, ExportError> {
        // no network traffic for a day that was already exported
        ensure_available(&self.output_dir, date, &self.zone_id)?;

        let chunks = self.fetcher.fetch(date, &self.zone_id).await?;
        info!("Downloading {} log chunks for {date}", chunks.len());
        let archive = self.assembler.assemble(chunks).await?;
        Ok(write_archive(
            &self.output_dir,
            date,
            &self.zone_id,
            &archive,
        )?)
    }

    /// Exports `dates` in order, stopping at the first failure.
    pub async fn export(&self, dates: &[NaiveDate]) -> Result<Vec<PathBuf>, ExportError> {
        let mut written = Vec::with_capacity(dates.len());
        for date in dates {
            written.push(self.export_day(*date).await?);
        }
        Ok(written)
    }
}

/// Exports every day of `config`.
pub async fn run(config: &Config) -> Result<Vec<PathBuf>, ExportError> {
    Exporter::new(config)?.export(&config.dates()).await
}
