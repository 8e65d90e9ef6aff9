// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::assembler::AssembleError;
use crate::client::ApiError;
use crate::config::ConfigError;
use crate::fetcher::FetchError;
use crate::writer::WriteError;

/// Any failure of an export run. None of them is retried.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to set up HTTP client: {0}")]
    Client(#[from] ApiError),

    #[error("failed to list logs: {0}")]
    Fetch(#[from] FetchError),

    #[error("failed to assemble archive: {0}")]
    Assemble(#[from] AssembleError),

    #[error("failed to write archive: {0}")]
    Write(#[from] WriteError),
}
