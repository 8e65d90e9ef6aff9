// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Export of Tencent Cloud EdgeOne Layer-7 access logs.
//!
//! One run lists the offline log chunks of a zone for a day with a signed
//! `DownloadL7Logs` call, downloads and decompresses every chunk, and writes
//! the concatenation as a single `<YYYYMMDD>-<zone>.xz` archive.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod api;
pub mod assembler;
pub mod client;
pub mod config;
pub mod error;
pub mod exporter;
pub mod fetcher;
pub mod signer;
pub mod writer;

pub use api::{Action, ChunkDescriptor, DownloadL7Logs, EdgeOne, Service};
pub use assembler::{AssembleError, LogAssembler};
pub use client::{ApiClient, ApiError};
pub use config::{Args, Config, ConfigError, Credential, CredentialPaths};
pub use error::ExportError;
pub use exporter::{run, Exporter};
pub use fetcher::{FetchError, LogFetcher};
pub use writer::{archive_filename, WriteError};
