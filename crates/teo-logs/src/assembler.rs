// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Turns a list of chunk descriptors into one xz archive.
//!
//! The decompressed archive is a plain concatenation of blocks, one per
//! chunk, in the order the chunks were listed:
//!
//! ```text
//! {"Domain":"...","LogTime":...,"Size":...,"DecompressedSize":N}\n
//! <N bytes of log text>
//! ```
//!
//! Blocks carry no separator beyond what the log text itself ends with, so
//! `DecompressedSize` is what lets a reader split the stream again.

use flate2::read::MultiGzDecoder;
use reqwest::{Client, Url};
use std::io::{self, Read, Write};
use std::string::FromUtf8Error;
use thiserror::Error;
use tracing::{debug, info};
use xz2::stream::{Check, Stream};
use xz2::write::XzEncoder;

use crate::api::ChunkDescriptor;

/// `LZMA_PRESET_EXTREME` from liblzma.
const LZMA_PRESET_EXTREME: u32 = 0x8000_0000;
/// Highest xz level in extreme mode (`xz -9e`).
pub const XZ_PRESET: u32 = 9 | LZMA_PRESET_EXTREME;

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("log chunk #{0} has no Url")]
    MissingUrl(usize),
    #[error("failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("downloading {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("failed to decompress {url}: {source}")]
    Decompress {
        url: String,
        #[source]
        source: io::Error,
    },
    #[error("{url} is not valid UTF-8: {source}")]
    Utf8 {
        url: String,
        #[source]
        source: FromUtf8Error,
    },
    #[error("failed to serialize chunk metadata: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("failed to set up xz encoder: {0}")]
    Encoder(#[from] xz2::stream::Error),
    #[error("failed to compress archive: {0}")]
    Compress(#[source] io::Error),
}

/// The download link without its signature query, safe to log.
pub fn redact_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.into()
        }
        Err(_) => "<invalid url>".to_string(),
    }
}

/// Decompresses a gzip body. Concatenated gzip members are read as one stream.
pub fn decompress_gzip(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = MultiGzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;
    Ok(decompressed)
}

pub fn compress_xz(data: &[u8], preset: u32) -> Result<Vec<u8>, AssembleError> {
    let stream = Stream::new_easy_encoder(preset, Check::Crc64)?;
    let mut encoder = XzEncoder::new_stream(Vec::with_capacity(data.len() / 8), stream);
    encoder.write_all(data).map_err(AssembleError::Compress)?;
    encoder.finish().map_err(AssembleError::Compress)
}

/// Decodes one downloaded chunk and appends its block to `archive`.
///
/// Returns the metadata written in front of the log text.
pub fn append_chunk(
    archive: &mut Vec<u8>,
    descriptor: ChunkDescriptor,
    gzipped: &[u8],
) -> Result<ChunkDescriptor, AssembleError> {
    let url = descriptor.url().map(redact_url).unwrap_or_default();
    let decompressed = decompress_gzip(gzipped).map_err(|source| AssembleError::Decompress {
        url: url.clone(),
        source,
    })?;
    let text = String::from_utf8(decompressed).map_err(|source| AssembleError::Utf8 { url, source })?;

    let metadata = descriptor.into_metadata(text.len() as u64);
    serde_json::to_writer(&mut *archive, &metadata)?;
    archive.push(b'\n');
    archive.extend_from_slice(text.as_bytes());
    Ok(metadata)
}

/// Downloads chunks one after another and builds the compressed archive.
#[derive(Debug, Clone)]
pub struct LogAssembler {
    client: Client,
    preset: u32,
}

impl LogAssembler {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            preset: XZ_PRESET,
        }
    }

    pub fn with_preset(mut self, preset: u32) -> Self {
        self.preset = preset;
        self
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, AssembleError> {
        let download_error = |source| AssembleError::Download {
            url: redact_url(url),
            source,
        };
        let response = self.client.get(url).send().await.map_err(download_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(AssembleError::Status {
                url: redact_url(url),
                status: status.as_u16(),
            });
        }
        let body = response.bytes().await.map_err(download_error)?;
        Ok(body.to_vec())
    }

    /// Uncompressed archive contents, chunks kept in input order.
    pub async fn concatenate(&self, chunks: Vec<ChunkDescriptor>) -> Result<Vec<u8>, AssembleError> {
        let total = chunks.len();
        let mut archive = Vec::new();
        for (index, chunk) in chunks.into_iter().enumerate() {
            let url = chunk
                .url()
                .ok_or(AssembleError::MissingUrl(index))?
                .to_string();
            debug!("Downloading chunk {}/{total}: {}", index + 1, redact_url(&url));
            let gzipped = self.download(&url).await?;
            let metadata = append_chunk(&mut archive, chunk, &gzipped)?;
            info!("{}", serde_json::to_string(&metadata)?);
        }
        Ok(archive)
    }

    pub async fn assemble(&self, chunks: Vec<ChunkDescriptor>) -> Result<Vec<u8>, AssembleError> {
        let archive = self.concatenate(chunks).await?;
        debug!("Compressing {} bytes", archive.len());
        compress_xz(&archive, self.preset)
    }
}
