// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use chrono::{FixedOffset, NaiveDate};
use thiserror::Error;
use tracing::{debug, info};

use crate::api::{ChunkDescriptor, DownloadL7Logs, DownloadL7LogsResponse};
use crate::client::{ApiClient, ApiError};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Only the first page is read. A full page may hide further chunks, so
    /// it is refused rather than archived incomplete.
    #[error("{total_count} log chunks reported, page limit is {limit}; refusing to archive a possibly truncated list")]
    PageLimitExceeded { total_count: u32, limit: u32 },
}

/// Lists the log chunks of one day for one zone.
#[derive(Debug, Clone)]
pub struct LogFetcher {
    client: ApiClient,
    utc_offset: FixedOffset,
    limit: u32,
}

impl LogFetcher {
    pub fn new(client: ApiClient, utc_offset: FixedOffset, limit: u32) -> Self {
        Self {
            client,
            utc_offset,
            limit,
        }
    }

    pub fn query(&self, date: NaiveDate, zone_id: &str) -> DownloadL7Logs {
        DownloadL7Logs::for_day(date, &self.utc_offset, zone_id, self.limit)
    }

    /// Chunk descriptors in the order the API returned them.
    pub async fn fetch(&self, date: NaiveDate, zone_id: &str) -> Result<Vec<ChunkDescriptor>, FetchError> {
        let query = self.query(date, zone_id);
        debug!(
            "Requesting logs for zone {zone_id} from {} to {}",
            query.start_time, query.end_time
        );
        let response = self.client.call(&query).await?;
        self.check(response)
    }

    fn check(&self, response: DownloadL7LogsResponse) -> Result<Vec<ChunkDescriptor>, FetchError> {
        if response.total_count >= self.limit {
            return Err(FetchError::PageLimitExceeded {
                total_count: response.total_count,
                limit: self.limit,
            });
        }
        info!(
            "API listed {} log chunks (request id {})",
            response.total_count,
            response.request_id.as_deref().unwrap_or("-")
        );
        Ok(response.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credential;
    use serde_json::json;

    fn fetcher(limit: u32) -> LogFetcher {
        let client = ApiClient::new(reqwest::Client::new(), Credential::new("id", "key"));
        LogFetcher::new(client, FixedOffset::east_opt(8 * 3600).unwrap(), limit)
    }

    fn response(total_count: u32) -> DownloadL7LogsResponse {
        serde_json::from_value(json!({
            "TotalCount": total_count,
            "Data": [{"Url": "https://logs/a.gz"}],
            "RequestId": "req"
        }))
        .unwrap()
    }

    #[test]
    fn test_total_count_equal_to_limit_fails() {
        let err = fetcher(300).check(response(300)).unwrap_err();
        assert!(matches!(
            err,
            FetchError::PageLimitExceeded {
                total_count: 300,
                limit: 300
            }
        ));
    }

    #[test]
    fn test_total_count_below_limit_passes() {
        let data = fetcher(300).check(response(299)).unwrap();
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn test_query_shape() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let query = fetcher(300).query(date, "zone-abc");
        assert_eq!(query.start_time, "2024-03-01T00:00:00+08:00");
        assert_eq!(query.end_time, "2024-03-01T23:59:00+08:00");
        assert_eq!(query.zone_ids, vec!["zone-abc".to_string()]);
        assert!(query.domains.is_empty());
        assert_eq!(query.limit, 300);
        assert_eq!(query.offset, 0);
    }
}
