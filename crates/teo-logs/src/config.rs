// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use chrono::{FixedOffset, NaiveDate, TimeDelta};
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Page size requested from `DownloadL7Logs`. Only the first page is read.
pub const DEFAULT_LIMIT: u32 = 300;
/// Offset, in hours east of UTC, of the day boundaries sent to the API.
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 8;
/// Days subtracted from today when no date is given; logs lag behind by about a day.
pub const DEFAULT_DAYS_AGO: i64 = 2;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is empty", .0.display())]
    Empty(PathBuf),
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("invalid UTC offset: {0} hours")]
    InvalidOffset(i32),
    #[error("end date {end} must be after start date {start}")]
    EmptyRange { start: NaiveDate, end: NaiveDate },
}

/// Tencent Cloud access key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    secret_id: String,
    secret_key: String,
}

impl Credential {
    pub fn new(secret_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            secret_id: secret_id.into(),
            secret_key: secret_key.into(),
        }
    }

    pub fn secret_id(&self) -> &str {
        &self.secret_id
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Locations of the three flat files holding the credential and zone.
#[derive(Debug, Clone)]
pub struct CredentialPaths {
    pub secret_id: PathBuf,
    pub secret_key: PathBuf,
    pub zone_id: PathBuf,
}

impl Default for CredentialPaths {
    fn default() -> Self {
        Self {
            secret_id: PathBuf::from("sid"),
            secret_key: PathBuf::from("sk"),
            zone_id: PathBuf::from("zid"),
        }
    }
}

/// Everything one export run needs, assembled once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub credential: Credential,
    pub zone_id: String,
    /// First (or only) day to export.
    pub date: NaiveDate,
    /// Exclusive end of a multi-day export.
    pub end_date: Option<NaiveDate>,
    pub utc_offset: FixedOffset,
    pub limit: u32,
    pub output_dir: PathBuf,
}

/// Raw command line values, before validation.
#[derive(Debug, Clone, Default)]
pub struct Args {
    pub date: Option<String>,
    pub end_date: Option<String>,
    pub utc_offset_hours: Option<i32>,
    pub output_dir: Option<PathBuf>,
}

impl Config {
    #[allow(clippy::unwrap_used)]
    pub fn new(credential: Credential, zone_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            credential,
            zone_id: zone_id.into(),
            date,
            end_date: None,
            utc_offset: parse_utc_offset(DEFAULT_UTC_OFFSET_HOURS).unwrap(),
            limit: DEFAULT_LIMIT,
            output_dir: PathBuf::from("."),
        }
    }

    /// Reads the credential files and resolves the dates relative to `today`.
    pub fn load(paths: &CredentialPaths, args: &Args, today: NaiveDate) -> Result<Self, ConfigError> {
        let secret_id = read_value(&paths.secret_id)?;
        let secret_key = read_value(&paths.secret_key)?;
        let zone_id = read_value(&paths.zone_id)?;

        let date = match args.date.as_deref() {
            Some(date) => parse_date(date)?,
            None => default_date(today),
        };
        let end_date = args.end_date.as_deref().map(parse_date).transpose()?;
        if let Some(end) = end_date {
            if end <= date {
                return Err(ConfigError::EmptyRange { start: date, end });
            }
        }

        let mut config = Config::new(Credential::new(secret_id, secret_key), zone_id, date);
        config.end_date = end_date;
        if let Some(hours) = args.utc_offset_hours {
            config.utc_offset = parse_utc_offset(hours)?;
        }
        if let Some(output_dir) = &args.output_dir {
            config.output_dir.clone_from(output_dir);
        }
        Ok(config)
    }

    /// Days to export, in ascending order. Never empty.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates = vec![self.date];
        if let Some(end) = self.end_date {
            let mut date = self.date;
            while let Some(next) = date.checked_add_signed(TimeDelta::days(1)) {
                if next >= end {
                    break;
                }
                dates.push(next);
                date = next;
            }
        }
        dates
    }
}

/// Contents of `path` with trailing whitespace and newlines removed.
fn read_value(path: &Path) -> Result<String, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value = raw.trim_end();
    if value.is_empty() {
        return Err(ConfigError::Empty(path.to_path_buf()));
    }
    Ok(value.to_string())
}

pub fn parse_date(date: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
        .map_err(|_| ConfigError::InvalidDate(date.to_string()))
}

pub fn default_date(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_signed(TimeDelta::days(DEFAULT_DAYS_AGO))
        .unwrap_or(today)
}

pub fn parse_utc_offset(hours: i32) -> Result<FixedOffset, ConfigError> {
    hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .ok_or(ConfigError::InvalidOffset(hours))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    fn paths(dir: &TempDir) -> CredentialPaths {
        CredentialPaths {
            secret_id: write(dir, "sid", "AKIDexample\n"),
            secret_key: write(dir, "sk", "secretexample\r\n"),
            zone_id: write(dir, "zid", "zone-abc"),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 3).unwrap()
    }

    #[test]
    fn test_load_defaults_to_two_days_ago() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(&paths(&dir), &Args::default(), today()).unwrap();

        assert_eq!(config.credential.secret_id(), "AKIDexample");
        assert_eq!(config.credential.secret_key(), "secretexample");
        assert_eq!(config.zone_id, "zone-abc");
        assert_eq!(config.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(config.end_date, None);
        assert_eq!(config.utc_offset.local_minus_utc(), 8 * 3600);
        assert_eq!(config.limit, 300);
        assert_eq!(config.output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_load_with_explicit_arguments() {
        let dir = TempDir::new().unwrap();
        let args = Args {
            date: Some("2024-02-27".to_string()),
            end_date: Some("2024-03-01".to_string()),
            utc_offset_hours: Some(0),
            output_dir: Some(dir.path().to_path_buf()),
        };
        let config = Config::load(&paths(&dir), &args, today()).unwrap();

        assert_eq!(config.date, NaiveDate::from_ymd_opt(2024, 2, 27).unwrap());
        assert_eq!(config.utc_offset.local_minus_utc(), 0);
        assert_eq!(config.output_dir, dir.path());
        assert_eq!(
            config.dates(),
            vec![
                NaiveDate::from_ymd_opt(2024, 2, 27).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 28).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            ]
        );
    }

    #[test]
    fn test_single_day_when_no_end_date() {
        let config = Config::new(Credential::new("id", "key"), "zone", today());
        assert_eq!(config.dates(), vec![today()]);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut paths = paths(&dir);
        paths.secret_key = dir.path().join("does-not-exist");
        let err = Config::load(&paths, &Args::default(), today()).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("does-not-exist"));
    }

    #[test]
    fn test_empty_file() {
        let dir = TempDir::new().unwrap();
        let mut paths = paths(&dir);
        paths.zone_id = write(&dir, "zid", "\n");
        let err = Config::load(&paths, &Args::default(), today()).unwrap_err();
        assert!(matches!(err, ConfigError::Empty(_)));
    }

    #[test]
    fn test_invalid_dates() {
        assert!(matches!(
            parse_date("20240301"),
            Err(ConfigError::InvalidDate(_))
        ));
        assert!(matches!(
            parse_date("2024-02-30"),
            Err(ConfigError::InvalidDate(_))
        ));
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn test_end_date_must_follow_start() {
        let dir = TempDir::new().unwrap();
        let args = Args {
            date: Some("2024-03-01".to_string()),
            end_date: Some("2024-03-01".to_string()),
            ..Default::default()
        };
        let err = Config::load(&paths(&dir), &args, today()).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyRange { .. }));
    }

    #[test]
    fn test_default_date_crosses_month() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            default_date(today),
            NaiveDate::from_ymd_opt(2024, 2, 28).unwrap()
        );
    }

    #[test]
    fn test_utc_offset_bounds() {
        assert_eq!(parse_utc_offset(-5).unwrap().local_minus_utc(), -5 * 3600);
        assert!(matches!(
            parse_utc_offset(24),
            Err(ConfigError::InvalidOffset(24))
        ));
    }

    #[test]
    fn test_debug_redacts_secret_key() {
        let credential = Credential::new("AKIDexample", "secretexample");
        let debug = format!("{credential:?}");
        assert!(debug.contains("AKIDexample"));
        assert!(!debug.contains("secretexample"));
    }
}
