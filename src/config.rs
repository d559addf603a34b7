//! Run parameters and the hostinfo credentials file.
//!
//! The hostinfo file carries the master server URL and the basic-auth
//! credentials, one per line. Everything else arrives on the command line and
//! is folded into [`RunParameters`] before any network activity, so a failed
//! parse is reported while the run is still cheap to abort.

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

/// Accepted layout for explicit baseline dates, e.g. `05-12-2016`.
pub const BASELINE_DATE_FORMAT: &str = "%m-%d-%Y";

/// Sentinel meaning "the current date".
pub const TODAY_SENTINEL: &str = "TODAY";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read hostinfo file {1}: {0}")]
    Io(std::io::Error, PathBuf),

    #[error(
        "hostinfo file {0} is incomplete: expected base URL, username and \
         password on three lines"
    )]
    Incomplete(PathBuf),

    #[error("baseline date {0:?} is not TODAY or MM-DD-YYYY: {1}")]
    BadBaseline(String, chrono::ParseError),
}

/// Connection details for the master server, read once at startup.
#[derive(Debug, Clone)]
pub struct HostInfo {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

impl HostInfo {
    /// Load from a three-line file: base URL, username, password.
    /// Surrounding whitespace on each line is ignored.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e, path.to_path_buf()))?;
        Self::parse(&contents).ok_or_else(|| ConfigError::Incomplete(path.to_path_buf()))
    }

    fn parse(contents: &str) -> Option<Self> {
        let mut lines = contents.lines().map(str::trim);
        let base_url = lines.next().filter(|l| !l.is_empty())?;
        let username = lines.next().filter(|l| !l.is_empty())?;
        let password = lines.next().filter(|l| !l.is_empty())?;
        Some(Self {
            base_url: base_url.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

/// Baseline date argument: the `TODAY` sentinel or an explicit date.
///
/// Both forms resolve to midnight UTC of the named day, so repeated runs with
/// the same arguments compute the same target expiration. (The previous
/// generation of this tool interpreted `TODAY` in host-local time and
/// explicit dates in UTC, which made the two modes disagree about day
/// boundaries.)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Baseline {
    Today,
    Date(NaiveDate),
}

impl Baseline {
    fn resolve(self) -> NaiveDate {
        match self {
            Self::Today => Utc::now().date_naive(),
            Self::Date(date) => date,
        }
    }
}

impl FromStr for Baseline {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == TODAY_SENTINEL {
            return Ok(Self::Today);
        }
        NaiveDate::parse_from_str(s, BASELINE_DATE_FORMAT)
            .map(Self::Date)
            .map_err(|e| ConfigError::BadBaseline(s.to_string(), e))
    }
}

/// Immutable configuration for one run.
#[derive(Debug, Clone)]
pub struct RunParameters {
    /// Baseline + offset, midnight UTC. Computed exactly once and used for
    /// every comparison and every mutation payload within the run.
    pub target_expiration: DateTime<Utc>,
    /// Report candidates without issuing any update call.
    pub dry_run: bool,
    /// Select every archive, regardless of its current expiration.
    pub select_all: bool,
    /// Drop destinations whose reported cold storage size normalizes to zero.
    pub skip_zero_destinations: bool,
    /// Development cap on the total number of archives examined.
    pub archive_limit: Option<u64>,
}

impl RunParameters {
    pub fn new(
        baseline: Baseline,
        offset_days: u32,
        dry_run: bool,
        select_all: bool,
        skip_zero_destinations: bool,
        archive_limit: Option<u64>,
    ) -> Self {
        let day = baseline.resolve() + Duration::days(i64::from(offset_days));
        Self {
            target_expiration: day.and_time(NaiveTime::MIN).and_utc(),
            dry_run,
            select_all,
            skip_zero_destinations,
            archive_limit,
        }
    }

    /// Calendar date of the target expiration, used in mutation payloads.
    pub fn target_date(&self) -> NaiveDate {
        self.target_expiration.date_naive()
    }
}
