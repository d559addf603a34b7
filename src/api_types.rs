//! Wire types for the Destination and ColdStorage collection APIs.
//!
//! Responses arrive wrapped in a `data` envelope. The one deliberately odd
//! shape is `coldBytes`: PROVIDER destinations report it as a numeric string
//! while every other destination type reports a JSON number. That union is
//! decoded here and normalized to an integer in the enumerator; it never
//! travels further into the pipeline.

use serde::Deserialize;

use crate::pager::PageBody;

/// Unpaged destination collection resource.
pub const DESTINATION_PATH: &str = "/api/Destination";

/// Paged archive collection resource.
pub const COLD_STORAGE_PATH: &str = "/api/ColdStorage";

/// Wire layout of archive expiration timestamps,
/// e.g. `2016-07-01T00:00:00.000-07:00`.
pub const ARCHIVE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

/// Destination type reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DestinationKind {
    Provider,
    Cluster,
    /// Any type the API grows later; treated like a cluster for decoding.
    #[serde(other)]
    Other,
}

/// The heterogeneous `coldBytes` wire value.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ColdBytes {
    Number(f64),
    Text(String),
}

/// One destination as returned by `GET /api/Destination`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationRecord {
    pub destination_id: i64,
    pub guid: String,
    pub destination_name: String,
    #[serde(rename = "type")]
    pub kind: DestinationKind,
    /// Absent or null for destinations that have never held cold storage.
    #[serde(default)]
    pub cold_bytes: Option<ColdBytes>,
}

#[derive(Debug, Deserialize)]
pub struct DestinationResponse {
    pub data: DestinationData,
}

#[derive(Debug, Deserialize)]
pub struct DestinationData {
    pub destinations: Vec<DestinationRecord>,
}

/// One cold storage archive row as returned by `GET /api/ColdStorage`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveRecord {
    pub archive_guid: String,
    #[serde(default)]
    pub archive_bytes: i64,
    /// Verbatim expiration string. May be absent or malformed in real data;
    /// that is an expected, counted condition rather than a decode error.
    #[serde(default)]
    pub archive_hold_expire_date: String,
}

/// One page of `GET /api/ColdStorage` results.
#[derive(Debug, Deserialize)]
pub struct ColdStoragePage {
    pub data: ColdStorageData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColdStorageData {
    pub cold_storage_rows: Vec<ArchiveRecord>,
}

impl PageBody for ColdStoragePage {
    type Item = ArchiveRecord;

    fn into_items(self) -> Vec<ArchiveRecord> {
        self.data.cold_storage_rows
    }
}
