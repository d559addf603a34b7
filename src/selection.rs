//! Candidate selection: which archives get their purge date pulled earlier.
//!
//! The rule is "pull purge dates earlier only": an archive is a candidate iff
//! its current expiration is strictly later than the computed target. Equal
//! timestamps are left untouched. Archives with a missing or malformed
//! expiration are skipped and counted, never defaulted.

use chrono::{DateTime, Utc};

use crate::{
    api_types::{ARCHIVE_TIME_FORMAT, ArchiveRecord, COLD_STORAGE_PATH, ColdStoragePage},
    client::{ApiClient, ClientError},
    config::RunParameters,
    destinations::Destination,
    pager::Pager,
};

/// An archive selected for expiration-date mutation. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub guid: String,
    /// Expiration exactly as received from the API, possibly empty.
    pub original_expiration: String,
    pub destination_id: i64,
}

/// Outcome of a selection pass across all destinations.
#[derive(Debug, Default)]
pub struct Selection {
    /// Candidates in discovery order: by destination, then page, then row.
    pub candidates: Vec<Candidate>,
    /// Archives skipped for a missing or malformed expiration (or a missing
    /// guid, which makes them unaddressable).
    pub malformed: u64,
    /// Total archives examined across all destinations.
    pub examined: u64,
    /// Total bytes held by the selected candidates.
    pub selected_bytes: i64,
}

/// Page through every destination's archives and collect the candidates.
///
/// A GET failure anywhere aborts selection: a partial candidate set would be
/// misleading. The optional archive limit caps total items examined (not
/// pages) to bound development runs.
pub async fn select_candidates(
    client: &ApiClient,
    destinations: &[Destination],
    params: &RunParameters,
) -> Result<Selection, ClientError> {
    let mut selection = Selection::default();

    'all: for destination in destinations {
        tracing::info!(
            destination_id = destination.id,
            guid = %destination.guid,
            name = %destination.name,
            kind = ?destination.kind,
            cold_bytes = destination.cold_bytes,
            "Retrieving cold storage archives"
        );
        let found_before = selection.candidates.len();

        let mut pager: Pager<'_, ColdStoragePage> = Pager::new(
            client,
            COLD_STORAGE_PATH,
            vec![("destinationId", destination.id.to_string())],
        );
        while let Some(rows) = pager.next().await? {
            for row in rows {
                if params
                    .archive_limit
                    .is_some_and(|limit| selection.examined >= limit)
                {
                    tracing::warn!(
                        limit = params.archive_limit,
                        "Archive limit reached, stopping scan early"
                    );
                    break 'all;
                }
                selection.examined += 1;
                consider(
                    &mut selection,
                    destination.id,
                    row,
                    params.target_expiration,
                    params.select_all,
                );
            }
        }

        tracing::info!(
            destination_id = destination.id,
            candidates = selection.candidates.len() - found_before,
            "Destination scan complete"
        );
    }

    Ok(selection)
}

/// Apply the selection rule to one archive row.
fn consider(
    selection: &mut Selection,
    destination_id: i64,
    row: ArchiveRecord,
    target: DateTime<Utc>,
    select_all: bool,
) {
    if row.archive_guid.is_empty() {
        // Unaddressable: there is nothing to PUT against.
        tracing::warn!(destination_id, "Archive row has no guid, skipping");
        selection.malformed += 1;
        return;
    }

    if select_all {
        selection.selected_bytes += row.archive_bytes;
        selection.candidates.push(Candidate {
            guid: row.archive_guid,
            original_expiration: row.archive_hold_expire_date,
            destination_id,
        });
        return;
    }

    match DateTime::parse_from_str(&row.archive_hold_expire_date, ARCHIVE_TIME_FORMAT) {
        Ok(expires) => {
            if expires > target {
                selection.selected_bytes += row.archive_bytes;
                selection.candidates.push(Candidate {
                    guid: row.archive_guid,
                    original_expiration: row.archive_hold_expire_date,
                    destination_id,
                });
            }
        }
        Err(err) => {
            tracing::warn!(
                guid = %row.archive_guid,
                error = %err,
                "Archive has a null or malformed expiration date, skipping"
            );
            selection.malformed += 1;
        }
    }
}
