//! Audit trail for considered archives.
//!
//! One CSV row per outcome, whether applied, failed, or only previewed. The
//! header row is always emitted so a zero-candidate run still produces a
//! valid (degenerate) table.

use std::io;

use chrono::{DateTime, Utc};

use crate::{api_types::ARCHIVE_TIME_FORMAT, mutation::MutationOutcome};

const HEADERS: [&str; 4] = [
    "Archive GUID",
    "Old Purge Date",
    "New Purge Date",
    "DestinationId",
];

/// Write the audit table for a run.
///
/// The old value is the expiration exactly as received (possibly empty); the
/// new value is always populated, in the full wire timestamp layout.
pub fn write_audit<W: io::Write>(writer: W, outcomes: &[MutationOutcome]) -> csv::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADERS)?;
    for outcome in outcomes {
        csv.write_record([
            outcome.candidate.guid.as_str(),
            outcome.candidate.original_expiration.as_str(),
            &outcome
                .applied_expiration
                .format(ARCHIVE_TIME_FORMAT)
                .to_string(),
            &outcome.candidate.destination_id.to_string(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Audit file name for one run, e.g. `results_2016-05-12_14-30-05.csv`.
///
/// Timestamped per run to avoid overwriting earlier results; dry runs carry a
/// `test_` prefix so previews are never mistaken for applied changes.
pub fn audit_file_name(dry_run: bool, now: DateTime<Utc>) -> String {
    let prefix = if dry_run { "test_" } else { "" };
    format!("{prefix}results_{}.csv", now.format("%Y-%m-%d_%H-%M-%S"))
}
