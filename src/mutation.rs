//! Applies the new purge date to selected archives.
//!
//! Mutations are fail-soft: one failed PUT is logged with the archive's guid
//! and the batch continues. The failed candidate still appears in the audit
//! trail carrying its attempted (not confirmed) new value.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::{api_types::COLD_STORAGE_PATH, client::ApiClient, selection::Candidate};

/// Date-only layout for the PUT payload; the server resolves the time of day.
const PAYLOAD_DATE_FORMAT: &str = "%Y-%m-%d";

/// Result of one attempted (or previewed) purge-date change.
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    pub candidate: Candidate,
    pub succeeded: bool,
    /// The expiration this run applied (or would apply, in dry-run).
    pub applied_expiration: DateTime<Utc>,
}

/// Apply the target expiration to every candidate, in discovery order.
///
/// In dry-run mode no network call is made and every outcome reports success,
/// so the preview audit matches what a live run would attempt.
pub async fn apply(
    client: &ApiClient,
    candidates: Vec<Candidate>,
    target_expiration: DateTime<Utc>,
    dry_run: bool,
) -> Vec<MutationOutcome> {
    if dry_run {
        return candidates
            .into_iter()
            .map(|candidate| MutationOutcome {
                candidate,
                succeeded: true,
                applied_expiration: target_expiration,
            })
            .collect();
    }

    let body = json!({
        "archiveHoldExpireDate":
            target_expiration.format(PAYLOAD_DATE_FORMAT).to_string(),
    });

    tracing::info!(
        count = candidates.len(),
        "Starting to change archive expiration dates"
    );

    let mut outcomes = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let path = format!("{COLD_STORAGE_PATH}/{}", candidate.guid);
        let succeeded = match client
            .put_json(&path, &[("idType", "guid".to_string())], &body)
            .await
        {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(
                    guid = %candidate.guid,
                    error = %err,
                    "Could not change purge date for archive"
                );
                false
            }
        };
        outcomes.push(MutationOutcome {
            candidate,
            succeeded,
            applied_expiration: target_expiration,
        });
    }
    outcomes
}
