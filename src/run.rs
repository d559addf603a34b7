//! One run of the retrieval–selection–mutation pipeline, end to end.
//!
//! All accumulators (destination list, candidate list, outcomes, counters)
//! are plain values threaded through the stages, and the fatal-vs-continue
//! decision happens at this single level: a failed GET aborts the run, a
//! failed PUT is confined to its archive.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::{
    client::{ApiClient, ClientError},
    config::{HostInfo, RunParameters},
    destinations, mutation, report, selection,
};

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Client construction or a GET failure. Reads are fatal: a partial
    /// candidate set would be incomplete and misleading.
    #[error("API read failed: {0}")]
    Read(#[from] ClientError),

    #[error("failed to write audit file {1}: {0}")]
    Report(csv::Error, PathBuf),
}

/// Counters reported at the end of a run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub destinations: usize,
    pub examined: u64,
    pub candidates: usize,
    pub changed: usize,
    pub failed: usize,
    pub malformed: u64,
    pub selected_bytes: i64,
    pub dry_run: bool,
    pub audit_path: PathBuf,
}

/// Execute one full run and write the audit table into `out_dir`.
pub async fn run(
    hostinfo: &HostInfo,
    params: &RunParameters,
    out_dir: &Path,
) -> Result<RunSummary, RunError> {
    let client = ApiClient::new(&hostinfo.base_url, &hostinfo.username, &hostinfo.password)?;

    tracing::info!(
        target_expiration = %params.target_expiration,
        dry_run = params.dry_run,
        select_all = params.select_all,
        skip_zero = params.skip_zero_destinations,
        "Starting purge date run"
    );

    let destinations = destinations::list_destinations(&client, params.skip_zero_destinations).await?;
    let selection = selection::select_candidates(&client, &destinations, params).await?;

    if !params.select_all {
        tracing::info!(
            malformed = selection.malformed,
            "Archives with a null or malformed expiration date (see log lines above for guids)"
        );
    }

    let candidate_count = selection.candidates.len();
    let outcomes = mutation::apply(
        &client,
        selection.candidates,
        params.target_expiration,
        params.dry_run,
    )
    .await;

    let audit_path = out_dir.join(report::audit_file_name(params.dry_run, Utc::now()));
    let file = std::fs::File::create(&audit_path)
        .map_err(|e| RunError::Report(csv::Error::from(e), audit_path.clone()))?;
    report::write_audit(file, &outcomes).map_err(|e| RunError::Report(e, audit_path.clone()))?;

    let changed = outcomes.iter().filter(|o| o.succeeded).count();
    Ok(RunSummary {
        destinations: destinations.len(),
        examined: selection.examined,
        candidates: candidate_count,
        changed: if params.dry_run { 0 } else { changed },
        failed: if params.dry_run { 0 } else { outcomes.len() - changed },
        malformed: selection.malformed,
        selected_bytes: selection.selected_bytes,
        dry_run: params.dry_run,
        audit_path,
    })
}
