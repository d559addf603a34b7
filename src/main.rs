//! coldpurge: reschedule the purge date of cold storage archives.
//!
//! Pages every destination's cold storage archives out of the master server,
//! selects the ones whose expiration falls strictly after baseline + offset,
//! and rewrites their purge date with per-archive success tracking. Each run
//! appends to a per-day log file and writes a timestamped CSV audit table;
//! dry runs produce the same audit with a `test_` prefix and touch nothing.
//!
//! Credentials come from a three-line `hostinfo.conf`: base URL, username,
//! password.

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;

mod api_types;
mod client;
mod config;
mod destinations;
mod mutation;
mod observability;
mod pager;
mod report;
mod run;
mod selection;

#[cfg(test)]
mod tests;

use config::{Baseline, HostInfo, RunParameters};

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Set the purge date of archives in cold storage",
    long_about = None
)]
struct Args {
    /// Baseline date for the new purge date: TODAY or MM-DD-YYYY (UTC).
    #[arg(short, long, default_value = "TODAY")]
    baseline: Baseline,

    /// Number of days after the baseline date to set the purge date to.
    #[arg(short = 'd', long = "days", default_value_t = 0)]
    days: u32,

    /// Report what would change without issuing any update call.
    #[arg(short = 't', long = "dry-run")]
    dry_run: bool,

    /// Change every archive in cold storage, not only those expiring after
    /// baseline + days.
    #[arg(short = 'a', long = "all")]
    all: bool,

    /// Skip destinations that report zero bytes in cold storage. Reported
    /// sizes are occasionally wrong, so this is off by default.
    #[arg(short = 's', long = "skip-zero")]
    skip_zero: bool,

    /// Stop after examining this many archives (for development runs).
    #[arg(long)]
    limit: Option<u64>,

    /// Path to the hostinfo file: base URL, username, password, one per line.
    #[arg(long, default_value = "hostinfo.conf")]
    hostinfo: PathBuf,

    /// Directory for the per-day log file.
    #[arg(long, default_value = ".")]
    log_dir: PathBuf,

    /// Directory for the audit CSV.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(err) = observability::init_tracing(&args.log_dir) {
        eprintln!("can't open log file in {}: {err}", args.log_dir.display());
        return ExitCode::FAILURE;
    }

    tracing::info!(
        baseline = ?args.baseline,
        days = args.days,
        dry_run = args.dry_run,
        all = args.all,
        skip_zero = args.skip_zero,
        limit = args.limit,
        "Parsed command line arguments"
    );

    let hostinfo = match HostInfo::from_file(&args.hostinfo) {
        Ok(hostinfo) => hostinfo,
        Err(err) => {
            tracing::error!(error = %err, "Can't load host configuration, quitting");
            return ExitCode::FAILURE;
        }
    };

    let params = RunParameters::new(
        args.baseline,
        args.days,
        args.dry_run,
        args.all,
        args.skip_zero,
        args.limit,
    );
    tracing::info!(
        host = %hostinfo.base_url,
        new_purge_date = %params.target_date(),
        "Connecting to host"
    );

    match run::run(&hostinfo, &params, &args.out_dir).await {
        Ok(summary) => {
            if summary.dry_run {
                tracing::info!(
                    would_change = summary.candidates,
                    selected_bytes = summary.selected_bytes,
                    "This was only a test, no purge dates were changed"
                );
            } else {
                tracing::info!(
                    changed = summary.changed,
                    failed = summary.failed,
                    selected_bytes = summary.selected_bytes,
                    "Total purge dates changed"
                );
            }
            tracing::info!(audit = %summary.audit_path.display(), "Done");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "Run aborted");
            ExitCode::FAILURE
        }
    }
}
