//! Logging initialization: console output plus a per-day append log file.
//!
//! One log file is created per calendar day; runs on the same day append to
//! it. The console mirrors the same events so interactive runs read like the
//! log.

use std::{fs::OpenOptions, io, path::Path, sync::Arc};

use chrono::NaiveDate;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log file name for the given day, e.g. `coldpurge_2016-05-12.log`.
pub fn log_file_name(day: NaiveDate) -> String {
    format!("coldpurge_{}.log", day.format("%Y-%m-%d"))
}

/// Install the global tracing subscriber.
///
/// Filtering follows `RUST_LOG` when set, defaulting to `info`. The file sink
/// is opened in append mode so same-day runs accumulate in one file.
pub fn init_tracing(log_dir: &Path) -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let path = log_dir.join(log_file_name(chrono::Utc::now().date_naive()));
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let console_layer = fmt::layer().compact().with_target(false);
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(Arc::new(file));

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();
    Ok(())
}
