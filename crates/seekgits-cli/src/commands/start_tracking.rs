//! `seekgits encrypt <path>` — begin tracking a path (start-tracking, §4.6).

use anyhow::{Context, Result};
use tracing::instrument;

use seekgits_core::Lifecycle;

#[instrument(level = "info", name = "cmd::encrypt", skip(lifecycle))]
pub fn execute(lifecycle: &Lifecycle, path: &str, recipient: Option<&str>) -> Result<()> {
    lifecycle
        .start_tracking(path, recipient)
        .with_context(|| format!("failed to start tracking {path:?}"))?;
    println!("Now tracking {path} (encrypted on commit).");
    Ok(())
}
