//! `seekgits remove <path>` — stop-tracking (§4.6).

use anyhow::{Context, Result};
use tracing::instrument;

use seekgits_core::Lifecycle;

#[instrument(level = "info", name = "cmd::remove", skip(lifecycle))]
pub fn execute(lifecycle: &Lifecycle, path: &str) -> Result<()> {
    lifecycle
        .stop_tracking(path)
        .with_context(|| format!("failed to stop tracking {path:?}"))?;
    println!("Stopped tracking {path}. The working copy has been removed; re-checkout if needed.");
    Ok(())
}
