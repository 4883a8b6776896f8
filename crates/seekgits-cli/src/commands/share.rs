//! `seekgits share <path> <recipient>` — add-recipient (§4.6).

use anyhow::{Context, Result};
use tracing::instrument;

use seekgits_core::Lifecycle;

#[instrument(level = "info", name = "cmd::share", skip(lifecycle))]
pub fn execute(lifecycle: &Lifecycle, path: &str, recipient: &str) -> Result<()> {
    lifecycle
        .share(path, recipient)
        .with_context(|| format!("failed to share {path:?} with {recipient:?}"))?;
    println!("{path} is now readable by {recipient}.");
    Ok(())
}
