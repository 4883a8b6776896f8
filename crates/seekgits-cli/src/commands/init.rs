//! `seekgits init` — register the git filter driver and create the manifest.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::instrument;

use seekgits_core::Lifecycle;

#[instrument(level = "info", name = "cmd::init", skip(lifecycle))]
pub fn execute(lifecycle: &Lifecycle, binary_path: &Path) -> Result<()> {
    lifecycle
        .init(binary_path)
        .context("failed to initialize seekgits in this repository")?;
    println!("Initialized seekgits. Tracked files will be encrypted on `git add`.");
    Ok(())
}
