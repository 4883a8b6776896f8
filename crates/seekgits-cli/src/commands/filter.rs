//! `seekgits filter encrypt|decrypt <path> [tmpfile]` — the clean/smudge/
//! textconv entry points the host VCS shells out to (component C5).
//!
//! Per `spec.md` §4.5, stdout carries only the transformed bytes and
//! diagnostics go to stderr; these commands always exit 0 on the
//! pass-through and placeholder paths — the only thing that can fail
//! outright is being unable to write to stdout at all.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{instrument, warn};

use seekgits_core::config::ConfigStore;
use seekgits_core::filter::{self, CleanOutcome, RevealOutcome};

fn read_input(path_arg: Option<&Path>) -> Result<Vec<u8>> {
    match path_arg {
        Some(tmpfile) => {
            fs::read(tmpfile).with_context(|| format!("failed to read {}", tmpfile.display()))
        }
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf).context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

/// `filter encrypt <path> [tmpfile]` — clean.
#[instrument(level = "debug", name = "cmd::filter::encrypt", skip(config), fields(path))]
pub fn encrypt(config: &ConfigStore, path: &str, tmpfile: Option<&Path>) -> Result<()> {
    let input = read_input(tmpfile)?;
    let (output, outcome) = filter::clean(config, path, &input);

    if matches!(outcome, CleanOutcome::PassthroughNoAccess) {
        warn!(path, "could not obtain a file key; committing plaintext unchanged");
    }

    io::stdout().write_all(&output).context("failed to write filtered output to stdout")?;
    Ok(())
}

/// `filter decrypt <path> [tmpfile]` — smudge and textconv share this transform.
#[instrument(level = "debug", name = "cmd::filter::decrypt", skip(config), fields(path))]
pub fn decrypt(config: &ConfigStore, path: &str, tmpfile: Option<&Path>) -> Result<()> {
    let input = read_input(tmpfile)?;
    let (output, outcome) = filter::reveal(config, path, &input);

    if matches!(outcome, RevealOutcome::Placeholder) {
        warn!(path, "could not decrypt file; emitting placeholder");
    }

    io::stdout().write_all(&output).context("failed to write filtered output to stdout")?;
    Ok(())
}
