//! `seekgits status [path]` — report recipients and access, per path (§4.6).

use anyhow::{Context, Result};
use comfy_table::Table;
use tracing::instrument;

use seekgits_core::{FileStatus, Lifecycle};

fn render_row(table: &mut Table, status: &FileStatus) {
    table.add_row(vec![
        status.path.clone(),
        status.recipients.join(", "),
        yes_no(status.working_copy_present).to_string(),
        yes_no(status.current_identity_has_access).to_string(),
    ]);
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}

#[instrument(level = "debug", name = "cmd::status", skip(lifecycle))]
pub fn execute(lifecycle: &Lifecycle, path: Option<&str>) -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Path", "Recipients", "Working copy", "Readable by you"]);

    match path {
        Some(path) => {
            let status = lifecycle
                .status(path)
                .with_context(|| format!("failed to get status for {path:?}"))?;
            render_row(&mut table, &status);
        }
        None => {
            for path in lifecycle.list_tracked().context("failed to list tracked paths")? {
                let status = lifecycle.status(&path).with_context(|| format!("failed to get status for {path:?}"))?;
                render_row(&mut table, &status);
            }
        }
    }

    println!("{table}");
    Ok(())
}
