//! The `.gitattributes` filter-directive manager: component C4.
//!
//! For every tracked path `P` this module maintains the exact line
//! `P filter=seekgits diff=seekgits` in the attribute file at the
//! repository root. Matching is by exact leading token, never by
//! substring — `"x"` must not match a line written for `"prefix/x"`.

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, instrument};

/// Name of the attribute tool, used to build the filter/diff directive.
pub const FILTER_NAME: &str = "seekgits";

#[derive(Error, Debug)]
pub enum AttributeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn directive_suffix() -> String {
    format!("filter={FILTER_NAME} diff={FILTER_NAME}")
}

/// Manages the per-path filter directives in `.gitattributes`.
pub struct AttributeManager {
    attributes_path: PathBuf,
}

impl AttributeManager {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self { attributes_path: repo_root.into().join(".gitattributes") }
    }

    fn read_lines(&self) -> Result<Vec<String>, AttributeError> {
        match fs::read_to_string(&self.attributes_path) {
            Ok(contents) => Ok(contents.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_lines(&self, lines: &[String]) -> Result<(), AttributeError> {
        if lines.is_empty() {
            if self.attributes_path.exists() {
                fs::remove_file(&self.attributes_path)?;
            }
            return Ok(());
        }
        let mut contents = lines.join("\n");
        contents.push('\n');
        fs::write(&self.attributes_path, contents)?;
        Ok(())
    }

    /// Exact-token match: does a line for exactly `path` exist?
    #[instrument(level = "debug", skip(self))]
    pub fn has_filter(&self, path: &str) -> Result<bool, AttributeError> {
        let lines = self.read_lines()?;
        Ok(lines.iter().any(|line| is_filter_line_for(line, path)))
    }

    /// Idempotently append the directive line for `path`.
    #[instrument(level = "debug", skip(self))]
    pub fn add_filter(&self, path: &str) -> Result<(), AttributeError> {
        let mut lines = self.read_lines()?;
        if lines.iter().any(|line| is_filter_line_for(line, path)) {
            return Ok(());
        }
        lines.push(format!("{path} {}", directive_suffix()));
        debug!(path, "added filter attribute");
        self.write_lines(&lines)
    }

    /// Remove the directive line for `path`, if present. Deletes the file
    /// entirely if that was its last line.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_filter(&self, path: &str) -> Result<(), AttributeError> {
        let lines = self.read_lines()?;
        let remaining: Vec<String> = lines
            .into_iter()
            .filter(|line| !is_filter_line_for(line, path))
            .collect();
        debug!(path, "removed filter attribute");
        self.write_lines(&remaining)
    }

    /// Every path with a `filter=seekgits` directive, in file order.
    pub fn list_filtered(&self) -> Result<Vec<String>, AttributeError> {
        let lines = self.read_lines()?;
        Ok(lines
            .iter()
            .filter_map(|line| {
                let mut tokens = line.split_whitespace();
                let path = tokens.next()?;
                if tokens.any(|t| t == format!("filter={FILTER_NAME}")) {
                    Some(path.to_string())
                } else {
                    None
                }
            })
            .collect())
    }
}

/// Does `line`'s first whitespace-delimited token equal `path` exactly,
/// and does the line carry our filter directive?
fn is_filter_line_for(line: &str, path: &str) -> bool {
    let mut tokens = line.split_whitespace();
    let Some(first) = tokens.next() else { return false };
    first == path && tokens.any(|t| t == format!("filter={FILTER_NAME}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn s7_exact_token_matching() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(".gitattributes"),
            "tools/link-tracker/.env filter=seekgits diff=seekgits\n",
        )
        .unwrap();
        let mgr = AttributeManager::new(dir.path());

        assert!(!mgr.has_filter(".env").unwrap());
        assert!(mgr.has_filter("tools/link-tracker/.env").unwrap());

        mgr.add_filter(".env").unwrap();
        assert!(mgr.has_filter(".env").unwrap());
        assert!(mgr.has_filter("tools/link-tracker/.env").unwrap());

        let contents = fs::read_to_string(dir.path().join(".gitattributes")).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn add_filter_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mgr = AttributeManager::new(dir.path());
        mgr.add_filter("secrets.env").unwrap();
        mgr.add_filter("secrets.env").unwrap();
        let contents = fs::read_to_string(dir.path().join(".gitattributes")).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }

    #[test]
    fn remove_filter_deletes_file_when_empty() {
        let dir = TempDir::new().unwrap();
        let mgr = AttributeManager::new(dir.path());
        mgr.add_filter("secrets.env").unwrap();
        mgr.remove_filter("secrets.env").unwrap();
        assert!(!dir.path().join(".gitattributes").exists());
    }

    #[test]
    fn remove_filter_preserves_other_lines() {
        let dir = TempDir::new().unwrap();
        let mgr = AttributeManager::new(dir.path());
        mgr.add_filter("a.env").unwrap();
        mgr.add_filter("b.env").unwrap();
        mgr.remove_filter("a.env").unwrap();

        assert!(!mgr.has_filter("a.env").unwrap());
        assert!(mgr.has_filter("b.env").unwrap());
    }

    #[test]
    fn list_filtered_returns_all_tracked_paths() {
        let dir = TempDir::new().unwrap();
        let mgr = AttributeManager::new(dir.path());
        mgr.add_filter("a.env").unwrap();
        mgr.add_filter("b.env").unwrap();
        assert_eq!(mgr.list_filtered().unwrap(), vec!["a.env", "b.env"]);
    }

    #[test]
    fn missing_attributes_file_behaves_as_empty() {
        let dir = TempDir::new().unwrap();
        let mgr = AttributeManager::new(dir.path());
        assert!(!mgr.has_filter("a.env").unwrap());
        assert!(mgr.list_filtered().unwrap().is_empty());
    }

    #[test]
    fn ignores_unrelated_attribute_lines() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitattributes"), "*.bin binary\n").unwrap();
        let mgr = AttributeManager::new(dir.path());
        assert!(!mgr.has_filter("*.bin").unwrap());
        mgr.add_filter("secret.bin").unwrap();
        let contents = fs::read_to_string(dir.path().join(".gitattributes")).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
