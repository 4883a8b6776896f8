//! Optional local convenience config at `~/.config/seekgits/config.toml`.
//!
//! This file is never committed and never part of the manifest's
//! contract (`SPEC_FULL.md` §5.3) — it only overrides two knobs that
//! would otherwise default sensibly. Its absence is not an error.

use std::fs;

use serde::Deserialize;

/// Local, non-authoritative CLI preferences.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalConfig {
    /// Override the `gpg` binary to invoke instead of resolving `gpg` from `PATH`.
    pub gpg_binary: Option<String>,

    /// Default `--trust-model` value passed to `gpg --encrypt`.
    pub trust_model: Option<String>,
}

impl LocalConfig {
    /// Load `~/.config/seekgits/config.toml`, or fall back to defaults if
    /// the file is absent, unreadable, or the user has no home directory.
    pub fn load() -> Self {
        let Some(dirs) = directories::ProjectDirs::from("", "", "seekgits") else {
            return Self::default();
        };
        let path = dirs.config_dir().join("config.toml");
        let Ok(contents) = fs::read_to_string(&path) else {
            return Self::default();
        };
        toml::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed local config");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let parsed: LocalConfig = toml::from_str("").unwrap();
        assert!(parsed.gpg_binary.is_none());
        assert!(parsed.trust_model.is_none());
    }

    #[test]
    fn parses_gpg_binary_override() {
        let parsed: LocalConfig = toml::from_str(r#"gpg_binary = "/usr/bin/gpg2""#).unwrap();
        assert_eq!(parsed.gpg_binary.as_deref(), Some("/usr/bin/gpg2"));
    }
}
