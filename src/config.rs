use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

use crate::filters::ActionFilters;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Directory holding the JSON store. Supports a leading `~/`.
    pub data_dir: String,
    pub undo_manager: UndoManagerConfig,
    /// Initial filters for the history panel.
    pub filters: ActionFilters,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: "~/.local/share/tilemark".to_string(),
            undo_manager: UndoManagerConfig::default(),
            filters: ActionFilters::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Undo manager
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct UndoManagerConfig {
    /// Master switch. When off, mutations are not recorded.
    pub status: bool,
    /// Log capacity; the oldest actions are evicted beyond it.
    pub max_length: usize,
}

impl Default for UndoManagerConfig {
    fn default() -> Self {
        Self {
            status: true,
            max_length: 50,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Try to load the configuration file from, in order:
    ///
    /// 1. `$TILEMARK_CONFIG`
    /// 2. `$XDG_CONFIG_HOME/tilemark/config.toml`
    /// 3. `~/.config/tilemark/config.toml`
    ///
    /// If none of these paths exist, return a default `Config`.
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::locate() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            Self::parse(&contents)
                .with_context(|| format!("failed to parse config file {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.undo_manager.max_length == 0 {
            bail!("undo_manager.max_length must be at least 1");
        }
        Ok(())
    }

    /// `data_dir` with `~/` expanded.
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(expand_tilde(&self.data_dir))
    }

    /// Return the first config path that actually exists on disk, or `None`.
    fn locate() -> Option<PathBuf> {
        let candidates = Self::candidate_paths();
        candidates.into_iter().find(|p| p.is_file())
    }

    /// Ordered list of paths we check for a config file.
    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(p) = std::env::var("TILEMARK_CONFIG") {
            paths.push(PathBuf::from(p));
        }

        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg).join("tilemark").join("config.toml"));
        }

        if let Ok(home) = std::env::var("HOME") {
            paths.push(
                PathBuf::from(home)
                    .join(".config")
                    .join("tilemark")
                    .join("config.toml"),
            );
        }

        paths
    }
}

/// Expand `~/` prefix in a path string.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_default();
        format!("{}/{}", home, rest)
    } else {
        path.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        assert!(cfg.undo_manager.status);
        assert_eq!(cfg.undo_manager.max_length, 50);
        assert!(cfg.filters.created);
        assert!(!cfg.filters.group_same_id);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn parse_empty_gives_defaults() {
        let cfg = Config::parse("").unwrap();
        assert_eq!(cfg.undo_manager, UndoManagerConfig::default());
        assert_eq!(cfg.data_dir, "~/.local/share/tilemark");
    }

    #[test]
    fn parse_undo_manager_section() {
        let toml_str = r#"
            data_dir = "/var/lib/tilemark"

            [undo_manager]
            status = false
            max_length = 3
        "#;
        let cfg = Config::parse(toml_str).unwrap();
        assert_eq!(cfg.data_dir, "/var/lib/tilemark");
        assert!(!cfg.undo_manager.status);
        assert_eq!(cfg.undo_manager.max_length, 3);
        assert_eq!(cfg.data_path(), PathBuf::from("/var/lib/tilemark"));
    }

    #[test]
    fn parse_partial_undo_manager_keeps_other_default() {
        let toml_str = r#"
            [undo_manager]
            max_length = 7
        "#;
        let cfg = Config::parse(toml_str).unwrap();
        assert!(cfg.undo_manager.status);
        assert_eq!(cfg.undo_manager.max_length, 7);
    }

    #[test]
    fn parse_filters_section() {
        let toml_str = r#"
            [filters]
            deleted = false
            show_folders = false
            group_same_id = true
        "#;
        let cfg = Config::parse(toml_str).unwrap();
        assert!(cfg.filters.created);
        assert!(!cfg.filters.deleted);
        assert!(!cfg.filters.show_folders);
        assert!(cfg.filters.group_same_id);
    }

    #[test]
    fn zero_max_length_rejected() {
        let toml_str = r#"
            [undo_manager]
            max_length = 0
        "#;
        assert!(Config::parse(toml_str).is_err());
    }

    #[test]
    fn negative_max_length_rejected() {
        let toml_str = r#"
            [undo_manager]
            max_length = -1
        "#;
        assert!(Config::parse(toml_str).is_err());
    }

    #[test]
    fn tilde_expansion() {
        let home = std::env::var("HOME").unwrap_or_default();
        assert_eq!(expand_tilde("~/data"), format!("{}/data", home));
        assert_eq!(expand_tilde("/abs/data"), "/abs/data");
    }
}
