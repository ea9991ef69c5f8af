//! Application configuration

use crate::Operation;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub navigation: NavigationConfig,
    pub grid: GridConfig,
    pub transform: TransformConfig,
    pub tags: TagConfig,
    pub toast: ToastConfig,
    pub files: FilesConfig,
    pub keybindings: KeybindingsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Step of `nav.next_jump` / `nav.prev_jump`
    pub jump_step: usize,
    /// Maximum number of remembered transitions
    pub history_capacity: usize,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            jump_step: 10,
            history_capacity: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub max_rows: usize,
    pub max_cols: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            max_rows: 10,
            max_cols: 10,
        }
    }
}

/// Per-image zoom limits, in percent
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub scale_step: u32,
    pub min_scale: u32,
    pub max_scale: u32,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            scale_step: 10,
            min_scale: 10,
            max_scale: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TagConfig {
    /// Number of directories kept in the tag cache
    pub cache_capacity: usize,
    /// Name of the per-directory JSON file holding tags
    pub sidecar_file: String,
    pub max_tags: usize,
    /// Maximum tag length in code points
    pub max_tag_chars: usize,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 100,
            sidecar_file: ".flipview-tags.json".to_string(),
            max_tags: 50,
            max_tag_chars: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToastConfig {
    pub duration_ms: u64,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self { duration_ms: 1000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Move deleted images to the OS trash instead of unlinking them
    pub use_trash: bool,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self { use_trash: true }
    }
}

/// Operation id -> canonical keys, one table per input mode
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeybindingsConfig {
    pub view: HashMap<String, Vec<String>>,
    pub edit: HashMap<String, Vec<String>>,
}

impl Default for KeybindingsConfig {
    fn default() -> Self {
        Self {
            view: default_view_keybindings(),
            edit: default_edit_keybindings(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults when absent
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            tracing::info!("Configuration loaded from {:?}", path);
            Ok(config.sanitized())
        } else {
            tracing::info!("Using default configuration");
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::info!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("com", "Flipview", "Flipview")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("./config.toml"))
    }

    /// Clamp values that would break invariants
    fn sanitized(mut self) -> Self {
        self.navigation.jump_step = self.navigation.jump_step.max(1);
        self.navigation.history_capacity = self.navigation.history_capacity.max(1);
        self.grid.max_rows = self.grid.max_rows.max(1);
        self.grid.max_cols = self.grid.max_cols.max(1);
        self.transform.min_scale = self.transform.min_scale.max(1);
        self.transform.max_scale = self.transform.max_scale.max(self.transform.min_scale);
        self.transform.scale_step = self.transform.scale_step.max(1);
        self.tags.cache_capacity = self.tags.cache_capacity.max(1);

        for (id, _) in self.keybindings.view.iter().chain(self.keybindings.edit.iter()) {
            if id.parse::<Operation>().is_err() {
                tracing::warn!("Ignoring keybinding for unknown operation {:?}", id);
            }
        }
        self
    }
}

fn bind(kb: &mut HashMap<String, Vec<String>>, op: Operation, keys: &[&str]) {
    kb.insert(op.id().to_string(), keys.iter().map(|k| k.to_string()).collect());
}

fn default_view_keybindings() -> HashMap<String, Vec<String>> {
    let mut kb = HashMap::new();

    // Navigation
    bind(&mut kb, Operation::Next, &["arrowright", "wheeldown", "x"]);
    bind(&mut kb, Operation::Prev, &["arrowleft", "wheelup", "z"]);
    bind(&mut kb, Operation::NextJump, &["arrowdown", "shift:wheeldown"]);
    bind(&mut kb, Operation::PrevJump, &["arrowup", "shift:wheelup"]);
    bind(&mut kb, Operation::Random, &["q", "rightclick"]);
    bind(&mut kb, Operation::NextBookmark, &["b", "shift:rightclick"]);
    bind(&mut kb, Operation::PrevHistory, &["h"]);
    bind(&mut kb, Operation::NextHistory, &["shift:h"]);

    // Marking & files
    bind(&mut kb, Operation::ToggleBookmark, &["middleclick", "shift:b"]);
    bind(&mut kb, Operation::DeleteWithConfirm, &["delete"]);

    // Grid
    bind(&mut kb, Operation::RowsIncrement, &["r"]);
    bind(&mut kb, Operation::RowsDecrement, &["shift:r"]);
    bind(&mut kb, Operation::ColsIncrement, &["l"]);
    bind(&mut kb, Operation::ColsDecrement, &["shift:l"]);

    // Dialogs & overlays
    bind(&mut kb, Operation::OpenTagEditor, &["t"]);
    bind(&mut kb, Operation::ToggleInfoOverlay, &["i"]);
    bind(&mut kb, Operation::OpenGoto, &["ctrl,shift:g"]);
    bind(&mut kb, Operation::OpenFilter, &["ctrl,shift:t"]);

    // Rotation
    bind(&mut kb, Operation::RotateGlobalRight, &["ctrl,shift:arrowright"]);
    bind(&mut kb, Operation::RotateGlobalLeft, &["ctrl,shift:arrowleft"]);
    bind(&mut kb, Operation::RotateVisibleLocalRight, &["ctrl:arrowright", "ctrl,shift:f"]);
    bind(&mut kb, Operation::RotateVisibleLocalLeft, &["ctrl:arrowleft", "ctrl,shift:b"]);

    bind(&mut kb, Operation::EnterEditMode, &["ctrl,shift:e"]);

    kb
}

fn default_edit_keybindings() -> HashMap<String, Vec<String>> {
    let mut kb = HashMap::new();

    bind(&mut kb, Operation::ExitEditMode, &["escape", "ctrl,shift:e"]);
    bind(&mut kb, Operation::ResetVisibleTransform, &["ctrl:r"]);
    bind(&mut kb, Operation::ScaleVisibleUp, &["wheelup"]);
    bind(&mut kb, Operation::ScaleVisibleDown, &["wheeldown"]);
    bind(&mut kb, Operation::RotateVisibleLocalRight, &["ctrl:arrowright", "ctrl,shift:f"]);
    bind(&mut kb, Operation::RotateVisibleLocalLeft, &["ctrl:arrowleft", "ctrl,shift:b"]);

    kb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_constants() {
        let config = AppConfig::default();
        assert_eq!(config.navigation.jump_step, 10);
        assert_eq!(config.navigation.history_capacity, 500);
        assert_eq!(config.grid.max_rows, 10);
        assert_eq!(config.tags.cache_capacity, 100);
        assert_eq!(config.tags.max_tags, 50);
        assert_eq!(config.toast.duration_ms, 1000);
        assert_eq!(config.transform.max_scale, 1000);
    }

    #[test]
    fn test_default_bindings_use_known_operations() {
        let config = AppConfig::default();
        for id in config.keybindings.view.keys().chain(config.keybindings.edit.keys()) {
            assert!(id.parse::<Operation>().is_ok(), "{id}");
        }
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.navigation.jump_step, 10);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[navigation]\njump_step = 5\nhistory_capacity = 0\n\n[grid]\nmax_rows = 4\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.navigation.jump_step, 5);
        assert_eq!(config.navigation.history_capacity, 1);
        assert_eq!(config.grid.max_rows, 4);
        assert_eq!(config.grid.max_cols, 10);
        assert!(config.keybindings.view.contains_key("nav.next"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.toast.duration_ms = 2500;
        config.save_to(&path).unwrap();

        let reloaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(reloaded.toast.duration_ms, 2500);
        assert_eq!(
            reloaded.keybindings.edit.get("edit.reset"),
            Some(&vec!["ctrl:r".to_string()])
        );
    }
}
