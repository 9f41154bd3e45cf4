//! JSON configuration.
//!
//! One file describes where templates live, how the HTTP endpoint is
//! exposed, and how the autocomplete widget behaves. Every field has
//! a default so a partial (or empty) file is valid.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory (relative to the project) holding the config file.
pub const CONFIG_DIR: &str = ".trellis";

/// File name of the config inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.json";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// The global templates directory.
    pub templates_path: PathBuf,

    /// Per-site template folders, in the order they should win on
    /// duplicate paths.
    pub sites: Vec<SiteRoot>,

    /// Explicit roots. When non-empty these replace the
    /// sites + global resolution entirely.
    pub roots: Vec<RootConfig>,

    /// Recognized template extensions, without the dot.
    pub extensions: Vec<String>,

    /// Follow symbolic links when walking.
    pub follow_symlinks: bool,

    pub server: ServerSettings,

    pub autocomplete: AutocompleteSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            templates_path: PathBuf::from("templates"),
            sites: Vec::new(),
            roots: Vec::new(),
            extensions: vec!["twig".to_string()],
            follow_symlinks: false,
            server: ServerSettings::default(),
            autocomplete: AutocompleteSettings::default(),
        }
    }
}

impl Config {
    /// Path of the config file inside a project directory.
    pub fn default_path(project: &Path) -> PathBuf {
        project.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Reads and parses a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise falls back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

/// Maps a site to its template folder.
///
/// A site with an explicit `template` setting uses that folder;
/// otherwise a folder named after the site handle is tried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRoot {
    pub handle: String,
    #[serde(default)]
    pub template: Option<String>,
}

impl SiteRoot {
    /// Folder name (and path prefix) this site contributes.
    pub fn folder(&self) -> &str {
        self.template
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.handle)
    }
}

/// An explicitly configured root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub prefix: String,
    /// Walk failures abort the build when true.
    #[serde(default)]
    pub required: bool,
}

/// HTTP endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    pub bind: String,
    /// Mount point of the admin area, e.g. `/admin`.
    pub admin_base: String,
    /// Bearer tokens granting administrative access.
    pub admin_tokens: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:7440".to_string(),
            admin_base: "/admin".to_string(),
            admin_tokens: Vec::new(),
        }
    }
}

/// Autocomplete widget settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutocompleteSettings {
    /// Selectors for fields that should get autocomplete.
    pub selectors: Vec<String>,
    pub native_markers: NativeMarkerSettings,
    pub cache_ttl_ms: u64,
    pub blur_grace_ms: u64,
    pub max_results: usize,
}

impl Default for AutocompleteSettings {
    fn default() -> Self {
        Self {
            selectors: vec![
                r#"input[name="settings[template]"]"#.to_string(),
                r#"input[name="entryType[template]"]"#.to_string(),
                r#"input[name="section[template]"]"#.to_string(),
                r#"input[name="category[template]"]"#.to_string(),
                r#"input[name="settings[defaultTemplate]"]"#.to_string(),
            ],
            native_markers: NativeMarkerSettings::default(),
            cache_ttl_ms: 60_000,
            blur_grace_ms: 200,
            max_results: 20,
        }
    }
}

/// Markers that mean the host already provides autocomplete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NativeMarkerSettings {
    pub attributes: Vec<String>,
    pub container_classes: Vec<String>,
}

impl Default for NativeMarkerSettings {
    fn default() -> Self {
        Self {
            attributes: vec!["data-autosuggest".to_string()],
            container_classes: vec!["autosuggest-container".to_string()],
        }
    }
}
