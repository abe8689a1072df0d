//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in the
//! project root, next to the content, style and static directories:
//!
//! ```text
//! my-site/
//! ├── config.toml              # Optional: overrides stock defaults
//! ├── content/                 # Markdown pages with TOML front matter
//! ├── assets/scss/             # Style sources compiled into one hashed CSS file
//! └── static/                  # Copied verbatim into the output root
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! input_dir = "content"
//! output_dir = "_site"
//! static_dir = "static"
//!
//! [site]
//! title = "hashpress"
//! base_url = ""               # Absolute URL prefix for sitemap.xml
//!
//! [styles]
//! enabled = true
//! dir = "assets/scss"
//! basename = "main"           # main.<hash>.css
//! minified_suffix = false     # true → main.min.<hash>.css
//! output_subdir = "css"       # written to _site/css/, served as /css/...
//! load_paths = []             # extra @import search paths
//! targets = ["defaults"]      # browserslist queries for vendor prefixing
//!
//! [bundles]
//! dir = "_site/assets"        # omit to disable the bundle resolver
//!
//! [minify]
//! html = true
//! xml = true
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. Relative directories are resolved against
/// the project root with [`SiteConfig::resolve`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Directory holding markdown content.
    pub input_dir: String,
    /// Directory the built site is written to.
    pub output_dir: String,
    /// Directory copied verbatim into the output root (skipped when missing).
    pub static_dir: String,
    pub site: SiteInfo,
    pub styles: StylesConfig,
    pub bundles: BundlesConfig,
    pub minify: MinifyConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            input_dir: "content".to_string(),
            output_dir: "_site".to_string(),
            static_dir: "static".to_string(),
            site: SiteInfo::default(),
            styles: StylesConfig::default(),
            bundles: BundlesConfig::default(),
            minify: MinifyConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let basename = &self.styles.basename;
        if basename.is_empty() || basename.contains(['/', '\\', '.']) {
            return Err(ConfigError::Validation(
                "styles.basename must be a non-empty name without '/' or '.'".into(),
            ));
        }
        if self.styles.enabled && self.styles.targets.is_empty() {
            return Err(ConfigError::Validation(
                "styles.targets must not be empty when styles are enabled".into(),
            ));
        }
        if Path::new(&self.styles.output_subdir).is_absolute() {
            return Err(ConfigError::Validation(
                "styles.output_subdir must be relative to output_dir".into(),
            ));
        }
        if self.output_dir.is_empty() {
            return Err(ConfigError::Validation("output_dir must not be empty".into()));
        }
        Ok(())
    }

    /// Resolve every configured directory against the project root.
    pub fn resolve(&self, root: &Path) -> ResolvedDirs {
        let style_dir = root.join(&self.styles.dir);
        let mut load_paths = vec![style_dir.clone()];
        load_paths.extend(self.styles.load_paths.iter().map(|p| root.join(p)));
        ResolvedDirs {
            input: root.join(&self.input_dir),
            output: root.join(&self.output_dir),
            static_files: root.join(&self.static_dir),
            styles: style_dir,
            load_paths,
            bundles: self.bundles.dir.as_ref().map(|d| root.join(d)),
        }
    }
}

/// Absolute (root-joined) directories derived from a [`SiteConfig`].
#[derive(Debug, Clone)]
pub struct ResolvedDirs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub static_files: PathBuf,
    pub styles: PathBuf,
    /// `@import` search path: the style directory first, then `styles.load_paths`.
    pub load_paths: Vec<PathBuf>,
    pub bundles: Option<PathBuf>,
}

/// Site-wide metadata used by the layout and sitemap.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteInfo {
    /// Fallback page title and `<title>` suffix.
    pub title: String,
    /// Absolute URL prefix (e.g. `https://example.com`) for sitemap entries.
    /// Empty means sitemap URLs stay root-relative.
    pub base_url: String,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            title: "hashpress".to_string(),
            base_url: String::new(),
        }
    }
}

/// Style compilation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StylesConfig {
    /// Compile the style directory before rendering.
    pub enabled: bool,
    /// Directory of `.scss`/`.css` sources, relative to the project root.
    pub dir: String,
    /// Output file stem: `{basename}.{hash}.css`.
    pub basename: String,
    /// Insert `.min` before the hash: `{basename}.min.{hash}.css`.
    pub minified_suffix: bool,
    /// Subdirectory of `output_dir` receiving the stylesheet; also its URL prefix.
    pub output_subdir: String,
    /// Extra directories searched when resolving `@import`.
    pub load_paths: Vec<String>,
    /// Browserslist queries driving vendor prefixing.
    pub targets: Vec<String>,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: "assets/scss".to_string(),
            basename: "main".to_string(),
            minified_suffix: false,
            output_subdir: "css".to_string(),
            load_paths: Vec::new(),
            targets: vec!["defaults".to_string()],
        }
    }
}

/// External bundler integration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BundlesConfig {
    /// Directory the external bundler writes `.css`/`.js` files into.
    /// When absent the resolver is not run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

/// Post-render minification toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MinifyConfig {
    pub html: bool,
    pub xml: bool,
}

impl Default for MinifyConfig {
    fn default() -> Self {
        Self {
            html: true,
            xml: true,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the project root.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(root)?)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# hashpress configuration
# =======================
# All settings are optional. Values shown below are the defaults.
# Unknown keys cause an error.

# Markdown content (pages), relative to this file.
input_dir = "content"

# Where the built site is written.
output_dir = "_site"

# Copied verbatim into output_dir. Skipped when the directory is missing.
static_dir = "static"

# ---------------------------------------------------------------------------
# Site metadata
# ---------------------------------------------------------------------------
[site]
title = "hashpress"

# Absolute URL prefix for sitemap.xml entries, e.g. "https://example.com".
# Leave empty to emit root-relative URLs.
base_url = ""

# ---------------------------------------------------------------------------
# Style compilation
# ---------------------------------------------------------------------------
[styles]
enabled = true

# Every .scss/.css file here (except _partials) is concatenated in filename
# order, compiled, prefixed, minified and written as one hashed stylesheet.
dir = "assets/scss"

# Output name: {basename}.{sha256}.css, or {basename}.min.{sha256}.css.
basename = "main"
minified_suffix = false

# Subdirectory of output_dir; the stylesheet is served as /{output_subdir}/...
output_subdir = "css"

# Extra directories searched by @import (the style dir is always searched).
load_paths = []

# Browserslist queries that decide which vendor prefixes are added.
targets = ["defaults"]

# ---------------------------------------------------------------------------
# External bundler output
# ---------------------------------------------------------------------------
[bundles]
# Directory scanned for bundler-produced .css/.js files. Files whose name
# contains "main" are primary, "vendor" are vendor bundles.
# dir = "_site/assets"

# ---------------------------------------------------------------------------
# Output minification
# ---------------------------------------------------------------------------
[minify]
html = true
xml = true
"##
}
