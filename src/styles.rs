//! Style compilation with content-hashed output.
//!
//! Every `.scss`/`.css` file in the style directory is compiled into a single
//! stylesheet whose filename carries the SHA-256 of its final bytes:
//!
//! ```text
//! assets/scss/                       _site/css/
//! ├── _mixins.scss   (partial)       └── main.3f1c…e9a0.css
//! ├── reset.scss          ──────►
//! └── theme.scss                     served as /css/main.3f1c…e9a0.css
//! ```
//!
//! ## Stages
//!
//! 1. **Collect**: non-partial sources, sorted by filename. Order is the cascade
//!    order, so sorting is what makes the output reproducible.
//! 2. **Concatenate**: each file prefixed with a `/* source: name */` comment.
//! 3. **Preprocess**: SCSS → CSS with [grass](https://docs.rs/grass). `@import`
//!    resolves against the style directory, then `styles.load_paths`.
//! 4. **Prefix + minify**: [lightningcss](https://docs.rs/lightningcss) adds
//!    vendor prefixes for the browserslist targets, then merges rules, drops
//!    comments and prints compressed output.
//! 5. **Hash + write**: `{basename}[.min].{sha256}.css`.
//!
//! Every failure here is fatal. A stylesheet is shared by every page, so a
//! half-processed one must never be written.

use crate::config::{ResolvedDirs, SiteConfig};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const STYLE_EXTENSIONS: &[&str] = &["scss", "css"];

#[derive(Error, Debug)]
pub enum StyleError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Style directory not found: {0}")]
    MissingDir(PathBuf),
    #[error("No style sources (.scss or .css) found in {0}")]
    NoSources(PathBuf),
    #[error("Failed to compile {file}: {message}")]
    Preprocess { file: PathBuf, message: String },
    #[error("Invalid browser targets {queries:?}: {message}")]
    Targets {
        queries: Vec<String>,
        message: String,
    },
    #[error("Failed to prefix/minify styles from {dir}: {message}")]
    Transform { dir: PathBuf, message: String },
}

impl StyleError {
    fn io(path: &Path, source: io::Error) -> Self {
        StyleError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One style source file.
#[derive(Debug, Clone)]
pub struct StyleFile {
    pub path: PathBuf,
    pub text: String,
}

impl StyleFile {
    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// The ordered set of style sources for one build.
#[derive(Debug, Clone)]
pub struct StyleSource {
    dir: PathBuf,
    files: Vec<StyleFile>,
}

impl StyleSource {
    /// Read every non-partial style file in `dir`, sorted by filename.
    pub fn collect(dir: &Path) -> Result<StyleSource, StyleError> {
        if !dir.is_dir() {
            return Err(StyleError::MissingDir(dir.to_path_buf()));
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| StyleError::io(dir, e))? {
            let path = entry.map_err(|e| StyleError::io(dir, e))?.path();
            if !is_style_source(&path) {
                continue;
            }
            let text = fs::read_to_string(&path).map_err(|e| StyleError::io(&path, e))?;
            files.push(StyleFile { path, text });
        }

        Ok(StyleSource::from_files(dir, files))
    }

    /// Build a source set from already-read files. Files are re-sorted by name.
    pub fn from_files(dir: &Path, mut files: Vec<StyleFile>) -> StyleSource {
        files.sort_by_key(|f| f.name());
        StyleSource {
            dir: dir.to_path_buf(),
            files,
        }
    }

    pub fn files(&self) -> &[StyleFile] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// All files joined in order, each behind a provenance comment.
    pub fn concatenate(&self) -> String {
        concatenate(&self.files)
    }
}

fn concatenate(files: &[StyleFile]) -> String {
    let mut out = String::new();
    for file in files {
        out.push_str(&format!("/* source: {} */\n", file.name()));
        out.push_str(&file.text);
        if !file.text.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// Partials (`_name.scss`) are import-only and never compiled on their own.
fn is_style_source(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    if name.starts_with('_') || name.starts_with('.') {
        return false;
    }
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| STYLE_EXTENSIONS.contains(&ext.as_str()))
}

/// Everything `compile` needs besides the source directory.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// `@import` search path, in priority order.
    pub load_paths: Vec<PathBuf>,
    /// Browserslist queries for vendor prefixing.
    pub targets: Vec<String>,
    pub basename: String,
    pub minified_suffix: bool,
    /// Site output root.
    pub output_dir: PathBuf,
    /// Subdirectory of `output_dir`, also used as the URL prefix.
    pub output_subdir: String,
}

impl CompileOptions {
    pub fn from_config(config: &SiteConfig, dirs: &ResolvedDirs) -> Self {
        Self {
            load_paths: dirs.load_paths.clone(),
            targets: config.styles.targets.clone(),
            basename: config.styles.basename.clone(),
            minified_suffix: config.styles.minified_suffix,
            output_dir: dirs.output.clone(),
            output_subdir: config.styles.output_subdir.clone(),
        }
    }
}

/// A compiled, hashed stylesheet that has been written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledAsset {
    /// Final minified CSS.
    pub content: String,
    /// Lowercase hex SHA-256 of `content`.
    pub content_hash: String,
    /// Public URL, e.g. `/css/main.<hash>.css`.
    pub logical_path: String,
    /// Where the file was written.
    pub output_path: PathBuf,
}

/// Compile every style source in `style_dir` into one hashed stylesheet.
pub fn compile(style_dir: &Path, options: &CompileOptions) -> Result<CompiledAsset, StyleError> {
    info!(dir = %style_dir.display(), "compiling styles");

    let source = StyleSource::collect(style_dir)?;
    let content = compile_source(&source, options)?;
    let content_hash = content_hash(content.as_bytes());
    let filename = hashed_filename(&options.basename, options.minified_suffix, &content_hash);

    let target_dir = options.output_dir.join(&options.output_subdir);
    fs::create_dir_all(&target_dir).map_err(|e| StyleError::io(&target_dir, e))?;
    let output_path = target_dir.join(&filename);
    fs::write(&output_path, &content).map_err(|e| StyleError::io(&output_path, e))?;

    info!(path = %output_path.display(), bytes = content.len(), "wrote stylesheet");

    Ok(CompiledAsset {
        content,
        content_hash,
        logical_path: logical_path(&options.output_subdir, &filename),
        output_path,
    })
}

/// Preprocess, prefix and minify a source set without touching the disk.
pub fn compile_source(
    source: &StyleSource,
    options: &CompileOptions,
) -> Result<String, StyleError> {
    if source.is_empty() {
        return Err(StyleError::NoSources(source.dir.clone()));
    }
    debug!(files = source.files.len(), "preprocessing style sources");

    let css = preprocess(source, &options.load_paths)?;
    let browsers = resolve_browsers(&options.targets)?;
    optimize_css(&css, browsers).map_err(|message| StyleError::Transform {
        dir: source.dir.clone(),
        message,
    })
}

fn grass_options(load_paths: &[PathBuf]) -> grass::Options<'static> {
    load_paths.iter().fold(
        grass::Options::default().style(grass::OutputStyle::Expanded),
        |options, path| options.load_path(path),
    )
}

fn preprocess(source: &StyleSource, load_paths: &[PathBuf]) -> Result<String, StyleError> {
    let options = grass_options(load_paths);
    grass::from_string(source.concatenate(), &options).map_err(|err| StyleError::Preprocess {
        file: first_failing_file(source, &options),
        message: err.to_string(),
    })
}

/// Find the first file whose cumulative prefix stops compiling.
///
/// Later files may depend on variables and mixins from earlier ones, so files
/// are never compiled in isolation.
fn first_failing_file(source: &StyleSource, options: &grass::Options<'_>) -> PathBuf {
    (1..=source.files.len())
        .find(|&n| grass::from_string(concatenate(&source.files[..n]), options).is_err())
        .map(|n| source.files[n - 1].path.clone())
        .unwrap_or_else(|| source.dir.clone())
}

/// Resolve browserslist queries into lightningcss targets.
pub fn resolve_browsers(queries: &[String]) -> Result<Option<Browsers>, StyleError> {
    if queries.is_empty() {
        return Ok(None);
    }
    Browsers::from_browserslist(queries).map_err(|e| StyleError::Targets {
        queries: queries.to_vec(),
        message: e.to_string(),
    })
}

/// Vendor-prefix (when `browsers` is set) and minify a CSS string.
pub fn optimize_css(css: &str, browsers: Option<Browsers>) -> Result<String, String> {
    let targets = Targets {
        browsers,
        ..Targets::default()
    };
    let mut sheet = StyleSheet::parse(css, ParserOptions::default()).map_err(|e| e.to_string())?;
    sheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| e.to_string())?;
    let printed = sheet
        .to_css(PrinterOptions {
            minify: true,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;
    Ok(printed.code)
}

/// SHA-256 of `bytes`, lowercase hex.
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// `{basename}.{hash}.css` or `{basename}.min.{hash}.css`.
pub fn hashed_filename(basename: &str, minified_suffix: bool, hash: &str) -> String {
    if minified_suffix {
        format!("{basename}.min.{hash}.css")
    } else {
        format!("{basename}.{hash}.css")
    }
}

fn logical_path(output_subdir: &str, filename: &str) -> String {
    let subdir = output_subdir.trim_matches('/');
    if subdir.is_empty() {
        format!("/{filename}")
    } else {
        format!("/{subdir}/{filename}")
    }
}
