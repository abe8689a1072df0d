//! The build lifecycle.
//!
//! ```text
//! 1. Assets    styles/ + bundles/  →  AssetPaths       (before-build hook)
//! 2. Static    static/             →  _site/           (verbatim copy)
//! 3. Content   content/**/*.md     →  ContentItem      (draft filter applied)
//! 4. Render    ContentItem         →  _site/**/index.html (parallel, minified)
//! 5. Sitemap   rendered URLs       →  _site/sitemap.xml
//! ```
//!
//! Stage 1 runs to completion before any page renders; its result is shared
//! read-only by every render worker. Everything is recomputed on every build.

use crate::assets::AssetPaths;
use crate::bundles::BundleManifest;
use crate::config::{self, ConfigError, SiteConfig};
use crate::content::{self, ContentError, ContentItem};
use crate::drafts::{BuildMode, UnknownMode, should_include};
use crate::minify::Minifier;
use crate::render::{self, RenderError, SitemapEntry};
use crate::styles::StyleError;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

pub const SITEMAP_FILE: &str = "sitemap.xml";

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Mode(#[from] UnknownMode),
    #[error("Style error: {0}")]
    Styles(#[from] StyleError),
    #[error("Content error: {0}")]
    Content(#[from] ContentError),
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Cannot walk static directory: {0}")]
    Walk(#[from] walkdir::Error),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> BuildError + '_ {
    move |source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// What one build produced.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub mode: BuildMode,
    pub output_dir: PathBuf,
    /// URLs of the rendered pages, sorted.
    pub pages: Vec<String>,
    pub drafts_skipped: usize,
    /// Logical path of the compiled stylesheet, when styles are enabled.
    pub stylesheet: Option<String>,
    pub bundles: BundleManifest,
    pub static_files: usize,
    /// Documents written unminified because minification failed.
    pub minify_fallbacks: usize,
    pub duration: Duration,
}

struct WrittenPage {
    url: String,
    lastmod: Option<String>,
    fell_back: bool,
}

/// Load `config.toml` from `root` and build.
pub fn build_project(root: &Path, mode: BuildMode) -> Result<BuildReport, BuildError> {
    let config = config::load_config(root)?;
    build(&config, root, mode)
}

/// Run one full build of the site at `root`.
pub fn build(config: &SiteConfig, root: &Path, mode: BuildMode) -> Result<BuildReport, BuildError> {
    let started = Instant::now();
    let dirs = config.resolve(root);
    info!(root = %root.display(), %mode, "build started");

    let assets = AssetPaths::prepare(config, &dirs)?;

    fs::create_dir_all(&dirs.output).map_err(io_error(&dirs.output))?;
    let static_files = copy_static(&dirs.static_files, &dirs.output)?;

    let collected = content::collect(&dirs.input)?;
    let total = collected.len();
    let items: Vec<ContentItem> = collected
        .into_iter()
        .filter(|item| should_include(item, mode))
        .collect();
    let drafts_skipped = total - items.len();
    if drafts_skipped > 0 {
        info!(count = drafts_skipped, %mode, "drafts excluded");
    }

    let minifier = Minifier::new(&config.minify);
    let written = items
        .par_iter()
        .map(|item| write_page(item, config, &assets, &minifier, &dirs.output))
        .collect::<Result<Vec<_>, BuildError>>()?;

    let mut entries: Vec<SitemapEntry> = written
        .iter()
        .map(|page| SitemapEntry {
            url: page.url.clone(),
            lastmod: page.lastmod.clone(),
        })
        .collect();
    entries.sort_by(|a, b| a.url.cmp(&b.url));

    let sitemap_path = dirs.output.join(SITEMAP_FILE);
    let sitemap_xml = render::sitemap(&config.site.base_url, &entries);
    let sitemap = minifier.apply(sitemap_xml.into_bytes(), &sitemap_path);
    fs::write(&sitemap_path, &sitemap.bytes).map_err(io_error(&sitemap_path))?;

    let minify_fallbacks =
        written.iter().filter(|page| page.fell_back).count() + usize::from(sitemap.fell_back);

    let report = BuildReport {
        mode,
        output_dir: dirs.output.clone(),
        pages: entries.into_iter().map(|e| e.url).collect(),
        drafts_skipped,
        stylesheet: assets.stylesheet().map(str::to_string),
        bundles: assets.bundles().clone(),
        static_files,
        minify_fallbacks,
        duration: started.elapsed(),
    };
    info!(
        pages = report.pages.len(),
        drafts_skipped,
        minify_fallbacks,
        elapsed_ms = report.duration.as_millis() as u64,
        "build finished"
    );
    Ok(report)
}

fn write_page(
    item: &ContentItem,
    config: &SiteConfig,
    assets: &AssetPaths,
    minifier: &Minifier,
    output_dir: &Path,
) -> Result<WrittenPage, BuildError> {
    let html = render::render_page(item, &config.site, assets)?;
    let path = output_dir.join(item.output_rel_path());
    let minified = minifier.apply(html.into_bytes(), &path);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    fs::write(&path, &minified.bytes).map_err(io_error(&path))?;
    debug!(source = %item.source_path.display(), output = %path.display(), "wrote page");

    Ok(WrittenPage {
        url: item.url(),
        lastmod: item.front.date.as_ref().map(ToString::to_string),
        fell_back: minified.fell_back,
    })
}

/// Copy `static_dir` into `output_dir`, returning the number of files copied.
fn copy_static(static_dir: &Path, output_dir: &Path) -> Result<usize, BuildError> {
    if !static_dir.is_dir() {
        debug!(dir = %static_dir.display(), "no static directory");
        return Ok(0);
    }
    let mut copied = 0;
    for entry in WalkDir::new(static_dir) {
        let entry = entry?;
        let rel = entry.path().strip_prefix(static_dir).unwrap_or(entry.path());
        let dest = output_dir.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).map_err(io_error(&dest))?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &dest).map_err(io_error(entry.path()))?;
            copied += 1;
        }
    }
    Ok(copied)
}
