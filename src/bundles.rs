//! Discovery of externally bundled assets.
//!
//! An external bundler writes content-addressed files such as
//! `main.4f2a91.js` and `vendor.77be0c.css` into a known directory. This module
//! lists that directory and exposes the files as root-relative URLs; it never
//! reads or hashes them.
//!
//! A missing directory is the normal state before the bundler's first run, so
//! it produces an empty manifest and a warning rather than an error.

use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Bundle file kind, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleKind {
    Css,
    Js,
}

impl BundleKind {
    fn from_path(path: &Path) -> Option<BundleKind> {
        match path.extension()?.to_str()? {
            "css" => Some(BundleKind::Css),
            "js" => Some(BundleKind::Js),
            _ => None,
        }
    }
}

/// Role within a kind, matched by substring on the filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleRole {
    Primary,
    Vendor,
}

impl BundleRole {
    fn marker(self) -> &'static str {
        match self {
            BundleRole::Primary => "main",
            BundleRole::Vendor => "vendor",
        }
    }
}

/// Bundle URLs found in one directory listing, sorted by filename.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BundleManifest {
    pub css: Vec<String>,
    pub js: Vec<String>,
}

impl BundleManifest {
    pub fn is_empty(&self) -> bool {
        self.css.is_empty() && self.js.is_empty()
    }

    pub fn urls(&self, kind: BundleKind) -> &[String] {
        match kind {
            BundleKind::Css => &self.css,
            BundleKind::Js => &self.js,
        }
    }

    /// First URL of `kind` whose filename contains the role marker.
    ///
    /// URLs are kept in alphabetical order, so when several files match the
    /// same marker the alphabetically first one wins.
    pub fn find(&self, kind: BundleKind, role: BundleRole) -> Option<&str> {
        self.urls(kind)
            .iter()
            .find(|url| url_filename(url).contains(role.marker()))
            .map(String::as_str)
    }

    fn from_files(files: &[PathBuf]) -> BundleManifest {
        let mut manifest = BundleManifest::default();
        for path in files {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let url = format!("/{name}");
            match BundleKind::from_path(path) {
                Some(BundleKind::Css) => manifest.css.push(url),
                Some(BundleKind::Js) => manifest.js.push(url),
                None => {}
            }
        }
        manifest
    }
}

fn url_filename(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// List regular files directly inside `dir`, sorted by filename.
pub fn list_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Build the manifest for `dir`.
///
/// Never fails: a missing or unreadable directory yields the empty manifest.
pub fn resolve(dir: &Path) -> BundleManifest {
    match list_files(dir) {
        Ok(files) => {
            let manifest = BundleManifest::from_files(&files);
            debug!(
                dir = %dir.display(),
                css = manifest.css.len(),
                js = manifest.js.len(),
                "resolved bundles"
            );
            manifest
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(dir = %dir.display(), "bundle directory does not exist yet, no bundles linked");
            BundleManifest::default()
        }
        Err(e) => {
            warn!(
                dir = %dir.display(),
                error = %e,
                "cannot read bundle directory, no bundles linked"
            );
            BundleManifest::default()
        }
    }
}
