//! Shared test utilities for the hashpress test suite.
//!
//! Provides fixture setup, inline file-tree creation and assertions over a
//! built output directory.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_files(tmp.path(), &[
//!     ("assets/scss/main.scss", "body { margin: 0; }"),
//!     ("content/index.md", "# Home"),
//! ]);
//! build(&SiteConfig::default(), tmp.path(), BuildMode::Build).unwrap();
//!
//! assert_files_exist(&tmp.path().join("_site"), &["index.html", "sitemap.xml"]);
//! let css = stylesheets(&tmp.path().join("_site/css"));
//! ```

use std::path::Path;
use tempfile::TempDir;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Write `(relative path, contents)` pairs under `root`, creating parent
/// directories as needed.
pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (rel, contents) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
    }
}

// =========================================================================
// Output assertions: panic with a clear message on miss
// =========================================================================

/// Read a file from the default `_site` output directory under `root`.
pub fn read_output(root: &Path, rel: &str) -> String {
    let path = root.join("_site").join(rel);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read output file {}: {e}", path.display()))
}

/// Assert every relative path exists as a file under `dir`.
pub fn assert_files_exist(dir: &Path, rels: &[&str]) {
    let missing: Vec<&str> = rels
        .iter()
        .copied()
        .filter(|rel| !dir.join(rel).is_file())
        .collect();
    assert!(
        missing.is_empty(),
        "missing output files under {}: {missing:?}",
        dir.display()
    );
}

/// Names of the `.css` files directly inside `dir`, sorted.
pub fn stylesheets(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("cannot list {}: {e}", dir.display()))
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| name.ends_with(".css"))
        .collect();
    names.sort();
    names
}
