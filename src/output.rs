//! CLI output formatting.
//!
//! Output is **information-centric**: each line names what was produced (a
//! page URL, an asset role) first, with the file it landed in as secondary
//! context after an arrow.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! Assets
//!     css → /css/main.3f1c…e9a0.css
//!     css_vendor → /vendor.1a2b3c.css
//!     js → /main.4f2a91.js
//!     js_vendor → (none)
//!
//! Pages
//! 001 / → index.html
//! 002 /guide/ → guide/index.html
//!
//! Built 2 pages (1 draft skipped, 3 static files) in 42ms → _site
//! ```
//!
//! ## Styles
//!
//! ```text
//! /css/main.3f1c…e9a0.css
//!     Output: _site/css/main.3f1c…e9a0.css
//!     SHA-256: 3f1c…e9a0
//!     Size: 1843 bytes
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::assets::AssetPaths;
use crate::bundles::BundleManifest;
use crate::site::BuildReport;
use crate::styles::CompiledAsset;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 page`, `2 pages`.
fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// Output file of a page URL, relative to the output directory.
fn page_file(url: &str) -> String {
    let trimmed = url.trim_matches('/');
    if trimmed.is_empty() {
        "index.html".to_string()
    } else {
        format!("{trimmed}/index.html")
    }
}

fn asset_lines(assets: &AssetPaths) -> Vec<String> {
    ["css", "css_vendor", "js", "js_vendor"]
        .into_iter()
        .map(|name| {
            let path = assets.lookup(name).filter(|p| !p.is_empty()).unwrap_or("(none)");
            format!("{}{} \u{2192} {}", indent(1), name, path)
        })
        .collect()
}

// ============================================================================
// Build
// ============================================================================

pub fn format_build_output(report: &BuildReport) -> Vec<String> {
    let mut lines = Vec::new();
    let assets = AssetPaths::new(report.stylesheet.clone(), report.bundles.clone());

    lines.push("Assets".to_string());
    lines.extend(asset_lines(&assets));

    lines.push(String::new());
    lines.push("Pages".to_string());
    for (i, url) in report.pages.iter().enumerate() {
        lines.push(format!("{} {} \u{2192} {}", format_index(i + 1), url, page_file(url)));
    }

    if report.minify_fallbacks > 0 {
        lines.push(String::new());
        lines.push(format!(
            "Minification failed for {}; originals written",
            plural(report.minify_fallbacks, "document", "documents")
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "Built {} ({} skipped, {}) in {}ms \u{2192} {}",
        plural(report.pages.len(), "page", "pages"),
        plural(report.drafts_skipped, "draft", "drafts"),
        plural(report.static_files, "static file", "static files"),
        report.duration.as_millis(),
        report.output_dir.display()
    ));
    lines
}

/// Print build output to stdout.
pub fn print_build_output(report: &BuildReport) {
    for line in format_build_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Styles
// ============================================================================

pub fn format_styles_output(asset: &CompiledAsset) -> Vec<String> {
    vec![
        asset.logical_path.clone(),
        format!("{}Output: {}", indent(1), asset.output_path.display()),
        format!("{}SHA-256: {}", indent(1), asset.content_hash),
        format!("{}Size: {} bytes", indent(1), asset.content.len()),
    ]
}

/// Print style compilation output to stdout.
pub fn print_styles_output(asset: &CompiledAsset) {
    for line in format_styles_output(asset) {
        println!("{}", line);
    }
}

// ============================================================================
// Bundles
// ============================================================================

pub fn format_bundles_output(dir: &Path, manifest: &BundleManifest) -> Vec<String> {
    let mut lines = vec![format!("Bundles in {}", dir.display())];
    if manifest.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
        return lines;
    }
    for url in manifest.css.iter().chain(&manifest.js) {
        lines.push(format!("{}{}", indent(1), url));
    }
    lines.push(String::new());
    lines.push("Resolved".to_string());
    lines.extend(asset_lines(&AssetPaths::new(None, manifest.clone())));
    lines
}

/// Print bundle listing to stdout.
pub fn print_bundles_output(dir: &Path, manifest: &BundleManifest) {
    for line in format_bundles_output(dir, manifest) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
