//! # hashpress
//!
//! A small static site builder whose one stylesheet is named after the SHA-256
//! of its own bytes, so it can be cached forever and is replaced the moment it
//! changes.
//!
//! # Architecture: Hook, Render, Minify
//!
//! ```text
//! 1. Prepare   assets/scss/ + bundle dir  →  AssetPaths     (once, before rendering)
//! 2. Render    content/**/*.md            →  HTML pages     (parallel, drafts filtered)
//! 3. Minify    every output document      →  _site/         (HTML aggressive, XML conservative)
//! ```
//!
//! Stage 1 produces an immutable [`assets::AssetPaths`] that every render worker
//! reads by reference. Nothing is cached between builds: each build recompiles
//! the stylesheet and relists the bundle directory.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`styles`] | SCSS → CSS (grass), prefix + minify (lightningcss), SHA-256 naming |
//! | [`bundles`] | Lists externally built `main`/`vendor` JS and CSS bundles |
//! | [`assets`] | The resolved asset paths templates and shortcodes look up |
//! | [`shortcodes`] | `{% name args %}` expansion, including the terminal-cast player embed |
//! | [`drafts`] | Build mode and the draft filter |
//! | [`content`] | Markdown discovery and `+++` TOML front matter |
//! | [`render`] | Markdown → HTML inside the Maud layout; `sitemap.xml` |
//! | [`minify`] | Per-extension output minification with fallback to the original |
//! | [`site`] | The build lifecycle tying the stages together |
//! | [`watch`] | Rebuild on change |
//! | [`config`] | `config.toml` loading, merging over stock defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Hash of the Final Bytes
//!
//! The stylesheet hash is taken after prefixing and minification, over exactly
//! the bytes written to disk. Two builds that produce the same CSS produce the
//! same filename, whatever the sources looked like.
//!
//! ## Failure Boundaries
//!
//! A broken stylesheet fails the build: every page links it. A document the
//! minifier cannot handle does not: the original bytes are written and a
//! warning names the file. A missing bundle directory is the normal state before
//! the bundler's first run and produces an empty manifest.
//!
//! ## Maud Over Template Engines
//!
//! The layout is a [Maud](https://maud.lambda.xyz/) template: checked at
//! compile time, escaped by default, no template files to ship.

pub mod assets;
pub mod bundles;
pub mod config;
pub mod content;
pub mod drafts;
pub mod minify;
pub mod output;
pub mod render;
pub mod shortcodes;
pub mod site;
pub mod styles;
pub mod watch;

#[cfg(test)]
pub(crate) mod test_helpers;
