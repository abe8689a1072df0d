//! Resolved asset paths for templates.
//!
//! [`AssetPaths::prepare`] is the before-build hook: it compiles the style
//! directory and/or lists the bundle directory, once, before any page is
//! rendered. The result is immutable and handed to the renderer by reference,
//! so every page of one build sees the same URLs and rendering never triggers
//! recompilation.
//!
//! Lookups return `""` when nothing matches. Templates are expected to skip the
//! corresponding tag in that case.

use crate::bundles::{self, BundleKind, BundleManifest, BundleRole};
use crate::config::{ResolvedDirs, SiteConfig};
use crate::styles::{self, CompileOptions, StyleError};
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetPaths {
    stylesheet: Option<String>,
    bundles: BundleManifest,
}

impl AssetPaths {
    pub fn new(stylesheet: Option<String>, bundles: BundleManifest) -> Self {
        Self {
            stylesheet,
            bundles,
        }
    }

    /// Run the asset stages configured for this site, in order: style
    /// compilation (fatal on error), then bundle resolution (never fails).
    pub fn prepare(config: &SiteConfig, dirs: &ResolvedDirs) -> Result<AssetPaths, StyleError> {
        let stylesheet = if config.styles.enabled {
            let options = CompileOptions::from_config(config, dirs);
            Some(styles::compile(&dirs.styles, &options)?.logical_path)
        } else {
            None
        };

        let bundles = dirs
            .bundles
            .as_deref()
            .map(bundles::resolve)
            .unwrap_or_default();

        let paths = AssetPaths::new(stylesheet, bundles);
        info!(
            css = paths.css(),
            js = paths.js(),
            "asset paths resolved"
        );
        Ok(paths)
    }

    /// The compiled stylesheet, when style compilation ran.
    pub fn stylesheet(&self) -> Option<&str> {
        self.stylesheet.as_deref()
    }

    pub fn bundles(&self) -> &BundleManifest {
        &self.bundles
    }

    /// Primary stylesheet: the compiled one, otherwise the bundler's `main` CSS.
    pub fn css(&self) -> &str {
        self.stylesheet
            .as_deref()
            .or_else(|| self.bundles.find(BundleKind::Css, BundleRole::Primary))
            .unwrap_or("")
    }

    pub fn css_vendor(&self) -> &str {
        self.bundle(BundleKind::Css, BundleRole::Vendor)
    }

    pub fn js(&self) -> &str {
        self.bundle(BundleKind::Js, BundleRole::Primary)
    }

    pub fn js_vendor(&self) -> &str {
        self.bundle(BundleKind::Js, BundleRole::Vendor)
    }

    fn bundle(&self, kind: BundleKind, role: BundleRole) -> &str {
        self.bundles.find(kind, role).unwrap_or("")
    }

    /// Look up a path by its template name (`css`, `css_vendor`, `js`, `js_vendor`).
    pub fn lookup(&self, name: &str) -> Option<&str> {
        match name {
            "css" => Some(self.css()),
            "css_vendor" => Some(self.css_vendor()),
            "js" => Some(self.js()),
            "js_vendor" => Some(self.js_vendor()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write_files;
    use std::path::Path;
    use tempfile::TempDir;

    fn manifest(css: &[&str], js: &[&str]) -> BundleManifest {
        BundleManifest {
            css: css.iter().map(|s| s.to_string()).collect(),
            js: js.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn empty_paths_return_empty_strings() {
        let paths = AssetPaths::default();
        assert_eq!(paths.css(), "");
        assert_eq!(paths.css_vendor(), "");
        assert_eq!(paths.js(), "");
        assert_eq!(paths.js_vendor(), "");
    }

    #[test]
    fn compiled_stylesheet_wins_over_bundle_css() {
        let paths = AssetPaths::new(
            Some("/css/main.abc.css".to_string()),
            manifest(&["/main.1.css", "/vendor.2.css"], &[]),
        );
        assert_eq!(paths.css(), "/css/main.abc.css");
        assert_eq!(paths.css_vendor(), "/vendor.2.css");
    }

    #[test]
    fn bundle_css_used_without_compiled_stylesheet() {
        let paths = AssetPaths::new(
            None,
            manifest(&["/main.1.css"], &["/main.9.js", "/vendor.8.js"]),
        );
        assert_eq!(paths.css(), "/main.1.css");
        assert_eq!(paths.js(), "/main.9.js");
        assert_eq!(paths.js_vendor(), "/vendor.8.js");
    }

    #[test]
    fn lookup_by_name() {
        let paths = AssetPaths::new(None, manifest(&[], &["/main.9.js"]));
        assert_eq!(paths.lookup("js"), Some("/main.9.js"));
        assert_eq!(paths.lookup("css"), Some(""));
        assert_eq!(paths.lookup("fonts"), None);
    }

    #[test]
    fn prepare_compiles_styles_and_resolves_bundles() {
        let tmp = TempDir::new().unwrap();
        write_files(
            tmp.path(),
            &[
                ("assets/scss/site.scss", "body { margin: 0; }"),
                ("bundles/main.77.js", "console.log(1)"),
            ],
        );
        let mut config = SiteConfig::default();
        config.bundles.dir = Some("bundles".to_string());
        let dirs = config.resolve(tmp.path());

        let paths = AssetPaths::prepare(&config, &dirs).unwrap();
        assert!(paths.css().starts_with("/css/main."));
        assert_eq!(paths.stylesheet(), Some(paths.css()));
        assert_eq!(paths.js(), "/main.77.js");

        let written = dirs.output.join(paths.css().trim_start_matches('/'));
        assert!(written.is_file());
    }

    #[test]
    fn prepare_without_styles_or_bundles() {
        let mut config = SiteConfig::default();
        config.styles.enabled = false;
        let dirs = config.resolve(Path::new("/nonexistent-site"));
        let paths = AssetPaths::prepare(&config, &dirs).unwrap();
        assert_eq!(paths, AssetPaths::default());
    }

    #[test]
    fn prepare_fails_on_style_errors() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("assets/scss/a.scss", "a { color: ")]);
        let config = SiteConfig::default();
        let dirs = config.resolve(tmp.path());
        assert!(AssetPaths::prepare(&config, &dirs).is_err());
    }
}
