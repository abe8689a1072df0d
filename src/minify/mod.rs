//! Output minification.
//!
//! Every generated file passes through [`Minifier::apply`] on its way to disk.
//! The output path decides the treatment:
//!
//! | Extension | Kind | Treatment |
//! |-----------|------|-----------|
//! | `.html`, `.htm` | [`OutputKind::Html`] | aggressive, see [`HtmlPolicy`] |
//! | `.xml` | [`OutputKind::Xml`] | inter-element whitespace only, see [`XmlPolicy`] |
//! | anything else | [`OutputKind::Passthrough`] | bytes unchanged |
//!
//! Minification never fails a build. If a document cannot be minified (it is
//! not UTF-8, is malformed XML, or minifies to nothing), the original bytes are
//! written and a warning names the file.

mod html;
mod xml;

pub use html::{HtmlPolicy, minify_html};
pub use xml::{XmlPolicy, minify_xml};

use crate::config::MinifyConfig;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum MinifyError {
    #[error("document is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("minifier produced no output for a non-empty document")]
    Empty,
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// How one output file is treated, with the policy to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Html(HtmlPolicy),
    Xml(XmlPolicy),
    Passthrough,
}

impl OutputKind {
    /// Classify by extension (case-insensitive), with the default policies.
    pub fn classify(path: &Path) -> OutputKind {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("html") | Some("htm") => OutputKind::Html(HtmlPolicy::aggressive()),
            Some("xml") => OutputKind::Xml(XmlPolicy::conservative()),
            _ => OutputKind::Passthrough,
        }
    }
}

/// Result of [`Minifier::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct Minified {
    pub bytes: Vec<u8>,
    /// The document could not be minified and `bytes` is the original.
    pub fell_back: bool,
}

/// Minification settings for one build.
#[derive(Debug, Clone, Copy)]
pub struct Minifier {
    html: bool,
    xml: bool,
}

impl Default for Minifier {
    fn default() -> Self {
        Self {
            html: true,
            xml: true,
        }
    }
}

impl Minifier {
    pub fn new(config: &MinifyConfig) -> Self {
        Self {
            html: config.html,
            xml: config.xml,
        }
    }

    /// The treatment for `path`, honouring the per-kind switches.
    pub fn kind_for(&self, path: &Path) -> OutputKind {
        match OutputKind::classify(path) {
            OutputKind::Html(_) if !self.html => OutputKind::Passthrough,
            OutputKind::Xml(_) if !self.xml => OutputKind::Passthrough,
            kind => kind,
        }
    }

    /// Minify `document`, which is about to be written to `path`.
    pub fn apply(&self, document: Vec<u8>, path: &Path) -> Minified {
        let kind = self.kind_for(path);
        if kind == OutputKind::Passthrough {
            return Minified {
                bytes: document,
                fell_back: false,
            };
        }
        match try_minify(&document, &kind) {
            Ok(bytes) => {
                debug!(
                    path = %path.display(),
                    before = document.len(),
                    after = bytes.len(),
                    "minified"
                );
                Minified {
                    bytes,
                    fell_back: false,
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "minification failed, writing original");
                Minified {
                    bytes: document,
                    fell_back: true,
                }
            }
        }
    }
}

/// Minify with default settings, falling back to the original on failure.
pub fn minify(document: &[u8], path: &Path) -> Vec<u8> {
    Minifier::default().apply(document.to_vec(), path).bytes
}

/// Minify as `kind`, surfacing failures instead of falling back.
pub fn try_minify(document: &[u8], kind: &OutputKind) -> Result<Vec<u8>, MinifyError> {
    match kind {
        OutputKind::Passthrough => Ok(document.to_vec()),
        OutputKind::Html(policy) => {
            let text = std::str::from_utf8(document)?;
            Ok(minify_html(text, policy)?.into_bytes())
        }
        OutputKind::Xml(policy) => {
            let text = std::str::from_utf8(document)?;
            Ok(minify_xml(text, policy)?.into_bytes())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_by_extension() {
        assert!(matches!(
            OutputKind::classify(Path::new("a/index.html")),
            OutputKind::Html(_)
        ));
        assert!(matches!(
            OutputKind::classify(Path::new("A.HTM")),
            OutputKind::Html(_)
        ));
        assert!(matches!(
            OutputKind::classify(Path::new("sitemap.xml")),
            OutputKind::Xml(_)
        ));
        assert_eq!(OutputKind::classify(Path::new("main.css")), OutputKind::Passthrough);
        assert_eq!(OutputKind::classify(Path::new("README")), OutputKind::Passthrough);
    }

    #[test]
    fn passthrough_is_byte_identical() {
        let bytes = b"  body {  color: red }\n\xff".to_vec();
        assert_eq!(minify(&bytes, Path::new("style.css")), bytes);
    }

    #[test]
    fn html_is_minified() {
        let out = minify(b"<div>\n  <p>Hi</p>\n</div>", Path::new("index.html"));
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("<div><p>Hi"), "{out}");
        assert!(!out.contains('\n'));
    }

    #[test]
    fn malformed_html_still_written() {
        let doc = b"<div class=\"open>never closed".to_vec();
        let result = Minifier::default().apply(doc, Path::new("broken.html"));
        assert!(!result.bytes.is_empty());
    }

    #[test]
    fn invalid_utf8_falls_back() {
        let doc = b"<p>\xff\xfe</p>".to_vec();
        let result = Minifier::default().apply(doc.clone(), Path::new("index.html"));
        assert!(result.fell_back);
        assert_eq!(result.bytes, doc);
    }

    #[test]
    fn malformed_xml_falls_back() {
        let doc = b"<feed><entry></feed>".to_vec();
        assert_eq!(minify(&doc, Path::new("feed.xml")), doc);
    }

    #[test]
    fn try_minify_surfaces_errors() {
        let html = OutputKind::classify(Path::new("x.html"));
        assert!(matches!(try_minify(b"<p>\xff</p>", &html), Err(MinifyError::Utf8(_))));
        let xml = OutputKind::classify(Path::new("x.xml"));
        assert!(matches!(try_minify(b"<a><b></a>", &xml), Err(MinifyError::Xml(_))));
    }

    #[test]
    fn disabled_kinds_pass_through() {
        let minifier = Minifier::new(&MinifyConfig { html: false, xml: true });
        assert_eq!(minifier.kind_for(Path::new("index.html")), OutputKind::Passthrough);
        let doc = b"<div>\n  <p>Hi</p>\n</div>".to_vec();
        let result = minifier.apply(doc.clone(), Path::new("index.html"));
        assert_eq!(result.bytes, doc);
        assert!(!result.fell_back);
    }
}
