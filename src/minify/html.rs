//! HTML minification with [minify-html](https://docs.rs/minify-html).
//!
//! [`HtmlPolicy`] is the set of switches hashpress exposes; [`HtmlPolicy::cfg`]
//! maps it onto a `minify_html::Cfg`. Whitespace collapsing, attribute
//! unquoting and the embedded CSS/JS passes are minify-html's own.
//!
//! minify-html accepts any input. The only failure reported here is an empty
//! result for a non-blank document, which would otherwise replace a page with
//! nothing.

use super::MinifyError;

/// Switches for the HTML rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HtmlPolicy {
    /// Drop comments. SSI comments are kept either way.
    pub remove_comments: bool,
    /// Minify `<style>` contents and `style` attributes.
    pub minify_css: bool,
    /// Minify `<script>` contents.
    pub minify_js: bool,
    /// Drop closing tags the parser can infer (`</li>`, `</p>`, `</td>`, ...).
    pub remove_optional_tags: bool,
    /// Keep `<html>` and `<head>` opening tags. `<html lang>` carries meaning.
    pub keep_document_tags: bool,
    /// Drop `<!...>` bang declarations other than the doctype.
    pub remove_bangs: bool,
    pub remove_processing_instructions: bool,
}

impl HtmlPolicy {
    /// Everything on, document tags kept.
    pub const fn aggressive() -> Self {
        Self {
            remove_comments: true,
            minify_css: true,
            minify_js: true,
            remove_optional_tags: true,
            keep_document_tags: true,
            remove_bangs: true,
            remove_processing_instructions: true,
        }
    }

    /// The minify-html configuration for this policy.
    pub fn cfg(&self) -> minify_html::Cfg {
        let mut cfg = minify_html::Cfg::new();
        cfg.keep_comments = !self.remove_comments;
        cfg.minify_css = self.minify_css;
        cfg.minify_js = self.minify_js;
        cfg.keep_closing_tags = !self.remove_optional_tags;
        cfg.keep_html_and_head_opening_tags = self.keep_document_tags;
        cfg.remove_bangs = self.remove_bangs;
        cfg.remove_processing_instructions = self.remove_processing_instructions;
        cfg
    }
}

impl Default for HtmlPolicy {
    fn default() -> Self {
        Self::aggressive()
    }
}

/// Minify one HTML document.
pub fn minify_html(src: &str, policy: &HtmlPolicy) -> Result<String, MinifyError> {
    let out = minify_html::minify(src.as_bytes(), &policy.cfg());
    if out.is_empty() && !src.trim().is_empty() {
        return Err(MinifyError::Empty);
    }
    String::from_utf8(out).map_err(|e| MinifyError::Utf8(e.utf8_error()))
}
