//! Page rendering.
//!
//! Each content item is rendered in three steps: shortcodes in the markdown
//! body are expanded against the resolved [`AssetPaths`], the result is
//! converted to HTML with pulldown-cmark, and the HTML is wrapped in the site
//! layout. The layout links every resolved asset: vendor stylesheet, then the
//! primary one, then deferred vendor and primary scripts. Empty lookups produce
//! no tag.
//!
//! Uses [maud](https://maud.lambda.xyz/) for the layout, so every interpolated
//! value is escaped.

use crate::assets::AssetPaths;
use crate::config::SiteInfo;
use crate::content::ContentItem;
use crate::shortcodes::{self, ShortcodeError};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Event, Options, Parser, Tag, html as md_html};
use quick_xml::escape::escape;
use std::ops::Range;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Shortcode error in {path}: {source}")]
    Shortcode {
        path: PathBuf,
        source: ShortcodeError,
    },
}

/// One `<url>` entry of `sitemap.xml`.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    /// Root-relative URL.
    pub url: String,
    pub lastmod: Option<String>,
}

/// Render a content item to a complete HTML document.
pub fn render_page(
    item: &ContentItem,
    site: &SiteInfo,
    assets: &AssetPaths,
) -> Result<String, RenderError> {
    let body = expand_outside_code(&item.body, assets).map_err(|source| RenderError::Shortcode {
        path: item.source_path.clone(),
        source,
    })?;
    let title = item.title();
    let page_title = if title.is_empty() || title == site.title {
        site.title.clone()
    } else {
        format!("{} | {}", title, site.title)
    };

    let content = html! {
        article.page-content {
            (PreEscaped(markdown_to_html(&body)))
        }
    };
    Ok(base_document(&page_title, site, assets, content).into_string())
}

const MARKDOWN_OPTIONS: Options = Options::ENABLE_TABLES
    .union(Options::ENABLE_FOOTNOTES)
    .union(Options::ENABLE_STRIKETHROUGH);

/// Expand shortcodes in a markdown body, except inside code spans and code
/// blocks, so pages can show `{% css %}` literally.
pub fn expand_outside_code(markdown: &str, assets: &AssetPaths) -> Result<String, ShortcodeError> {
    let mut out = String::with_capacity(markdown.len());
    let mut cursor = 0;
    for code in code_ranges(markdown) {
        if code.start < cursor {
            continue;
        }
        shortcodes::expand_into(&mut out, &markdown[cursor..code.start], cursor, assets)?;
        out.push_str(&markdown[code.clone()]);
        cursor = code.end;
    }
    shortcodes::expand_into(&mut out, &markdown[cursor..], cursor, assets)?;
    Ok(out)
}

/// Byte ranges of inline code and code blocks, in document order.
fn code_ranges(markdown: &str) -> Vec<Range<usize>> {
    Parser::new_ext(markdown, MARKDOWN_OPTIONS)
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Code(_) | Event::Start(Tag::CodeBlock(_)) => Some(range),
            _ => None,
        })
        .collect()
}

/// Convert markdown to HTML with tables, footnotes and strikethrough enabled.
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, MARKDOWN_OPTIONS);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    md_html::push_html(&mut out, parser);
    out
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(title: &str, site: &SiteInfo, assets: &AssetPaths, content: Markup) -> Markup {
    let stylesheets = [assets.css_vendor(), assets.css()];
    let scripts = [assets.js_vendor(), assets.js()];
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                @for href in stylesheets.iter().filter(|h| !h.is_empty()) {
                    link rel="stylesheet" href=(href);
                }
                @for src in scripts.iter().filter(|s| !s.is_empty()) {
                    script defer src=(src) {}
                }
            }
            body {
                header.site-header {
                    a href="/" { (site.title) }
                }
                main {
                    (content)
                }
            }
        }
    }
}

// ============================================================================
// Sitemap
// ============================================================================

/// Render `sitemap.xml`. URLs are made absolute when `base_url` is set.
pub fn sitemap(base_url: &str, entries: &[SitemapEntry]) -> String {
    let base = base_url.trim_end_matches('/');
    let mut xml = String::from(concat!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
        "<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    ));
    for entry in entries {
        let loc = format!("{base}{}", entry.url);
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape(loc.as_str())));
        if let Some(lastmod) = &entry.lastmod {
            xml.push_str(&format!("    <lastmod>{}</lastmod>\n", escape(lastmod.as_str())));
        }
        xml.push_str("  </url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundles::BundleManifest;
    use crate::content::FrontMatter;

    fn site() -> SiteInfo {
        SiteInfo {
            title: "Docs".to_string(),
            base_url: String::new(),
        }
    }

    fn page(body: &str) -> ContentItem {
        ContentItem {
            source_path: PathBuf::from("content/guide.md"),
            rel_path: PathBuf::from("guide.md"),
            front: FrontMatter {
                title: Some("Guide".to_string()),
                ..FrontMatter::default()
            },
            body: body.to_string(),
        }
    }

    fn assets() -> AssetPaths {
        AssetPaths::new(
            Some("/css/main.abc.css".to_string()),
            BundleManifest {
                css: vec!["/vendor.1.css".to_string()],
                js: vec!["/main.2.js".to_string()],
            },
        )
    }

    #[test]
    fn markdown_extensions_enabled() {
        let html = markdown_to_html("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~old~~");
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>old</del>"));
    }

    #[test]
    fn layout_links_assets_vendor_first() {
        let html = render_page(&page("# Hi"), &site(), &assets()).unwrap();
        assert!(html.contains("<title>Guide | Docs</title>"));
        let vendor = html.find(r#"href="/vendor.1.css""#).unwrap();
        let main = html.find(r#"href="/css/main.abc.css""#).unwrap();
        assert!(vendor < main);
        assert!(html.contains(r#"src="/main.2.js""#));
        assert!(html.contains("<h1>Hi</h1>"));
    }

    #[test]
    fn empty_lookups_emit_no_tags() {
        let html = render_page(&page("text"), &site(), &AssetPaths::default()).unwrap();
        assert!(!html.contains("<link"));
        assert!(!html.contains("<script"));
    }

    #[test]
    fn shortcodes_expanded_before_markdown() {
        let html = render_page(&page("Styles live at {% css %}."), &site(), &assets()).unwrap();
        assert!(html.contains("<p>Styles live at /css/main.abc.css.</p>"));
    }

    #[test]
    fn shortcodes_in_code_left_literal() {
        let body = "Link {% css %}.\n\nWrite `{% css %}` in a page.\n\n```\n{% nope %}\n```\n";
        let html = render_page(&page(body), &site(), &assets()).unwrap();
        assert!(html.contains("<p>Link /css/main.abc.css.</p>"));
        assert!(html.contains("<code>{% css %}</code>"));
        assert!(html.contains("<pre><code>{% nope %}\n</code></pre>"));
    }

    #[test]
    fn expand_outside_code_keeps_offsets() {
        let err = expand_outside_code("`{% css %}` then {% css", &assets()).unwrap_err();
        assert_eq!(err, ShortcodeError::Unterminated(17));
    }

    #[test]
    fn shortcode_errors_name_source_file() {
        let err = render_page(&page("{% nope %}"), &site(), &assets()).unwrap_err();
        assert!(err.to_string().contains("content/guide.md"));
    }

    #[test]
    fn title_is_escaped() {
        let mut item = page("x");
        item.front.title = Some("<script>".to_string());
        let html = render_page(&item, &site(), &assets()).unwrap();
        assert!(html.contains("<title>&lt;script&gt; | Docs</title>"));
    }

    #[test]
    fn sitemap_absolute_and_escaped() {
        let xml = sitemap(
            "https://example.com/",
            &[
                SitemapEntry {
                    url: "/".to_string(),
                    lastmod: None,
                },
                SitemapEntry {
                    url: "/q&a/".to_string(),
                    lastmod: Some("2024-03-01".to_string()),
                },
            ],
        );
        assert!(xml.contains("<loc>https://example.com/</loc>"));
        assert!(xml.contains("<loc>https://example.com/q&amp;a/</loc>"));
        assert!(xml.contains("<lastmod>2024-03-01</lastmod>"));
        assert!(xml.ends_with("</urlset>\n"));
    }

    #[test]
    fn sitemap_relative_without_base_url() {
        let entry = SitemapEntry {
            url: "/about/".to_string(),
            lastmod: None,
        };
        let xml = sitemap("", &[entry]);
        assert!(xml.contains("<loc>/about/</loc>"));
    }
}
