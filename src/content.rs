//! Content ingestion.
//!
//! Walks the input directory for markdown files and splits each into TOML
//! front matter and body:
//!
//! ```text
//! +++
//! title = "Installing"
//! draft = true
//! date = 2024-03-01
//! +++
//! # Installing
//! …
//! ```
//!
//! The front matter block is optional. Output locations follow the directory
//! layout, with every page written as an `index.html`:
//!
//! | Source | Output | URL |
//! |--------|--------|-----|
//! | `index.md` | `index.html` | `/` |
//! | `about.md` | `about/index.html` | `/about/` |
//! | `docs/index.md` | `docs/index.html` | `/docs/` |
//! | `docs/install.md` | `docs/install/index.html` | `/docs/install/` |

use crate::drafts::Draftable;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

const DELIMITER: &str = "+++";

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Cannot walk content directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Invalid front matter in {path}: {source}")]
    FrontMatter {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Front matter in {0} is missing its closing '+++'")]
    UnterminatedFrontMatter(PathBuf),
    #[error("{first} and {second} both render to {output}")]
    DuplicateOutput {
        output: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },
}

/// Front matter of one content file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub draft: Option<bool>,
    pub date: Option<toml::value::Datetime>,
    /// Keys with no built-in meaning.
    #[serde(skip)]
    pub extra: toml::Table,
}

impl FrontMatter {
    const KNOWN_KEYS: [&'static str; 3] = ["title", "draft", "date"];

    fn parse(src: &str) -> Result<FrontMatter, toml::de::Error> {
        let mut front: FrontMatter = toml::from_str(src)?;
        let mut extra: toml::Table = toml::from_str(src)?;
        for key in Self::KNOWN_KEYS {
            extra.remove(key);
        }
        front.extra = extra;
        Ok(front)
    }
}

/// One markdown file from the input directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    pub source_path: PathBuf,
    /// Path relative to the input directory, e.g. `docs/install.md`.
    pub rel_path: PathBuf,
    pub front: FrontMatter,
    pub body: String,
}

impl Draftable for ContentItem {
    fn draft(&self) -> Option<bool> {
        self.front.draft
    }
}

impl ContentItem {
    /// Read and parse one file.
    pub fn load(input_dir: &Path, source_path: &Path) -> Result<ContentItem, ContentError> {
        let text = fs::read_to_string(source_path).map_err(|source| ContentError::Io {
            path: source_path.to_path_buf(),
            source,
        })?;
        let (front, body) = parse_document(source_path, &text)?;
        let rel_path = source_path
            .strip_prefix(input_dir)
            .unwrap_or(source_path)
            .to_path_buf();
        Ok(ContentItem {
            source_path: source_path.to_path_buf(),
            rel_path,
            front,
            body: body.to_string(),
        })
    }

    /// Front matter title, else the first `# ` heading, else the file stem.
    pub fn title(&self) -> String {
        if let Some(title) = &self.front.title {
            return title.clone();
        }
        self.body
            .lines()
            .find(|line| line.starts_with("# "))
            .map(|line| line.trim_start_matches("# ").trim().to_string())
            .unwrap_or_else(|| {
                self.rel_path
                    .file_stem()
                    .map(|s| s.to_string_lossy().replace('-', " "))
                    .unwrap_or_default()
            })
    }

    /// Directory segments of the page, e.g. `["docs", "install"]`; empty for the root index.
    fn segments(&self) -> Vec<String> {
        let mut segments: Vec<String> = self
            .rel_path
            .parent()
            .into_iter()
            .flat_map(|p| p.components())
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let stem = self
            .rel_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if stem != "index" {
            segments.push(stem);
        }
        segments
    }

    /// Output file relative to the output directory.
    pub fn output_rel_path(&self) -> PathBuf {
        let mut path: PathBuf = self.segments().iter().collect();
        path.push("index.html");
        path
    }

    /// Root-relative URL with a trailing slash.
    pub fn url(&self) -> String {
        let segments = self.segments();
        if segments.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", segments.join("/"))
        }
    }
}

/// Split `text` into front matter and body.
///
/// Files without a leading `+++` line have default front matter and the whole
/// text as body.
pub fn parse_document<'a>(
    path: &Path,
    text: &'a str,
) -> Result<(FrontMatter, &'a str), ContentError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let Some(rest) = text
        .strip_prefix(DELIMITER)
        .filter(|rest| rest.starts_with('\n') || rest.starts_with("\r\n"))
    else {
        return Ok((FrontMatter::default(), text));
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        // The first piece is the remainder of the opening delimiter line.
        if offset > 0 && line.trim_end() == DELIMITER {
            let front =
                FrontMatter::parse(&rest[..offset]).map_err(|source| ContentError::FrontMatter {
                    path: path.to_path_buf(),
                    source,
                })?;
            return Ok((front, &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    Err(ContentError::UnterminatedFrontMatter(path.to_path_buf()))
}

/// Collect every `.md` file under `input_dir`, sorted by path.
///
/// Hidden files and directories are skipped. A missing input directory yields
/// no content. Two files rendering to the same output (`docs.md` and
/// `docs/index.md`) are an error, drafts included.
pub fn collect(input_dir: &Path) -> Result<Vec<ContentItem>, ContentError> {
    if !input_dir.exists() {
        warn!(dir = %input_dir.display(), "content directory does not exist, no pages to render");
        return Ok(Vec::new());
    }

    let mut items = Vec::new();
    let walker = WalkDir::new(input_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));
    for entry in walker {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file() && is_markdown(path) {
            items.push(ContentItem::load(input_dir, path)?);
        }
    }

    check_unique_outputs(&items)?;
    debug!(dir = %input_dir.display(), count = items.len(), "collected content");
    Ok(items)
}

fn check_unique_outputs(items: &[ContentItem]) -> Result<(), ContentError> {
    let mut seen: HashMap<PathBuf, &Path> = HashMap::with_capacity(items.len());
    for item in items {
        let output = item.output_rel_path();
        if let Some(first) = seen.get(&output) {
            return Err(ContentError::DuplicateOutput {
                output,
                first: first.to_path_buf(),
                second: item.source_path.clone(),
            });
        }
        seen.insert(output, &item.source_path);
    }
    Ok(())
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("md"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drafts::{BuildMode, should_include};
    use crate::test_helpers::write_files;
    use tempfile::TempDir;

    fn item(rel: &str) -> ContentItem {
        ContentItem {
            source_path: PathBuf::from("/site/content").join(rel),
            rel_path: PathBuf::from(rel),
            front: FrontMatter::default(),
            body: String::new(),
        }
    }

    // =========================================================================
    // Front matter
    // =========================================================================

    #[test]
    fn parses_front_matter() {
        let text = concat!(
            "+++\ntitle = \"Hello\"\ndraft = true\n",
            "date = 2024-03-01\nauthor = \"sam\"\n+++\n# Body\n"
        );
        let (front, body) = parse_document(Path::new("a.md"), text).unwrap();
        assert_eq!(front.title.as_deref(), Some("Hello"));
        assert_eq!(front.draft, Some(true));
        assert_eq!(front.date.map(|d| d.to_string()).as_deref(), Some("2024-03-01"));
        assert_eq!(front.extra.get("author").and_then(|v| v.as_str()), Some("sam"));
        assert!(!front.extra.contains_key("draft"));
        assert_eq!(body, "# Body\n");
    }

    #[test]
    fn no_front_matter() {
        let (front, body) = parse_document(Path::new("a.md"), "# Just text\n").unwrap();
        assert_eq!(front, FrontMatter::default());
        assert_eq!(body, "# Just text\n");
    }

    #[test]
    fn crlf_delimiters() {
        let text = "+++\r\ndraft = false\r\n+++\r\nbody";
        let (front, body) = parse_document(Path::new("a.md"), text).unwrap();
        assert_eq!(front.draft, Some(false));
        assert_eq!(body, "body");
    }

    #[test]
    fn plus_signs_in_text_are_not_front_matter() {
        let (front, body) = parse_document(Path::new("a.md"), "+++ not a delimiter\n").unwrap();
        assert_eq!(front, FrontMatter::default());
        assert_eq!(body, "+++ not a delimiter\n");
    }

    #[test]
    fn unterminated_front_matter_is_error() {
        let err = parse_document(Path::new("a.md"), "+++\ntitle = \"x\"\n").unwrap_err();
        assert!(matches!(err, ContentError::UnterminatedFrontMatter(_)));
    }

    #[test]
    fn invalid_toml_names_file() {
        let err = parse_document(Path::new("posts/bad.md"), "+++\ntitle = \n+++\n").unwrap_err();
        assert!(err.to_string().contains("posts/bad.md"));
    }

    // =========================================================================
    // Paths
    // =========================================================================

    #[test]
    fn output_paths_and_urls() {
        assert_eq!(item("index.md").output_rel_path(), PathBuf::from("index.html"));
        assert_eq!(item("index.md").url(), "/");
        assert_eq!(item("about.md").output_rel_path(), PathBuf::from("about/index.html"));
        assert_eq!(item("about.md").url(), "/about/");
        assert_eq!(item("docs/index.md").url(), "/docs/");
        assert_eq!(
            item("docs/install.md").output_rel_path(),
            PathBuf::from("docs/install/index.html")
        );
        assert_eq!(item("docs/install.md").url(), "/docs/install/");
    }

    #[test]
    fn title_fallbacks() {
        let mut page = item("getting-started.md");
        assert_eq!(page.title(), "getting started");
        page.body = "intro\n# Getting Started\n".to_string();
        assert_eq!(page.title(), "Getting Started");
        page.front.title = Some("Custom".to_string());
        assert_eq!(page.title(), "Custom");
    }

    // =========================================================================
    // Collection
    // =========================================================================

    #[test]
    fn collects_markdown_sorted() {
        let tmp = TempDir::new().unwrap();
        write_files(
            tmp.path(),
            &[
                ("b.md", "b"),
                ("a.md", "a"),
                ("docs/install.md", "+++\ndraft = true\n+++\ninstall"),
                ("notes.txt", "ignored"),
                (".hidden/secret.md", "ignored"),
            ],
        );
        let items = collect(tmp.path()).unwrap();
        let rels: Vec<_> = items.iter().map(|i| i.rel_path.to_string_lossy().to_string()).collect();
        assert_eq!(rels, vec!["a.md", "b.md", "docs/install.md"]);
        assert!(should_include(&items[0], BuildMode::Build));
        assert!(!should_include(&items[2], BuildMode::Build));
        assert!(should_include(&items[2], BuildMode::Serve));
    }

    #[test]
    fn colliding_outputs_rejected() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("docs.md", "# A"), ("docs/index.md", "# B")]);
        let err = collect(tmp.path()).unwrap_err();
        match &err {
            ContentError::DuplicateOutput {
                output,
                first,
                second,
            } => {
                assert_eq!(output, &PathBuf::from("docs/index.html"));
                let mut sources = vec![first.clone(), second.clone()];
                sources.sort();
                assert_eq!(
                    sources,
                    vec![tmp.path().join("docs.md"), tmp.path().join("docs/index.md")]
                );
            }
            other => panic!("expected DuplicateOutput, got {other:?}"),
        }
        let message = err.to_string();
        assert!(message.contains("docs.md") && message.contains("docs/index.md"));
    }

    #[test]
    fn missing_input_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(collect(&tmp.path().join("content")).unwrap().is_empty());
    }
}
