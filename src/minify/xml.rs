//! Conservative XML minification.
//!
//! Only whitespace-only text in element-only content (and around the root
//! element) is removed. Elements with mixed content keep every byte of their
//! text, so `<b>this</b> <i>now</i>` stays two words. Attribute values,
//! text content, CDATA, processing instructions and (by default) comments are
//! written back exactly as read, so feeds and sitemaps keep their meaning.
//! Elements under `xml:space="preserve"` are left alone entirely.

use super::MinifyError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmlPolicy {
    pub collapse_whitespace: bool,
    pub keep_comments: bool,
}

impl XmlPolicy {
    pub const fn conservative() -> Self {
        Self {
            collapse_whitespace: true,
            keep_comments: true,
        }
    }
}

impl Default for XmlPolicy {
    fn default() -> Self {
        Self::conservative()
    }
}

/// Minify one XML document.
pub fn minify_xml(src: &str, policy: &XmlPolicy) -> Result<String, MinifyError> {
    let mut reader = Reader::from_str(src);
    let mut events = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Eof => break,
            event => events.push(event),
        }
    }

    let keep = keep_mask(&events, policy);
    let mut writer = Writer::new(Vec::with_capacity(src.len()));
    for (event, keep) in events.into_iter().zip(keep) {
        if keep {
            writer.write_event(event).map_err(quick_xml::Error::from)?;
        }
    }

    String::from_utf8(writer.into_inner()).map_err(|e| MinifyError::Utf8(e.utf8_error()))
}

fn keep_mask(events: &[Event<'_>], policy: &XmlPolicy) -> Vec<bool> {
    let mixed = mixed_content(events);
    let mut keep = Vec::with_capacity(events.len());
    // Open elements: index of the start event, and whether whitespace inside is significant.
    let mut open: Vec<(usize, bool)> = Vec::new();

    for (i, event) in events.iter().enumerate() {
        let preserving = open.last().is_some_and(|&(_, preserve)| preserve);
        let kept = match event {
            Event::Start(start) => {
                open.push((i, xml_space(start).unwrap_or(preserving)));
                true
            }
            Event::End(_) => {
                open.pop();
                true
            }
            Event::Text(text) if policy.collapse_whitespace && !preserving && is_blank(text) => {
                open.last().is_some_and(|&(start, _)| mixed[start])
            }
            Event::Comment(_) => policy.keep_comments,
            _ => true,
        };
        keep.push(kept);
    }
    keep
}

/// Per event index: for a start event, whether the element has mixed content
/// (non-blank text, CDATA or an entity reference as a direct child). Blank
/// text is only insignificant in element-only content and at the top level.
fn mixed_content(events: &[Event<'_>]) -> Vec<bool> {
    let mut mixed = vec![false; events.len()];
    let mut open: Vec<usize> = Vec::new();
    for (i, event) in events.iter().enumerate() {
        let has_text = match event {
            Event::Start(_) => {
                open.push(i);
                false
            }
            Event::End(_) => {
                open.pop();
                false
            }
            Event::Text(text) => !is_blank(text),
            Event::CData(_) | Event::GeneralRef(_) => true,
            _ => false,
        };
        if has_text {
            if let Some(&start) = open.last() {
                mixed[start] = true;
            }
        }
    }
    mixed
}

fn is_blank(text: &[u8]) -> bool {
    text.iter().all(u8::is_ascii_whitespace)
}

/// `Some(true)` for `xml:space="preserve"`, `Some(false)` for `"default"`.
fn xml_space(start: &BytesStart<'_>) -> Option<bool> {
    start
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"xml:space")
        .map(|attr| attr.value.as_ref() == b"preserve")
}
