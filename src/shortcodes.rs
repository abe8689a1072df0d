//! Template shortcodes.
//!
//! Content can call into the asset registry with `{% name args %}`:
//!
//! ```text
//! <link rel="preload" href="{% css %}" as="style">
//! {% asciinema "/casts/install.cast" theme="monokai" fontSize="big" loop=true %}
//! ```
//!
//! | Shortcode | Output |
//! |-----------|--------|
//! | `css`, `css_vendor`, `js`, `js_vendor` | resolved asset URL, or empty |
//! | `asciinema` / `player` | terminal-cast player container + init script |
//!
//! Arguments are bare words or quoted strings; `key=value` pairs become options.
//! Commas between arguments are allowed and ignored.

use crate::assets::AssetPaths;
use crate::styles::content_hash;
use maud::{PreEscaped, html};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

const OPEN: &str = "{%";
const CLOSE: &str = "%}";

/// Option keys always passed to the player as strings.
const STRING_OPTIONS: &[&str] = &["theme", "fontSize"];

#[derive(Error, Debug, PartialEq)]
pub enum ShortcodeError {
    #[error("unterminated shortcode starting at byte {0}")]
    Unterminated(usize),
    #[error("malformed shortcode '{0}'")]
    Malformed(String),
    #[error("unknown shortcode '{0}'")]
    Unknown(String),
    #[error("shortcode '{0}' requires a media URL argument")]
    MissingUrl(String),
}

/// One parsed `{% … %}` invocation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Shortcode {
    pub name: String,
    pub args: Vec<String>,
    pub options: BTreeMap<String, String>,
}

/// Replace every shortcode in `text` with its output.
pub fn expand(text: &str, assets: &AssetPaths) -> Result<String, ShortcodeError> {
    let mut out = String::with_capacity(text.len());
    expand_into(&mut out, text, 0, assets)?;
    Ok(out)
}

/// Expand `text` onto `out`. `offset` is the position of `text` in the
/// enclosing document, used in error positions.
pub fn expand_into(
    out: &mut String,
    text: &str,
    offset: usize,
    assets: &AssetPaths,
) -> Result<(), ShortcodeError> {
    let mut rest = text;
    let mut offset = offset;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];
        let end = after_open
            .find(CLOSE)
            .ok_or(ShortcodeError::Unterminated(offset + start))?;

        let shortcode = parse(&after_open[..end])?;
        out.push_str(&render(&shortcode, assets)?);

        let consumed = start + OPEN.len() + end + CLOSE.len();
        offset += consumed;
        rest = &rest[consumed..];
    }
    out.push_str(rest);
    Ok(())
}

/// Parse the inside of a `{% … %}` block.
pub fn parse(inner: &str) -> Result<Shortcode, ShortcodeError> {
    let malformed = || ShortcodeError::Malformed(inner.trim().to_string());
    let mut chars = inner.chars().peekable();
    let mut shortcode = Shortcode::default();

    loop {
        while chars.next_if(|c| c.is_whitespace() || *c == ',').is_some() {}
        let Some(&first) = chars.peek() else {
            break;
        };

        if first == '"' || first == '\'' {
            let value = read_quoted(&mut chars).ok_or_else(malformed)?;
            if shortcode.name.is_empty() {
                return Err(malformed());
            }
            shortcode.args.push(value);
            continue;
        }

        let mut word = String::new();
        while let Some(c) = chars.next_if(|c| !c.is_whitespace() && *c != '=' && *c != ',') {
            word.push(c);
        }

        if chars.next_if_eq(&'=').is_some() {
            if shortcode.name.is_empty() || word.is_empty() {
                return Err(malformed());
            }
            let value = match chars.peek() {
                Some('"') | Some('\'') => read_quoted(&mut chars).ok_or_else(malformed)?,
                _ => {
                    let mut value = String::new();
                    while let Some(c) = chars.next_if(|c| !c.is_whitespace() && *c != ',') {
                        value.push(c);
                    }
                    value
                }
            };
            shortcode.options.insert(word, value);
        } else if shortcode.name.is_empty() {
            shortcode.name = word;
        } else {
            shortcode.args.push(word);
        }
    }

    if shortcode.name.is_empty() {
        return Err(malformed());
    }
    Ok(shortcode)
}

fn read_quoted(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<String> {
    let quote = chars.next()?;
    let mut value = String::new();
    loop {
        match chars.next()? {
            '\\' => value.push(chars.next()?),
            c if c == quote => return Some(value),
            c => value.push(c),
        }
    }
}

fn render(shortcode: &Shortcode, assets: &AssetPaths) -> Result<String, ShortcodeError> {
    if let Some(path) = assets.lookup(&shortcode.name) {
        return Ok(path.to_string());
    }
    match shortcode.name.as_str() {
        "asciinema" | "player" => {
            let url = shortcode
                .args
                .first()
                .ok_or_else(|| ShortcodeError::MissingUrl(shortcode.name.clone()))?;
            Ok(embed_player(url, &shortcode.options))
        }
        other => Err(ShortcodeError::Unknown(other.to_string())),
    }
}

/// Markup for an embedded terminal-cast player.
///
/// Produces a container `<div>` plus a script handing it to the page-global
/// `AsciinemaPlayer`. The container id is derived from the URL (or taken from an
/// `id` option) so repeated builds emit identical markup. Remaining options are
/// forwarded to the player: `theme` and `fontSize` as strings, anything else
/// with `true`/`false` and numbers converted to JSON literals.
pub fn embed_player(url: &str, options: &BTreeMap<String, String>) -> String {
    let id = options
        .get("id")
        .cloned()
        .unwrap_or_else(|| format!("player-{}", &content_hash(url.as_bytes())[..12]));

    let player_options: serde_json::Map<String, Value> = options
        .iter()
        .filter(|(key, _)| key.as_str() != "id")
        .map(|(key, value)| (key.clone(), option_value(key, value)))
        .collect();

    let script = format!(
        "AsciinemaPlayer.create({}, document.getElementById({}), {});",
        Value::String(url.to_string()),
        Value::String(id.clone()),
        Value::Object(player_options),
    );

    html! {
        div.asciinema-player id=(id) {}
        script { (PreEscaped(script.replace("</", "<\\/"))) }
    }
    .into_string()
}

fn option_value(key: &str, raw: &str) -> Value {
    if STRING_OPTIONS.contains(&key) {
        return Value::String(raw.to_string());
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => raw
            .parse::<i64>()
            .map(Value::from)
            .ok()
            .or_else(|| {
                raw.parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
            })
            .unwrap_or_else(|| Value::String(raw.to_string())),
    }
}
