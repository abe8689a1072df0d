//! Draft gating.
//!
//! Content marked `draft = true` in its front matter is published only while
//! previewing. A production build (`BuildMode::Build`) drops it; `serve` and
//! `watch` keep it so authors can see work in progress.
//!
//! The mode is picked once per invocation, from `HASHPRESS_RUN_MODE` when set,
//! otherwise from the CLI subcommand.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Environment variable selecting the build mode.
pub const RUN_MODE_ENV: &str = "HASHPRESS_RUN_MODE";

#[derive(Error, Debug, PartialEq)]
#[error("unknown run mode '{0}' (expected build, serve or watch)")]
pub struct UnknownMode(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Production build: drafts are excluded.
    Build,
    Serve,
    Watch,
}

impl BuildMode {
    /// Read the mode from [`RUN_MODE_ENV`], falling back to `default` when unset.
    pub fn from_env(default: BuildMode) -> Result<BuildMode, UnknownMode> {
        match std::env::var(RUN_MODE_ENV) {
            Ok(value) if !value.trim().is_empty() => value.parse(),
            _ => Ok(default),
        }
    }

    pub fn includes_drafts(self) -> bool {
        self != BuildMode::Build
    }
}

impl FromStr for BuildMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "build" => Ok(BuildMode::Build),
            "serve" => Ok(BuildMode::Serve),
            "watch" => Ok(BuildMode::Watch),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuildMode::Build => "build",
            BuildMode::Serve => "serve",
            BuildMode::Watch => "watch",
        })
    }
}

/// Anything carrying an optional draft flag.
pub trait Draftable {
    fn draft(&self) -> Option<bool>;
}

/// Decide whether an item is published in `mode`.
///
/// Excluded only when the item is a draft *and* this is a production build.
/// A missing flag counts as not-a-draft.
pub fn should_include<T: Draftable + ?Sized>(item: &T, mode: BuildMode) -> bool {
    !(item.draft().unwrap_or(false) && !mode.includes_drafts())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Item(Option<bool>);

    impl Draftable for Item {
        fn draft(&self) -> Option<bool> {
            self.0
        }
    }

    #[test]
    fn draft_excluded_from_build() {
        assert!(!should_include(&Item(Some(true)), BuildMode::Build));
    }

    #[test]
    fn draft_included_while_serving() {
        assert!(should_include(&Item(Some(true)), BuildMode::Serve));
        assert!(should_include(&Item(Some(true)), BuildMode::Watch));
    }

    #[test]
    fn published_item_included_in_build() {
        assert!(should_include(&Item(Some(false)), BuildMode::Build));
    }

    #[test]
    fn missing_flag_is_not_a_draft() {
        assert!(should_include(&Item(None), BuildMode::Build));
        assert!(should_include(&Item(None), BuildMode::Serve));
    }

    #[test]
    fn parse_modes_case_insensitive() {
        assert_eq!("build".parse(), Ok(BuildMode::Build));
        assert_eq!(" Serve ".parse(), Ok(BuildMode::Serve));
        assert_eq!("WATCH".parse(), Ok(BuildMode::Watch));
    }

    #[test]
    fn parse_unknown_mode_is_error() {
        let err = "production".parse::<BuildMode>().unwrap_err();
        assert_eq!(err, UnknownMode("production".to_string()));
        assert!(err.to_string().contains("production"));
    }

    #[test]
    fn display_roundtrips() {
        for mode in [BuildMode::Build, BuildMode::Serve, BuildMode::Watch] {
            assert_eq!(mode.to_string().parse(), Ok(mode));
        }
    }
}
