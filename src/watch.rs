//! Rebuild on change.
//!
//! Runs one build, then watches the content, style and static directories
//! (plus `config.toml`) and runs a full rebuild after every burst of changes.
//! A burst ends once no event has arrived for [`DEBOUNCE`]. Failed builds are
//! reported through the callback and the loop keeps going; the process ends
//! with Ctrl-C.

use crate::config::{self, ConfigError, SiteConfig};
use crate::drafts::BuildMode;
use crate::site::{self, BuildError, BuildReport};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Quiet period that ends a burst of file events.
pub const DEBOUNCE: Duration = Duration::from_millis(200);

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("File watcher error: {0}")]
    Notify(#[from] notify::Error),
    #[error("File watcher disconnected")]
    Disconnected,
}

/// Paths to watch for `config`: existing source directories, then `config.toml`.
pub fn watch_roots(config: &SiteConfig, root: &Path) -> Vec<(PathBuf, RecursiveMode)> {
    let dirs = config.resolve(root);
    let mut candidates = vec![dirs.input, dirs.static_files];
    if config.styles.enabled {
        candidates.extend(dirs.load_paths);
    }

    let mut roots: Vec<(PathBuf, RecursiveMode)> = Vec::new();
    for dir in candidates {
        if dir.is_dir() && !roots.iter().any(|(p, _)| p == &dir) {
            roots.push((dir, RecursiveMode::Recursive));
        }
    }
    let config_file = root.join("config.toml");
    if config_file.is_file() {
        roots.push((config_file, RecursiveMode::NonRecursive));
    }
    roots
}

/// Whether `event` should trigger a rebuild.
///
/// Access events are ignored, as are events confined to the output
/// directory, which the build itself writes.
pub fn triggers_rebuild(event: &Event, output_dir: &Path) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) && event.paths.iter().any(|p| !p.starts_with(output_dir))
}

/// Build once, then rebuild on every change until the watcher fails.
///
/// `on_build` receives the outcome of every build, including the first.
pub fn watch(
    root: &Path,
    mode: BuildMode,
    mut on_build: impl FnMut(Result<BuildReport, BuildError>),
) -> Result<(), WatchError> {
    let config = config::load_config(root)?;
    let output_dir = config.resolve(root).output;

    on_build(site::build_project(root, mode));

    let (tx, rx) = mpsc::channel();
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| {
            let _ = tx.send(res);
        },
        Config::default(),
    )?;

    for (path, recursive) in watch_roots(&config, root) {
        watcher.watch(&path, recursive)?;
        debug!(path = %path.display(), "watching");
    }
    info!(root = %root.display(), %mode, "watching for changes");

    loop {
        match rx.recv().map_err(|_| WatchError::Disconnected)? {
            Ok(event) if triggers_rebuild(&event, &output_dir) => {
                debug!(paths = ?event.paths, "change detected");
            }
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "file watcher reported an error");
                continue;
            }
        }

        // Let the burst settle.
        loop {
            match rx.recv_timeout(DEBOUNCE) {
                Ok(_) => {}
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return Err(WatchError::Disconnected),
            }
        }

        info!("rebuilding");
        on_build(site::build_project(root, mode));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write_files;
    use notify::event::{AccessKind, CreateKind, ModifyKind};
    use tempfile::TempDir;

    #[test]
    fn roots_include_existing_dirs_and_config() {
        let tmp = TempDir::new().unwrap();
        write_files(
            tmp.path(),
            &[
                ("config.toml", ""),
                ("content/index.md", ""),
                ("assets/scss/main.scss", ""),
            ],
        );
        let roots = watch_roots(&SiteConfig::default(), tmp.path());
        let paths: Vec<PathBuf> = roots.iter().map(|(p, _)| p.clone()).collect();
        assert_eq!(
            paths,
            vec![
                tmp.path().join("content"),
                tmp.path().join("assets/scss"),
                tmp.path().join("config.toml"),
            ]
        );
        assert_eq!(roots[2].1, RecursiveMode::NonRecursive);
    }

    #[test]
    fn style_dir_not_watched_when_disabled() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("assets/scss/main.scss", "")]);
        let mut config = SiteConfig::default();
        config.styles.enabled = false;
        assert!(watch_roots(&config, tmp.path()).is_empty());
    }

    #[test]
    fn rebuild_triggers() {
        let output = Path::new("/site/_site");
        let edit =
            Event::new(EventKind::Modify(ModifyKind::Any)).add_path("/site/content/a.md".into());
        assert!(triggers_rebuild(&edit, output));

        let create =
            Event::new(EventKind::Create(CreateKind::File)).add_path("/site/static/x.png".into());
        assert!(triggers_rebuild(&create, output));

        let read =
            Event::new(EventKind::Access(AccessKind::Any)).add_path("/site/content/a.md".into());
        assert!(!triggers_rebuild(&read, output));

        let own_output = Event::new(EventKind::Create(CreateKind::File))
            .add_path("/site/_site/index.html".into());
        assert!(!triggers_rebuild(&own_output, output));
    }
}
