//! Watch-and-recheck loop.
//!
//! Monitors the fixture's directory and re-runs the check pipeline when a
//! watched file changes. Successive outputs are rendered as a line diff
//! against the previous run, so an edit shows exactly which diagnostics
//! and mismatches appeared or went away.

use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::debug;
use notify::{DebouncedEvent, RecursiveMode, Watcher as _Watcher};
use similar::{ChangeTag, TextDiff};

const WATCHER_DELAY: Duration = Duration::from_millis(250);

const GREEN: &str = "\x1b[92m";
const RED: &str = "\x1b[91m";
const RESET: &str = "\x1b[0m";

/// Output memory across runs. Feeding it the latest rendering yields what
/// to print: the first run verbatim, later runs as a colored line diff
/// against the previous one (new lines green, dropped lines red).
#[derive(Debug, Default)]
pub struct WatchSession {
    last_output: Option<String>,
}

impl WatchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, output: &str) -> String {
        let rendered = match &self.last_output {
            None => output.to_string(),
            Some(last) => diff_lines(last, output),
        };
        self.last_output = Some(output.to_string());
        rendered
    }
}

fn diff_lines(last: &str, current: &str) -> String {
    let diff = TextDiff::from_lines(last, current);
    let mut colored = String::new();
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => {
                colored.push_str(GREEN);
                colored.push_str(change.value());
                colored.push_str(RESET);
            }
            ChangeTag::Delete => {
                colored.push_str(RED);
                colored.push_str(change.value());
                colored.push_str(RESET);
            }
            ChangeTag::Equal => colored.push_str(change.value()),
        }
    }
    colored
}

/// Only files ending in one of the watched suffixes trigger a re-check;
/// editor temp files and the report output stay inert.
pub fn matches_suffix(path: &Path, suffixes: &[String]) -> bool {
    let name = path.to_string_lossy();
    suffixes.iter().any(|suffix| name.ends_with(suffix.as_str()))
}

/// Run `recheck` once, then again on every relevant change under `dir`,
/// printing the diffed output each time. Returns only if the watcher
/// channel closes.
pub fn watch<F>(dir: &Path, suffixes: &[String], mut recheck: F) -> Result<()>
where
    F: FnMut() -> Result<String>,
{
    let mut session = WatchSession::new();
    print!("{}", session.record(&recheck()?));

    let (notify_sender, notify_receiver) = mpsc::channel();
    let mut watcher = notify::watcher(notify_sender, WATCHER_DELAY)
        .context("failed to spawn notify watcher")?;
    watcher
        .watch(dir, RecursiveMode::Recursive)
        .with_context(|| format!("failed to watch {:?}", dir))?;
    println!(
        "Watching {} (suffixes {:?}), Ctrl+C to stop...",
        dir.display(),
        suffixes
    );

    for event in notify_receiver {
        let path = match event {
            DebouncedEvent::Create(path) | DebouncedEvent::Write(path) => path,
            DebouncedEvent::Rename(_, dst) => dst,
            _ => continue,
        };
        if !matches_suffix(&path, suffixes) {
            debug!("skipping {:?}: suffix not watched", path);
            continue;
        }
        println!("\nChange detected: {}", path.display());
        match recheck() {
            Ok(output) => print!("{}", session.record(&output)),
            // Keep watching; the previous good output stays the baseline.
            Err(err) => println!("Check failed: {err:#}"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn suffixes() -> Vec<String> {
        vec![".c".to_string(), ".h".to_string()]
    }

    #[test]
    fn first_run_prints_verbatim() {
        let mut session = WatchSession::new();
        let out = session.record("test.c: 0 defects\n");
        assert_eq!(out, "test.c: 0 defects\n");
    }

    #[test]
    fn unchanged_output_stays_uncolored() {
        let mut session = WatchSession::new();
        session.record("test.c: 0 defects\n");
        let out = session.record("test.c: 0 defects\n");
        assert_eq!(out, "test.c: 0 defects\n");
    }

    #[test]
    fn new_line_is_green_dropped_line_is_red() {
        let mut session = WatchSession::new();
        session.record("old diagnostic\nshared line\n");
        let out = session.record("shared line\nnew diagnostic\n");
        assert!(out.contains("\x1b[91mold diagnostic\n\x1b[0m"));
        assert!(out.contains("\x1b[92mnew diagnostic\n\x1b[0m"));
        assert!(out.contains("shared line\n"));
        assert!(!out.contains("\x1b[92mshared line"));
        assert!(!out.contains("\x1b[91mshared line"));
    }

    #[test]
    fn suffix_filter() {
        assert!(matches_suffix(&PathBuf::from("/w/test.c"), &suffixes()));
        assert!(matches_suffix(&PathBuf::from("/w/lock.h"), &suffixes()));
        assert!(!matches_suffix(&PathBuf::from("/w/report.txt"), &suffixes()));
        assert!(!matches_suffix(&PathBuf::from("/w/test.c~"), &suffixes()));
    }
}
