//! Fixture front end.
//!
//! Reads a C-like source fixture and extracts two things: the ordered
//! trace of lock-lifecycle calls, and the expectation annotations that
//! make the fixture self-checking (`// no-warning`,
//! `// expected-warning{{TEXT}}`). Only the callee name and the first
//! argument's identifier matter; the real pthread semantics never do.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::CalleeMatcher;
use crate::expect::ExpectationSet;
use crate::trace::{HandleId, LockEvent, Trace};

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{file}:{line}: unterminated expected-warning annotation")]
    UnterminatedAnnotation { file: String, line: usize },
}

/// A call argument only counts when the identifier is directly followed
/// by `,` or `)`; that skips prototypes, where the first token after the
/// parenthesis is a type name.
static CALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?P<callee>[A-Za-z_][A-Za-z0-9_]*)\s*\(\s*(?P<arg>[&*]*[A-Za-z_][A-Za-z0-9_]*)\s*[,)]",
    )
    .unwrap()
});
static NO_WARNING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"//\s*no-warning\b").unwrap());
static EXPECTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"expected-warning\{\{(?P<msg>.*?)\}\}").unwrap());
const EXPECTED_OPEN: &str = "expected-warning{{";

/// Parsed fixture: the event trace plus its annotation-derived oracle.
#[derive(Clone, Debug)]
pub struct Fixture {
    pub trace: Trace,
    pub expectations: ExpectationSet,
}

pub fn load(path: impl AsRef<Path>, matcher: &CalleeMatcher) -> Result<Fixture, FixtureError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse(&path.display().to_string(), &source, matcher)
}

pub fn parse(
    file: &str,
    source: &str,
    matcher: &CalleeMatcher,
) -> Result<Fixture, FixtureError> {
    let mut trace = Trace::new(file);
    let mut expectations = ExpectationSet::new();

    for (idx, raw) in source.lines().enumerate() {
        let line = idx + 1;

        // Calls live before the first comment marker; annotations after it.
        let code = raw.split("//").next().unwrap_or(raw);
        for caps in CALL_RE.captures_iter(code) {
            let callee = &caps["callee"];
            let Some(op) = matcher.classify(callee) else {
                continue;
            };
            let column = caps.get(0).map(|m| m.start() + 1).unwrap_or(1);
            let handle = caps["arg"].trim_start_matches(['&', '*']);
            debug!("{}:{}: {} {}({})", file, line, op, callee, handle);
            trace.events.push(LockEvent {
                op,
                handle: HandleId::new(handle),
                callee: callee.to_string(),
                line,
                column,
            });
        }

        let matched = EXPECTED_RE
            .captures_iter(raw)
            .map(|caps| caps["msg"].to_string())
            .collect::<Vec<_>>();
        if raw.matches(EXPECTED_OPEN).count() > matched.len() {
            return Err(FixtureError::UnterminatedAnnotation {
                file: file.to_string(),
                line,
            });
        }
        for msg in matched {
            expectations.expect_message(line, msg);
        }
        if NO_WARNING_RE.is_match(raw) {
            expectations.expect_clean(line);
        }
    }

    debug!(
        "{}: {} lock events, {} annotated lines",
        file,
        trace.events.len(),
        expectations.len()
    );
    Ok(Fixture {
        trace,
        expectations,
    })
}
