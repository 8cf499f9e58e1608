//! Structured diagnostic expectations and the comparison oracle.
//!
//! A fixture's annotation comments compile into an [`ExpectationSet`]:
//! per-line expected messages plus explicit zero assertions. Verification
//! is strict: every emitted diagnostic must be matched by an expectation,
//! and every expectation must be met. An empty mismatch list is a pass.

use itertools::Itertools;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::report::Diagnostic;

/// Per-line expected diagnostics for one fixture.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ExpectationSet {
    /// line -> expected messages, in annotation order.
    expected: BTreeMap<usize, Vec<String>>,
    /// Lines asserted to yield no diagnostic at all.
    clean: BTreeSet<usize>,
}

impl ExpectationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect exactly one diagnostic with this message on `line`, in
    /// addition to any already expected there.
    pub fn expect_message(&mut self, line: usize, message: impl Into<String>) {
        self.expected.entry(line).or_default().push(message.into());
    }

    /// Assert that `line` yields zero diagnostics.
    pub fn expect_clean(&mut self, line: usize) {
        self.clean.insert(line);
    }

    /// Number of annotated lines.
    pub fn len(&self) -> usize {
        self.expected.len() + self.clean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expected.is_empty() && self.clean.is_empty()
    }

    /// Compare expectations against the diagnostics the checker actually
    /// produced. Mismatches come back ordered by line.
    pub fn verify(&self, diagnostics: &[Diagnostic]) -> Vec<Mismatch> {
        let mut actual: BTreeMap<usize, Vec<&Diagnostic>> = BTreeMap::new();
        for diag in diagnostics {
            actual.entry(diag.line).or_default().push(diag);
        }

        let lines: Vec<usize> = self
            .expected
            .keys()
            .chain(self.clean.iter())
            .chain(actual.keys())
            .copied()
            .sorted()
            .dedup()
            .collect();

        let mut mismatches = Vec::new();
        for line in lines {
            let mut got: Vec<&Diagnostic> =
                actual.get(&line).map(|v| v.clone()).unwrap_or_default();

            if self.clean.contains(&line) {
                for diag in got {
                    mismatches.push(Mismatch::UnexpectedDiagnostic {
                        line,
                        message: diag.message.clone(),
                    });
                }
                continue;
            }

            let mut wanted: Vec<&String> = self
                .expected
                .get(&line)
                .map(|v| v.iter().collect())
                .unwrap_or_default();

            // Exact matches pair off first, then leftovers pair up as
            // wrong-text mismatches so a single typo reads as one failure.
            wanted.retain(|want| {
                if let Some(pos) = got.iter().position(|diag| diag.message == **want) {
                    got.remove(pos);
                    false
                } else {
                    true
                }
            });
            let mut wanted = wanted.into_iter();
            let mut got = got.into_iter();
            loop {
                match (wanted.next(), got.next()) {
                    (Some(want), Some(diag)) => mismatches.push(Mismatch::WrongMessage {
                        line,
                        expected: want.clone(),
                        actual: diag.message.clone(),
                    }),
                    (Some(want), None) => mismatches.push(Mismatch::MissingDiagnostic {
                        line,
                        message: want.clone(),
                    }),
                    (None, Some(diag)) => mismatches.push(Mismatch::UnexpectedDiagnostic {
                        line,
                        message: diag.message.clone(),
                    }),
                    (None, None) => break,
                }
            }
        }
        mismatches
    }
}

/// One way the checker's output can disagree with the fixture's
/// annotations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Mismatch {
    UnexpectedDiagnostic { line: usize, message: String },
    MissingDiagnostic { line: usize, message: String },
    WrongMessage { line: usize, expected: String, actual: String },
}

impl Mismatch {
    pub fn line(&self) -> usize {
        match self {
            Mismatch::UnexpectedDiagnostic { line, .. }
            | Mismatch::MissingDiagnostic { line, .. }
            | Mismatch::WrongMessage { line, .. } => *line,
        }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::UnexpectedDiagnostic { line, message } => {
                write!(f, "line {}: unexpected diagnostic: {}", line, message)
            }
            Mismatch::MissingDiagnostic { line, message } => {
                write!(f, "line {}: expected diagnostic not emitted: {}", line, message)
            }
            Mismatch::WrongMessage {
                line,
                expected,
                actual,
            } => write!(
                f,
                "line {}: expected {:?}, got {:?}",
                line, expected, actual
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{DefectKind, DOUBLE_INIT_MSG};

    fn diag(line: usize, message: &str) -> Diagnostic {
        Diagnostic {
            kind: DefectKind::DoubleInit,
            file: "test.c".to_string(),
            line,
            column: 2,
            message: message.to_string(),
            handle: "mutex".to_string(),
            first_init_span: "test.c:6:2".to_string(),
        }
    }

    #[test]
    fn exact_match_passes() {
        let mut set = ExpectationSet::new();
        set.expect_clean(6);
        set.expect_message(7, DOUBLE_INIT_MSG);
        let mismatches = set.verify(&[diag(7, DOUBLE_INIT_MSG)]);
        assert!(mismatches.is_empty());
    }

    #[test]
    fn diagnostic_on_clean_line_fails() {
        let mut set = ExpectationSet::new();
        set.expect_clean(6);
        let mismatches = set.verify(&[diag(6, DOUBLE_INIT_MSG)]);
        assert_eq!(
            mismatches,
            vec![Mismatch::UnexpectedDiagnostic {
                line: 6,
                message: DOUBLE_INIT_MSG.to_string(),
            }]
        );
    }

    #[test]
    fn missing_diagnostic_fails() {
        let mut set = ExpectationSet::new();
        set.expect_message(7, DOUBLE_INIT_MSG);
        let mismatches = set.verify(&[]);
        assert_eq!(
            mismatches,
            vec![Mismatch::MissingDiagnostic {
                line: 7,
                message: DOUBLE_INIT_MSG.to_string(),
            }]
        );
    }

    #[test]
    fn wrong_text_is_one_mismatch() {
        let mut set = ExpectationSet::new();
        set.expect_message(7, DOUBLE_INIT_MSG);
        let mismatches = set.verify(&[diag(7, "This lock is fine")]);
        assert_eq!(
            mismatches,
            vec![Mismatch::WrongMessage {
                line: 7,
                expected: DOUBLE_INIT_MSG.to_string(),
                actual: "This lock is fine".to_string(),
            }]
        );
    }

    #[test]
    fn unannotated_diagnostic_fails() {
        let set = ExpectationSet::new();
        let mismatches = set.verify(&[diag(12, DOUBLE_INIT_MSG)]);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].line(), 12);
    }

    #[test]
    fn surplus_diagnostic_on_annotated_line_fails() {
        let mut set = ExpectationSet::new();
        set.expect_message(7, DOUBLE_INIT_MSG);
        let mismatches = set.verify(&[diag(7, DOUBLE_INIT_MSG), diag(7, DOUBLE_INIT_MSG)]);
        assert_eq!(
            mismatches,
            vec![Mismatch::UnexpectedDiagnostic {
                line: 7,
                message: DOUBLE_INIT_MSG.to_string(),
            }]
        );
    }
}
