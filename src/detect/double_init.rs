//! Double-initialization checker.
//!
//! Tracks a two-state machine per handle identity: uninitialized and
//! initialized. `init` on an initialized handle is the defect; `destroy`
//! resets the handle, so `init; destroy; init` is clean. Nothing richer
//! (locked, poisoned, use-after-destroy) is modeled.

use indexmap::IndexMap;
use log::debug;
use smallvec::SmallVec;
use std::time::Instant;

use crate::report::{CheckReport, DefectKind, Diagnostic, DOUBLE_INIT_MSG, TOOL_NAME};
use crate::trace::{HandleId, LockOp, Trace};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum LockState {
    #[default]
    Uninitialized,
    Initialized,
}

#[derive(Clone, Debug, Default)]
struct HandleRecord {
    state: LockState,
    /// Init sites since the last reset; the first one is the call that
    /// put the handle into the initialized state.
    init_sites: SmallVec<[(usize, usize); 2]>,
}

pub struct DoubleInitDetector<'a> {
    trace: &'a Trace,
}

impl<'a> DoubleInitDetector<'a> {
    pub fn new(trace: &'a Trace) -> Self {
        Self { trace }
    }

    pub fn detect(&self) -> CheckReport {
        let start_time = Instant::now();
        let mut report = CheckReport::new(TOOL_NAME.to_string());

        // Insertion-ordered so diagnostics come out deterministically.
        let mut states: IndexMap<HandleId, HandleRecord> = IndexMap::new();

        for event in &self.trace.events {
            let record = states.entry(event.handle.clone()).or_default();
            match event.op {
                LockOp::Init => {
                    if record.state == LockState::Initialized {
                        let first = record
                            .init_sites
                            .first()
                            .copied()
                            .unwrap_or((event.line, event.column));
                        debug!(
                            "double init of `{}` at {}:{} (first at {}:{})",
                            event.handle, event.line, event.column, first.0, first.1
                        );
                        report.diagnostics.push(Diagnostic {
                            kind: DefectKind::DoubleInit,
                            file: self.trace.file.clone(),
                            line: event.line,
                            column: event.column,
                            message: DOUBLE_INIT_MSG.to_string(),
                            handle: event.handle.to_string(),
                            first_init_span: format!(
                                "{}:{}:{}",
                                self.trace.file, first.0, first.1
                            ),
                        });
                    } else {
                        record.state = LockState::Initialized;
                    }
                    record.init_sites.push((event.line, event.column));
                }
                LockOp::Destroy => {
                    record.state = LockState::Uninitialized;
                    record.init_sites.clear();
                }
            }
        }

        report.defect_count = report.diagnostics.len();
        report.has_defect = report.defect_count > 0;
        report.analysis_time = start_time.elapsed();
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::LockEvent;

    fn event(op: LockOp, handle: &str, line: usize) -> LockEvent {
        LockEvent {
            op,
            handle: HandleId::new(handle),
            callee: match op {
                LockOp::Init => "pthread_mutex_init".to_string(),
                LockOp::Destroy => "pthread_mutex_destroy".to_string(),
            },
            line,
            column: 2,
        }
    }

    fn trace(events: Vec<LockEvent>) -> Trace {
        Trace {
            file: "test.c".to_string(),
            events,
        }
    }

    #[test]
    fn single_init_is_clean() {
        let trace = trace(vec![event(LockOp::Init, "mutex", 6)]);
        let report = DoubleInitDetector::new(&trace).detect();
        assert!(!report.has_defect);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn second_init_warns_at_second_call() {
        let trace = trace(vec![
            event(LockOp::Init, "mutex", 6),
            event(LockOp::Init, "mutex", 7),
        ]);
        let report = DoubleInitDetector::new(&trace).detect();
        assert_eq!(report.defect_count, 1);
        let diag = &report.diagnostics[0];
        assert_eq!(diag.line, 7);
        assert_eq!(diag.message, DOUBLE_INIT_MSG);
        assert_eq!(diag.first_init_span, "test.c:6:2");
    }

    #[test]
    fn destroy_resets_the_handle() {
        let trace = trace(vec![
            event(LockOp::Init, "mutex", 6),
            event(LockOp::Destroy, "mutex", 7),
            event(LockOp::Init, "mutex", 8),
        ]);
        let report = DoubleInitDetector::new(&trace).detect();
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn distinct_handles_are_independent() {
        let trace = trace(vec![
            event(LockOp::Init, "m1", 6),
            event(LockOp::Init, "m2", 7),
        ]);
        let report = DoubleInitDetector::new(&trace).detect();
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn every_extra_init_warns_once() {
        let trace = trace(vec![
            event(LockOp::Init, "mutex", 5),
            event(LockOp::Init, "mutex", 6),
            event(LockOp::Init, "mutex", 7),
        ]);
        let report = DoubleInitDetector::new(&trace).detect();
        assert_eq!(report.defect_count, 2);
        assert_eq!(report.diagnostics[0].line, 6);
        assert_eq!(report.diagnostics[1].line, 7);
        // Both point back at the init that entered the initialized state.
        assert_eq!(report.diagnostics[1].first_init_span, "test.c:5:2");
    }

    #[test]
    fn destroy_of_uninitialized_handle_is_silent() {
        let trace = trace(vec![event(LockOp::Destroy, "mutex", 6)]);
        let report = DoubleInitDetector::new(&trace).detect();
        assert!(report.diagnostics.is_empty());
    }
}
