//! Metrics sink boundary.
//!
//! This module is the only bridge between compilation logic and the
//! thread-local metrics state. Tests and embedders can reroute events
//! through a scoped sink override.

use crate::obs::metrics::{self, CompilerCounters};
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = const { RefCell::new(None) };
}

///
/// RewriteKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RewriteKind {
    AssignmentHoist,
    LikeFastPath,
    ArrayExpansion,
    ProjectionIndirection,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    CompileFinished { pre_exec_count: usize },
    PreExecQueryAdded,
    RewriteApplied { kind: RewriteKind },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default thread-local sink that writes into the counter state. Acts
/// as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::CompileFinished { .. } => metrics::with_state_mut(|m| {
                m.compilations = m.compilations.saturating_add(1);
            }),
            MetricsEvent::PreExecQueryAdded => metrics::with_state_mut(|m| {
                m.pre_exec_queries = m.pre_exec_queries.saturating_add(1);
            }),
            MetricsEvent::RewriteApplied { kind } => metrics::with_state_mut(|m| {
                let counter = match kind {
                    RewriteKind::AssignmentHoist => &mut m.hoisted_assignments,
                    RewriteKind::LikeFastPath => &mut m.like_fast_paths,
                    RewriteKind::ArrayExpansion => &mut m.array_expansions,
                    RewriteKind::ProjectionIndirection => &mut m.projection_indirections,
                };
                *counter = counter.saturating_add(1);
            }),
        }
    }
}

pub(crate) fn record(event: MetricsEvent) {
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    if let Some(sink) = sink {
        sink.record(event);
    } else {
        GlobalMetricsSink.record(event);
    }
}

/// Run a closure with a temporary metrics sink override. The previous
/// sink is restored on all exits, including unwind.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let previous = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = previous;
            });
        }
    }

    let previous = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(previous);

    f()
}

/// Snapshot the current counter state.
#[must_use]
pub fn metrics_report() -> CompilerCounters {
    metrics::report()
}

/// Reset all counter state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        cell::Cell,
        panic::{AssertUnwindSafe, catch_unwind},
    };

    struct CountingSink {
        calls: Cell<usize>,
    }

    impl MetricsSink for CountingSink {
        fn record(&self, _: MetricsEvent) {
            self.calls.set(self.calls.get() + 1);
        }
    }

    #[test]
    fn with_metrics_sink_routes_and_restores_nested_overrides() {
        SINK_OVERRIDE.with(|cell| {
            *cell.borrow_mut() = None;
        });

        let outer = Rc::new(CountingSink {
            calls: Cell::new(0),
        });
        let inner = Rc::new(CountingSink {
            calls: Cell::new(0),
        });

        with_metrics_sink(Rc::clone(&outer) as Rc<dyn MetricsSink>, || {
            record(MetricsEvent::PreExecQueryAdded);
            assert_eq!(outer.calls.get(), 1);
            assert_eq!(inner.calls.get(), 0);

            with_metrics_sink(Rc::clone(&inner) as Rc<dyn MetricsSink>, || {
                record(MetricsEvent::PreExecQueryAdded);
            });

            // Inner override was restored to the outer override.
            record(MetricsEvent::PreExecQueryAdded);
        });

        assert_eq!(outer.calls.get(), 2);
        assert_eq!(inner.calls.get(), 1);

        SINK_OVERRIDE.with(|cell| {
            assert!(cell.borrow().is_none());
        });
    }

    #[test]
    fn with_metrics_sink_restores_override_on_panic() {
        SINK_OVERRIDE.with(|cell| {
            *cell.borrow_mut() = None;
        });

        let sink = Rc::new(CountingSink {
            calls: Cell::new(0),
        });

        let panicked = catch_unwind(AssertUnwindSafe(|| {
            with_metrics_sink(Rc::clone(&sink) as Rc<dyn MetricsSink>, || {
                record(MetricsEvent::PreExecQueryAdded);
                panic!("intentional panic for guard test");
            });
        }))
        .is_err();
        assert!(panicked);
        assert_eq!(sink.calls.get(), 1);

        // Guard restored the slot after unwind.
        SINK_OVERRIDE.with(|cell| {
            assert!(cell.borrow().is_none());
        });
    }

    #[test]
    fn global_sink_accumulates_counters() {
        metrics_reset_all();

        record(MetricsEvent::CompileFinished { pre_exec_count: 2 });
        record(MetricsEvent::RewriteApplied {
            kind: RewriteKind::LikeFastPath,
        });
        record(MetricsEvent::RewriteApplied {
            kind: RewriteKind::ArrayExpansion,
        });

        let report = metrics_report();
        assert_eq!(report.compilations, 1);
        assert_eq!(report.like_fast_paths, 1);
        assert_eq!(report.array_expansions, 1);
        assert_eq!(report.projection_indirections, 0);

        metrics_reset_all();
        assert_eq!(metrics_report(), CompilerCounters::default());
    }
}
