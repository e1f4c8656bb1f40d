use serde::{Deserialize, Serialize};
use std::cell::RefCell;

thread_local! {
    static STATE: RefCell<CompilerCounters> = RefCell::new(CompilerCounters::default());
}

///
/// CompilerCounters
///
/// Point-in-time counter snapshot for observability surfaces. All
/// counters saturate instead of wrapping.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct CompilerCounters {
    pub compilations: u64,
    pub pre_exec_queries: u64,
    pub hoisted_assignments: u64,
    pub like_fast_paths: u64,
    pub array_expansions: u64,
    pub projection_indirections: u64,
}

pub(crate) fn with_state_mut<T>(f: impl FnOnce(&mut CompilerCounters) -> T) -> T {
    STATE.with(|state| f(&mut state.borrow_mut()))
}

pub(crate) fn report() -> CompilerCounters {
    STATE.with(|state| *state.borrow())
}

pub(crate) fn reset_all() {
    STATE.with(|state| *state.borrow_mut() = CompilerCounters::default());
}
