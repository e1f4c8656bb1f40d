//! Query-tree compiler: a typed intermediate representation of queries
//! and the lowering pass converting it into a document/graph-database
//! query dialect with bound parameters, pre-execution transaction steps,
//! and read/write collection tracking.
//!
//! Compilation is synchronous, single-threaded per query, and free of
//! global mutable state; independent compilations may run in parallel.

pub mod compile;
pub mod compound;
pub mod context;
pub mod error;
pub mod fragment;
pub mod ir;
pub mod lowering;
pub mod obs;
pub mod rewrite;

///
/// CONSTANTS
///

/// Sentinel property carried by runtime-error objects. The executing
/// layer detects this key on result values and fails the operation.
pub const RUNTIME_ERROR_TOKEN: &str = "__arql_runtime_error";

/// Largest integer exactly representable in the dialect's number type;
/// used as the open upper bound for skip-only LIMIT clauses.
pub const MAX_SAFE_INTEGER: u64 = 9_007_199_254_740_991;

///
/// Prelude
///
/// Domain vocabulary only. No renderers, contexts, or helpers are
/// re-exported here.
///

pub mod prelude {
    pub use crate::{
        compile::{CompileOptions, compile, compile_with_options},
        compound::{CompoundQuery, PreExecQuery, QueryResultValidator, RenderedQuery},
        error::CompileError,
        ir::{
            BasicType, BinaryOperator, LanguageOperator, NodeRef, OrderClause, OrderDirection,
            Quantifier, QueryNode, UnaryOperator, Variable,
        },
    };
    pub use arql_model::{ModelRegistry, RootEntityModel};
}
