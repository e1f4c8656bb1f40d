//! Top-level compiler entry: lowers a query tree into a compound query
//! with rendered text, bindings, and collection-access sets.

use crate::{
    compound::{CompoundQuery, PreExecQuery},
    context::QueryContext,
    error::CompileError,
    fragment::{CompoundRenderer, query_result_variable},
    ir::NodeRef,
    lowering,
    obs::{self, MetricsEvent},
};
use arql_model::ModelRegistry;
use std::{
    collections::BTreeSet,
    sync::{Arc, atomic::AtomicBool},
};

///
/// CompileOptions
///

#[derive(Clone, Debug, Default)]
pub struct CompileOptions {
    /// Cooperative cancellation token, polled at pre-execution query
    /// boundaries. Aborting discards all partial output.
    pub cancellation: Option<Arc<AtomicBool>>,
}

impl CompileOptions {
    #[must_use]
    pub const fn new() -> Self {
        Self { cancellation: None }
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: Arc<AtomicBool>) -> Self {
        self.cancellation = Some(token);
        self
    }
}

/// Compile `root` against `registry` with default options.
pub fn compile(root: &NodeRef, registry: &ModelRegistry) -> Result<CompoundQuery, CompileError> {
    compile_with_options(root, registry, &CompileOptions::new())
}

/// Compile `root` against `registry`.
///
/// The output bundles the pre-execution queries in declaration order,
/// the main query, and the union of accessed collections. Compilation
/// is deterministic: the same tree and model yield identical text and
/// identical bindings modulo fresh-name allocation.
pub fn compile_with_options(
    root: &NodeRef,
    registry: &ModelRegistry,
    options: &CompileOptions,
) -> Result<CompoundQuery, CompileError> {
    let ctx = QueryContext::root(registry, options.cancellation.clone());

    let main_fragment = lowering::lower_query(root, &ctx)?;
    ctx.check_cancelled()?;

    let pending = ctx.take_pre_exec_queries();
    let mut renderer = CompoundRenderer::new();
    let mut read_collections = BTreeSet::new();
    let mut write_collections = BTreeSet::new();

    let mut pre_exec = Vec::with_capacity(pending.len());
    for entry in &pending {
        read_collections.extend(entry.fragment.read_collections().iter().cloned());
        write_collections.extend(entry.fragment.write_collections().iter().cloned());
        pre_exec.push(PreExecQuery {
            query: renderer.render(&entry.fragment),
            result_binding: entry
                .result_variable
                .as_ref()
                .map(|variable| renderer.result_name(variable)),
            validator: entry.validator.clone(),
        });
    }

    read_collections.extend(main_fragment.read_collections().iter().cloned());
    write_collections.extend(main_fragment.write_collections().iter().cloned());
    let main = renderer.render(&main_fragment);
    let result_binding = renderer.result_name(&query_result_variable("result"));

    obs::record(MetricsEvent::CompileFinished {
        pre_exec_count: pre_exec.len(),
    });

    Ok(CompoundQuery {
        pre_exec,
        main,
        result_binding,
        read_collections,
        write_collections,
    })
}
