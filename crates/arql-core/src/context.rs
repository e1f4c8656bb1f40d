//! Compilation context: the variable-scope map, the pre-execution
//! queue, and the cancellation hook.
//!
//! Contexts are value-cloned down the parent-to-child call chain, so a
//! sub-compilation can never leak scope entries back into its parent.
//! The pre-execution queue is the only state shared across the whole
//! compound query, via a reference-counted cell owned by one
//! single-threaded compilation.

use crate::{
    compound::QueryResultValidator,
    error::CompileError,
    fragment::{
        FragmentVariable, QueryFragment, QueryResultVariable, query_result_variable,
        variable as fragment_variable,
    },
    ir::{NodeRef, Variable},
    lowering,
    obs::{self, MetricsEvent},
};
use arql_model::ModelRegistry;
use std::{
    cell::RefCell,
    collections::BTreeMap,
    rc::Rc,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

///
/// ScopedVariable
///
/// What an IR variable resolves to in the current scope: a transient
/// query variable, or a cross-query result binding.
///

#[derive(Clone, Debug)]
pub(crate) enum ScopedVariable {
    Transient(FragmentVariable),
    QueryResult(QueryResultVariable),
}

impl ScopedVariable {
    fn to_fragment(&self) -> QueryFragment {
        match self {
            Self::Transient(v) => QueryFragment::from(v),
            Self::QueryResult(v) => QueryFragment::from(v),
        }
    }
}

///
/// PendingPreExecQuery
///
/// A pre-execution query that has been compiled but not yet rendered.
///

#[derive(Debug)]
pub(crate) struct PendingPreExecQuery {
    pub fragment: QueryFragment,
    pub result_variable: Option<QueryResultVariable>,
    pub validator: Option<QueryResultValidator>,
}

#[derive(Debug, Default)]
struct SharedState {
    pre_exec: Vec<PendingPreExecQuery>,
}

///
/// QueryContext
///
/// Bookkeeping for one compilation. Cloning is cheap and intentional:
/// each descent receives its own scope map while sharing the compound
/// query's pre-execution queue.
///

#[derive(Clone, Debug)]
pub struct QueryContext<'m> {
    registry: &'m ModelRegistry,
    variables: BTreeMap<u64, ScopedVariable>,
    shared: Rc<RefCell<SharedState>>,
    cancellation: Option<Arc<AtomicBool>>,
}

impl<'m> QueryContext<'m> {
    pub(crate) fn root(
        registry: &'m ModelRegistry,
        cancellation: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            registry,
            variables: BTreeMap::new(),
            shared: Rc::new(RefCell::new(SharedState::default())),
            cancellation,
        }
    }

    pub(crate) const fn registry(&self) -> &'m ModelRegistry {
        self.registry
    }

    /// Clone this context with `variable` mapped to a fresh transient
    /// fragment variable. Introducing the same identity twice is a
    /// compiler bug surfaced as `DoubleIntroduction`.
    pub(crate) fn introduce_variable(
        &self,
        variable: &Variable,
    ) -> Result<(Self, FragmentVariable), CompileError> {
        if self.variables.contains_key(&variable.id()) {
            return Err(CompileError::DoubleIntroduction {
                label: variable.label().to_string(),
            });
        }

        let fragment_var = fragment_variable(variable.label());
        let mut next = self.clone();
        next.variables.insert(
            variable.id(),
            ScopedVariable::Transient(fragment_var.clone()),
        );
        Ok((next, fragment_var))
    }

    /// Resolve `variable` in the current scope.
    pub(crate) fn get_variable(&self, variable: &Variable) -> Result<QueryFragment, CompileError> {
        self.variables
            .get(&variable.id())
            .map(ScopedVariable::to_fragment)
            .ok_or_else(|| CompileError::UnboundVariable {
                label: variable.label().to_string(),
            })
    }

    /// Fresh context for a pre-execution query: query-result bindings
    /// are inherited, the transient scope of the parent is hidden, and
    /// the pre-execution queue stays shared.
    pub(crate) fn new_pre_exec_context(&self) -> Self {
        let mut next = self.clone();
        next.variables
            .retain(|_, entry| matches!(entry, ScopedVariable::QueryResult(_)));
        next
    }

    /// Compile `query` as its own pre-execution query, append it to the
    /// queue, and (if `result_variable` is given) return a context with
    /// that variable bound to the query's result.
    pub(crate) fn add_pre_execute_query(
        &self,
        query: &NodeRef,
        result_variable: Option<&Variable>,
        validator: Option<QueryResultValidator>,
    ) -> Result<Self, CompileError> {
        self.check_cancelled()?;

        let pre_exec_context = self.new_pre_exec_context();
        let fragment = lowering::lower_query(query, &pre_exec_context)?;

        let result_var = result_variable.map(|v| query_result_variable(v.label()));
        self.shared.borrow_mut().pre_exec.push(PendingPreExecQuery {
            fragment,
            result_variable: result_var.clone(),
            validator,
        });
        obs::record(MetricsEvent::PreExecQueryAdded);

        match (result_variable, result_var) {
            (Some(variable), Some(result_var)) => {
                if self.variables.contains_key(&variable.id()) {
                    return Err(CompileError::DoubleIntroduction {
                        label: variable.label().to_string(),
                    });
                }
                let mut next = self.clone();
                next.variables
                    .insert(variable.id(), ScopedVariable::QueryResult(result_var));
                Ok(next)
            }
            _ => Ok(self.clone()),
        }
    }

    /// Drain the accumulated pre-execution queue (compound assembly).
    pub(crate) fn take_pre_exec_queries(&self) -> Vec<PendingPreExecQuery> {
        std::mem::take(&mut self.shared.borrow_mut().pre_exec)
    }

    /// Cooperative cancellation, polled at pre-execution boundaries.
    pub(crate) fn check_cancelled(&self) -> Result<(), CompileError> {
        match &self.cancellation {
            Some(token) if token.load(Ordering::Relaxed) => Err(CompileError::Cancelled),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::QueryContext;
    use crate::{error::CompileError, ir::Variable};
    use arql_model::ModelRegistry;
    use std::sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    };

    #[test]
    fn introduce_then_get_resolves() {
        let registry = ModelRegistry::new();
        let ctx = QueryContext::root(&registry, None);
        let var = Variable::new("item");

        let (ctx, _) = ctx.introduce_variable(&var).expect("fresh introduction");
        assert!(ctx.get_variable(&var).is_ok());
    }

    #[test]
    fn use_before_introduction_fails() {
        let registry = ModelRegistry::new();
        let ctx = QueryContext::root(&registry, None);
        let var = Variable::new("ghost");

        let err = ctx.get_variable(&var).unwrap_err();
        assert_eq!(
            err,
            CompileError::UnboundVariable {
                label: "ghost".to_string()
            }
        );
    }

    #[test]
    fn double_introduction_fails() {
        let registry = ModelRegistry::new();
        let ctx = QueryContext::root(&registry, None);
        let var = Variable::new("item");

        let (ctx, _) = ctx.introduce_variable(&var).expect("fresh introduction");
        let err = ctx.introduce_variable(&var).unwrap_err();
        assert_eq!(
            err,
            CompileError::DoubleIntroduction {
                label: "item".to_string()
            }
        );
    }

    #[test]
    fn same_label_is_a_distinct_identity() {
        let registry = ModelRegistry::new();
        let ctx = QueryContext::root(&registry, None);
        let first = Variable::new("item");
        let second = Variable::new("item");

        let (ctx, _) = ctx.introduce_variable(&first).expect("fresh introduction");
        let (ctx, _) = ctx.introduce_variable(&second).expect("distinct identity");
        assert!(ctx.get_variable(&first).is_ok());
        assert!(ctx.get_variable(&second).is_ok());
    }

    #[test]
    fn scope_entries_do_not_leak_into_parent() {
        let registry = ModelRegistry::new();
        let parent = QueryContext::root(&registry, None);
        let var = Variable::new("item");

        let (child, _) = parent.introduce_variable(&var).expect("fresh introduction");
        assert!(child.get_variable(&var).is_ok());
        assert!(parent.get_variable(&var).is_err());
    }

    #[test]
    fn pre_exec_context_hides_transient_scope() {
        let registry = ModelRegistry::new();
        let ctx = QueryContext::root(&registry, None);
        let var = Variable::new("item");

        let (ctx, _) = ctx.introduce_variable(&var).expect("fresh introduction");
        let pre_exec = ctx.new_pre_exec_context();
        assert!(pre_exec.get_variable(&var).is_err());
    }

    #[test]
    fn cancellation_token_is_polled() {
        let registry = ModelRegistry::new();
        let token = Arc::new(AtomicBool::new(false));
        let ctx = QueryContext::root(&registry, Some(Arc::clone(&token)));

        assert!(ctx.check_cancelled().is_ok());
        token.store(true, Ordering::Relaxed);
        assert_eq!(ctx.check_cancelled().unwrap_err(), CompileError::Cancelled);
    }
}
