//! Semantics-preserving rewrites over the IR.
//!
//! Assignment hoisting lives here; the LIKE analysis and the quantifier
//! array expansion are applied inline by the lowering rules they belong
//! to. All rewrites preserve observable results: extraction never moves
//! an assignment across a construct that could shadow a variable or
//! alter evaluation count.

use crate::{
    context::QueryContext,
    error::CompileError,
    frag,
    fragment::QueryFragment,
    ir::{NodeRef, extract_variable_assignments},
    lowering,
    obs::{self, MetricsEvent, RewriteKind},
};

/// Hoist `VariableAssignment` nodes that appear as direct values of
/// `node` into `LET` lines for the enclosing scope.
///
/// Returns the rewritten node, the `LET` lines in dependency order, and
/// the context extended with the introduced variables. This avoids
/// wrapping each nested value in a `FIRST(LET … RETURN …)` subquery.
pub(crate) fn hoist_assignments<'m>(
    node: &NodeRef,
    ctx: &QueryContext<'m>,
) -> Result<(NodeRef, Vec<QueryFragment>, QueryContext<'m>), CompileError> {
    let (rewritten, assignments) = extract_variable_assignments(node);

    let mut ctx = ctx.clone();
    let mut let_lines = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        // The value is lowered before its variable enters scope; later
        // assignments see all earlier ones.
        let value = lowering::lower(&assignment.value, &ctx)?;
        let (next_ctx, variable) = ctx.introduce_variable(&assignment.variable)?;
        ctx = next_ctx;
        let_lines.push(frag!["LET ", &variable, " = ", value]);
        obs::record(MetricsEvent::RewriteApplied {
            kind: RewriteKind::AssignmentHoist,
        });
    }

    Ok((rewritten, let_lines, ctx))
}
