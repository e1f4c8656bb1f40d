use crate::{
    MAX_SAFE_INTEGER,
    context::QueryContext,
    error::CompileError,
    frag,
    fragment::{self, QueryFragment},
    ir::{
        NodeRef, OrderClause, OrderDirection, QueryNode, Variable, simplify_booleans,
        substitute_variable,
    },
    lowering::{follow_edge_simple, lower},
    obs::{self, MetricsEvent, RewriteKind},
    rewrite,
};
use std::rc::Rc;

/// FOR/FILTER/SORT/LIMIT/LET/RETURN assembly.
#[expect(clippy::too_many_arguments)]
pub(super) fn lower_transform_list(
    list: &NodeRef,
    item_variable: &Variable,
    filter: Option<&NodeRef>,
    order_by: &[OrderClause],
    skip: u64,
    max_count: Option<u64>,
    inner: &NodeRef,
    ctx: &QueryContext,
) -> Result<QueryFragment, CompileError> {
    let (scope_ctx, item) = ctx.introduce_variable(item_variable)?;
    let mut block = Vec::new();

    // The list source is lowered in the outer scope; the item variable
    // is not visible to its own source.
    if let QueryNode::FollowEdge { side, source } = list.as_ref() {
        block.push(frag![
            "FOR ",
            &item,
            " IN ",
            follow_edge_simple(side, source, ctx)?
        ]);
        // dangling edges yield null targets
        block.push(frag!["FILTER ", &item, " != null"]);
    } else {
        block.push(frag!["FOR ", &item, " IN ", lower(list, ctx)?]);
    }

    if let Some(filter) = filter {
        let simplified = simplify_booleans(filter);
        if !matches!(simplified.as_ref(), QueryNode::ConstBool(true)) {
            block.push(frag!["FILTER ", lower(&simplified, &scope_ctx)?]);
        }
    }

    if !order_by.is_empty() {
        let mut clauses = Vec::with_capacity(order_by.len());
        for clause in order_by {
            let expression = lower(&clause.expression, &scope_ctx)?;
            clauses.push(match clause.direction {
                OrderDirection::Ascending => frag!["(", expression, ")"],
                OrderDirection::Descending => frag!["(", expression, ") DESC"],
            });
        }
        block.push(frag!["SORT ", fragment::join(clauses, ", ")]);
    }

    match (skip, max_count) {
        (0, Some(max)) => block.push(fragment::text(format!("LIMIT {max}"))),
        (skip, Some(max)) => block.push(fragment::text(format!("LIMIT {skip}, {max}"))),
        (skip, None) if skip > 0 => {
            block.push(fragment::text(format!("LIMIT {skip}, {MAX_SAFE_INTEGER}")));
        }
        _ => {}
    }

    // Projection indirection: bind a second item variable to the
    // re-fetched document so the engine defers materialization until
    // after limit/sort.
    let mut inner_node = Rc::clone(inner);
    let mut inner_ctx = scope_ctx;
    if applies_projection_indirection(list, item_variable, &inner_node, max_count, ctx)? {
        let projected = Variable::new(format!("{}Full", item_variable.label()));
        let (next_ctx, projected_frag) = inner_ctx.introduce_variable(&projected)?;
        block.push(frag![
            "LET ",
            &projected_frag,
            " = DOCUMENT(",
            &item,
            "._id)"
        ]);
        inner_node = substitute_variable(
            &inner_node,
            item_variable,
            &QueryNode::variable(projected),
        );
        inner_ctx = next_ctx;
        obs::record(MetricsEvent::RewriteApplied {
            kind: RewriteKind::ProjectionIndirection,
        });
    }

    // Assignments hoisted from the projection become LET lines between
    // LIMIT and RETURN.
    let (inner_node, let_lines, inner_ctx) = rewrite::hoist_assignments(&inner_node, &inner_ctx)?;
    block.extend(let_lines);
    block.push(frag!["RETURN ", lower(&inner_node, &inner_ctx)?]);

    Ok(frag!["(\n", fragment::indent(fragment::lines(block)), "\n)"])
}

fn applies_projection_indirection(
    list: &NodeRef,
    item_variable: &Variable,
    inner: &NodeRef,
    max_count: Option<u64>,
    ctx: &QueryContext,
) -> Result<bool, CompileError> {
    if max_count.is_none() {
        return Ok(false);
    }
    let QueryNode::Entities { entity_type } = list.as_ref() else {
        return Ok(false);
    };
    // An identity projection materializes the document either way.
    if matches!(inner.as_ref(), QueryNode::Variable(v) if v == item_variable) {
        return Ok(false);
    }

    Ok(ctx.registry().root_entity(entity_type)?.projection_indirection)
}
