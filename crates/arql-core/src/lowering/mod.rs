//! Lowering pass: exhaustive dispatch over the node family producing
//! dialect fragments. Handlers are pure functions of `(node, context)`;
//! every rewrite applied here preserves observable results.

mod binary_op;
mod mutation;
mod quantifier;
mod search;
mod transform_list;

#[cfg(test)]
mod tests;

use crate::{
    RUNTIME_ERROR_TOKEN,
    context::QueryContext,
    error::CompileError,
    frag,
    fragment::{self, CollectionAccess, QueryFragment},
    ir::{BasicType, NodeRef, QueryNode, UnaryOperator},
    rewrite,
};
use arql_model::naming::is_safe_identifier;
use serde_json::json;
use std::rc::Rc;

/// Lower a node in expression position.
pub(crate) fn lower(node: &NodeRef, ctx: &QueryContext) -> Result<QueryFragment, CompileError> {
    match node.as_ref() {
        // value nodes
        QueryNode::Literal(v) => {
            if v.is_object() {
                return Err(CompileError::malformed(
                    "literal nodes hold JSON scalars or arrays, not objects",
                ));
            }
            Ok(fragment::value(v.clone()))
        }
        QueryNode::ConstBool(b) => Ok(fragment::text(if *b { "true" } else { "false" })),
        QueryNode::ConstInt(i) => Ok(fragment::text(i.to_string())),
        QueryNode::Null => Ok(fragment::text("null")),
        QueryNode::RuntimeError { message } => Ok(frag![
            "{ ",
            RUNTIME_ERROR_TOKEN,
            ": ",
            fragment::value(json!(message)),
            " }"
        ]),

        // structural nodes
        QueryNode::Object { properties } => {
            if properties.is_empty() {
                return Ok(fragment::text("{}"));
            }
            let mut entries = Vec::with_capacity(properties.len());
            for property in properties {
                entries.push(frag![
                    object_key(&property.key),
                    ": ",
                    lower(&property.value, ctx)?
                ]);
            }
            Ok(frag!["{ ", fragment::join(entries, ", "), " }"])
        }
        QueryNode::List { items } => {
            if items.is_empty() {
                return Ok(fragment::text("[]"));
            }
            let items = items
                .iter()
                .map(|item| lower(item, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(frag!["[", fragment::join(items, ", "), "]"])
        }
        QueryNode::MergeObjects { objects } => {
            lower_variadic(objects, ctx, "MERGE", fragment::text("{}"))
        }
        QueryNode::ConcatLists { lists } => lower_variadic(lists, ctx, "UNION", fragment::text("[]")),
        QueryNode::FirstOfList { list } => Ok(frag!["FIRST(", lower(list, ctx)?, ")"]),
        QueryNode::SafeList { list } => {
            // x if it is a list, [] otherwise
            let conditional = QueryNode::conditional(
                QueryNode::type_check(Rc::clone(list), BasicType::List),
                Rc::clone(list),
                QueryNode::list(Vec::new()),
            );
            lower(&conditional, ctx)
        }

        // variable/scope nodes
        QueryNode::Variable(variable) => ctx.get_variable(variable),
        QueryNode::VariableAssignment {
            variable,
            value,
            result,
        } => {
            let value = lower(value, ctx)?;
            let (inner_ctx, fragment_var) = ctx.introduce_variable(variable)?;
            let result = lower(result, &inner_ctx)?;
            Ok(frag![
                "FIRST(LET ",
                &fragment_var,
                " = ",
                value,
                " RETURN ",
                result,
                ")"
            ])
        }
        QueryNode::WithPreExecution { pre_exec, result } => {
            let mut ctx = ctx.clone();
            for spec in pre_exec {
                ctx = ctx.add_pre_execute_query(
                    &spec.query,
                    spec.result_variable.as_ref(),
                    spec.result_validator.clone(),
                )?;
            }
            lower(result, &ctx)
        }

        // access nodes
        QueryNode::Field {
            object,
            path,
            field,
        } => {
            let mut fragment = lower(object, ctx)?;
            for segment in path.iter().chain(std::iter::once(field)) {
                fragment = append_accessor(fragment, segment);
            }
            Ok(fragment)
        }
        QueryNode::RootEntityId { object } => Ok(frag![lower(object, ctx)?, "._key"]),
        QueryNode::EntityFromId { entity_type, id } => {
            let model = ctx.registry().root_entity(entity_type)?;
            Ok(frag![
                "DOCUMENT(",
                fragment::collection(&model.collection_name, CollectionAccess::Read)?,
                ", ",
                lower(id, ctx)?,
                ")"
            ])
        }
        QueryNode::Entities { entity_type } => {
            let model = ctx.registry().root_entity(entity_type)?;
            fragment::collection(&model.collection_name, CollectionAccess::Read)
        }
        QueryNode::FollowEdge { side, source } => {
            // Outside a FOR … IN position, dangling edges are filtered
            // out with a wrapping subquery.
            let node = fragment::variable("node");
            Ok(frag![
                "(FOR ",
                &node,
                " IN ",
                follow_edge_simple(side, source, ctx)?,
                " FILTER ",
                &node,
                " != null RETURN ",
                &node,
                ")"
            ])
        }

        // transformation nodes
        QueryNode::TransformList {
            list,
            item_variable,
            filter,
            order_by,
            skip,
            max_count,
            inner,
        } => transform_list::lower_transform_list(
            list,
            item_variable,
            filter.as_ref(),
            order_by,
            *skip,
            *max_count,
            inner,
            ctx,
        ),
        QueryNode::Count { list } => lower_count(list, ctx),

        // operation nodes
        QueryNode::BinaryOp { op, lhs, rhs } => binary_op::lower_binary_op(*op, lhs, rhs, ctx),
        QueryNode::UnaryOp { op, value } => match op {
            UnaryOperator::Not => Ok(frag!["!(", lower(value, ctx)?, ")"]),
            UnaryOperator::JsonStringify => {
                Ok(frag!["JSON_STRINGIFY(", lower(value, ctx)?, ")"])
            }
        },
        QueryNode::Conditional {
            condition,
            then_value,
            else_value,
        } => Ok(frag![
            "(",
            lower(condition, ctx)?,
            " ? ",
            lower(then_value, ctx)?,
            " : ",
            lower(else_value, ctx)?,
            ")"
        ]),
        QueryNode::TypeCheck { value, basic_type } => {
            let value = lower(value, ctx)?;
            Ok(match basic_type {
                BasicType::Scalar => frag![
                    "(IS_BOOL(",
                    value.clone(),
                    ") || IS_NUMBER(",
                    value.clone(),
                    ") || IS_STRING(",
                    value,
                    "))"
                ],
                BasicType::List => frag!["IS_LIST(", value, ")"],
                BasicType::Object => frag!["IS_OBJECT(", value, ")"],
                BasicType::Null => frag!["IS_NULL(", value, ")"],
            })
        }
        QueryNode::OperatorWithLanguage {
            op,
            lhs,
            rhs,
            language,
        } => search::lower_language_operator(*op, lhs, rhs, language.as_ref(), ctx),

        // mutation nodes are statements, not expressions
        QueryNode::CreateEntity { .. }
        | QueryNode::UpdateEntities { .. }
        | QueryNode::DeleteEntities { .. }
        | QueryNode::AddEdges { .. }
        | QueryNode::RemoveEdges { .. }
        | QueryNode::SetEdge { .. } => Err(CompileError::malformed(
            "mutation nodes are statements and may only form the root of a query",
        )),

        // quantifier nodes
        QueryNode::QuantifierFilter {
            quantifier,
            list,
            item_variable,
            condition,
        } => quantifier::lower_quantifier_filter(*quantifier, list, item_variable, condition, ctx),

        // search nodes
        QueryNode::QuickSearch {
            entity_type,
            item_variable,
            filter,
        } => search::lower_quick_search(entity_type, item_variable, filter, ctx),
    }
}

/// Lower a node as a whole query: register pre-execution entries, hoist
/// top-level assignments into `LET` lines, and place the remainder
/// either as a statement or under `RETURN`.
pub(crate) fn lower_query(node: &NodeRef, ctx: &QueryContext) -> Result<QueryFragment, CompileError> {
    let mut ctx = ctx.clone();
    let mut node = Rc::clone(node);

    while let QueryNode::WithPreExecution { pre_exec, result } = node.as_ref() {
        for spec in pre_exec {
            ctx = ctx.add_pre_execute_query(
                &spec.query,
                spec.result_variable.as_ref(),
                spec.result_validator.clone(),
            )?;
        }
        let result = Rc::clone(result);
        node = result;
    }

    let (node, let_lines, ctx) = rewrite::hoist_assignments(&node, &ctx)?;

    let body = if node.is_statement() {
        mutation::lower_statement(&node, &ctx)?
    } else {
        frag!["RETURN ", lower(&node, &ctx)?]
    };

    let mut query_lines = let_lines;
    query_lines.push(body);
    Ok(fragment::lines(query_lines))
}

/// `MERGE(…)` / `UNION(…)` with the degenerate arities flattened away.
fn lower_variadic(
    operands: &[NodeRef],
    ctx: &QueryContext,
    function: &str,
    empty: QueryFragment,
) -> Result<QueryFragment, CompileError> {
    match operands {
        [] => Ok(empty),
        [single] => lower(single, ctx),
        _ => {
            let operands = operands
                .iter()
                .map(|operand| lower(operand, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(frag![
                format!("{function}("),
                fragment::join(operands, ", "),
                ")"
            ])
        }
    }
}

/// Dotted access for safe segments, bound bracket access otherwise.
fn append_accessor(fragment: QueryFragment, segment: &str) -> QueryFragment {
    if is_safe_identifier(segment) {
        frag![fragment, ".", segment]
    } else {
        frag![fragment, "[", fragment::value(json!(segment)), "]"]
    }
}

/// Object keys that pass the whitelist are emitted unquoted; everything
/// else is bound as a computed key.
fn object_key(key: &str) -> QueryFragment {
    if is_safe_identifier(key) {
        fragment::text(key)
    } else {
        frag!["[", fragment::value(json!(key)), "]"]
    }
}

/// `LENGTH` for index-optimizable list shapes, a counting subquery for
/// everything else.
fn lower_count(list: &NodeRef, ctx: &QueryContext) -> Result<QueryFragment, CompileError> {
    match list.as_ref() {
        QueryNode::Field { .. } | QueryNode::Entities { .. } => {
            Ok(frag!["LENGTH(", lower(list, ctx)?, ")"])
        }
        _ => {
            let item = fragment::variable("itemToCount");
            let count = fragment::variable("count");
            Ok(frag![
                "FIRST(FOR ",
                &item,
                " IN ",
                lower(list, ctx)?,
                " COLLECT WITH COUNT INTO ",
                &count,
                " RETURN ",
                &count,
                ")"
            ])
        }
    }
}

/// `OUTBOUND|INBOUND <source> <edgeCollection>`, for use in a FOR … IN
/// position. Tracks the edge collection and the traversal target's
/// collection as reads.
fn follow_edge_simple(
    side: &arql_model::RelationSide,
    source: &NodeRef,
    ctx: &QueryContext,
) -> Result<QueryFragment, CompileError> {
    let target = ctx.registry().root_entity(side.target_type())?;
    Ok(frag![
        side.direction.traversal_token(),
        " ",
        lower(source, ctx)?,
        " ",
        fragment::collection(side.edge_collection_name(), CollectionAccess::Read)?,
        fragment::track(&target.collection_name, CollectionAccess::Read)?
    ])
}
