use crate::{
    context::QueryContext,
    error::CompileError,
    frag,
    fragment::{self, QueryFragment},
    ir::{
        BinaryOperator, NodeRef, Quantifier, QueryNode, TransformListBuilder, Variable,
        references_variable, simplify_booleans,
    },
    lowering::{
        binary_op::{analyze_like_pattern, literal_string, LikePatternShape},
        lower,
    },
    obs::{self, MetricsEvent, RewriteKind},
};
use arql_model::naming::is_safe_identifier;
use serde_json::json;
use std::rc::Rc;

/// Canonical quantifier reduction. `some` first attempts the
/// array-expansion fast path; `every` is rewritten to `none` with a
/// negated condition; the remaining shapes reduce to a count over the
/// filtered list.
pub(super) fn lower_quantifier_filter(
    quantifier: Quantifier,
    list: &NodeRef,
    item_variable: &Variable,
    condition: &NodeRef,
    ctx: &QueryContext,
) -> Result<QueryFragment, CompileError> {
    // The expanded form cannot express universal quantification, so the
    // fast path is some-only.
    if quantifier == Quantifier::Some
        && let Some(fragment) = try_array_expansion(list, item_variable, condition, ctx)?
    {
        obs::record(MetricsEvent::RewriteApplied {
            kind: RewriteKind::ArrayExpansion,
        });
        return Ok(fragment);
    }

    let (quantifier, condition) = match quantifier {
        Quantifier::Every => (
            Quantifier::None,
            simplify_booleans(&QueryNode::not(Rc::clone(condition))),
        ),
        other => (other, Rc::clone(condition)),
    };

    let filtered = TransformListBuilder::new(Rc::clone(list), item_variable.clone())
        .filter(condition)
        .identity();
    let count = QueryNode::count(filtered);

    let comparison = match quantifier {
        Quantifier::Some => {
            QueryNode::binary_op(BinaryOperator::GreaterThan, count, QueryNode::const_int(0))
        }
        Quantifier::None => QueryNode::equal(count, QueryNode::const_int(0)),
        Quantifier::Every => unreachable!("every was rewritten to none above"),
    };

    lower(&comparison, ctx)
}

/// Array-expansion fast path: `value IN list[*].path.to.field`.
///
/// Applies when the list is a field access (optionally SafeList-wrapped),
/// the condition compares a field chain rooted at the item variable, and
/// the comparison is an equality (literal caseless LIKE patterns count
/// as equality). The expanded form is optimizable by multi-value
/// indices over the field chain.
fn try_array_expansion(
    list: &NodeRef,
    item_variable: &Variable,
    condition: &NodeRef,
    ctx: &QueryContext,
) -> Result<Option<QueryFragment>, CompileError> {
    // IN over a non-list is false, matching SafeList semantics, so the
    // wrapper can be peeled off.
    let list = match list.as_ref() {
        QueryNode::SafeList { list } => list,
        _ => list,
    };
    if !matches!(list.as_ref(), QueryNode::Field { .. }) {
        return Ok(None);
    }

    let (value, chain_lhs) = match condition.as_ref() {
        QueryNode::BinaryOp {
            op: BinaryOperator::Equal,
            lhs,
            rhs,
        } => {
            if references_variable(rhs, item_variable) {
                return Ok(None);
            }
            (lower(rhs, ctx)?, lhs)
        }
        QueryNode::BinaryOp {
            op: BinaryOperator::Like,
            lhs,
            rhs,
        } => {
            let Some(pattern) = literal_string(rhs) else {
                return Ok(None);
            };
            let LikePatternShape::Literal { text } = analyze_like_pattern(pattern) else {
                return Ok(None);
            };
            // Only caseless literals reduce to equality.
            if text.to_lowercase() != text.to_uppercase() {
                return Ok(None);
            }
            (fragment::value(json!(text)), lhs)
        }
        _ => return Ok(None),
    };

    let Some(chain) = field_chain_from(chain_lhs, item_variable) else {
        return Ok(None);
    };

    let mut fragment = frag!["(", value, " IN ", lower(list, ctx)?];
    if !chain.is_empty() {
        fragment = fragment.append("[*]");
        for segment in chain {
            fragment = if is_safe_identifier(&segment) {
                frag![fragment, ".", segment]
            } else {
                frag![fragment, "[", fragment::value(json!(segment)), "]"]
            };
        }
    }
    Ok(Some(fragment.append(")")))
}

/// The field-access chain from `item_variable` down to `node`, outermost
/// segment first. `None` if `node` is not such a chain.
fn field_chain_from(node: &NodeRef, item_variable: &Variable) -> Option<Vec<String>> {
    match node.as_ref() {
        QueryNode::Variable(v) if v == item_variable => Some(Vec::new()),
        QueryNode::Field {
            object,
            path,
            field,
        } => {
            let mut chain = field_chain_from(object, item_variable)?;
            chain.extend(path.iter().cloned());
            chain.push(field.clone());
            Some(chain)
        }
        _ => None,
    }
}
