//! Traversal primitive over the node family: visit children in declared
//! order and rebuild with substitutions. Rebuilding preserves sharing
//! when no child changed.

use crate::ir::{
    node::{NodeRef, ObjectProperty, PreExecSpec, PropertySpec, QueryNode},
    ops::OrderClause,
    variable::Variable,
};
use std::rc::Rc;

/// Apply `f` to every direct child of `node`, rebuilding the node with
/// the returned children. Returns the original handle when `f` leaves
/// every child untouched.
pub fn map_children(node: &NodeRef, f: &mut dyn FnMut(&NodeRef) -> NodeRef) -> NodeRef {
    let mut changed = false;
    let mut apply = |child: &NodeRef| -> NodeRef {
        let mapped = f(child);
        if !Rc::ptr_eq(child, &mapped) {
            changed = true;
        }
        mapped
    };

    let rebuilt = match node.as_ref() {
        QueryNode::Literal(_)
        | QueryNode::ConstBool(_)
        | QueryNode::ConstInt(_)
        | QueryNode::Null
        | QueryNode::RuntimeError { .. }
        | QueryNode::Variable(_)
        | QueryNode::Entities { .. } => return Rc::clone(node),

        QueryNode::Object { properties } => QueryNode::Object {
            properties: properties
                .iter()
                .map(|p| ObjectProperty {
                    key: p.key.clone(),
                    value: apply(&p.value),
                })
                .collect(),
        },
        QueryNode::List { items } => QueryNode::List {
            items: items.iter().map(&mut apply).collect(),
        },
        QueryNode::MergeObjects { objects } => QueryNode::MergeObjects {
            objects: objects.iter().map(&mut apply).collect(),
        },
        QueryNode::ConcatLists { lists } => QueryNode::ConcatLists {
            lists: lists.iter().map(&mut apply).collect(),
        },
        QueryNode::FirstOfList { list } => QueryNode::FirstOfList { list: apply(list) },
        QueryNode::SafeList { list } => QueryNode::SafeList { list: apply(list) },

        QueryNode::VariableAssignment {
            variable,
            value,
            result,
        } => QueryNode::VariableAssignment {
            variable: variable.clone(),
            value: apply(value),
            result: apply(result),
        },
        QueryNode::WithPreExecution { pre_exec, result } => QueryNode::WithPreExecution {
            pre_exec: pre_exec
                .iter()
                .map(|spec| PreExecSpec {
                    query: apply(&spec.query),
                    result_variable: spec.result_variable.clone(),
                    result_validator: spec.result_validator.clone(),
                })
                .collect(),
            result: apply(result),
        },

        QueryNode::Field {
            object,
            path,
            field,
        } => QueryNode::Field {
            object: apply(object),
            path: path.clone(),
            field: field.clone(),
        },
        QueryNode::RootEntityId { object } => QueryNode::RootEntityId {
            object: apply(object),
        },
        QueryNode::EntityFromId { entity_type, id } => QueryNode::EntityFromId {
            entity_type: entity_type.clone(),
            id: apply(id),
        },
        QueryNode::FollowEdge { side, source } => QueryNode::FollowEdge {
            side: side.clone(),
            source: apply(source),
        },

        QueryNode::TransformList {
            list,
            item_variable,
            filter,
            order_by,
            skip,
            max_count,
            inner,
        } => QueryNode::TransformList {
            list: apply(list),
            item_variable: item_variable.clone(),
            filter: filter.as_ref().map(&mut apply),
            order_by: order_by
                .iter()
                .map(|clause| OrderClause {
                    expression: apply(&clause.expression),
                    direction: clause.direction,
                })
                .collect(),
            skip: *skip,
            max_count: *max_count,
            inner: apply(inner),
        },
        QueryNode::Count { list } => QueryNode::Count { list: apply(list) },

        QueryNode::BinaryOp { op, lhs, rhs } => QueryNode::BinaryOp {
            op: *op,
            lhs: apply(lhs),
            rhs: apply(rhs),
        },
        QueryNode::UnaryOp { op, value } => QueryNode::UnaryOp {
            op: *op,
            value: apply(value),
        },
        QueryNode::Conditional {
            condition,
            then_value,
            else_value,
        } => QueryNode::Conditional {
            condition: apply(condition),
            then_value: apply(then_value),
            else_value: apply(else_value),
        },
        QueryNode::TypeCheck { value, basic_type } => QueryNode::TypeCheck {
            value: apply(value),
            basic_type: *basic_type,
        },
        QueryNode::OperatorWithLanguage {
            op,
            lhs,
            rhs,
            language,
        } => QueryNode::OperatorWithLanguage {
            op: *op,
            lhs: apply(lhs),
            rhs: apply(rhs),
            language: language.clone(),
        },

        QueryNode::CreateEntity {
            entity_type,
            object,
        } => QueryNode::CreateEntity {
            entity_type: entity_type.clone(),
            object: apply(object),
        },
        QueryNode::UpdateEntities {
            entity_type,
            list,
            current_variable,
            updates,
        } => QueryNode::UpdateEntities {
            entity_type: entity_type.clone(),
            list: apply(list),
            current_variable: current_variable.clone(),
            updates: updates
                .iter()
                .map(|u| PropertySpec {
                    property: u.property.clone(),
                    value: apply(&u.value),
                })
                .collect(),
        },
        QueryNode::DeleteEntities { entity_type, list } => QueryNode::DeleteEntities {
            entity_type: entity_type.clone(),
            list: apply(list),
        },
        QueryNode::AddEdges { relation, edges } => QueryNode::AddEdges {
            relation: relation.clone(),
            edges: edges
                .iter()
                .map(|e| crate::ir::node::EdgeSpec {
                    from_key: apply(&e.from_key),
                    to_key: apply(&e.to_key),
                })
                .collect(),
        },
        QueryNode::RemoveEdges { relation, filter } => QueryNode::RemoveEdges {
            relation: relation.clone(),
            filter: crate::ir::node::EdgeFilter {
                from_keys: filter.from_keys.as_ref().map(&mut apply),
                to_keys: filter.to_keys.as_ref().map(&mut apply),
            },
        },
        QueryNode::SetEdge {
            relation,
            existing,
            new,
        } => QueryNode::SetEdge {
            relation: relation.clone(),
            existing: crate::ir::node::PartialEdgeSpec {
                from_key: existing.from_key.as_ref().map(&mut apply),
                to_key: existing.to_key.as_ref().map(&mut apply),
            },
            new: crate::ir::node::EdgeSpec {
                from_key: apply(&new.from_key),
                to_key: apply(&new.to_key),
            },
        },

        QueryNode::QuantifierFilter {
            quantifier,
            list,
            item_variable,
            condition,
        } => QueryNode::QuantifierFilter {
            quantifier: *quantifier,
            list: apply(list),
            item_variable: item_variable.clone(),
            condition: apply(condition),
        },
        QueryNode::QuickSearch {
            entity_type,
            item_variable,
            filter,
        } => QueryNode::QuickSearch {
            entity_type: entity_type.clone(),
            item_variable: item_variable.clone(),
            filter: apply(filter),
        },
    };

    if changed {
        Rc::new(rebuilt)
    } else {
        Rc::clone(node)
    }
}

/// True if `node` references `variable` anywhere in its tree.
#[must_use]
pub fn references_variable(node: &NodeRef, variable: &Variable) -> bool {
    let sentinel = QueryNode::null();
    !Rc::ptr_eq(node, &substitute_variable(node, variable, &sentinel))
}

/// Replace every reference to `variable` in `node` with `replacement`.
///
/// Variable identity is global, so shadowing cannot occur and the
/// substitution may descend through scope-introducing nodes.
pub fn substitute_variable(node: &NodeRef, variable: &Variable, replacement: &NodeRef) -> NodeRef {
    if let QueryNode::Variable(v) = node.as_ref()
        && v == variable
    {
        return Rc::clone(replacement);
    }

    map_children(node, &mut |child| {
        substitute_variable(child, variable, replacement)
    })
}
