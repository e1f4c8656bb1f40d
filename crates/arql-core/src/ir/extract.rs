//! Assignment extraction: lift `VariableAssignment` nodes reachable over
//! direct-value edges so they can become `LET` statements in an outer
//! scope instead of per-value subqueries.

use crate::ir::{
    fold::map_children,
    node::{NodeRef, QueryNode},
    variable::Variable,
};
use std::rc::Rc;

///
/// ExtractedAssignment
///
/// One lifted assignment, in dependency order: assignments nested inside
/// a value are listed before the assignment that uses them.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ExtractedAssignment {
    pub variable: Variable,
    pub value: NodeRef,
}

/// Walk from `node` along direct-value edges and lift every
/// `VariableAssignment` encountered, replacing it in place with its
/// result node.
///
/// Direct-value edges are edges whose target is evaluated exactly once,
/// unconditionally, whenever the parent is evaluated: object property
/// values, list/merge/concat members, field-access bases, and assignment
/// chains themselves. The walk never crosses a list-comprehension or
/// function boundary (transform bodies, subqueries, conditional arms,
/// operator operands), so lifting cannot change evaluation count or
/// capture a shadowed variable.
#[must_use]
pub fn extract_variable_assignments(node: &NodeRef) -> (NodeRef, Vec<ExtractedAssignment>) {
    let mut assignments = Vec::new();
    let rewritten = extract(node, &mut assignments);
    (rewritten, assignments)
}

fn extract(node: &NodeRef, out: &mut Vec<ExtractedAssignment>) -> NodeRef {
    match node.as_ref() {
        QueryNode::VariableAssignment {
            variable,
            value,
            result,
        } => {
            let value = extract(value, out);
            out.push(ExtractedAssignment {
                variable: variable.clone(),
                value,
            });
            extract(result, out)
        }

        QueryNode::Object { .. }
        | QueryNode::List { .. }
        | QueryNode::MergeObjects { .. }
        | QueryNode::ConcatLists { .. }
        | QueryNode::Field { .. }
        | QueryNode::RootEntityId { .. } => map_children(node, &mut |child| extract(child, out)),

        _ => Rc::clone(node),
    }
}
