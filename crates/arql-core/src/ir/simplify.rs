//! Boolean constant folding.
//!
//! Guarantees:
//! - logical equivalence is preserved
//! - `true`/`false` neutral and absorbing elements are removed
//! - double negation is eliminated
//!
//! The pass only rewrites AND/OR/NOT structure; other nodes pass through
//! untouched.

use crate::ir::{
    node::{NodeRef, QueryNode},
    ops::{BinaryOperator, UnaryOperator},
};
use std::rc::Rc;

#[must_use]
pub fn simplify_booleans(node: &NodeRef) -> NodeRef {
    match node.as_ref() {
        QueryNode::BinaryOp {
            op: op @ (BinaryOperator::And | BinaryOperator::Or),
            lhs,
            rhs,
        } => {
            let lhs = simplify_booleans(lhs);
            let rhs = simplify_booleans(rhs);
            match op {
                BinaryOperator::And => simplify_and(lhs, rhs),
                _ => simplify_or(lhs, rhs),
            }
        }

        QueryNode::UnaryOp {
            op: UnaryOperator::Not,
            value,
        } => {
            let value = simplify_booleans(value);
            match value.as_ref() {
                QueryNode::ConstBool(b) => QueryNode::const_bool(!b),
                QueryNode::UnaryOp {
                    op: UnaryOperator::Not,
                    value: inner,
                } => Rc::clone(inner),
                _ => QueryNode::not(value),
            }
        }

        _ => Rc::clone(node),
    }
}

fn as_const_bool(node: &NodeRef) -> Option<bool> {
    match node.as_ref() {
        QueryNode::ConstBool(b) => Some(*b),
        _ => None,
    }
}

fn simplify_and(lhs: NodeRef, rhs: NodeRef) -> NodeRef {
    match (as_const_bool(&lhs), as_const_bool(&rhs)) {
        (Some(false), _) | (_, Some(false)) => QueryNode::const_bool(false),
        (Some(true), _) => rhs,
        (_, Some(true)) => lhs,
        _ => QueryNode::and(lhs, rhs),
    }
}

fn simplify_or(lhs: NodeRef, rhs: NodeRef) -> NodeRef {
    match (as_const_bool(&lhs), as_const_bool(&rhs)) {
        (Some(true), _) | (_, Some(true)) => QueryNode::const_bool(true),
        (Some(false), _) => rhs,
        (_, Some(false)) => lhs,
        _ => QueryNode::or(lhs, rhs),
    }
}
