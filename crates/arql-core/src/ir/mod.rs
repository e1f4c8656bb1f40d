//! Query IR: a closed family of immutable expression/statement nodes
//! with strict construction invariants. Interpretation happens in later
//! passes:
//!
//! - boolean simplification and assignment extraction (rewrites)
//! - lowering to dialect fragments
//!
//! Nodes are shared by reference-counted handles; sharing is permitted
//! for value and variable nodes and must not introduce cycles.

mod extract;
mod fold;
mod node;
mod ops;
mod simplify;
mod variable;


pub use extract::{ExtractedAssignment, extract_variable_assignments};
pub use fold::{map_children, references_variable, substitute_variable};
pub use node::{
    EdgeFilter, EdgeSpec, NodeRef, ObjectProperty, PartialEdgeSpec, PreExecSpec, PropertySpec,
    QueryNode, TransformListBuilder,
};
pub use ops::{
    BasicType, BinaryOperator, LanguageOperator, OrderClause, OrderDirection, Quantifier,
    UnaryOperator,
};
pub use simplify::simplify_booleans;
pub use variable::Variable;
