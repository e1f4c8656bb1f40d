use crate::ir::node::NodeRef;
use derive_more::Display;

///
/// BinaryOperator
///
/// Most operators map to a native token directly; the text-matching
/// family (CONTAINS, STARTS_WITH, ENDS_WITH, LIKE) is rewritten during
/// lowering into index-friendly forms where the operand shape allows.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum BinaryOperator {
    And,
    Or,
    Equal,
    Unequal,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    In,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Contains,
    StartsWith,
    EndsWith,
    Like,
    Append,
    Prepend,
}

impl BinaryOperator {
    /// Native infix token, for operators that have one.
    #[must_use]
    pub const fn native_token(self) -> Option<&'static str> {
        match self {
            Self::And => Some("&&"),
            Self::Or => Some("||"),
            Self::Equal => Some("=="),
            Self::Unequal => Some("!="),
            Self::LessThan => Some("<"),
            Self::LessThanOrEqual => Some("<="),
            Self::GreaterThan => Some(">"),
            Self::GreaterThanOrEqual => Some(">="),
            Self::In => Some("IN"),
            Self::Add => Some("+"),
            Self::Subtract => Some("-"),
            Self::Multiply => Some("*"),
            Self::Divide => Some("/"),
            Self::Modulo => Some("%"),
            Self::Contains
            | Self::StartsWith
            | Self::EndsWith
            | Self::Like
            | Self::Append
            | Self::Prepend => None,
        }
    }
}

///
/// UnaryOperator
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum UnaryOperator {
    Not,
    JsonStringify,
}

///
/// LanguageOperator
///
/// Full-text predicates evaluated inside search views. All of them are
/// analyzer-wrapped; only `QuickSearchStartsWith` uses the identity
/// analyzer unconditionally.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum LanguageOperator {
    QuickSearchStartsWith,
    QuickSearchContainsAnyWord,
    QuickSearchContainsPrefix,
    QuickSearchContainsPhrase,
}

///
/// Quantifier
///
/// Existential/universal shape of a predicate over a list field.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Quantifier {
    Some,
    Every,
    None,
}

///
/// BasicType
///
/// Runtime type classes checkable in the dialect. `Scalar` is the union
/// of bool, number, and string.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum BasicType {
    Scalar,
    List,
    Object,
    Null,
}

///
/// OrderDirection
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum OrderDirection {
    #[default]
    Ascending,
    Descending,
}

///
/// OrderClause
///
/// One SORT clause: an expression (usually referencing the surrounding
/// item variable) and a direction.
///

#[derive(Clone, Debug, PartialEq)]
pub struct OrderClause {
    pub expression: NodeRef,
    pub direction: OrderDirection,
}

impl OrderClause {
    #[must_use]
    pub const fn new(expression: NodeRef, direction: OrderDirection) -> Self {
        Self {
            expression,
            direction,
        }
    }

    #[must_use]
    pub const fn ascending(expression: NodeRef) -> Self {
        Self::new(expression, OrderDirection::Ascending)
    }

    #[must_use]
    pub const fn descending(expression: NodeRef) -> Self {
        Self::new(expression, OrderDirection::Descending)
    }
}
