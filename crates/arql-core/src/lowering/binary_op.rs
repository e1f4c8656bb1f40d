use crate::{
    context::QueryContext,
    error::CompileError,
    frag,
    fragment::{self, QueryFragment},
    ir::{BinaryOperator, NodeRef, QueryNode},
    lowering::lower,
    obs::{self, MetricsEvent, RewriteKind},
};
use serde_json::{Value as JsonValue, json};

/// Largest code point; appended to a prefix it forms the exclusive
/// upper bound of the prefix's range.
const MAX_CHAR: char = '\u{10FFFF}';

pub(super) fn lower_binary_op(
    op: BinaryOperator,
    lhs: &NodeRef,
    rhs: &NodeRef,
    ctx: &QueryContext,
) -> Result<QueryFragment, CompileError> {
    if let Some(token) = op.native_token() {
        return Ok(frag![
            "(",
            lower(lhs, ctx)?,
            format!(" {token} "),
            lower(rhs, ctx)?,
            ")"
        ]);
    }

    match op {
        BinaryOperator::Contains => Ok(frag![
            "(",
            lower(lhs, ctx)?,
            " LIKE CONCAT(\"%\", ",
            lower(rhs, ctx)?,
            ", \"%\"))"
        ]),

        BinaryOperator::StartsWith => {
            let basic = frag![
                "(LEFT(",
                lower(lhs, ctx)?,
                ", LENGTH(",
                lower(rhs, ctx)?,
                ")) == ",
                lower(rhs, ctx)?,
                ")"
            ];
            // A literal prefix additionally gets the index-friendly
            // range conjunct.
            match literal_string(rhs) {
                Some(prefix) => {
                    let fast = fast_starts_with(lower(lhs, ctx)?, prefix);
                    obs::record(MetricsEvent::RewriteApplied {
                        kind: RewriteKind::LikeFastPath,
                    });
                    Ok(frag!["(", fast, " && ", basic, ")"])
                }
                None => Ok(basic),
            }
        }

        BinaryOperator::EndsWith => Ok(frag![
            "(RIGHT(",
            lower(lhs, ctx)?,
            ", LENGTH(",
            lower(rhs, ctx)?,
            ")) == ",
            lower(rhs, ctx)?,
            ")"
        ]),

        BinaryOperator::Like => lower_like(lhs, rhs, ctx),

        BinaryOperator::Append => Ok(frag![
            "CONCAT(",
            lower(lhs, ctx)?,
            ", ",
            lower(rhs, ctx)?,
            ")"
        ]),
        BinaryOperator::Prepend => Ok(frag![
            "CONCAT(",
            lower(rhs, ctx)?,
            ", ",
            lower(lhs, ctx)?,
            ")"
        ]),

        _ => Err(CompileError::UnsupportedOperator {
            operator: op.to_string(),
            reason: "operator has neither a native token nor a rewrite".to_string(),
        }),
    }
}

/// Case-insensitive LIKE. Literal patterns are analyzed: fully literal
/// patterns become an equals-ignore-case range, pure prefix patterns
/// become only the range clamp, and mixed patterns conjoin the clamp
/// over the literal prefix with the slow LIKE check.
fn lower_like(
    lhs: &NodeRef,
    rhs: &NodeRef,
    ctx: &QueryContext,
) -> Result<QueryFragment, CompileError> {
    let Some(pattern) = literal_string(rhs) else {
        return Ok(frag![
            "LIKE(",
            lower(lhs, ctx)?,
            ", ",
            lower(rhs, ctx)?,
            ", true)"
        ]);
    };

    let shape = analyze_like_pattern(pattern);
    obs::record(MetricsEvent::RewriteApplied {
        kind: RewriteKind::LikeFastPath,
    });

    match shape {
        LikePatternShape::Literal { text } => Ok(equals_ignore_case(lower(lhs, ctx)?, &text)),
        LikePatternShape::PrefixOnly { prefix } => Ok(fast_starts_with(lower(lhs, ctx)?, &prefix)),
        LikePatternShape::Complex { prefix } => Ok(frag![
            "(",
            fast_starts_with(lower(lhs, ctx)?, &prefix),
            " && LIKE(",
            lower(lhs, ctx)?,
            ", ",
            fragment::value(json!(pattern)),
            ", true))"
        ]),
    }
}

/// Index-friendly range over every case variant of `prefix`.
///
/// The collation sorts case-insensitively but in its own order among
/// equal-ignore-case strings, so the clamp runs from `UPPER(prefix)`
/// (the smallest value equal-ignore-case to the prefix) up to, but not
/// including, `LOWER(prefix + U+10FFFF)`.
pub(super) fn fast_starts_with(lhs: QueryFragment, prefix: &str) -> QueryFragment {
    if prefix.is_empty() {
        return frag!["IS_STRING(", lhs, ")"];
    }

    let max = format!("{prefix}{MAX_CHAR}");
    frag![
        "(",
        lhs.clone(),
        " >= UPPER(",
        fragment::value(json!(prefix)),
        ") && ",
        lhs,
        " < LOWER(",
        fragment::value(json!(max)),
        "))"
    ]
}

/// Equality modulo case. Values without cased characters degrade to a
/// plain equality check.
pub(super) fn equals_ignore_case(lhs: QueryFragment, value: &str) -> QueryFragment {
    if value.to_lowercase() == value.to_uppercase() {
        return frag!["(", lhs, " == ", fragment::value(json!(value)), ")"];
    }

    frag![
        "(",
        lhs.clone(),
        " >= UPPER(",
        fragment::value(json!(value)),
        ") && ",
        lhs,
        " <= LOWER(",
        fragment::value(json!(value)),
        "))"
    ]
}

///
/// LikePatternShape
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) enum LikePatternShape {
    /// No wildcards; `text` is the unescaped pattern.
    Literal { text: String },
    /// A literal prefix followed by a single trailing `%`.
    PrefixOnly { prefix: String },
    /// Anything else; `prefix` is the literal part before the first
    /// wildcard (possibly empty).
    Complex { prefix: String },
}

/// Analyze a LIKE pattern: `%`/`_` are wildcards, backslash escapes the
/// next character, a trailing backslash is taken literally.
pub(super) fn analyze_like_pattern(pattern: &str) -> LikePatternShape {
    let mut prefix = String::new();
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => prefix.push(chars.next().unwrap_or('\\')),
            '%' => {
                return if chars.as_str().is_empty() {
                    LikePatternShape::PrefixOnly { prefix }
                } else {
                    LikePatternShape::Complex { prefix }
                };
            }
            '_' => return LikePatternShape::Complex { prefix },
            c => prefix.push(c),
        }
    }

    LikePatternShape::Literal { text: prefix }
}

pub(super) fn literal_string(node: &NodeRef) -> Option<&str> {
    match node.as_ref() {
        QueryNode::Literal(JsonValue::String(s)) => Some(s),
        _ => None,
    }
}
