use crate::{
    context::QueryContext,
    error::CompileError,
    frag,
    fragment::{self, CollectionAccess, QueryFragment},
    ir::{LanguageOperator, NodeRef, Variable},
    lowering::lower,
};
use arql_model::{AnalyzerLanguage, IDENTITY_ANALYZER, flex_search_view_name};

/// `(FOR v IN <view> SEARCH <filter> RETURN v)`.
///
/// The view name is derived from the collection; the executing layer
/// still locks the collection itself, so that is what gets tracked.
pub(super) fn lower_quick_search(
    entity_type: &str,
    item_variable: &Variable,
    filter: &NodeRef,
    ctx: &QueryContext,
) -> Result<QueryFragment, CompileError> {
    let model = ctx.registry().root_entity(entity_type)?;
    if !model.is_flex_search_indexed() {
        return Err(CompileError::malformed(format!(
            "root entity type '{entity_type}' has no search view"
        )));
    }

    let view = flex_search_view_name(&model.collection_name);
    let view_fragment = fragment::identifier(&view)?
        .append(fragment::track(&model.collection_name, CollectionAccess::Read)?);

    let (scope_ctx, item) = ctx.introduce_variable(item_variable)?;
    let filter = lower(filter, &scope_ctx)?;

    Ok(frag![
        "(FOR ",
        &item,
        " IN ",
        view_fragment,
        " SEARCH ",
        filter,
        " RETURN ",
        &item,
        ")"
    ])
}

/// Analyzer-wrapped search predicates. Language-aware operators use the
/// `text_<lang>` analyzer; prefix matching against the identity analyzer
/// needs none.
pub(super) fn lower_language_operator(
    op: LanguageOperator,
    lhs: &NodeRef,
    rhs: &NodeRef,
    language: Option<&AnalyzerLanguage>,
    ctx: &QueryContext,
) -> Result<QueryFragment, CompileError> {
    let analyzer_name = match op {
        LanguageOperator::QuickSearchStartsWith => IDENTITY_ANALYZER.to_string(),
        _ => language.map_or_else(
            || IDENTITY_ANALYZER.to_string(),
            AnalyzerLanguage::analyzer_name,
        ),
    };
    let analyzer = fragment::identifier(&analyzer_name)?;
    let lhs = lower(lhs, ctx)?;
    let rhs = lower(rhs, ctx)?;

    Ok(match op {
        LanguageOperator::QuickSearchStartsWith => frag![
            "ANALYZER(STARTS_WITH(",
            lhs,
            ", ",
            rhs,
            "), ",
            analyzer,
            ")"
        ],
        LanguageOperator::QuickSearchContainsAnyWord => frag![
            "ANALYZER(",
            lhs,
            " IN TOKENS(",
            rhs,
            ", ",
            analyzer.clone(),
            "), ",
            analyzer,
            ")"
        ],
        LanguageOperator::QuickSearchContainsPrefix => frag![
            "ANALYZER(STARTS_WITH(",
            lhs,
            ", TOKENS(",
            rhs,
            ", ",
            analyzer.clone(),
            ")[0]), ",
            analyzer,
            ")"
        ],
        LanguageOperator::QuickSearchContainsPhrase => frag![
            "ANALYZER(PHRASE(",
            lhs,
            ", ",
            rhs,
            "), ",
            analyzer,
            ")"
        ],
    })
}
