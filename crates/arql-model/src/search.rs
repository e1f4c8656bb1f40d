use serde::{Deserialize, Serialize};
use std::fmt;

/// Analyzer used for exact-match flex-search predicates.
pub const IDENTITY_ANALYZER: &str = "identity";

/// Prefix of every search-view name derived from a collection.
const VIEW_NAME_PREFIX: &str = "flex_view_";

/// Name of the search view backing flex-search queries on `collection`.
#[must_use]
pub fn flex_search_view_name(collection: &str) -> String {
    format!("{VIEW_NAME_PREFIX}{collection}")
}

///
/// AnalyzerLanguage
///
/// Lowercased ISO language tag selecting the `text_<lang>` analyzer for
/// language-aware search operators.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AnalyzerLanguage(String);

impl AnalyzerLanguage {
    /// Normalizes the tag to lowercase; the analyzer name is derived from
    /// the normalized form.
    #[must_use]
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self(tag.as_ref().to_ascii_lowercase())
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.0
    }

    /// Analyzer name used during indexing and querying: `text_<tag>`.
    #[must_use]
    pub fn analyzer_name(&self) -> String {
        format!("text_{}", self.0)
    }
}

impl fmt::Display for AnalyzerLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

///
/// SortDirection
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

///
/// PrimarySortClause
///
/// One clause of the ordering stored inside a search view. Views with a
/// primary sort answer sorted queries without re-sorting.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PrimarySortClause {
    pub field: String,
    pub direction: SortDirection,
}

///
/// FlexSearchConfig
///
/// Search-view configuration for one root entity type.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct FlexSearchConfig {
    pub primary_sort: Vec<PrimarySortClause>,
    pub default_language: Option<AnalyzerLanguage>,
}

#[cfg(test)]
mod tests {
    use super::{AnalyzerLanguage, flex_search_view_name};

    #[test]
    fn view_name_is_prefixed_collection_name() {
        assert_eq!(flex_search_view_name("deliveries"), "flex_view_deliveries");
    }

    #[test]
    fn analyzer_name_lowercases_the_tag() {
        assert_eq!(AnalyzerLanguage::new("DE").analyzer_name(), "text_de");
        assert_eq!(AnalyzerLanguage::new("en").tag(), "en");
    }
}
