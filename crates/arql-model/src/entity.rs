use crate::search::{AnalyzerLanguage, FlexSearchConfig};
use serde::{Deserialize, Serialize};

///
/// RootEntityModel
///
/// Minimal runtime model for one root entity type. Only root entities
/// own a collection and a document key; child entities, value objects,
/// and entity extensions are embedded and never appear here.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RootEntityModel {
    /// Stable type name as used by the query IR.
    pub name: String,
    /// Physical collection backing this type.
    pub collection_name: String,
    /// Ordered field list (authoritative for search-view derivation).
    pub fields: Vec<FieldModel>,
    /// Search-view configuration; `None` means the type is not
    /// flex-search indexed.
    pub flex_search: Option<FlexSearchConfig>,
    /// Experimental switch: defer document materialization until after
    /// limit/sort in list projections over this type.
    pub projection_indirection: bool,
}

impl RootEntityModel {
    #[must_use]
    pub fn new(name: impl Into<String>, collection_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collection_name: collection_name.into(),
            fields: Vec::new(),
            flex_search: None,
            projection_indirection: false,
        }
    }

    #[must_use]
    pub fn with_fields(mut self, fields: Vec<FieldModel>) -> Self {
        self.fields = fields;
        self
    }

    #[must_use]
    pub fn with_flex_search(mut self, config: FlexSearchConfig) -> Self {
        self.flex_search = Some(config);
        self
    }

    #[must_use]
    pub const fn with_projection_indirection(mut self) -> Self {
        self.projection_indirection = true;
        self
    }

    /// True if a search view exists for this type.
    #[must_use]
    pub const fn is_flex_search_indexed(&self) -> bool {
        self.flex_search.is_some()
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldModel> {
        self.fields.iter().find(|f| f.name == name)
    }
}

///
/// FieldModel
///
/// Per-field metadata the compiler needs: system-field classification,
/// flex-search membership, and the analyzer language for full-text
/// fields.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FieldModel {
    pub name: String,
    pub is_system_field: bool,
    pub flex_search_indexed: bool,
    /// Analyzer language for full-text fields; `None` means the field is
    /// indexed with the identity analyzer only.
    pub language: Option<AnalyzerLanguage>,
}

impl FieldModel {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_system_field: false,
            flex_search_indexed: false,
            language: None,
        }
    }

    #[must_use]
    pub const fn system(mut self) -> Self {
        self.is_system_field = true;
        self
    }

    #[must_use]
    pub const fn flex_search_indexed(mut self) -> Self {
        self.flex_search_indexed = true;
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: AnalyzerLanguage) -> Self {
        self.language = Some(language);
        self
    }
}
