//! Model metadata surface for the arql query compiler: root entity and
//! relation models, flex-search configuration, analyzer naming, and the
//! registry the compiler resolves type names against.
//!
//! This crate is read-only at compile time. Building the model graph from
//! schema documents is a collaborator concern; only the surface the
//! compiler consumes lives here.

pub mod entity;
pub mod naming;
pub mod registry;
pub mod relation;
pub mod search;

mod error;

pub use entity::{FieldModel, RootEntityModel};
pub use error::ModelError;
pub use registry::ModelRegistry;
pub use relation::{EdgeDirection, RelationModel, RelationSide};
pub use search::{
    AnalyzerLanguage, FlexSearchConfig, IDENTITY_ANALYZER, PrimarySortClause, SortDirection,
    flex_search_view_name,
};
