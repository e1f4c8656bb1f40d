use serde::{Deserialize, Serialize};
use std::sync::Arc;

///
/// RelationModel
///
/// Named bidirectional edge type between two root entity kinds, stored
/// as an edge collection.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RelationModel {
    pub name: String,
    pub edge_collection_name: String,
    /// Root entity type on the `_from` side.
    pub from_type: String,
    /// Root entity type on the `_to` side.
    pub to_type: String,
}

impl RelationModel {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        edge_collection_name: impl Into<String>,
        from_type: impl Into<String>,
        to_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            edge_collection_name: edge_collection_name.into(),
            from_type: from_type.into(),
            to_type: to_type.into(),
        }
    }
}

///
/// EdgeDirection
///
/// Traversal direction relative to the source document.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum EdgeDirection {
    Outbound,
    Inbound,
}

impl EdgeDirection {
    /// Native traversal keyword for this direction.
    #[must_use]
    pub const fn traversal_token(self) -> &'static str {
        match self {
            Self::Outbound => "OUTBOUND",
            Self::Inbound => "INBOUND",
        }
    }
}

///
/// RelationSide
///
/// One directed view of a relation: the edge collection plus the
/// traversal direction from the source entity.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RelationSide {
    pub relation: Arc<RelationModel>,
    pub direction: EdgeDirection,
}

impl RelationSide {
    #[must_use]
    pub const fn new(relation: Arc<RelationModel>, direction: EdgeDirection) -> Self {
        Self {
            relation,
            direction,
        }
    }

    #[must_use]
    pub fn edge_collection_name(&self) -> &str {
        &self.relation.edge_collection_name
    }

    /// Root entity type the traversal starts from.
    #[must_use]
    pub fn source_type(&self) -> &str {
        match self.direction {
            EdgeDirection::Outbound => &self.relation.from_type,
            EdgeDirection::Inbound => &self.relation.to_type,
        }
    }

    /// Root entity type the traversal arrives at.
    #[must_use]
    pub fn target_type(&self) -> &str {
        match self.direction {
            EdgeDirection::Outbound => &self.relation.to_type,
            EdgeDirection::Inbound => &self.relation.from_type,
        }
    }
}
