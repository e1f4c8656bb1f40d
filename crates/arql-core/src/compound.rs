use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, BTreeSet};

///
/// RenderedQuery
///
/// One executable query: dialect text plus its bound parameters.
/// Literal values never appear in the text; they are referenced by
/// binding name only.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RenderedQuery {
    pub text: String,
    pub bindings: BTreeMap<String, JsonValue>,
}

///
/// QueryResultValidator
///
/// Opaque post-execution check attached to a pre-execution query. The
/// compiler carries it through unchanged; the executing layer resolves
/// `name` to an implementation and feeds it `config`.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct QueryResultValidator {
    pub name: String,
    pub config: JsonValue,
}

impl QueryResultValidator {
    #[must_use]
    pub fn new(name: impl Into<String>, config: JsonValue) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }
}

///
/// PreExecQuery
///
/// A query emitted before the main query within the same transaction.
/// Its result may be bound to a name visible to all later queries of the
/// compound.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PreExecQuery {
    pub query: RenderedQuery,
    pub result_binding: Option<String>,
    pub validator: Option<QueryResultValidator>,
}

///
/// CompoundQuery
///
/// Ordered bundle of pre-execution queries plus a main query, annotated
/// with the union of accessed collection names. Pre-execution queries
/// run in declaration order; each sees the result bindings of all
/// earlier ones and nothing else.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CompoundQuery {
    pub pre_exec: Vec<PreExecQuery>,
    pub main: RenderedQuery,
    /// Name under which the main query's result is surfaced.
    pub result_binding: String,
    pub read_collections: BTreeSet<String>,
    pub write_collections: BTreeSet<String>,
}
