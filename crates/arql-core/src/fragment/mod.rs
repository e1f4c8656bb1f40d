//! Safe templating of native query text. A fragment is an immutable
//! sequence of parts (raw compiler tokens, bound values, variables)
//! plus the sets of collections it reads and writes. Bound values never
//! appear as source text; identifiers are emitted verbatim only after
//! passing the safety whitelist.

mod render;


pub(crate) use render::CompoundRenderer;

use crate::error::CompileError;
use arql_model::naming::is_safe_identifier;
use serde_json::Value as JsonValue;
use std::{
    collections::BTreeSet,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

static NEXT_FRAGMENT_VARIABLE_ID: AtomicU64 = AtomicU64::new(1);

///
/// FragmentVariable
///
/// A transient query variable. Identity is the allocated id; the label
/// only seasons the rendered name for readability.
///

#[derive(Clone, Debug)]
pub struct FragmentVariable {
    id: u64,
    label: Arc<str>,
}

impl FragmentVariable {
    #[must_use]
    pub(crate) const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub(crate) fn label(&self) -> &str {
        &self.label
    }
}

impl PartialEq for FragmentVariable {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for FragmentVariable {}

///
/// QueryResultVariable
///
/// A named cross-query binding: the result of one query of a compound,
/// referenced by later queries as a bound parameter filled in by the
/// executing layer.
///

#[derive(Clone, Debug)]
pub struct QueryResultVariable {
    id: u64,
    label: Arc<str>,
}

impl QueryResultVariable {
    #[must_use]
    pub(crate) const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub(crate) fn label(&self) -> &str {
        &self.label
    }
}

impl PartialEq for QueryResultVariable {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for QueryResultVariable {}

/// Allocate a fresh transient variable. The rendered name is derived
/// from `label` and made collision-resistant at serialization time.
#[must_use]
pub fn variable(label: impl AsRef<str>) -> FragmentVariable {
    FragmentVariable {
        id: NEXT_FRAGMENT_VARIABLE_ID.fetch_add(1, Ordering::Relaxed),
        label: Arc::from(label.as_ref()),
    }
}

/// Allocate a named binding usable as a cross-query result.
#[must_use]
pub fn query_result_variable(label: impl AsRef<str>) -> QueryResultVariable {
    QueryResultVariable {
        id: NEXT_FRAGMENT_VARIABLE_ID.fetch_add(1, Ordering::Relaxed),
        label: Arc::from(label.as_ref()),
    }
}

///
/// FragmentPart
///

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum FragmentPart {
    Text(String),
    BoundValue(JsonValue),
    Variable(FragmentVariable),
    ResultVariable(QueryResultVariable),
}

///
/// QueryFragment
///
/// The unit of composition. Fragments compose by concatenation; the
/// read/write collection sets are union accumulators with no ordering
/// significance.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryFragment {
    parts: Vec<FragmentPart>,
    reads: BTreeSet<String>,
    writes: BTreeSet<String>,
}

impl QueryFragment {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Concatenate, merging collection-access sets.
    #[must_use]
    pub fn append(mut self, other: impl Into<Self>) -> Self {
        let other = other.into();
        self.parts.extend(other.parts);
        self.reads.extend(other.reads);
        self.writes.extend(other.writes);
        self
    }

    #[must_use]
    pub(crate) fn parts(&self) -> &[FragmentPart] {
        &self.parts
    }

    #[must_use]
    pub fn read_collections(&self) -> &BTreeSet<String> {
        &self.reads
    }

    #[must_use]
    pub fn write_collections(&self) -> &BTreeSet<String> {
        &self.writes
    }
}

impl From<&str> for QueryFragment {
    fn from(s: &str) -> Self {
        text(s)
    }
}

impl From<String> for QueryFragment {
    fn from(s: String) -> Self {
        text(s)
    }
}

impl From<&FragmentVariable> for QueryFragment {
    fn from(v: &FragmentVariable) -> Self {
        Self {
            parts: vec![FragmentPart::Variable(v.clone())],
            ..Self::default()
        }
    }
}

impl From<FragmentVariable> for QueryFragment {
    fn from(v: FragmentVariable) -> Self {
        Self::from(&v)
    }
}

impl From<&QueryResultVariable> for QueryFragment {
    fn from(v: &QueryResultVariable) -> Self {
        Self {
            parts: vec![FragmentPart::ResultVariable(v.clone())],
            ..Self::default()
        }
    }
}

impl From<QueryResultVariable> for QueryFragment {
    fn from(v: QueryResultVariable) -> Self {
        Self::from(&v)
    }
}

/// Raw fragment source. Only for known-safe compiler tokens; anything
/// influenced by user data goes through `value` or `identifier`.
#[must_use]
pub fn text(s: impl Into<String>) -> QueryFragment {
    QueryFragment {
        parts: vec![FragmentPart::Text(s.into())],
        ..QueryFragment::default()
    }
}

/// Bind `v` as a parameter; the text only ever carries the placeholder.
#[must_use]
pub fn value(v: JsonValue) -> QueryFragment {
    QueryFragment {
        parts: vec![FragmentPart::BoundValue(v)],
        ..QueryFragment::default()
    }
}

/// Emit `name` verbatim after validating it against the identifier
/// whitelist.
pub fn identifier(name: &str) -> Result<QueryFragment, CompileError> {
    if !is_safe_identifier(name) {
        return Err(CompileError::invalid_identifier(name));
    }
    Ok(text(name))
}

///
/// CollectionAccess
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CollectionAccess {
    Read,
    Write,
}

/// Like `identifier`, but additionally tracks the collection in the
/// fragment's access sets.
pub fn collection(name: &str, access: CollectionAccess) -> Result<QueryFragment, CompileError> {
    let mut fragment = identifier(name)?;
    match access {
        CollectionAccess::Read => {
            fragment.reads.insert(name.to_string());
        }
        CollectionAccess::Write => {
            fragment.writes.insert(name.to_string());
        }
    }
    Ok(fragment)
}

/// Track a collection access without emitting any text. Used where the
/// emitted identifier (e.g. a search view) differs from the collection
/// the executing layer must lock.
pub(crate) fn track(name: &str, access: CollectionAccess) -> Result<QueryFragment, CompileError> {
    if !is_safe_identifier(name) {
        return Err(CompileError::invalid_identifier(name));
    }
    let mut fragment = QueryFragment::empty();
    match access {
        CollectionAccess::Read => {
            fragment.reads.insert(name.to_string());
        }
        CollectionAccess::Write => {
            fragment.writes.insert(name.to_string());
        }
    }
    Ok(fragment)
}

/// Concatenate `fragments` with `separator` between consecutive items.
#[must_use]
pub fn join(fragments: Vec<QueryFragment>, separator: &str) -> QueryFragment {
    let mut out = QueryFragment::empty();
    for (index, fragment) in fragments.into_iter().enumerate() {
        if index > 0 {
            out = out.append(text(separator));
        }
        out = out.append(fragment);
    }
    out
}

/// Concatenate `fragments` as consecutive lines.
#[must_use]
pub fn lines(fragments: Vec<QueryFragment>) -> QueryFragment {
    join(fragments, "\n")
}

/// Indent every line of `fragment` by one level.
#[must_use]
pub fn indent(fragment: QueryFragment) -> QueryFragment {
    const INDENT: &str = "  ";

    let mut parts = Vec::with_capacity(fragment.parts.len() + 1);
    parts.push(FragmentPart::Text(INDENT.to_string()));
    for part in fragment.parts {
        match part {
            FragmentPart::Text(s) => {
                parts.push(FragmentPart::Text(s.replace('\n', "\n  ")));
            }
            other => parts.push(other),
        }
    }

    QueryFragment {
        parts,
        reads: fragment.reads,
        writes: fragment.writes,
    }
}

/// Concatenate fragment-convertible parts in order.
///
/// String literals become raw compiler tokens; use `value()` /
/// `identifier()` explicitly for anything else.
#[macro_export]
macro_rules! frag {
    ($($part:expr),* $(,)?) => {{
        let mut fragment = $crate::fragment::QueryFragment::empty();
        $(fragment = fragment.append($part);)*
        fragment
    }};
}
