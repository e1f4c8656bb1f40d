use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering as AtomicOrdering},
    },
};

static NEXT_VARIABLE_ID: AtomicU64 = AtomicU64::new(1);

///
/// Variable
///
/// A scoped query variable. Identity is the allocated id, never the
/// label: two variables with identical labels are distinct, and clones
/// of one variable share its identity. Labels only season the generated
/// variable names for readability.
///

#[derive(Clone, Debug)]
pub struct Variable {
    id: u64,
    label: Arc<str>,
}

impl Variable {
    /// Allocate a variable with a fresh identity. Ids are never reused
    /// within a process.
    #[must_use]
    pub fn new(label: impl AsRef<str>) -> Self {
        Self {
            id: NEXT_VARIABLE_ID.fetch_add(1, AtomicOrdering::Relaxed),
            label: Arc::from(label.as_ref()),
        }
    }

    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Variable {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Variable {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.label, self.id)
    }
}
