//! Serialization of fragments into executable query text. Binding and
//! variable names are normalized here: value parameters are numbered per
//! query, variable and result names are allocated once per compound so
//! result bindings stay addressable across queries.

use crate::{
    compound::RenderedQuery,
    fragment::{FragmentPart, FragmentVariable, QueryFragment, QueryResultVariable},
};
use std::collections::{BTreeMap, HashMap};

///
/// CompoundRenderer
///
/// One renderer instance serializes every query of a compound, so
/// fresh-name allocation is consistent across them.
///

#[derive(Debug, Default)]
pub(crate) struct CompoundRenderer {
    variable_names: HashMap<u64, String>,
    result_names: HashMap<u64, String>,
    variable_counter: usize,
    result_counter: usize,
}

impl CompoundRenderer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Serialize one query's fragment. Value parameters are named
    /// `p0, p1, …` in first-appearance order within this query.
    pub(crate) fn render(&mut self, fragment: &QueryFragment) -> RenderedQuery {
        let mut text = String::new();
        let mut bindings = BTreeMap::new();
        let mut value_counter = 0usize;

        for part in fragment.parts() {
            match part {
                FragmentPart::Text(s) => text.push_str(s),
                FragmentPart::BoundValue(v) => {
                    let name = format!("p{value_counter}");
                    value_counter += 1;
                    text.push('@');
                    text.push_str(&name);
                    bindings.insert(name, v.clone());
                }
                FragmentPart::Variable(v) => {
                    text.push_str(&self.variable_name(v));
                }
                FragmentPart::ResultVariable(v) => {
                    // Cross-query results arrive as parameters injected
                    // by the executing layer, not as compile-time
                    // bindings.
                    let name = self.result_name(v);
                    text.push('@');
                    text.push_str(&name);
                }
            }
        }

        RenderedQuery { text, bindings }
    }

    fn variable_name(&mut self, variable: &FragmentVariable) -> String {
        if let Some(name) = self.variable_names.get(&variable.id()) {
            return name.clone();
        }

        let name = scoped_name("v", self.variable_counter, variable.label());
        self.variable_counter += 1;
        self.variable_names.insert(variable.id(), name.clone());
        name
    }

    pub(crate) fn result_name(&mut self, variable: &QueryResultVariable) -> String {
        if let Some(name) = self.result_names.get(&variable.id()) {
            return name.clone();
        }

        let name = scoped_name("r", self.result_counter, variable.label());
        self.result_counter += 1;
        self.result_names.insert(variable.id(), name.clone());
        name
    }
}

/// `<prefix><n>_<label>` with the label reduced to whitelist characters;
/// a label with nothing salvageable is dropped entirely.
fn scoped_name(prefix: &str, counter: usize, label: &str) -> String {
    let sanitized: String = label
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();

    if sanitized.is_empty() {
        format!("{prefix}{counter}")
    } else {
        format!("{prefix}{counter}_{sanitized}")
    }
}
