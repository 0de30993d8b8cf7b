//! Parameter pool for Cosmos SQL queries.
//!
//! Every literal that reaches query text goes through [`ParameterPool`]:
//! the text only ever carries `@pN` placeholders. Equal literals share one
//! placeholder, so structurally identical searches produce identical text
//! and hit the same cached query plan.

use indexmap::IndexSet;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::expression::Literal;

/// Placeholder prefix of the Cosmos SQL dialect.
const PLACEHOLDER_PREFIX: &str = "@p";

/// A named slot in query text, rendered as `@p<index>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Placeholder(usize);

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PLACEHOLDER_PREFIX}{}", self.0)
    }
}

/// A placeholder paired with the literal bound to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub placeholder: Placeholder,
    pub value: Literal,
}

impl Binding {
    /// Placeholder name as it appears in query text.
    pub fn name(&self) -> String {
        self.placeholder.to_string()
    }
}

/// Serializes to the `{"name": "@p0", "value": ...}` shape of the Cosmos
/// REST query body.
impl Serialize for Binding {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Binding", 2)?;
        state.serialize_field("name", &self.name())?;
        state.serialize_field("value", &self.value.to_json())?;
        state.end()
    }
}

/// Interns literals into placeholders in first-seen order.
///
/// Owned by a single compile call; never shared.
#[derive(Debug, Default)]
pub struct ParameterPool {
    values: IndexSet<Literal>,
}

impl ParameterPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the placeholder for `value`, allocating the next sequential
    /// one if no equal value was added before.
    pub fn add_or_get(&mut self, value: Literal) -> Placeholder {
        if let Some(index) = self.values.get_index_of(&value) {
            return Placeholder(index);
        }
        let (index, _) = self.values.insert_full(value);
        Placeholder(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Export the pool as an ordered binding list.
    pub fn into_bindings(self) -> Vec<Binding> {
        self.values
            .into_iter()
            .enumerate()
            .map(|(index, value)| Binding {
                placeholder: Placeholder(index),
                value,
            })
            .collect()
    }
}
