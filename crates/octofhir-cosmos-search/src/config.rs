use serde::{Deserialize, Serialize};

/// Limits applied while compiling a search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryBuilderConfig {
    /// Maximum nesting depth of the predicate tree.
    pub max_expression_depth: usize,
    /// Maximum number of distinct bound parameters in one query.
    pub max_parameters: usize,
}

impl Default for QueryBuilderConfig {
    fn default() -> Self {
        Self {
            max_expression_depth: 32,
            max_parameters: 256,
        }
    }
}

impl QueryBuilderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_expression_depth == 0 {
            return Err("query.max_expression_depth must be > 0".into());
        }
        // System and visibility filters always bind `false`
        if self.max_parameters == 0 {
            return Err("query.max_parameters must be > 0".into());
        }
        Ok(())
    }
}
