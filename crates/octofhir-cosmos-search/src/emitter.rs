//! Predicate emission.
//!
//! Walks an [`Expression`] tree and appends Cosmos SQL fragments to the
//! query buffer. Literals are always routed through the [`ParameterPool`];
//! only placeholders, operators and fixed property paths are written as
//! text.

use crate::compartments::CompartmentIndexResolver;
use crate::error::{QueryBuildError, Result};
use crate::expression::{BinaryOperator, Expression, FieldName, Literal, StringOperator};
use crate::parameters::{ParameterPool, Placeholder};
use crate::properties::{
    ROOT_ALIAS, SEARCH_INDEX_ALIAS, SEARCH_INDICES, SEARCH_PARAMETER_CODE, root_property,
};
use crate::request::CompartmentType;

/// Which aliases are bound at the current position of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// Only the document alias `r`.
    Resource,
    /// Inside a search parameter subquery: `r` and `si`.
    SearchIndex,
}

pub(crate) struct PredicateEmitter<'a> {
    buffer: &'a mut String,
    pool: &'a mut ParameterPool,
    compartments: &'a CompartmentIndexResolver,
    max_depth: usize,
    depth: usize,
    scope: Scope,
}

impl<'a> PredicateEmitter<'a> {
    pub(crate) fn new(
        buffer: &'a mut String,
        pool: &'a mut ParameterPool,
        compartments: &'a CompartmentIndexResolver,
        max_depth: usize,
    ) -> Self {
        Self {
            buffer,
            pool,
            compartments,
            max_depth,
            depth: 0,
            scope: Scope::Resource,
        }
    }

    pub(crate) fn emit(&mut self, expression: &Expression) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(QueryBuildError::too_complex(format!(
                "expression nesting exceeds {} levels",
                self.max_depth
            )));
        }

        tracing::trace!(
            node = expression.kind_name(),
            depth = self.depth,
            "emitting predicate node"
        );

        let result = match expression {
            Expression::And(children) => self.visit_multiary("AND", children),
            Expression::Or(children) => self.visit_multiary("OR", children),
            Expression::Not(inner) => self.visit_not(inner),
            Expression::Missing { field, missing } => self.visit_missing(*field, *missing),
            Expression::MissingParameter { code, missing } => {
                self.visit_missing_parameter(code, *missing)
            }
            Expression::Binary { field, op, value } => self.visit_binary(*field, *op, value),
            Expression::String {
                field,
                op,
                value,
                ignore_case,
            } => self.visit_string(*field, *op, value, *ignore_case),
            Expression::In { field, values } => self.visit_in(*field, values),
            Expression::ArrayContains { field, value } => {
                self.visit_array_contains(*field, value)
            }
            Expression::SearchParameter { code, expression } => {
                self.visit_search_parameter(code, expression)
            }
            Expression::Compartment { kind, id } => self.emit_compartment(*kind, id),
        };

        self.depth -= 1;
        result
    }

    /// `ARRAY_CONTAINS(r.compartmentIndices.<kind>, @pN)`
    pub(crate) fn emit_compartment(&mut self, kind: CompartmentType, id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(QueryBuildError::invalid_expression(format!(
                "empty compartment id for compartment {kind}"
            )));
        }

        let path = root_property(&self.compartments.path_for(kind));
        let placeholder = self.bind(Literal::String(id.to_string()));
        self.push(&format!("ARRAY_CONTAINS({path}, {placeholder})"));
        Ok(())
    }

    fn visit_multiary(&mut self, operator: &str, children: &[Expression]) -> Result<()> {
        match children {
            [] => Err(QueryBuildError::invalid_expression(format!(
                "{operator} expression without operands"
            ))),
            [only] => self.emit(only),
            _ => {
                self.push("(");
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        self.push(&format!(" {operator} "));
                    }
                    self.emit(child)?;
                }
                self.push(")");
                Ok(())
            }
        }
    }

    fn visit_not(&mut self, inner: &Expression) -> Result<()> {
        self.push("NOT (");
        self.emit(inner)?;
        self.push(")");
        Ok(())
    }

    fn visit_missing(&mut self, field: FieldName, missing: bool) -> Result<()> {
        let path = self.field_path(field)?;
        if missing {
            self.push(&format!("NOT IS_DEFINED({path})"));
        } else {
            self.push(&format!("IS_DEFINED({path})"));
        }
        Ok(())
    }

    fn visit_missing_parameter(&mut self, code: &str, missing: bool) -> Result<()> {
        self.check_parameter_scope(code)?;

        let placeholder = self.bind(Literal::String(code.to_string()));
        let subquery = search_index_subquery(placeholder);
        if missing {
            self.push(&format!("NOT EXISTS ({subquery})"));
        } else {
            self.push(&format!("EXISTS ({subquery})"));
        }
        Ok(())
    }

    fn visit_binary(&mut self, field: FieldName, op: BinaryOperator, value: &Literal) -> Result<()> {
        let path = self.field_path(field)?;
        let placeholder = self.bind(value.clone());
        self.push(&format!("{path} {} {placeholder}", op.as_sql()));
        Ok(())
    }

    fn visit_string(
        &mut self,
        field: FieldName,
        op: StringOperator,
        value: &str,
        ignore_case: bool,
    ) -> Result<()> {
        let (path, value) = if ignore_case {
            let path = match field.normalized_property() {
                Some(normalized) => self.property_path(field, normalized)?,
                None => format!("LOWER({})", self.field_path(field)?),
            };
            (path, value.to_lowercase())
        } else {
            (self.field_path(field)?, value.to_string())
        };

        let placeholder = self.bind(Literal::String(value));
        match op.function() {
            None => self.push(&format!("{path} = {placeholder}")),
            Some(function) => self.push(&format!("{function}({path}, {placeholder})")),
        }
        Ok(())
    }

    fn visit_in(&mut self, field: FieldName, values: &[Literal]) -> Result<()> {
        if values.is_empty() {
            return Err(QueryBuildError::invalid_expression(format!(
                "IN expression on {field:?} without values"
            )));
        }

        let path = self.field_path(field)?;
        let placeholder = self.bind(Literal::List(values.to_vec()));
        self.push(&format!("ARRAY_CONTAINS({placeholder}, {path})"));
        Ok(())
    }

    fn visit_array_contains(&mut self, field: FieldName, value: &Literal) -> Result<()> {
        let path = self.field_path(field)?;
        let placeholder = self.bind(value.clone());
        self.push(&format!("ARRAY_CONTAINS({path}, {placeholder})"));
        Ok(())
    }

    fn visit_search_parameter(&mut self, code: &str, inner: &Expression) -> Result<()> {
        self.check_parameter_scope(code)?;

        let placeholder = self.bind(Literal::String(code.to_string()));
        self.push(&format!("EXISTS ({} AND ", search_index_subquery(placeholder)));

        self.scope = Scope::SearchIndex;
        let result = self.emit(inner);
        self.scope = Scope::Resource;
        result?;

        self.push(")");
        Ok(())
    }

    fn check_parameter_scope(&self, code: &str) -> Result<()> {
        if code.trim().is_empty() {
            return Err(QueryBuildError::invalid_expression(
                "search parameter code is empty",
            ));
        }
        if self.scope == Scope::SearchIndex {
            return Err(QueryBuildError::invalid_expression(format!(
                "search parameter '{code}' nested inside another search parameter"
            )));
        }
        Ok(())
    }

    fn field_path(&self, field: FieldName) -> Result<String> {
        self.property_path(field, field.property())
    }

    fn property_path(&self, field: FieldName, property: &str) -> Result<String> {
        if field.is_resource_field() {
            return Ok(root_property(property));
        }
        match self.scope {
            Scope::SearchIndex => Ok(format!("{SEARCH_INDEX_ALIAS}.{property}")),
            Scope::Resource => Err(QueryBuildError::invalid_expression(format!(
                "field {field:?} is only addressable inside a search parameter"
            ))),
        }
    }

    fn bind(&mut self, value: Literal) -> Placeholder {
        self.pool.add_or_get(value)
    }

    fn push(&mut self, fragment: &str) {
        self.buffer.push_str(fragment);
    }
}

/// `SELECT VALUE si FROM si IN r.searchIndices WHERE si.p = @pN`
fn search_index_subquery(code: Placeholder) -> String {
    format!(
        "SELECT VALUE {SEARCH_INDEX_ALIAS} FROM {SEARCH_INDEX_ALIAS} IN {ROOT_ALIAS}.{SEARCH_INDICES} \
         WHERE {SEARCH_INDEX_ALIAS}.{SEARCH_PARAMETER_CODE} = {code}"
    )
}
