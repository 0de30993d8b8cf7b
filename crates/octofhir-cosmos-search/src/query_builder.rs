//! Cosmos SQL query builder for FHIR searches.
//!
//! Produces the query text and bound parameters for a [`SearchRequest`].
//! Clause order is fixed:
//!
//! 1. Projection (`SELECT VALUE COUNT(1)` or `SELECT *`) over `root r`
//! 2. System data filter: `isSystem` undefined or false
//! 3. Search predicate
//! 4. Compartment membership (search only)
//! 5. Current, non-deleted versions only (search only)
//! 6. Ordering by `lastModified` (history always, descending)

use serde::Serialize;

use crate::compartments::CompartmentIndexResolver;
use crate::config::QueryBuilderConfig;
use crate::emitter::PredicateEmitter;
use crate::error::{QueryBuildError, Result};
use crate::expression::{Expression, Literal};
use crate::parameters::{Binding, ParameterPool};
use crate::properties::{
    COLLECTION, IS_DELETED, IS_HISTORY, IS_SYSTEM, LAST_MODIFIED, ROOT_ALIAS, root_property,
};
use crate::request::{CompartmentType, SearchRequest, SortOrder};

/// Paging hints passed to the store alongside the query.
///
/// Cosmos pages through feed options rather than OFFSET/LIMIT in the text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_item_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
}

impl QueryOptions {
    pub fn is_empty(&self) -> bool {
        self.max_item_count.is_none() && self.continuation_token.is_none()
    }
}

/// A compiled query: text plus its ordered bindings.
///
/// Serializes to the Cosmos REST query body
/// `{"query": "...", "parameters": [{"name": "@p0", "value": ...}]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuerySpec {
    #[serde(rename = "query")]
    text: String,
    #[serde(rename = "parameters")]
    bindings: Vec<Binding>,
    #[serde(skip_serializing_if = "QueryOptions::is_empty")]
    options: QueryOptions,
}

impl QuerySpec {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }
}

/// Compiles search requests into Cosmos SQL.
///
/// Holds only immutable configuration; every compile call owns its own
/// buffer and parameter pool, so one builder can serve concurrent callers.
///
/// # Example
///
/// ```ignore
/// let spec = QueryBuilder::default()
///     .compile_search(&SearchRequest::new().with_count_only())?;
///
/// assert_eq!(
///     spec.text(),
///     "SELECT VALUE COUNT(1) FROM root r \
///      WHERE (IS_DEFINED(r.isSystem) = @p0 OR r.isSystem = @p0) \
///      AND r.isHistory = @p0 AND r.isDeleted = @p0"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    config: QueryBuilderConfig,
    compartments: CompartmentIndexResolver,
}

impl QueryBuilder {
    pub fn new(config: QueryBuilderConfig) -> Self {
        Self {
            config,
            compartments: CompartmentIndexResolver::default(),
        }
    }

    /// Compile an ordinary search over current, non-deleted resources.
    pub fn compile_search(&self, request: &SearchRequest) -> Result<QuerySpec> {
        request.validate()?;
        let compartment = request.compartment()?;

        let mut assembler = QueryAssembler::new(&self.config, &self.compartments);
        assembler.append_projection(request.count_only);
        assembler.append_system_data_filter();
        if let Some(predicate) = &request.predicate {
            assembler.append_predicate(predicate)?;
        }
        if let Some((kind, id)) = compartment {
            assembler.append_compartment_filter(kind, id)?;
        }
        assembler.append_current_version_filter();
        if let Some(order) = request.sort
            && !request.count_only
        {
            assembler.append_last_modified_order(order);
        }

        let spec = assembler.finish(options_for(request))?;
        tracing::debug!(
            count_only = request.count_only,
            compartment = ?request.compartment_kind,
            bindings = spec.bindings.len(),
            "compiled search query"
        );
        Ok(spec)
    }

    /// Compile a history search: every version, including deleted and
    /// superseded ones, most recent first.
    ///
    /// Compartment scoping and sort requests do not apply to history and
    /// are ignored.
    pub fn compile_history(&self, request: &SearchRequest) -> Result<QuerySpec> {
        request.validate()?;
        if request.compartment_kind.is_some() {
            tracing::debug!(
                compartment = ?request.compartment_kind,
                "compartment scope ignored for history search"
            );
        }

        let mut assembler = QueryAssembler::new(&self.config, &self.compartments);
        assembler.append_projection(request.count_only);
        assembler.append_system_data_filter();
        if let Some(predicate) = &request.predicate {
            assembler.append_predicate(predicate)?;
        }
        assembler.append_last_modified_order(SortOrder::Desc);

        let spec = assembler.finish(options_for(request))?;
        tracing::debug!(
            count_only = request.count_only,
            bindings = spec.bindings.len(),
            "compiled history query"
        );
        Ok(spec)
    }
}

fn options_for(request: &SearchRequest) -> QueryOptions {
    QueryOptions {
        max_item_count: request.max_item_count,
        continuation_token: request.continuation_token.clone(),
    }
}

/// Per-call state: the text buffer and the parameter pool.
struct QueryAssembler<'a> {
    config: &'a QueryBuilderConfig,
    compartments: &'a CompartmentIndexResolver,
    buffer: String,
    pool: ParameterPool,
}

impl<'a> QueryAssembler<'a> {
    fn new(config: &'a QueryBuilderConfig, compartments: &'a CompartmentIndexResolver) -> Self {
        Self {
            config,
            compartments,
            buffer: String::new(),
            pool: ParameterPool::new(),
        }
    }

    fn append_projection(&mut self, count_only: bool) {
        let projection = if count_only { "VALUE COUNT(1)" } else { "*" };
        self.buffer
            .push_str(&format!("SELECT {projection} FROM {COLLECTION} {ROOT_ALIAS}"));
    }

    /// Documents written before `isSystem` existed have no flag at all, so
    /// both an undefined and a false flag count as user data.
    fn append_system_data_filter(&mut self) {
        let is_system = root_property(IS_SYSTEM);
        let no = self.pool.add_or_get(Literal::Bool(false));
        self.buffer.push_str(&format!(
            " WHERE (IS_DEFINED({is_system}) = {no} OR {is_system} = {no})"
        ));
    }

    fn append_predicate(&mut self, predicate: &Expression) -> Result<()> {
        self.buffer.push_str(" AND ");
        PredicateEmitter::new(
            &mut self.buffer,
            &mut self.pool,
            self.compartments,
            self.config.max_expression_depth,
        )
        .emit(predicate)
    }

    fn append_compartment_filter(&mut self, kind: CompartmentType, id: &str) -> Result<()> {
        self.buffer.push_str(" AND ");
        PredicateEmitter::new(
            &mut self.buffer,
            &mut self.pool,
            self.compartments,
            self.config.max_expression_depth,
        )
        .emit_compartment(kind, id)
    }

    fn append_current_version_filter(&mut self) {
        let no = self.pool.add_or_get(Literal::Bool(false));
        self.buffer.push_str(&format!(
            " AND {} = {no} AND {} = {no}",
            root_property(IS_HISTORY),
            root_property(IS_DELETED)
        ));
    }

    fn append_last_modified_order(&mut self, order: SortOrder) {
        self.buffer.push_str(&format!(
            " ORDER BY {} {}",
            root_property(LAST_MODIFIED),
            order.as_sql()
        ));
    }

    fn finish(self, options: QueryOptions) -> Result<QuerySpec> {
        if self.pool.len() > self.config.max_parameters {
            return Err(QueryBuildError::too_complex(format!(
                "{} bound parameters exceed the limit of {}",
                self.pool.len(),
                self.config.max_parameters
            )));
        }

        Ok(QuerySpec {
            text: self.buffer,
            bindings: self.pool.into_bindings(),
            options,
        })
    }
}
