//! FHIR search query compiler for the Cosmos DB document store.
//!
//! Translates an already-parsed search request (a predicate tree over
//! indexed resource properties, optional compartment scoping and count
//! mode) into Cosmos SQL text plus a deduplicated parameter set.
//!
//! ## Pipeline
//!
//! - [`ParameterPool`]: interns literals into `@pN` placeholders
//! - [`CompartmentIndexResolver`]: compartment type to membership index path
//! - `PredicateEmitter`: walks the [`Expression`] tree into clause text
//! - [`QueryBuilder`]: fixed clause sequence, produces a [`QuerySpec`]
//!
//! ```ignore
//! let builder = QueryBuilder::default();
//! let request = SearchRequest::new()
//!     .with_predicate(Expression::equals(FieldName::ResourceId, "abc"))
//!     .in_compartment(CompartmentType::Patient, "123");
//! let spec = builder.compile_search(&request)?;
//! assert!(spec.text().starts_with("SELECT * FROM root r WHERE"));
//! ```

pub mod compartments;
pub mod config;
mod emitter;
pub mod error;
pub mod expression;
pub mod parameters;
pub mod properties;
pub mod query_builder;
pub mod request;

pub use compartments::CompartmentIndexResolver;
pub use config::QueryBuilderConfig;
pub use error::{QueryBuildError, Result};
pub use expression::{BinaryOperator, Expression, FieldName, Literal, StringOperator};
pub use parameters::{Binding, ParameterPool, Placeholder};
pub use query_builder::{QueryBuilder, QueryOptions, QuerySpec};
pub use request::{CompartmentType, SearchRequest, SortOrder};
