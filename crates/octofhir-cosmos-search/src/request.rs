//! Search request shape handed to the compiler by the parameter parser.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{QueryBuildError, Result};
use crate::expression::Expression;

/// FHIR compartments with a membership index on the stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompartmentType {
    Device,
    Encounter,
    Patient,
    Practitioner,
    RelatedPerson,
}

impl CompartmentType {
    pub const ALL: [CompartmentType; 5] = [
        Self::Device,
        Self::Encounter,
        Self::Patient,
        Self::Practitioner,
        Self::RelatedPerson,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Device => "Device",
            Self::Encounter => "Encounter",
            Self::Patient => "Patient",
            Self::Practitioner => "Practitioner",
            Self::RelatedPerson => "RelatedPerson",
        }
    }
}

impl fmt::Display for CompartmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompartmentType {
    type Err = QueryBuildError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| QueryBuildError::UnknownCompartment(s.to_string()))
    }
}

/// Ordering of search results by last modification time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A validated, parsed search request.
///
/// Parameter names and compartment types have already been checked against
/// the server's catalog; the compiler only enforces structural contracts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRequest {
    /// Return a single count instead of documents (`_summary=count`).
    pub count_only: bool,
    pub predicate: Option<Expression>,
    pub compartment_kind: Option<CompartmentType>,
    pub compartment_id: Option<String>,
    /// Order by `lastModified`; ignored in count mode.
    pub sort: Option<SortOrder>,
    /// Page size (`_count`), passed to the store as a feed option.
    pub max_item_count: Option<u32>,
    /// Opaque store continuation for the next page.
    pub continuation_token: Option<String>,
}

impl SearchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_count_only(mut self) -> Self {
        self.count_only = true;
        self
    }

    pub fn with_predicate(mut self, predicate: Expression) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn in_compartment(mut self, kind: CompartmentType, id: impl Into<String>) -> Self {
        self.compartment_kind = Some(kind);
        self.compartment_id = Some(id.into());
        self
    }

    pub fn sorted(mut self, order: SortOrder) -> Self {
        self.sort = Some(order);
        self
    }

    pub fn with_max_item_count(mut self, count: u32) -> Self {
        self.max_item_count = Some(count);
        self
    }

    pub fn with_continuation_token(mut self, token: impl Into<String>) -> Self {
        self.continuation_token = Some(token.into());
        self
    }

    /// The compartment scope, if any.
    ///
    /// Kind and id must be given together and the id must be non-empty.
    pub fn compartment(&self) -> Result<Option<(CompartmentType, &str)>> {
        match (self.compartment_kind, self.compartment_id.as_deref()) {
            (None, None) => Ok(None),
            (Some(kind), Some(id)) if !id.trim().is_empty() => Ok(Some((kind, id))),
            (Some(kind), Some(_)) => Err(QueryBuildError::invalid_request(format!(
                "empty compartment id for compartment {kind}"
            ))),
            (Some(kind), None) => Err(QueryBuildError::invalid_request(format!(
                "compartment {kind} given without a compartment id"
            ))),
            (None, Some(id)) => Err(QueryBuildError::invalid_request(format!(
                "compartment id '{id}' given without a compartment type"
            ))),
        }
    }

    /// Check structural contracts before any query text is produced.
    pub fn validate(&self) -> Result<()> {
        self.compartment()?;

        if self.max_item_count == Some(0) {
            return Err(QueryBuildError::invalid_request(
                "max item count must be positive",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::FieldName;
    use serde_json::json;

    #[test]
    fn test_compartment_type_round_trip_names() {
        for kind in CompartmentType::ALL {
            assert_eq!(kind.as_str().parse::<CompartmentType>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_compartment_type() {
        let err = "Group".parse::<CompartmentType>().unwrap_err();
        assert_eq!(err, QueryBuildError::UnknownCompartment("Group".into()));

        // Names are case-sensitive, as in CompartmentDefinition.code
        assert!("patient".parse::<CompartmentType>().is_err());
    }

    #[test]
    fn test_compartment_requires_kind_and_id() {
        let request = SearchRequest::new().in_compartment(CompartmentType::Patient, "123");
        assert_eq!(
            request.compartment().unwrap(),
            Some((CompartmentType::Patient, "123"))
        );

        let request = SearchRequest {
            compartment_kind: Some(CompartmentType::Device),
            ..Default::default()
        };
        assert!(matches!(
            request.compartment(),
            Err(QueryBuildError::InvalidRequest(_))
        ));

        let request = SearchRequest {
            compartment_id: Some("123".into()),
            ..Default::default()
        };
        assert!(request.validate().is_err());

        let request = SearchRequest::new().in_compartment(CompartmentType::Encounter, "  ");
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let request = SearchRequest::new().with_max_item_count(0);
        assert!(matches!(
            request.validate(),
            Err(QueryBuildError::InvalidRequest(_))
        ));
        assert!(SearchRequest::new().with_max_item_count(10).validate().is_ok());
    }

    #[test]
    fn test_request_deserialize() {
        let value = json!({
            "countOnly": true,
            "compartmentKind": "RelatedPerson",
            "compartmentId": "rp-1",
            "predicate": {
                "binary": { "field": "resourceId", "op": "eq", "value": { "string": "abc" } }
            }
        });

        let request: SearchRequest = serde_json::from_value(value).unwrap();
        assert!(request.count_only);
        assert_eq!(request.compartment_kind, Some(CompartmentType::RelatedPerson));
        assert_eq!(
            request.predicate,
            Some(Expression::equals(FieldName::ResourceId, "abc"))
        );
        assert_eq!(request.sort, None);
    }

    #[test]
    fn test_sort_order_sql() {
        assert_eq!(SortOrder::Asc.as_sql(), "ASC");
        assert_eq!(SortOrder::default().as_sql(), "DESC");
    }
}
