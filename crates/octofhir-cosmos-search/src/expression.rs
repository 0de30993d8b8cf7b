//! Predicate tree consumed by the query compiler.
//!
//! The tree is produced upstream from parsed FHIR search parameters. Every
//! node kind is a variant of [`Expression`], so the emitter covers the full
//! set of node kinds through one exhaustive match.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

use crate::request::CompartmentType;

// ============================================================================
// Literals
// ============================================================================

/// A literal search value. Literals never appear in query text; they are
/// bound through the parameter pool.
///
/// Equality is structural and typed: `Integer(1)` and `Decimal(1.0)` are
/// different values and receive different placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Literal {
    Bool(bool),
    Integer(i64),
    Decimal(Number),
    String(String),
    /// Always held in UTC.
    DateTime(#[serde(with = "rfc3339_utc")] OffsetDateTime),
    List(Vec<Literal>),
}

impl Literal {
    /// Create a decimal literal. Returns `None` for NaN and infinities,
    /// which have no JSON representation.
    pub fn decimal(value: f64) -> Option<Self> {
        Number::from_f64(value).map(Self::Decimal)
    }

    /// Create a date-time literal normalized to UTC.
    pub fn date_time(value: OffsetDateTime) -> Self {
        Self::DateTime(value.to_offset(UtcOffset::UTC))
    }

    /// Convert to the JSON value submitted to the store.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Integer(i) => Value::from(*i),
            Self::Decimal(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
            Self::DateTime(dt) => Value::String(format_instant(dt)),
            Self::List(items) => Value::Array(items.iter().map(Literal::to_json).collect()),
        }
    }
}

/// Stored instants are compared as strings, so the wire form is always `Z`.
fn format_instant(dt: &OffsetDateTime) -> String {
    let utc = dt.to_offset(UtcOffset::UTC);
    utc.format(&Rfc3339).unwrap_or_else(|_| utc.to_string())
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<OffsetDateTime> for Literal {
    fn from(value: OffsetDateTime) -> Self {
        Self::date_time(value)
    }
}

mod rfc3339_utc {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::format_description::well_known::Rfc3339;
    use time::{OffsetDateTime, UtcOffset};

    pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = value
            .format(&Rfc3339)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&raw, &Rfc3339)
            .map(|dt| dt.to_offset(UtcOffset::UTC))
            .map_err(|e| serde::de::Error::custom(format!("invalid date-time '{raw}': {e}")))
    }
}

// ============================================================================
// Fields and operators
// ============================================================================

/// Addressable fields.
///
/// Resource fields live on the document wrapper (`r.resourceId`). All other
/// fields live on a search index entry (`si.c`) and are only addressable
/// inside a [`Expression::SearchParameter`] scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldName {
    ResourceId,
    ResourceType,
    LastModified,

    TokenSystem,
    TokenCode,
    TokenText,
    String,
    Number,
    NumberLow,
    NumberHigh,
    Quantity,
    QuantitySystem,
    QuantityCode,
    QuantityLow,
    QuantityHigh,
    DateTimeStart,
    DateTimeEnd,
    ReferenceBaseUri,
    ReferenceResourceType,
    ReferenceResourceId,
    Uri,
}

impl FieldName {
    /// Whether the field lives on the document wrapper rather than on a
    /// search index entry.
    pub fn is_resource_field(self) -> bool {
        matches!(
            self,
            Self::ResourceId | Self::ResourceType | Self::LastModified
        )
    }

    /// Stored property name.
    pub fn property(self) -> &'static str {
        use crate::properties;

        match self {
            Self::ResourceId => properties::RESOURCE_ID,
            Self::ResourceType => properties::RESOURCE_TYPE_NAME,
            Self::LastModified => properties::LAST_MODIFIED,
            Self::TokenSystem | Self::QuantitySystem => "s",
            Self::TokenCode | Self::QuantityCode => "c",
            Self::TokenText => "t",
            Self::String => "s",
            Self::Number => "n",
            Self::NumberLow => "ln",
            Self::NumberHigh => "hn",
            Self::Quantity => "q",
            Self::QuantityLow => "lq",
            Self::QuantityHigh => "hq",
            Self::DateTimeStart => "st",
            Self::DateTimeEnd => "et",
            Self::ReferenceBaseUri => "rb",
            Self::ReferenceResourceType => "rt",
            Self::ReferenceResourceId => "ri",
            Self::Uri => "u",
        }
    }

    /// Lower-cased copy of the field written at indexing time, if the field
    /// has one.
    pub fn normalized_property(self) -> Option<&'static str> {
        match self {
            Self::String => Some("n_s"),
            Self::TokenText => Some("n_t"),
            _ => None,
        }
    }
}

/// Comparison operators for [`Expression::Binary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryOperator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl BinaryOperator {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
        }
    }
}

/// String matching operators for [`Expression::String`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StringOperator {
    Equals,
    StartsWith,
    EndsWith,
    Contains,
}

impl StringOperator {
    /// Cosmos SQL function implementing the operator, `None` for plain
    /// equality.
    pub fn function(self) -> Option<&'static str> {
        match self {
            Self::Equals => None,
            Self::StartsWith => Some("STARTSWITH"),
            Self::EndsWith => Some("ENDSWITH"),
            Self::Contains => Some("CONTAINS"),
        }
    }
}

// ============================================================================
// Expression tree
// ============================================================================

/// A node of the search predicate tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Expression {
    /// All children must match. Must not be empty.
    And(Vec<Expression>),

    /// Any child must match. Must not be empty.
    Or(Vec<Expression>),

    Not(Box<Expression>),

    /// Field absent (`missing = true`) or present.
    Missing { field: FieldName, missing: bool },

    /// The resource has (or lacks) any index entry for a search parameter.
    MissingParameter { code: String, missing: bool },

    Binary {
        field: FieldName,
        op: BinaryOperator,
        value: Literal,
    },

    #[serde(rename_all = "camelCase")]
    String {
        field: FieldName,
        op: StringOperator,
        value: String,
        #[serde(default)]
        ignore_case: bool,
    },

    /// Field value is one of `values`.
    In { field: FieldName, values: Vec<Literal> },

    /// Array-valued field contains `value`.
    ArrayContains { field: FieldName, value: Literal },

    /// Inner expression must match a single index entry of the parameter.
    SearchParameter {
        code: String,
        expression: Box<Expression>,
    },

    /// Resource is a member of the given compartment instance.
    Compartment { kind: CompartmentType, id: String },
}

impl Expression {
    pub fn and(children: Vec<Expression>) -> Self {
        Self::And(children)
    }

    pub fn or(children: Vec<Expression>) -> Self {
        Self::Or(children)
    }

    pub fn negate(inner: Expression) -> Self {
        Self::Not(Box::new(inner))
    }

    pub fn missing(field: FieldName, missing: bool) -> Self {
        Self::Missing { field, missing }
    }

    pub fn missing_parameter(code: impl Into<String>, missing: bool) -> Self {
        Self::MissingParameter {
            code: code.into(),
            missing,
        }
    }

    pub fn binary(field: FieldName, op: BinaryOperator, value: impl Into<Literal>) -> Self {
        Self::Binary {
            field,
            op,
            value: value.into(),
        }
    }

    /// Shorthand for an equality [`Expression::Binary`].
    pub fn equals(field: FieldName, value: impl Into<Literal>) -> Self {
        Self::binary(field, BinaryOperator::Eq, value)
    }

    pub fn string(
        field: FieldName,
        op: StringOperator,
        value: impl Into<String>,
        ignore_case: bool,
    ) -> Self {
        Self::String {
            field,
            op,
            value: value.into(),
            ignore_case,
        }
    }

    pub fn one_of(field: FieldName, values: Vec<Literal>) -> Self {
        Self::In { field, values }
    }

    pub fn array_contains(field: FieldName, value: impl Into<Literal>) -> Self {
        Self::ArrayContains {
            field,
            value: value.into(),
        }
    }

    pub fn search_parameter(code: impl Into<String>, expression: Expression) -> Self {
        Self::SearchParameter {
            code: code.into(),
            expression: Box::new(expression),
        }
    }

    pub fn compartment(kind: CompartmentType, id: impl Into<String>) -> Self {
        Self::Compartment {
            kind,
            id: id.into(),
        }
    }

    /// Node kind name used in log events and error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::And(_) => "and",
            Self::Or(_) => "or",
            Self::Not(_) => "not",
            Self::Missing { .. } => "missing",
            Self::MissingParameter { .. } => "missing_parameter",
            Self::Binary { .. } => "binary",
            Self::String { .. } => "string",
            Self::In { .. } => "in",
            Self::ArrayContains { .. } => "array_contains",
            Self::SearchParameter { .. } => "search_parameter",
            Self::Compartment { .. } => "compartment",
        }
    }
}
