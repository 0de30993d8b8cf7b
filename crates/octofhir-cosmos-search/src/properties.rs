//! Property names of the document wrapper stored for every resource version.
//!
//! The wrapper carries bookkeeping flags next to the raw resource; search
//! filters address them through the root alias, e.g. `r.isHistory`.

/// Collection name used in the FROM clause.
pub const COLLECTION: &str = "root";

/// Alias bound to each document of the collection.
pub const ROOT_ALIAS: &str = "r";

/// Alias bound to each entry of [`SEARCH_INDICES`] inside a parameter scope.
pub const SEARCH_INDEX_ALIAS: &str = "si";

pub const IS_SYSTEM: &str = "isSystem";
pub const IS_HISTORY: &str = "isHistory";
pub const IS_DELETED: &str = "isDeleted";
pub const LAST_MODIFIED: &str = "lastModified";
pub const RESOURCE_ID: &str = "resourceId";
pub const RESOURCE_TYPE_NAME: &str = "resourceTypeName";
pub const SEARCH_INDICES: &str = "searchIndices";
pub const COMPARTMENT_INDICES: &str = "compartmentIndices";

/// Field of a search index entry holding the search parameter code.
pub const SEARCH_PARAMETER_CODE: &str = "p";

/// Build `r.<property>` for a wrapper property.
pub fn root_property(property: &str) -> String {
    format!("{ROOT_ALIAS}.{property}")
}
