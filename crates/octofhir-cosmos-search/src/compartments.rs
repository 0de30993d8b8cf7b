//! Compartment membership index lookup.
//!
//! Each stored document carries `compartmentIndices`, an object with one
//! array of compartment ids per compartment type, e.g.
//! `{"patient": ["123"], "encounter": ["e1", "e2"]}`. Compartment search
//! filters on the array for the requested compartment type.

use crate::properties::COMPARTMENT_INDICES;
use crate::request::CompartmentType;

/// Compartment type to sub-property of `compartmentIndices`.
static COMPARTMENT_INDEX_TABLE: &[(CompartmentType, &str)] = &[
    (CompartmentType::Device, "device"),
    (CompartmentType::Encounter, "encounter"),
    (CompartmentType::Patient, "patient"),
    (CompartmentType::Practitioner, "practitioner"),
    (CompartmentType::RelatedPerson, "relatedPerson"),
];

/// Resolves compartment types to the document property holding their
/// membership index.
#[derive(Debug, Clone, Copy)]
pub struct CompartmentIndexResolver {
    table: &'static [(CompartmentType, &'static str)],
}

impl Default for CompartmentIndexResolver {
    fn default() -> Self {
        Self {
            table: COMPARTMENT_INDEX_TABLE,
        }
    }
}

impl CompartmentIndexResolver {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn with_table(table: &'static [(CompartmentType, &'static str)]) -> Self {
        Self { table }
    }

    /// Property path of the membership index, e.g. `compartmentIndices.device`.
    ///
    /// # Panics
    ///
    /// Panics if `kind` has no entry in the table. Compartment types are
    /// validated upstream, so a miss means the table and the enum diverged.
    pub fn path_for(&self, kind: CompartmentType) -> String {
        let Some((_, suffix)) = self.table.iter().find(|(entry, _)| *entry == kind) else {
            tracing::error!(compartment = %kind, "no compartment index mapped for compartment type");
            panic!("no compartment index mapped for compartment type {kind}");
        };
        format!("{COMPARTMENT_INDICES}.{suffix}")
    }
}
