//! Stable identity resolution for scroll regions.

use std::fmt;

use contracts::{ElementId, IdGenerator, ScrollRegion};
use uuid::Uuid;

/// Random v4 UUIDs
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&mut self) -> ElementId {
        ElementId::from(Uuid::new_v4().to_string())
    }
}

/// Deterministic `prefix-0`, `prefix-1`, ... identifiers
#[derive(Debug, Clone)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: u64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new("region")
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&mut self) -> ElementId {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        ElementId::from(id)
    }
}

/// Resolves a region to its key, attaching a fresh one when it has none.
///
/// Lookup order: the region's native id, then the qualified attribute.
/// Empty values count as absent.
pub struct IdentityResolver {
    attribute: String,
    generator: Box<dyn IdGenerator>,
}

impl fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("attribute", &self.attribute)
            .finish_non_exhaustive()
    }
}

impl IdentityResolver {
    pub fn new(attribute: impl Into<String>, generator: Box<dyn IdGenerator>) -> Self {
        Self {
            attribute: attribute.into(),
            generator,
        }
    }

    /// Attribute generated identifiers are stored under
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Key already present on the region, without assigning one.
    pub fn existing(&self, region: &dyn ScrollRegion) -> Option<ElementId> {
        region
            .native_id()
            .filter(|id| !id.is_empty())
            .or_else(|| {
                region
                    .attribute(&self.attribute)
                    .filter(|id| !id.is_empty())
            })
            .map(ElementId::from)
    }

    /// Key for the region, generating and attaching one if absent.
    pub fn resolve(&mut self, region: &dyn ScrollRegion) -> ElementId {
        if let Some(id) = self.existing(region) {
            return id;
        }

        let id = self.generator.generate();
        region.set_attribute(&self.attribute, id.as_str());
        tracing::trace!(element = %id, attribute = %self.attribute, "assigned element id");
        id
    }
}
