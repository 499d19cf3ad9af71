//! Entity identity and audit timestamps.
//!
//! Aggregates embed an [`EntityMeta`] rather than inheriting from a base
//! type. Two entities are the same entity iff their identifiers are equal.

use chrono::{DateTime, Utc};

use super::tsid::EntityId;

/// Identifier plus creation / last-modification timestamps.
///
/// The identifier and creation time are fixed at construction.
#[derive(Debug, Clone)]
pub struct EntityMeta {
    id: EntityId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl EntityMeta {
    /// Fresh metadata with a generated identifier.
    pub fn new() -> Self {
        Self::with_id(EntityId::generate())
    }

    /// Fresh metadata with a caller-supplied identifier.
    pub fn with_id(id: EntityId) -> Self {
        let now = Utc::now();
        Self {
            id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild metadata loaded from storage.
    pub fn restore(id: EntityId, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Record a state change. Never moves the timestamp backwards.
    pub fn touch(&mut self) {
        let now = Utc::now();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}

impl Default for EntityMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// Implemented by every aggregate that embeds [`EntityMeta`].
pub trait Entity {
    fn meta(&self) -> &EntityMeta;

    fn id(&self) -> &EntityId {
        self.meta().id()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.meta().created_at()
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.meta().updated_at()
    }

    /// Identity comparison.
    fn same_entity<E: Entity>(&self, other: &E) -> bool
    where
        Self: Sized,
    {
        self.id() == other.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_meta_timestamps_match() {
        let meta = EntityMeta::new();
        assert_eq!(meta.created_at(), meta.updated_at());
    }

    #[test]
    fn test_touch_keeps_id_and_created_at() {
        let mut meta = EntityMeta::with_id(EntityId::from("fixed"));
        let created = meta.created_at();
        std::thread::sleep(std::time::Duration::from_millis(2));
        meta.touch();

        assert_eq!(meta.id().as_str(), "fixed");
        assert_eq!(meta.created_at(), created);
        assert!(meta.updated_at() > created);
    }

    #[test]
    fn test_touch_never_rewinds() {
        let future = Utc::now() + Duration::hours(1);
        let mut meta = EntityMeta::restore(EntityId::from("x"), future, future);
        meta.touch();
        assert_eq!(meta.updated_at(), future);
    }
}
