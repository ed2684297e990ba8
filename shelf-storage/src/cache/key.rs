//! Cache keys.

use std::fmt;

use shelf_core::{BookId, EntityIdType, EntityType};
use uuid::Uuid;

/// Key of one cache entry, rendered as `<entity>:<id>` (e.g. `book:<uuid>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    entity_type: EntityType,
    id: Uuid,
}

impl CacheKey {
    pub fn new(entity_type: EntityType, id: Uuid) -> Self {
        Self { entity_type, id }
    }

    pub fn book(id: BookId) -> Self {
        Self::new(EntityType::Book, id.as_uuid())
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The book this key belongs to, if it is a book key.
    pub fn book_id(&self) -> Option<BookId> {
        (self.entity_type == EntityType::Book).then(|| BookId::new(self.id))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.id)
    }
}
