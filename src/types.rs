//! Identifiers, notification payloads and container patch records
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Global ID generators (lock-free, atomic)
static VIEW_COUNTER: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(1));
static ELEMENT_COUNTER: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(1));

/// Identity of a [`Subview`](crate::Subview) handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ViewId(u64);

impl ViewId {
    pub(crate) fn next() -> Self {
        ViewId(VIEW_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view{}", self.0)
    }
}

/// Handle to a rendered element living in a [`Container`](crate::Container).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(u64);

impl ElementId {
    /// Mint a fresh, never reused element handle.
    pub fn next() -> Self {
        ElementId(ELEMENT_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "el{}", self.0)
    }
}

/// Stable identity of an entity. Compared by identity, never by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(Uuid);

impl EntityId {
    pub fn new() -> Self {
        EntityId(Uuid::new_v4())
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        EntityId(uuid)
    }

    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Anything the collection view can be bound to.
pub trait Entity {
    fn entity_id(&self) -> EntityId;
}

/// Payload attached to post-mutation notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubviewOptions {
    /// `subview:add` / `added`: the requested position.
    At { at: usize },
    /// `subview:remove` / `removed`: the position the view was removed from.
    Index { index: usize },
}

/// Container mutation kinds recorded by [`MemoryContainer`](crate::MemoryContainer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatchAction {
    InsertBefore,
    InsertAfter,
    Append,
    Remove,
    Detach,
}

impl fmt::Display for PatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PatchAction::InsertBefore => "INSERT_BEFORE",
            PatchAction::InsertAfter => "INSERT_AFTER",
            PatchAction::Append => "APPEND",
            PatchAction::Remove => "REMOVE",
            PatchAction::Detach => "DETACH",
        };
        f.write_str(name)
    }
}

/// One applied container mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerPatch {
    pub action: PatchAction,
    pub element: ElementId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<ElementId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = ElementId::next();
        let b = ElementId::next();
        assert_ne!(a, b);
        assert_ne!(ViewId::next(), ViewId::next());
        assert_ne!(EntityId::new(), EntityId::new());
    }

    #[test]
    fn options_serialize_as_plain_objects() {
        let at = serde_json::to_value(SubviewOptions::At { at: 3 }).unwrap();
        assert_eq!(at, serde_json::json!({ "at": 3 }));
        let index = serde_json::to_value(SubviewOptions::Index { index: 0 }).unwrap();
        assert_eq!(index, serde_json::json!({ "index": 0 }));
    }

    #[test]
    fn patch_action_names() {
        assert_eq!(PatchAction::InsertAfter.to_string(), "INSERT_AFTER");
        assert_eq!(
            serde_json::to_value(PatchAction::InsertBefore).unwrap(),
            serde_json::json!("INSERT_BEFORE")
        );
    }
}
