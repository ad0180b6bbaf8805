//! Observed collection capability and an in-memory ordered collection.
use crate::events::{Events, Listener, ListenerId};
use crate::types::{Entity, EntityId};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionEventKind {
    Added,
    Removed,
    Reset,
}

/// Mutation notification emitted by an [`ObservedCollection`].
pub enum CollectionEvent<E> {
    Added { entity: Rc<E>, at: usize },
    Removed { entity: Rc<E>, index: usize },
    /// The whole content was replaced; read the new state from the collection.
    Reset,
}

impl<E> CollectionEvent<E> {
    pub fn kind(&self) -> CollectionEventKind {
        match self {
            CollectionEvent::Added { .. } => CollectionEventKind::Added,
            CollectionEvent::Removed { .. } => CollectionEventKind::Removed,
            CollectionEvent::Reset => CollectionEventKind::Reset,
        }
    }
}

impl<E> fmt::Debug for CollectionEvent<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionEvent::Added { at, .. } => f.debug_struct("Added").field("at", at).finish(),
            CollectionEvent::Removed { index, .. } => {
                f.debug_struct("Removed").field("index", index).finish()
            }
            CollectionEvent::Reset => f.write_str("Reset"),
        }
    }
}

pub type CollectionListener<E> = Listener<CollectionEvent<E>>;

/// Ordered entities that announce their mutations.
pub trait ObservedCollection<E> {
    /// Current entities, in order.
    fn models(&self) -> Vec<Rc<E>>;

    fn subscribe(&self, kind: CollectionEventKind, listener: CollectionListener<E>) -> ListenerId;

    fn unsubscribe(&self, kind: CollectionEventKind, id: ListenerId);
}

/// In-memory ordered collection. Entities are unique by [`EntityId`].
pub struct Collection<E> {
    models: RefCell<Vec<Rc<E>>>,
    events: Events<CollectionEventKind, CollectionEvent<E>>,
}

impl<E: Entity> Default for Collection<E> {
    fn default() -> Self {
        Collection {
            models: RefCell::new(Vec::new()),
            events: Events::new(),
        }
    }
}

impl<E: Entity> fmt::Debug for Collection<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("len", &self.len())
            .field("listeners", &self.events)
            .finish()
    }
}

impl<E: Entity> Collection<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_models(models: impl IntoIterator<Item = E>) -> Self {
        let collection = Self::new();
        *collection.models.borrow_mut() = dedup(models.into_iter().map(Rc::new));
        collection
    }

    pub fn len(&self) -> usize {
        self.models.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.borrow().is_empty()
    }

    pub fn at(&self, index: usize) -> Option<Rc<E>> {
        self.models.borrow().get(index).cloned()
    }

    pub fn get(&self, id: EntityId) -> Option<Rc<E>> {
        self.models
            .borrow()
            .iter()
            .find(|m| m.entity_id() == id)
            .cloned()
    }

    pub fn index_of(&self, id: EntityId) -> Option<usize> {
        self.models.borrow().iter().position(|m| m.entity_id() == id)
    }

    /// Append `entity`; already-present entities are ignored.
    pub fn add(&self, entity: impl Into<Rc<E>>) -> Option<Rc<E>> {
        let at = self.len();
        self.add_at(entity, at)
    }

    /// Insert `entity` at `at` (clamped to the length). Returns the stored
    /// entity, or `None` when an entity with the same id is already present.
    pub fn add_at(&self, entity: impl Into<Rc<E>>, at: usize) -> Option<Rc<E>> {
        let entity = entity.into();
        if self.index_of(entity.entity_id()).is_some() {
            return None;
        }
        let at = {
            let mut models = self.models.borrow_mut();
            let at = at.min(models.len());
            models.insert(at, Rc::clone(&entity));
            at
        };
        self.events.emit(
            CollectionEventKind::Added,
            &CollectionEvent::Added {
                entity: Rc::clone(&entity),
                at,
            },
        );
        Some(entity)
    }

    pub fn remove(&self, id: EntityId) -> Option<Rc<E>> {
        let index = self.index_of(id)?;
        let entity = self.models.borrow_mut().remove(index);
        self.events.emit(
            CollectionEventKind::Removed,
            &CollectionEvent::Removed {
                entity: Rc::clone(&entity),
                index,
            },
        );
        Some(entity)
    }

    /// Replace the whole content and announce a single reset.
    pub fn reset(&self, models: impl IntoIterator<Item = E>) {
        *self.models.borrow_mut() = dedup(models.into_iter().map(Rc::new));
        self.events.emit(CollectionEventKind::Reset, &CollectionEvent::Reset);
    }

    pub fn on(&self, kind: CollectionEventKind, f: impl Fn(&CollectionEvent<E>) + 'static) -> ListenerId {
        self.events.on_fn(kind, f)
    }

    pub fn listener_count(&self, kind: CollectionEventKind) -> usize {
        self.events.listener_count(kind)
    }
}

fn dedup<E: Entity>(models: impl Iterator<Item = Rc<E>>) -> Vec<Rc<E>> {
    let mut out: Vec<Rc<E>> = Vec::new();
    for model in models {
        if !out.iter().any(|m| m.entity_id() == model.entity_id()) {
            out.push(model);
        }
    }
    out
}

impl<E: Entity> ObservedCollection<E> for Collection<E> {
    fn models(&self) -> Vec<Rc<E>> {
        self.models.borrow().clone()
    }

    fn subscribe(&self, kind: CollectionEventKind, listener: CollectionListener<E>) -> ListenerId {
        self.events.on(kind, listener)
    }

    fn unsubscribe(&self, kind: CollectionEventKind, id: ListenerId) {
        self.events.off(kind, id);
    }
}
