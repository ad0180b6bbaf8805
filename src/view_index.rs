//! Ordered, identity-keyed list of subviews.
//!
//! # Invariants
//!
//! - A subview occupies at most one position (keys are [`ViewId`]s).
//! - Positions are dense: `0..len()`.
//!
//! Lookups by handle are O(1); lookups by model scan in index order and
//! return the first match.
use crate::errors::CollectionViewError;
use crate::types::{EntityId, ViewId};
use crate::view::Subview;
use indexmap::IndexMap;

/// Outcome of [`ViewIndex::insert_at`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// The view already sat at the requested position.
    Unchanged,
    /// The view was present and now sits at `to`.
    Moved { from: usize, to: usize },
    Inserted { at: usize },
}

impl Insertion {
    /// Final position of the view, `None` for [`Insertion::Unchanged`].
    pub fn position(self) -> Option<usize> {
        match self {
            Insertion::Unchanged => None,
            Insertion::Moved { to, .. } => Some(to),
            Insertion::Inserted { at } => Some(at),
        }
    }
}

#[derive(Debug, Default)]
pub struct ViewIndex {
    views: IndexMap<ViewId, Subview>,
}

impl ViewIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Owned snapshot in index order.
    pub fn all(&self) -> Vec<Subview> {
        self.views.values().cloned().collect()
    }

    pub fn index_of(&self, view: &Subview) -> Option<usize> {
        let index = self.views.get_index_of(&view.id())?;
        // Ids are unique per handle; the check guards against foreign handles.
        (self.views[index] == *view).then_some(index)
    }

    pub fn at(&self, index: usize) -> Option<Subview> {
        self.views.get_index(index).map(|(_, v)| v.clone())
    }

    pub fn first(&self) -> Option<Subview> {
        self.views.first().map(|(_, v)| v.clone())
    }

    pub fn last(&self) -> Option<Subview> {
        self.views.last().map(|(_, v)| v.clone())
    }

    pub fn contains(&self, view: &Subview) -> bool {
        self.index_of(view).is_some()
    }

    pub fn find_by_model(&self, model: EntityId) -> Option<Subview> {
        self.views
            .values()
            .find(|v| v.model() == Some(model))
            .cloned()
    }

    /// Place `view` at `index`, moving it when it is already present.
    ///
    /// A move takes the view out of its old slot and inserts it at `index`
    /// in the shortened list, so `index == len()` moves it to the end.
    pub fn insert_at(&mut self, view: Subview, index: usize) -> Result<Insertion, CollectionViewError> {
        let len = self.views.len();
        if index > len {
            return Err(CollectionViewError::position(index, len));
        }

        match self.index_of(&view) {
            Some(existing) if existing == index => Ok(Insertion::Unchanged),
            Some(existing) => {
                let to = index.min(len - 1);
                self.views.move_index(existing, to);
                Ok(Insertion::Moved { from: existing, to })
            }
            None => {
                self.views.shift_insert(index, view.id(), view);
                Ok(Insertion::Inserted { at: index })
            }
        }
    }

    pub fn remove_at(&mut self, index: usize) -> Option<Subview> {
        self.views.shift_remove_index(index).map(|(_, v)| v)
    }

    pub fn clear(&mut self) {
        self.views.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subview> {
        self.views.values()
    }
}
