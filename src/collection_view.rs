//! Reconciliation engine keeping subviews, container children and an observed
//! collection in step.
//!
//! # Invariants
//!
//! 1. Between operations the container's children are exactly the subviews'
//!    elements, in subview order.
//! 2. A subview occupies at most one position; an entity is bound to at most
//!    one subview.
//! 3. `subview:before:*` listeners observe the state before the change,
//!    `subview:*` listeners the state after it.
//!
//! # Re-entrancy
//!
//! No internal borrow is held while listeners, the item-view factory,
//! `render()` or `dispose()` run, so any of them may call back into the
//! collection view. Nested calls run to completion immediately; nothing is
//! queued and cascades are not bounded.
//!
//! # Failure Modes
//!
//! - Invalid view or position on insert: `InvalidArgument` kind, no change.
//! - Missing item-view factory when an entity needs a subview: `NoItemView`.
//! - Any call after [`CollectionView::dispose`]: `Disposed`.
//! - Errors raised while handling a collection event are logged and dropped,
//!   since the collection's notification call has no way to carry them.
use crate::collection::{CollectionEvent, CollectionEventKind, CollectionListener, ObservedCollection};
use crate::container::{Container, MemoryContainer};
use crate::errors::CollectionViewError;
use crate::events::{Events, ListenerId, SubviewEvent, ViewEvent};
use crate::types::{Entity, SubviewOptions};
use crate::view::Subview;
use crate::view_index::{Insertion, ViewIndex};
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Builds the subview for an entity. The returned view should report the
/// entity's id from [`ItemView::model`](crate::ItemView::model).
pub type ItemViewFactory<E> = Rc<dyn Fn(&Rc<E>) -> Subview>;

/// Construction options.
pub struct CollectionViewOptions<E> {
    pub item_view: Option<ItemViewFactory<E>>,
    pub collection: Option<Rc<dyn ObservedCollection<E>>>,
    /// Defaults to a fresh [`MemoryContainer`].
    pub container: Option<Rc<dyn Container>>,
}

impl<E> Default for CollectionViewOptions<E> {
    fn default() -> Self {
        CollectionViewOptions {
            item_view: None,
            collection: None,
            container: None,
        }
    }
}

impl<E: 'static> CollectionViewOptions<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item_view(mut self, factory: impl Fn(&Rc<E>) -> Subview + 'static) -> Self {
        let factory: ItemViewFactory<E> = Rc::new(factory);
        self.item_view = Some(factory);
        self
    }

    pub fn collection<C: ObservedCollection<E> + 'static>(mut self, collection: Rc<C>) -> Self {
        let collection: Rc<dyn ObservedCollection<E>> = collection;
        self.collection = Some(collection);
        self
    }

    pub fn container<C: Container + 'static>(mut self, container: Rc<C>) -> Self {
        let container: Rc<dyn Container> = container;
        self.container = Some(container);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// No collection attached; the subview API is fully usable.
    Unbound,
    Bound,
    /// Terminal.
    Disposed,
}

/// Payload of the `subview:*` notifications.
pub struct SubviewNotice<E> {
    pub view: Subview,
    pub collection_view: CollectionView<E>,
    /// `{at}` for `subview:add`, `{index}` for `subview:remove`, `None` for
    /// the `before` notifications.
    pub options: Option<SubviewOptions>,
}

impl<E> fmt::Debug for SubviewNotice<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubviewNotice")
            .field("view", &self.view)
            .field("options", &self.options)
            .finish()
    }
}

struct State<E> {
    lifecycle: LifecycleState,
    index: ViewIndex,
    item_view: Option<ItemViewFactory<E>>,
    collection: Option<Rc<dyn ObservedCollection<E>>>,
    subscriptions: Vec<(CollectionEventKind, ListenerId)>,
}

struct Inner<E> {
    container: Rc<dyn Container>,
    state: RefCell<State<E>>,
    events: Events<SubviewEvent, SubviewNotice<E>>,
}

type Released<E> = (
    Rc<dyn ObservedCollection<E>>,
    Vec<(CollectionEventKind, ListenerId)>,
);

/// Detach the bound collection and its subscription ids from `state`.
fn release_subscriptions<E>(state: &mut State<E>) -> Option<Released<E>> {
    let subscriptions = std::mem::take(&mut state.subscriptions);
    state.collection.take().map(|collection| (collection, subscriptions))
}

// A view dropped without `dispose()` must not leave listeners behind.
impl<E> Drop for Inner<E> {
    fn drop(&mut self) {
        if let Some((collection, subscriptions)) = release_subscriptions(self.state.get_mut()) {
            for (kind, id) in subscriptions {
                collection.unsubscribe(kind, id);
            }
        }
    }
}

/// Shared handle to a collection view. Clones refer to the same view.
pub struct CollectionView<E>(Rc<Inner<E>>);

impl<E> Clone for CollectionView<E> {
    fn clone(&self) -> Self {
        CollectionView(Rc::clone(&self.0))
    }
}

impl<E> PartialEq for CollectionView<E> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<E> fmt::Debug for CollectionView<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.state.borrow();
        f.debug_struct("CollectionView")
            .field("state", &state.lifecycle)
            .field("subviews", &state.index.len())
            .field("listeners", &self.0.events)
            .finish()
    }
}

impl<E: Entity + 'static> CollectionView<E> {
    /// Create the view and, when a collection is given, bind to it and build
    /// one subview per existing entity, in collection order.
    pub fn new(options: CollectionViewOptions<E>) -> Result<Self, CollectionViewError> {
        let CollectionViewOptions {
            item_view,
            collection,
            container,
        } = options;
        let container = match container {
            Some(container) => container,
            None => Rc::new(MemoryContainer::new()) as Rc<dyn Container>,
        };

        let view = CollectionView(Rc::new(Inner {
            container,
            state: RefCell::new(State {
                lifecycle: LifecycleState::Unbound,
                index: ViewIndex::new(),
                item_view,
                collection: None,
                subscriptions: Vec::new(),
            }),
            events: Events::new(),
        }));

        if let Some(collection) = collection {
            view.bind_collection(collection)?;
        }
        Ok(view)
    }

    /// Attach `collection`, subscribe to its mutations and build a subview
    /// for each entity it already holds.
    pub fn bind_collection(
        &self,
        collection: Rc<dyn ObservedCollection<E>>,
    ) -> Result<(), CollectionViewError> {
        match self.state() {
            LifecycleState::Disposed => return Err(CollectionViewError::Disposed),
            LifecycleState::Bound => return Err(CollectionViewError::AlreadyBound),
            LifecycleState::Unbound => {}
        }

        let weak: Weak<Inner<E>> = Rc::downgrade(&self.0);
        let listener: CollectionListener<E> = Rc::new(move |event: &CollectionEvent<E>| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let view = CollectionView(inner);
            if let Err(err) = view.handle_collection_event(event) {
                log::error!("CollectionView: failed to apply {:?}: {}", event, err);
            }
        });

        let subscriptions: Vec<_> = [
            CollectionEventKind::Added,
            CollectionEventKind::Removed,
            CollectionEventKind::Reset,
        ]
        .into_iter()
        .map(|kind| (kind, collection.subscribe(kind, Rc::clone(&listener))))
        .collect();

        {
            let mut state = self.0.state.borrow_mut();
            state.collection = Some(Rc::clone(&collection));
            state.subscriptions = subscriptions;
            state.lifecycle = LifecycleState::Bound;
        }

        let models = collection.models();
        log::debug!("CollectionView: bound to collection with {} models", models.len());
        for (i, model) in models.iter().enumerate() {
            if let Err(err) = self.add_item_at(model, i) {
                self.rollback_bind(&models[..i]);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Undo a partially applied [`bind_collection`](Self::bind_collection):
    /// drop the subscriptions, remove the subviews built for `built` and
    /// return to `Unbound`.
    fn rollback_bind(&self, built: &[Rc<E>]) {
        let released = {
            let mut state = self.0.state.borrow_mut();
            if state.lifecycle != LifecycleState::Bound {
                return;
            }
            state.lifecycle = LifecycleState::Unbound;
            release_subscriptions(&mut state)
        };
        if let Some((collection, subscriptions)) = released {
            for (kind, id) in subscriptions {
                collection.unsubscribe(kind, id);
            }
        }
        for model in built {
            if let Err(err) = self.remove_item(model) {
                log::warn!("CollectionView: rollback could not remove item: {}", err);
            }
        }
        log::debug!("CollectionView: bind rolled back after {} items", built.len());
    }

    /// Rebuild every subview from the collection's current content.
    pub fn render(&self) -> Result<&Self, CollectionViewError> {
        self.render_all_items()?;
        Ok(self)
    }

    /// Remove all subviews, then build and insert a fresh subview per entity.
    pub fn render_all_items(&self) -> Result<(), CollectionViewError> {
        self.ensure_live()?;
        self.remove_all_subviews()?;

        let collection = self.0.state.borrow().collection.clone();
        let models = collection.map(|c| c.models()).unwrap_or_default();
        log::debug!("CollectionView: rendering {} items", models.len());
        for (i, model) in models.iter().enumerate() {
            self.add_item_at(model, i)?;
        }
        Ok(())
    }

    /// Cancel collection subscriptions, detach the container and drop all
    /// internal state. Subviews are released without being disposed one by
    /// one; their elements leave with the container.
    pub fn dispose(&self) -> Result<(), CollectionViewError> {
        let (released, dropped) = {
            let mut state = self.0.state.borrow_mut();
            if state.lifecycle == LifecycleState::Disposed {
                return Err(CollectionViewError::Disposed);
            }
            state.lifecycle = LifecycleState::Disposed;
            state.item_view = None;
            let dropped = state.index.len();
            state.index.clear();
            (release_subscriptions(&mut state), dropped)
        };

        if let Some((collection, subscriptions)) = released {
            for (kind, id) in subscriptions {
                collection.unsubscribe(kind, id);
            }
        }
        self.0.container.detach();
        self.0.events.off_all();
        log::debug!("CollectionView: disposed, released {} subviews", dropped);
        Ok(())
    }

    // Subview API

    pub fn subviews(&self) -> Vec<Subview> {
        self.0.state.borrow().index.all()
    }

    pub fn subview_index(&self, view: &Subview) -> Option<usize> {
        self.0.state.borrow().index.index_of(view)
    }

    pub fn subview_at(&self, index: usize) -> Option<Subview> {
        self.0.state.borrow().index.at(index)
    }

    pub fn first_subview(&self) -> Option<Subview> {
        self.0.state.borrow().index.first()
    }

    pub fn last_subview(&self) -> Option<Subview> {
        self.0.state.borrow().index.last()
    }

    pub fn contains_subview(&self, view: &Subview) -> bool {
        self.0.state.borrow().index.contains(view)
    }

    pub fn len(&self) -> usize {
        self.0.state.borrow().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.state.borrow().index.is_empty()
    }

    /// Insert `view` at `index`, or move it there when already present.
    ///
    /// Fails with an `InvalidArgument` kind error for a missing view or an
    /// index outside `0..=len`. A view already at `index` is left alone and
    /// no notification fires.
    pub fn insert_subview_at(
        &self,
        view: impl Into<Option<Subview>>,
        index: isize,
    ) -> Result<(), CollectionViewError> {
        self.ensure_live()?;
        let view = view.into().ok_or(CollectionViewError::InvalidView)?;
        let len = self.len();
        let index = usize::try_from(index)
            .ok()
            .filter(|&i| i <= len)
            .ok_or(CollectionViewError::InvalidPosition { index, len })?;
        self.place(view, index)
    }

    /// Append `view`; does nothing when it is already present anywhere.
    pub fn insert_subview(&self, view: &Subview) -> Result<(), CollectionViewError> {
        self.ensure_live()?;
        if self.contains_subview(view) {
            return Ok(());
        }
        self.place(view.clone(), self.len())
    }

    pub fn remove_subview_at(&self, index: usize) -> Result<(), CollectionViewError> {
        self.ensure_live()?;
        let Some(view) = self.subview_at(index) else {
            return Ok(());
        };

        self.emit(SubviewEvent::BeforeRemove, &view, None);

        // Re-resolve: a before-remove listener may have reshuffled the index.
        let removed_at = {
            let mut state = self.0.state.borrow_mut();
            match state.index.index_of(&view) {
                Some(at) => {
                    state.index.remove_at(at);
                    at
                }
                None => return Ok(()),
            }
        };

        let container = &*self.0.container;
        if !view.dispose(container) {
            container.remove_child(view.element());
        }
        log::trace!("CollectionView: removed {:?} from {}", view.id(), removed_at);

        let options = SubviewOptions::Index { index: removed_at };
        self.emit(SubviewEvent::Remove, &view, Some(options));
        view.notify(ViewEvent::Removed, self.erased(), options);
        Ok(())
    }

    pub fn remove_subview(&self, view: &Subview) -> Result<(), CollectionViewError> {
        self.ensure_live()?;
        match self.subview_index(view) {
            Some(index) => self.remove_subview_at(index),
            None => Ok(()),
        }
    }

    /// Remove subviews from the tail until none remain.
    pub fn remove_all_subviews(&self) -> Result<(), CollectionViewError> {
        self.ensure_live()?;
        loop {
            let len = self.len();
            if len == 0 {
                return Ok(());
            }
            self.remove_subview_at(len - 1)?;
        }
    }

    // Model API

    pub fn subview_for_item(&self, entity: &E) -> Option<Subview> {
        self.0.state.borrow().index.find_by_model(entity.entity_id())
    }

    /// Place the entity's subview at `index`, building it when the entity
    /// has none yet.
    pub fn add_item_at(&self, entity: &Rc<E>, index: usize) -> Result<(), CollectionViewError> {
        self.ensure_live()?;
        let len = self.len();
        if index > len {
            return Err(CollectionViewError::position(index, len));
        }
        let view = match self.subview_for_item(entity) {
            Some(view) => view,
            None => self.build_subview_for_item(entity)?,
        };
        self.place(view, index)
    }

    pub fn add_item(&self, entity: &Rc<E>) -> Result<(), CollectionViewError> {
        self.add_item_at(entity, self.len())
    }

    pub fn remove_item(&self, entity: &E) -> Result<(), CollectionViewError> {
        self.ensure_live()?;
        match self.subview_for_item(entity) {
            Some(view) => self.remove_subview(&view),
            None => Ok(()),
        }
    }

    pub fn build_subview_for_item(&self, entity: &Rc<E>) -> Result<Subview, CollectionViewError> {
        self.ensure_live()?;
        let factory = self
            .0
            .state
            .borrow()
            .item_view
            .clone()
            .ok_or(CollectionViewError::NoItemView)?;
        Ok(factory(entity))
    }

    // Accessors

    pub fn state(&self) -> LifecycleState {
        self.0.state.borrow().lifecycle
    }

    pub fn container(&self) -> Rc<dyn Container> {
        Rc::clone(&self.0.container)
    }

    pub fn collection(&self) -> Option<Rc<dyn ObservedCollection<E>>> {
        self.0.state.borrow().collection.clone()
    }

    pub fn events(&self) -> &Events<SubviewEvent, SubviewNotice<E>> {
        &self.0.events
    }

    pub fn on(&self, event: SubviewEvent, f: impl Fn(&SubviewNotice<E>) + 'static) -> ListenerId {
        self.0.events.on_fn(event, f)
    }

    pub fn off(&self, event: SubviewEvent, id: ListenerId) -> bool {
        self.0.events.off(event, id)
    }

    /// Whether the container's children are exactly the subviews' elements,
    /// in order.
    pub fn is_synchronized(&self) -> bool {
        let expected: Vec<_> = self
            .0
            .state
            .borrow()
            .index
            .iter()
            .map(Subview::element)
            .collect();
        self.0.container.children() == expected
    }

    // Private API

    fn ensure_live(&self) -> Result<(), CollectionViewError> {
        match self.state() {
            LifecycleState::Disposed => Err(CollectionViewError::Disposed),
            _ => Ok(()),
        }
    }

    /// Core insert/move path; `index` is already validated against the
    /// current length.
    fn place(&self, view: Subview, index: usize) -> Result<(), CollectionViewError> {
        if self.subview_index(&view) == Some(index) {
            return Ok(());
        }

        self.emit(SubviewEvent::BeforeAdd, &view, None);

        let (insertion, after, before) = {
            let mut state = self.0.state.borrow_mut();
            if state.lifecycle == LifecycleState::Disposed {
                return Err(CollectionViewError::Disposed);
            }
            let insertion = state.index.insert_at(view.clone(), index)?;
            let Some(at) = insertion.position() else {
                // A before-add listener already put it there.
                return Ok(());
            };
            // Anchor on the neighbouring subview in the updated order. The
            // moved element is never its own anchor, and the container's
            // implicit detach on reinsert lands it exactly at `at`.
            let after = at
                .checked_sub(1)
                .and_then(|p| state.index.at(p))
                .map(|v| v.element());
            let before = if at == 0 {
                state.index.at(1).map(|v| v.element())
            } else {
                None
            };
            (insertion, after, before)
        };

        if let Insertion::Inserted { .. } = insertion {
            view.render();
        }

        let container = &*self.0.container;
        let element = view.element();
        match (after, before) {
            (Some(reference), _) => container.insert_after(element, reference),
            (None, Some(reference)) => container.insert_before(element, reference),
            (None, None) => container.append(element),
        }
        log::trace!("CollectionView: {:?} for {:?}", insertion, view.id());

        let options = SubviewOptions::At { at: index };
        self.emit(SubviewEvent::Add, &view, Some(options));
        view.notify(ViewEvent::Added, self.erased(), options);
        Ok(())
    }

    fn emit(&self, event: SubviewEvent, view: &Subview, options: Option<SubviewOptions>) {
        let notice = SubviewNotice {
            view: view.clone(),
            collection_view: self.clone(),
            options,
        };
        self.0.events.emit(event, &notice);
    }

    fn erased(&self) -> Rc<dyn Any> {
        Rc::new(self.clone())
    }

    fn handle_collection_event(&self, event: &CollectionEvent<E>) -> Result<(), CollectionViewError> {
        match event {
            CollectionEvent::Added { entity, at } => self.add_item_at(entity, *at),
            CollectionEvent::Removed { entity, .. } => self.remove_item(entity),
            CollectionEvent::Reset => self.render_all_items(),
        }
    }
}
