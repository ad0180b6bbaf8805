//! Child component capabilities and the identity handle the collection view stores.
use crate::collection_view::CollectionView;
use crate::container::Container;
use crate::events::{Events, ViewEvent};
use crate::types::{ElementId, EntityId, SubviewOptions, ViewId};
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// A visual unit managed by a collection view.
pub trait ItemView {
    /// Element the view occupies in the container.
    fn element(&self) -> ElementId;

    /// Populate the view's content. Called once per fresh insertion, never on a move.
    fn render(&self) {}

    /// Entity this view is bound to, if any.
    fn model(&self) -> Option<EntityId> {
        None
    }
}

/// Optional teardown capability. A disposable view removes its own element
/// from `parent`; views without it have their element removed by the
/// collection view.
pub trait Dispose {
    fn dispose(&self, parent: &dyn Container);
}

/// Payload of the view-local `added` / `removed` notifications. Carries the
/// same data as the matching `subview:*` notification.
#[derive(Debug, Clone)]
pub struct ViewNotice {
    pub view: Subview,
    /// The [`CollectionView`] that moved or removed the view, type-erased
    /// because a subview is not tied to one entity type.
    pub collection_view: Rc<dyn Any>,
    pub options: SubviewOptions,
}

impl ViewNotice {
    /// The collection view that sent this notice, when its entity type is `E`.
    pub fn collection_view<E: 'static>(&self) -> Option<&CollectionView<E>> {
        (*self.collection_view).downcast_ref::<CollectionView<E>>()
    }
}

struct SubviewInner {
    id: ViewId,
    view: Rc<dyn ItemView>,
    // Resolved once at construction.
    disposer: Option<Rc<dyn Dispose>>,
    events: Events<ViewEvent, ViewNotice>,
}

/// Shared handle to an [`ItemView`]. Equality is identity: two handles are
/// equal only when they refer to the same subview.
#[derive(Clone)]
pub struct Subview(Rc<SubviewInner>);

impl Subview {
    pub fn new<V: ItemView + 'static>(view: V) -> Self {
        Self::shared(Rc::new(view))
    }

    pub fn disposable<V: ItemView + Dispose + 'static>(view: V) -> Self {
        Self::shared_disposable(Rc::new(view))
    }

    /// Wrap a view the caller keeps its own reference to.
    pub fn shared<V: ItemView + 'static>(view: Rc<V>) -> Self {
        Self::build(view, None)
    }

    pub fn shared_disposable<V: ItemView + Dispose + 'static>(view: Rc<V>) -> Self {
        let disposer: Rc<dyn Dispose> = view.clone();
        Self::build(view, Some(disposer))
    }

    fn build(view: Rc<dyn ItemView>, disposer: Option<Rc<dyn Dispose>>) -> Self {
        Subview(Rc::new(SubviewInner {
            id: ViewId::next(),
            view,
            disposer,
            events: Events::new(),
        }))
    }

    #[inline]
    pub fn id(&self) -> ViewId {
        self.0.id
    }

    pub fn element(&self) -> ElementId {
        self.0.view.element()
    }

    pub fn model(&self) -> Option<EntityId> {
        self.0.view.model()
    }

    pub fn view(&self) -> &Rc<dyn ItemView> {
        &self.0.view
    }

    pub fn is_disposable(&self) -> bool {
        self.0.disposer.is_some()
    }

    /// The view's own `added` / `removed` notifications.
    pub fn events(&self) -> &Events<ViewEvent, ViewNotice> {
        &self.0.events
    }

    pub(crate) fn render(&self) {
        self.0.view.render();
    }

    /// Returns `false` when the view has no disposal capability.
    pub(crate) fn dispose(&self, parent: &dyn Container) -> bool {
        match &self.0.disposer {
            Some(disposer) => {
                disposer.dispose(parent);
                true
            }
            None => false,
        }
    }

    pub(crate) fn notify(
        &self,
        event: ViewEvent,
        collection_view: Rc<dyn Any>,
        options: SubviewOptions,
    ) {
        let notice = ViewNotice {
            view: self.clone(),
            collection_view,
            options,
        };
        self.0.events.emit(event, &notice);
    }
}

impl PartialEq for Subview {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Subview {}

impl fmt::Debug for Subview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subview")
            .field("id", &self.0.id)
            .field("element", &self.element())
            .field("model", &self.model())
            .field("disposable", &self.is_disposable())
            .finish()
    }
}
