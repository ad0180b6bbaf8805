//! Keeps an ordered list of subviews, a container's children and an observed
//! collection of entities in step.
//!
//! A [`CollectionView`] owns one [`Subview`] per entity of its
//! [`ObservedCollection`], mirrors their order in a [`Container`], and
//! announces every structural change through `subview:*` notifications.
//!
//! ```ignore
//! let collection = Rc::new(Collection::with_models(todos));
//! let view = CollectionView::new(
//!     CollectionViewOptions::new()
//!         .collection(Rc::clone(&collection))
//!         .item_view(|todo: &Rc<Todo>| Subview::new(TodoRow::new(todo))),
//! )?;
//!
//! collection.add_at(Todo::new("write docs"), 0);
//! assert!(view.is_synchronized());
//! ```
mod collection;
mod collection_view;
mod container;
mod errors;
mod events;
mod types;
mod view;
mod view_index;

pub use collection::{
    Collection, CollectionEvent, CollectionEventKind, CollectionListener, ObservedCollection,
};
pub use collection_view::{
    CollectionView, CollectionViewOptions, ItemViewFactory, LifecycleState, SubviewNotice,
};
pub use container::{Container, MemoryContainer};
pub use errors::{CollectionViewError, ErrorKind};
pub use events::{Events, Listener, ListenerId, SubviewEvent, UnknownEvent, ViewEvent};
pub use types::{ContainerPatch, ElementId, Entity, EntityId, PatchAction, SubviewOptions, ViewId};
pub use view::{Dispose, ItemView, Subview, ViewNotice};
pub use view_index::{Insertion, ViewIndex};
