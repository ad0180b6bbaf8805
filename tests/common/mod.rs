#![allow(dead_code)]

use collection_view::{
    Collection, CollectionView, CollectionViewOptions, Container, Dispose, ElementId, Entity,
    EntityId, ItemView, MemoryContainer, Subview,
};
use std::cell::Cell;
use std::rc::Rc;

pub const MODEL_COUNT: usize = 100;

#[derive(Debug)]
pub struct Model {
    id: EntityId,
    pub num: usize,
}

impl Model {
    pub fn new(num: usize) -> Self {
        Model {
            id: EntityId::new(),
            num,
        }
    }
}

impl Entity for Model {
    fn entity_id(&self) -> EntityId {
        self.id
    }
}

pub fn models(n: usize) -> Vec<Model> {
    (1..=n).map(Model::new).collect()
}

/// Row view without a disposal capability.
pub struct ItemRow {
    pub element: ElementId,
    pub model: Option<EntityId>,
    pub renders: Cell<usize>,
}

impl ItemRow {
    pub fn for_model(model: Option<&Model>) -> Rc<Self> {
        Rc::new(ItemRow {
            element: ElementId::next(),
            model: model.map(Entity::entity_id),
            renders: Cell::new(0),
        })
    }
}

impl ItemView for ItemRow {
    fn element(&self) -> ElementId {
        self.element
    }

    fn render(&self) {
        self.renders.set(self.renders.get() + 1);
    }

    fn model(&self) -> Option<EntityId> {
        self.model
    }
}

/// Row view that tears itself down.
pub struct DisposableRow {
    pub element: ElementId,
    pub model: EntityId,
    pub disposed: Cell<bool>,
}

impl ItemView for DisposableRow {
    fn element(&self) -> ElementId {
        self.element
    }

    fn model(&self) -> Option<EntityId> {
        Some(self.model)
    }
}

impl Dispose for DisposableRow {
    fn dispose(&self, parent: &dyn Container) {
        self.disposed.set(true);
        parent.remove_child(self.element);
    }
}

pub fn item_view() -> Subview {
    Subview::shared(ItemRow::for_model(None))
}

pub struct Fixture {
    pub collection: Rc<Collection<Model>>,
    pub container: Rc<MemoryContainer>,
    pub view: CollectionView<Model>,
}

impl Fixture {
    pub fn children(&self) -> Vec<ElementId> {
        self.container.children()
    }

    pub fn assert_mirrored(&self) {
        let expected: Vec<ElementId> = self.view.subviews().iter().map(Subview::element).collect();
        assert_eq!(self.container.children(), expected);
    }
}

/// A rendered view over 100 models, one `ItemRow` each.
pub fn create_instance() -> Fixture {
    create_with(models(MODEL_COUNT), |model| {
        Subview::shared(ItemRow::for_model(Some(&**model)))
    })
}

pub fn create_with(models: Vec<Model>, factory: impl Fn(&Rc<Model>) -> Subview + 'static) -> Fixture {
    let collection = Rc::new(Collection::with_models(models));
    let container = Rc::new(MemoryContainer::new());
    let view = CollectionView::new(
        CollectionViewOptions::new()
            .collection(Rc::clone(&collection))
            .container(Rc::clone(&container))
            .item_view(factory),
    )
    .expect("collection view builds");
    view.render().expect("render succeeds");
    Fixture {
        collection,
        container,
        view,
    }
}
