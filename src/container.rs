//! Container capability and an in-memory element list that records every patch.
use crate::types::{ContainerPatch, ElementId, PatchAction};
use std::cell::{Cell, RefCell};

/// Ordered list of rendered elements a collection view keeps in sync.
///
/// Inserting an element that is already a child moves it: the element is
/// detached from its old slot first, the same way a DOM node is.
pub trait Container {
    /// Ordered snapshot of the current children.
    fn children(&self) -> Vec<ElementId>;

    fn insert_before(&self, element: ElementId, reference: ElementId);

    fn insert_after(&self, element: ElementId, reference: ElementId);

    fn append(&self, element: ElementId);

    /// Removing an element that is not a child does nothing.
    fn remove_child(&self, element: ElementId);

    /// Detach the container's own element from its parent.
    fn detach(&self);
}

#[derive(Debug)]
pub struct MemoryContainer {
    element: ElementId,
    children: RefCell<Vec<ElementId>>,
    attached: Cell<bool>,
    patches: RefCell<Vec<ContainerPatch>>,
}

impl Default for MemoryContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryContainer {
    pub fn new() -> Self {
        MemoryContainer {
            element: ElementId::next(),
            children: RefCell::new(Vec::new()),
            attached: Cell::new(true),
            patches: RefCell::new(Vec::new()),
        }
    }

    /// The container's own element.
    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn len(&self) -> usize {
        self.children.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.borrow().is_empty()
    }

    pub fn position(&self, element: ElementId) -> Option<usize> {
        self.children.borrow().iter().position(|&el| el == element)
    }

    pub fn is_attached(&self) -> bool {
        self.attached.get()
    }

    /// Every mutation applied so far, oldest first.
    pub fn patches(&self) -> Vec<ContainerPatch> {
        self.patches.borrow().clone()
    }

    pub fn take_patches(&self) -> Vec<ContainerPatch> {
        std::mem::take(&mut *self.patches.borrow_mut())
    }

    /// Serialize the mutation log, e.g. for replay on a real render target.
    pub fn patches_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&*self.patches.borrow())
    }

    fn record(&self, action: PatchAction, element: ElementId, reference: Option<ElementId>) {
        self.patches.borrow_mut().push(ContainerPatch {
            action,
            element,
            reference,
        });
    }

    /// Detach `element` if present, then place it relative to `reference`.
    fn place(&self, element: ElementId, reference: ElementId, offset: usize) -> bool {
        let mut children = self.children.borrow_mut();
        children.retain(|&el| el != element);
        match children.iter().position(|&el| el == reference) {
            Some(pos) => {
                children.insert(pos + offset, element);
                true
            }
            None => {
                log::warn!(
                    "MemoryContainer: reference {} is not a child of {}, appending {}",
                    reference,
                    self.element,
                    element
                );
                children.push(element);
                false
            }
        }
    }
}

impl Container for MemoryContainer {
    fn children(&self) -> Vec<ElementId> {
        self.children.borrow().clone()
    }

    fn insert_before(&self, element: ElementId, reference: ElementId) {
        if self.place(element, reference, 0) {
            self.record(PatchAction::InsertBefore, element, Some(reference));
        } else {
            self.record(PatchAction::Append, element, None);
        }
    }

    fn insert_after(&self, element: ElementId, reference: ElementId) {
        if self.place(element, reference, 1) {
            self.record(PatchAction::InsertAfter, element, Some(reference));
        } else {
            self.record(PatchAction::Append, element, None);
        }
    }

    fn append(&self, element: ElementId) {
        {
            let mut children = self.children.borrow_mut();
            children.retain(|&el| el != element);
            children.push(element);
        }
        self.record(PatchAction::Append, element, None);
    }

    fn remove_child(&self, element: ElementId) {
        let removed = {
            let mut children = self.children.borrow_mut();
            let before = children.len();
            children.retain(|&el| el != element);
            before != children.len()
        };
        if removed {
            self.record(PatchAction::Remove, element, None);
        }
    }

    fn detach(&self) {
        if self.attached.replace(false) {
            self.record(PatchAction::Detach, self.element, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(n: usize) -> (MemoryContainer, Vec<ElementId>) {
        let container = MemoryContainer::new();
        let els: Vec<ElementId> = (0..n).map(|_| ElementId::next()).collect();
        for &el in &els {
            container.append(el);
        }
        container.take_patches();
        (container, els)
    }

    #[test]
    fn insert_relative_to_reference() {
        let (container, els) = filled(3);
        let fresh = ElementId::next();
        container.insert_before(fresh, els[0]);
        assert_eq!(container.children(), vec![fresh, els[0], els[1], els[2]]);

        let other = ElementId::next();
        container.insert_after(other, els[2]);
        assert_eq!(container.children().last(), Some(&other));
        assert_eq!(container.len(), 5);
    }

    #[test]
    fn reinserting_a_child_moves_it() {
        let (container, els) = filled(4);
        container.insert_after(els[0], els[2]);
        assert_eq!(container.children(), vec![els[1], els[2], els[0], els[3]]);
        assert_eq!(container.len(), 4);

        container.insert_before(els[3], els[1]);
        assert_eq!(container.children(), vec![els[3], els[1], els[2], els[0]]);
    }

    #[test]
    fn unknown_reference_appends() {
        let (container, els) = filled(2);
        let fresh = ElementId::next();
        container.insert_after(fresh, ElementId::next());
        assert_eq!(container.children(), vec![els[0], els[1], fresh]);
        assert_eq!(container.patches()[0].action, PatchAction::Append);
    }

    #[test]
    fn remove_missing_child_is_silent() {
        let (container, els) = filled(2);
        container.remove_child(ElementId::next());
        assert!(container.patches().is_empty());
        container.remove_child(els[0]);
        assert_eq!(container.children(), vec![els[1]]);
        assert_eq!(container.patches().len(), 1);
    }

    #[test]
    fn detach_is_recorded_once() {
        let container = MemoryContainer::new();
        assert!(container.is_attached());
        container.detach();
        container.detach();
        assert!(!container.is_attached());
        assert_eq!(container.patches().len(), 1);
        assert_eq!(container.patches()[0].element, container.element());
    }

    #[test]
    fn patch_log_serializes() {
        let (container, els) = filled(1);
        let fresh = ElementId::next();
        container.insert_before(fresh, els[0]);
        let json: serde_json::Value =
            serde_json::from_str(&container.patches_json().unwrap()).unwrap();
        assert_eq!(json[0]["action"], "INSERT_BEFORE");
        assert_eq!(json[0]["element"], fresh.id());
        assert_eq!(json[0]["reference"], els[0].id());
    }
}
