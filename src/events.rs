//! Typed publish/subscribe surface used for subview lifecycle notifications.
//!
//! An [`Events`] value maps each event to an ordered list of listeners.
//! Listeners run synchronously, in subscription order, on the thread that
//! emits. The listener list is snapshotted before delivery, so a listener may
//! subscribe, unsubscribe or re-enter the emitter's owner while it runs; such
//! changes take effect from the next emission.
use indexmap::IndexMap;
use phf::phf_map;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;
use std::str::FromStr;

/// Notifications emitted by a collection view around structural changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubviewEvent {
    BeforeAdd,
    Add,
    BeforeRemove,
    Remove,
}

// Compile-time event name lookup
static SUBVIEW_EVENTS: phf::Map<&'static str, SubviewEvent> = phf_map! {
    "subview:before:add" => SubviewEvent::BeforeAdd,
    "subview:add" => SubviewEvent::Add,
    "subview:before:remove" => SubviewEvent::BeforeRemove,
    "subview:remove" => SubviewEvent::Remove,
};

impl SubviewEvent {
    pub const fn name(self) -> &'static str {
        match self {
            SubviewEvent::BeforeAdd => "subview:before:add",
            SubviewEvent::Add => "subview:add",
            SubviewEvent::BeforeRemove => "subview:before:remove",
            SubviewEvent::Remove => "subview:remove",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        SUBVIEW_EVENTS.get(name).copied()
    }
}

impl fmt::Display for SubviewEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SubviewEvent {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownEvent(s.to_string()))
    }
}

/// Notifications a subview receives about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewEvent {
    Added,
    Removed,
}

impl ViewEvent {
    pub const fn name(self) -> &'static str {
        match self {
            ViewEvent::Added => "added",
            ViewEvent::Removed => "removed",
        }
    }
}

impl fmt::Display for ViewEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ViewEvent {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "added" => Ok(ViewEvent::Added),
            "removed" => Ok(ViewEvent::Removed),
            other => Err(UnknownEvent(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event name '{0}'")]
pub struct UnknownEvent(pub String);

/// Token returned by [`Events::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type Listener<A> = Rc<dyn Fn(&A)>;

pub struct Events<Ev, A> {
    next_id: Cell<u64>,
    listeners: RefCell<IndexMap<Ev, Vec<(ListenerId, Listener<A>)>>>,
}

impl<Ev, A> Default for Events<Ev, A> {
    fn default() -> Self {
        Self {
            next_id: Cell::new(1),
            listeners: RefCell::new(IndexMap::new()),
        }
    }
}

impl<Ev: fmt::Debug, A> fmt::Debug for Events<Ev, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.borrow();
        f.debug_map()
            .entries(listeners.iter().map(|(ev, list)| (ev, list.len())))
            .finish()
    }
}

impl<Ev: Copy + Eq + Hash, A> Events<Ev, A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `listener` to `event`.
    ///
    /// Subscribing the same `Rc` twice to the same event is idempotent and
    /// returns the existing id.
    pub fn on(&self, event: Ev, listener: Listener<A>) -> ListenerId {
        let mut listeners = self.listeners.borrow_mut();
        let list = listeners.entry(event).or_default();
        if let Some((id, _)) = list
            .iter()
            .find(|(_, existing)| std::ptr::addr_eq(Rc::as_ptr(existing), Rc::as_ptr(&listener)))
        {
            return *id;
        }
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        list.push((id, listener));
        id
    }

    /// Convenience wrapper over [`Events::on`] for a plain closure.
    pub fn on_fn(&self, event: Ev, f: impl Fn(&A) + 'static) -> ListenerId {
        self.on(event, Rc::new(f))
    }

    /// Unsubscribe; returns `false` when `id` was not subscribed to `event`.
    pub fn off(&self, event: Ev, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let Some(list) = listeners.get_mut(&event) else {
            return false;
        };
        let before = list.len();
        list.retain(|(existing, _)| *existing != id);
        before != list.len()
    }

    pub fn off_all(&self) {
        self.listeners.borrow_mut().clear();
    }

    pub fn listener_count(&self, event: Ev) -> usize {
        self.listeners.borrow().get(&event).map_or(0, Vec::len)
    }

    pub fn emit(&self, event: Ev, args: &A) {
        let snapshot: Vec<Listener<A>> = match self.listeners.borrow().get(&event) {
            Some(list) => list.iter().map(|(_, l)| Rc::clone(l)).collect(),
            None => return,
        };
        for listener in snapshot {
            listener(args);
        }
    }
}
