//! Publish/subscribe primitive.
//!
//! Every decoupled notification in the engine (coordinate changes, sprite
//! creation, intersections, logic ticks, rendered frames, pointer hooks) goes
//! through an [`EventDistributor`]. Handlers are stored in insertion-ordered
//! slots with an id-to-slot index, so unsubscribing is O(1) and publishing
//! visits subscribers in the order they subscribed, skipping emptied slots.
//!
//! Publishing takes `&mut self`, so a handler can never reach back into the
//! distributor that is calling it. Subscriptions added or removed on a list
//! that has been taken out for an in-flight publish (see
//! [`SubscriberList::absorb`]) take effect once it is put back.

use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

/// Handle returned by `subscribe`; pass it to `unsubscribe` to detach.
///
/// Ids are unique process-wide, so a stale id never detaches a handler that
/// belongs to a different list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    fn next() -> Self {
        SubscriptionId(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed))
    }
}

/// Slot storage shared by every handler flavor.
pub struct SubscriberList<H: ?Sized> {
    slots: Vec<Option<(SubscriptionId, Box<H>)>>,
    index: FxHashMap<SubscriptionId, usize>,
    live: usize,
    /// Ids unsubscribed while this list was detached for an in-flight publish.
    missed: Vec<SubscriptionId>,
    detached: bool,
}

impl<H: ?Sized> Default for SubscriberList<H> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            index: FxHashMap::default(),
            live: 0,
            missed: Vec::new(),
            detached: false,
        }
    }
}

impl<H: ?Sized> SubscriberList<H> {
    pub fn insert(&mut self, handler: Box<H>) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.index.insert(id, self.slots.len());
        self.slots.push(Some((id, handler)));
        self.live += 1;
        id
    }

    /// Detach a handler. Unknown ids are ignored.
    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        match self.index.remove(&id) {
            Some(slot) => {
                self.slots[slot] = None;
                self.live -= 1;
                self.compact_if_sparse();
                true
            }
            None => {
                if self.detached {
                    self.missed.push(id);
                }
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
        self.live = 0;
    }

    /// Visit every live handler in subscription order.
    pub fn for_each(&mut self, mut f: impl FnMut(&mut H)) {
        for (_, handler) in self.slots.iter_mut().flatten() {
            f(&mut **handler);
        }
    }

    /// Swap the list out for an empty one that remembers what happens to it
    /// while the original is busy publishing.
    pub fn detach(&mut self) -> Self {
        let mut replacement = Self::default();
        replacement.detached = true;
        std::mem::replace(self, replacement)
    }

    /// Put a detached list back: `self` is the placeholder that collected
    /// changes during the publish, `original` the list that was published.
    pub fn absorb(&mut self, original: Self) {
        let placeholder = std::mem::replace(self, original);
        for id in placeholder.missed {
            self.remove(id);
        }
        for (id, handler) in placeholder.slots.into_iter().flatten() {
            self.index.insert(id, self.slots.len());
            self.slots.push(Some((id, handler)));
            self.live += 1;
        }
    }

    fn compact_if_sparse(&mut self) {
        if self.slots.len() < 16 || self.live * 2 > self.slots.len() {
            return;
        }
        self.slots.retain(Option::is_some);
        self.index.clear();
        for (slot, entry) in self.slots.iter().enumerate() {
            if let Some((id, _)) = entry {
                self.index.insert(*id, slot);
            }
        }
    }
}

impl<H: ?Sized> fmt::Debug for SubscriberList<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberList")
            .field("subscribers", &self.live)
            .finish()
    }
}

/// Single-payload event distributor. Use `EventDistributor<()>` for events
/// without a payload and [`EventDistributor::notify`] to fire them.
pub struct EventDistributor<T> {
    handlers: SubscriberList<dyn FnMut(&T)>,
}

impl<T> Default for EventDistributor<T> {
    fn default() -> Self {
        Self {
            handlers: SubscriberList::default(),
        }
    }
}

impl<T> EventDistributor<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&T) + 'static) -> SubscriptionId {
        self.handlers.insert(Box::new(handler))
    }

    /// Returns false when the id was not subscribed here.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.handlers.remove(id)
    }

    pub fn publish(&mut self, payload: &T) {
        self.handlers.for_each(|handler| handler(payload));
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Detach every subscriber at once.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

impl EventDistributor<()> {
    pub fn notify(&mut self) {
        self.publish(&());
    }
}

impl<T> fmt::Debug for EventDistributor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDistributor")
            .field("subscribers", &self.handlers.len())
            .finish()
    }
}
