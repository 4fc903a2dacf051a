//! Event definitions
//!
//! The three host events that can carry a book toward a saved container:
//! - a player finishing a book edit
//! - any container (a player's own inventory included) being opened
//! - an item moved programmatically from one inventory to another
//!
//! Each event exposes what it carries plus an explicit commit mutator.

use std::fmt;

use crate::{BookMeta, HostResult, ItemStack};

/// Listener priority.
///
/// Higher priorities are dispatched first, so a `Highest` listener observes
/// and mutates an event before any other listener sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Priority {
    Lowest = 0,
    Low = 1,
    Normal = 2,
    High = 3,
    Highest = 4,
}

/// Which host event an interceptor serves
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InterceptionPoint {
    Edit,
    Open,
    Transfer,
}

impl InterceptionPoint {
    pub fn all() -> &'static [InterceptionPoint] {
        &[
            InterceptionPoint::Edit,
            InterceptionPoint::Open,
            InterceptionPoint::Transfer,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            InterceptionPoint::Edit => "edit",
            InterceptionPoint::Open => "open",
            InterceptionPoint::Transfer => "transfer",
        }
    }
}

impl fmt::Display for InterceptionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A player finished editing a writable book; the edit is not yet committed
pub trait BookEditEvent {
    type Meta: BookMeta;

    /// Proposed metadata
    fn new_book_meta(&self) -> Option<Self::Meta>;

    /// Replace the proposed metadata before the host commits it
    fn set_new_book_meta(&mut self, meta: Self::Meta) -> HostResult<()>;
}

/// A container is being opened for viewing
pub trait InventoryOpenEvent {
    type Item: ItemStack;

    fn slot_count(&self) -> usize;

    /// Item in `slot`, or `None` for an empty slot
    fn slot_mut(&mut self, slot: usize) -> Option<&mut Self::Item>;
}

/// An item is being moved between two inventories
pub trait ItemTransferEvent {
    type Item: ItemStack;

    /// Copy of the item in motion
    fn item(&self) -> Option<Self::Item>;

    /// Replace the item that lands in the destination
    fn set_item(&mut self, item: Self::Item) -> HostResult<()>;
}

/// Subscription handle returned by an [`EventBus`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Boxed event listener
pub type Handler<E> = Box<dyn FnMut(&mut E)>;

/// Host event bus
pub trait EventBus {
    type Edit: BookEditEvent;
    type Open: InventoryOpenEvent;
    type Transfer: ItemTransferEvent;

    fn on_book_edit(&mut self, priority: Priority, handler: Handler<Self::Edit>)
        -> SubscriptionId;

    fn on_inventory_open(
        &mut self,
        priority: Priority,
        handler: Handler<Self::Open>,
    ) -> SubscriptionId;

    fn on_item_transfer(
        &mut self,
        priority: Priority,
        handler: Handler<Self::Transfer>,
    ) -> SubscriptionId;

    /// Remove a listener; returns `false` if it was not registered
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
}
