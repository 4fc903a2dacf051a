//! Simulated host events and event bus
//!
//! Listeners run synchronously in descending priority. Listeners of equal
//! priority run in registration order.

use bookguard_host::{
    BookEditEvent, EventBus, Handler, HostResult, InventoryOpenEvent, ItemTransferEvent, Priority,
    SubscriptionId,
};
use tracing::trace;

use crate::{ContainerId, SimBookMeta, SimItem};

/// A player finished editing the writable book in `container[slot]`
pub struct SimEditEvent {
    pub container: ContainerId,
    pub slot: usize,
    new_meta: Option<SimBookMeta>,
    pub cancelled: bool,
}

impl SimEditEvent {
    pub fn new(container: ContainerId, slot: usize, new_meta: Option<SimBookMeta>) -> Self {
        SimEditEvent {
            container,
            slot,
            new_meta,
            cancelled: false,
        }
    }

    /// Metadata the host will commit once dispatch finishes
    pub fn into_meta(self) -> Option<SimBookMeta> {
        self.new_meta
    }
}

impl BookEditEvent for SimEditEvent {
    type Meta = SimBookMeta;

    fn new_book_meta(&self) -> Option<SimBookMeta> {
        self.new_meta.clone()
    }

    fn set_new_book_meta(&mut self, meta: SimBookMeta) -> HostResult<()> {
        self.new_meta = Some(meta);
        Ok(())
    }
}

/// A container is being opened; listeners see its contents
pub struct SimOpenEvent {
    pub container: ContainerId,
    contents: Vec<Option<SimItem>>,
}

impl SimOpenEvent {
    pub fn new(container: ContainerId, contents: Vec<Option<SimItem>>) -> Self {
        SimOpenEvent {
            container,
            contents,
        }
    }

    pub fn into_contents(self) -> Vec<Option<SimItem>> {
        self.contents
    }
}

impl InventoryOpenEvent for SimOpenEvent {
    type Item = SimItem;

    fn slot_count(&self) -> usize {
        self.contents.len()
    }

    fn slot_mut(&mut self, slot: usize) -> Option<&mut SimItem> {
        self.contents.get_mut(slot).and_then(Option::as_mut)
    }
}

/// An item is moving from `source` to `destination`
pub struct SimTransferEvent {
    pub source: ContainerId,
    pub destination: ContainerId,
    item: Option<SimItem>,
    pub cancelled: bool,
}

impl SimTransferEvent {
    pub fn new(source: ContainerId, destination: ContainerId, item: SimItem) -> Self {
        SimTransferEvent {
            source,
            destination,
            item: Some(item),
            cancelled: false,
        }
    }

    pub fn into_item(self) -> Option<SimItem> {
        self.item
    }
}

impl ItemTransferEvent for SimTransferEvent {
    type Item = SimItem;

    fn item(&self) -> Option<SimItem> {
        self.item.clone()
    }

    fn set_item(&mut self, item: SimItem) -> HostResult<()> {
        self.item = Some(item);
        Ok(())
    }
}

struct Listener<E> {
    id: SubscriptionId,
    priority: Priority,
    handler: Handler<E>,
}

/// Listeners for one event kind, kept in dispatch order
struct Listeners<E> {
    list: Vec<Listener<E>>,
}

impl<E> Listeners<E> {
    fn new() -> Self {
        Listeners { list: Vec::new() }
    }

    fn insert(&mut self, id: SubscriptionId, priority: Priority, handler: Handler<E>) {
        let pos = self
            .list
            .iter()
            .position(|l| l.priority < priority)
            .unwrap_or(self.list.len());
        self.list.insert(
            pos,
            Listener {
                id,
                priority,
                handler,
            },
        );
    }

    fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.list.len();
        self.list.retain(|l| l.id != id);
        self.list.len() != before
    }

    fn dispatch(&mut self, event: &mut E) {
        for listener in &mut self.list {
            (listener.handler)(event);
        }
    }
}

/// Single-threaded event bus
pub struct LocalEventBus {
    next_id: u64,
    edit: Listeners<SimEditEvent>,
    open: Listeners<SimOpenEvent>,
    transfer: Listeners<SimTransferEvent>,
    dispatched: u64,
}

impl LocalEventBus {
    pub fn new() -> Self {
        LocalEventBus {
            next_id: 0,
            edit: Listeners::new(),
            open: Listeners::new(),
            transfer: Listeners::new(),
            dispatched: 0,
        }
    }

    fn next_id(&mut self) -> SubscriptionId {
        self.next_id += 1;
        SubscriptionId(self.next_id)
    }

    pub fn listener_count(&self) -> usize {
        self.edit.list.len() + self.open.list.len() + self.transfer.list.len()
    }

    /// Events dispatched so far
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    pub fn dispatch_edit(&mut self, event: &mut SimEditEvent) {
        trace!(container = %event.container, slot = event.slot, "dispatch edit");
        self.dispatched += 1;
        self.edit.dispatch(event);
    }

    pub fn dispatch_open(&mut self, event: &mut SimOpenEvent) {
        trace!(container = %event.container, "dispatch open");
        self.dispatched += 1;
        self.open.dispatch(event);
    }

    pub fn dispatch_transfer(&mut self, event: &mut SimTransferEvent) {
        trace!(
            source = %event.source,
            destination = %event.destination,
            "dispatch transfer"
        );
        self.dispatched += 1;
        self.transfer.dispatch(event);
    }
}

impl Default for LocalEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus for LocalEventBus {
    type Edit = SimEditEvent;
    type Open = SimOpenEvent;
    type Transfer = SimTransferEvent;

    fn on_book_edit(
        &mut self,
        priority: Priority,
        handler: Handler<SimEditEvent>,
    ) -> SubscriptionId {
        let id = self.next_id();
        self.edit.insert(id, priority, handler);
        id
    }

    fn on_inventory_open(
        &mut self,
        priority: Priority,
        handler: Handler<SimOpenEvent>,
    ) -> SubscriptionId {
        let id = self.next_id();
        self.open.insert(id, priority, handler);
        id
    }

    fn on_item_transfer(
        &mut self,
        priority: Priority,
        handler: Handler<SimTransferEvent>,
    ) -> SubscriptionId {
        let id = self.next_id();
        self.transfer.insert(id, priority, handler);
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.edit.remove(id) || self.open.remove(id) || self.transfer.remove(id)
    }
}
