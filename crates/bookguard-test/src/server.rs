//! Simulated game server
//!
//! Owns containers, an event bus and a chunk store, and drives the three
//! guarded paths the way a real host does: build the event, dispatch it,
//! then commit whatever the listeners left on it.

use bookguard_host::{BookMeta, HostError, ItemKind, ItemStack};
use thiserror::Error;
use tracing::debug;

use crate::{
    ChunkStore, Container, ContainerId, LocalEventBus, SaveError, SimEditEvent, SimItem,
    SimOpenEvent, SimTransferEvent, MAX_BOOK_PAGES,
};

/// Errors from simulated player and hopper actions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServerError {
    #[error("Unknown container: {0}")]
    UnknownContainer(ContainerId),

    #[error("{container} slot {slot} is empty")]
    EmptySlot { container: ContainerId, slot: usize },

    #[error("{container} slot {slot} does not hold a writable book")]
    NotWritable { container: ContainerId, slot: usize },

    #[error("Edit has {pages} pages, over the {max} page limit")]
    TooManyPages { pages: usize, max: usize },

    #[error("{0} is full")]
    DestinationFull(ContainerId),

    #[error("Event was cancelled")]
    Cancelled,

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Save(#[from] SaveError),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// In-memory host with guarded event paths
pub struct SimulatedServer {
    bus: LocalEventBus,
    containers: Vec<Container>,
    store: ChunkStore,
}

impl SimulatedServer {
    pub fn new() -> Self {
        Self::with_store(ChunkStore::default())
    }

    pub fn with_store(store: ChunkStore) -> Self {
        SimulatedServer {
            bus: LocalEventBus::new(),
            containers: Vec::new(),
            store,
        }
    }

    pub fn bus(&self) -> &LocalEventBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut LocalEventBus {
        &mut self.bus
    }

    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    pub fn add_container(&mut self, size: usize) -> ContainerId {
        let id = ContainerId(self.containers.len() as u32);
        self.containers.push(Container::new(id, size));
        id
    }

    pub fn container_ids(&self) -> Vec<ContainerId> {
        self.containers.iter().map(|c| c.id).collect()
    }

    pub fn container(&self, id: ContainerId) -> ServerResult<&Container> {
        self.containers
            .get(id.0 as usize)
            .ok_or(ServerError::UnknownContainer(id))
    }

    fn container_mut(&mut self, id: ContainerId) -> ServerResult<&mut Container> {
        self.containers
            .get_mut(id.0 as usize)
            .ok_or(ServerError::UnknownContainer(id))
    }

    /// Put an item straight into a slot with no event, as commands or other
    /// plugins can
    pub fn place(&mut self, id: ContainerId, slot: usize, item: SimItem) -> ServerResult<()> {
        self.container_mut(id)?.set(slot, item);
        Ok(())
    }

    /// A player rewrites the pages of the writable book in `id[slot]`
    pub fn edit_book(&mut self, id: ContainerId, slot: usize, pages: Vec<String>) -> ServerResult<()> {
        let item = self
            .container(id)?
            .get(slot)
            .ok_or(ServerError::EmptySlot { container: id, slot })?;
        if item.kind != ItemKind::WritableBook {
            return Err(ServerError::NotWritable { container: id, slot });
        }
        if pages.len() > MAX_BOOK_PAGES {
            return Err(ServerError::TooManyPages {
                pages: pages.len(),
                max: MAX_BOOK_PAGES,
            });
        }

        let mut proposed = item.book_meta().unwrap_or_default();
        proposed.replace_pages(pages);

        let mut event = SimEditEvent::new(id, slot, Some(proposed));
        self.bus.dispatch_edit(&mut event);
        if event.cancelled {
            return Err(ServerError::Cancelled);
        }

        if let Some(meta) = event.into_meta() {
            debug!(container = %id, slot, pages = meta.page_count(), "committing book edit");
            if let Some(item) = self.container_mut(id)?.get_mut(slot) {
                item.set_book_meta(meta)?;
            }
        }
        Ok(())
    }

    /// A player opens a container
    pub fn open(&mut self, id: ContainerId) -> ServerResult<()> {
        let contents = self.container_mut(id)?.take_contents();

        let mut event = SimOpenEvent::new(id, contents);
        self.bus.dispatch_open(&mut event);

        self.container_mut(id)?.restore_contents(event.into_contents());
        Ok(())
    }

    /// A hopper moves the stack in `from[slot]` into the first free slot of
    /// `to`, returning the destination slot
    pub fn transfer(&mut self, from: ContainerId, slot: usize, to: ContainerId) -> ServerResult<usize> {
        let dest_slot = self
            .container(to)?
            .first_empty()
            .ok_or(ServerError::DestinationFull(to))?;
        let item = self
            .container_mut(from)?
            .take(slot)
            .ok_or(ServerError::EmptySlot { container: from, slot })?;

        let mut event = SimTransferEvent::new(from, to, item.clone());
        self.bus.dispatch_transfer(&mut event);

        if event.cancelled {
            self.container_mut(from)?.set(slot, item);
            return Err(ServerError::Cancelled);
        }

        let moved = event.into_item().unwrap_or(item);
        self.container_mut(to)?.set(dest_slot, moved);
        Ok(dest_slot)
    }

    /// Persist one container
    pub fn save(&mut self, id: ContainerId) -> ServerResult<usize> {
        let container = self
            .containers
            .get(id.0 as usize)
            .ok_or(ServerError::UnknownContainer(id))?;
        Ok(self.store.save(container)?)
    }

    /// Persist every container, returning the ones that failed
    pub fn save_all(&mut self) -> Vec<(ContainerId, SaveError)> {
        let mut failures = Vec::new();
        for container in &self.containers {
            if let Err(err) = self.store.save(container) {
                failures.push((container.id, err));
            }
        }
        failures
    }

    /// Drop in-memory state and reload every container from its last snapshot
    pub fn restart(&mut self) {
        for container in &mut self.containers {
            let (id, size) = (container.id, container.size());
            *container = self
                .store
                .load(id)
                .unwrap_or_else(|| Container::new(id, size));
        }
    }

    /// Total amount of a material across all containers
    pub fn count_material(&self, name: &str) -> u32 {
        self.containers.iter().map(|c| c.count_material(name)).sum()
    }
}

impl Default for SimulatedServer {
    fn default() -> Self {
        Self::new()
    }
}
