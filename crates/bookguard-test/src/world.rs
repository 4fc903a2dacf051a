//! In-memory items and containers

use std::fmt;

use bookguard_host::{BookMeta, HostError, HostResult, ItemKind, ItemStack};

/// Most pages the simulated host keeps on a book; extra pages are dropped
pub const MAX_BOOK_PAGES: usize = 100;

fn capped(mut pages: Vec<String>) -> Vec<String> {
    pages.truncate(MAX_BOOK_PAGES);
    pages
}

/// Book metadata held by a simulated item
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimBookMeta {
    pub title: Option<String>,
    pub author: Option<String>,
    pages: Vec<String>,
}

impl SimBookMeta {
    pub fn new(pages: Vec<String>) -> Self {
        SimBookMeta {
            title: None,
            author: None,
            pages: capped(pages),
        }
    }

    pub fn signed(title: impl Into<String>, author: impl Into<String>, pages: Vec<String>) -> Self {
        SimBookMeta {
            title: Some(title.into()),
            author: Some(author.into()),
            pages: capped(pages),
        }
    }

    pub fn page_text(&self) -> &[String] {
        &self.pages
    }

    /// Replace the whole page list, as a finished edit does
    pub fn replace_pages(&mut self, pages: Vec<String>) {
        self.pages = capped(pages);
    }
}

impl BookMeta for SimBookMeta {
    fn pages(&self) -> Vec<String> {
        self.pages.clone()
    }

    fn set_page(&mut self, page: usize, text: &str) -> HostResult<()> {
        let count = self.pages.len();
        let target = page
            .checked_sub(1)
            .and_then(|i| self.pages.get_mut(i))
            .ok_or(HostError::PageOutOfRange { page, count })?;
        target.clear();
        target.push_str(text);
        Ok(())
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Simulated item stack
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimItem {
    pub kind: ItemKind,
    pub amount: u8,
    meta: Option<SimBookMeta>,
}

impl SimItem {
    pub fn writable_book(pages: Vec<String>) -> Self {
        SimItem {
            kind: ItemKind::WritableBook,
            amount: 1,
            meta: Some(SimBookMeta::new(pages)),
        }
    }

    pub fn written_book(title: &str, author: &str, pages: Vec<String>) -> Self {
        SimItem {
            kind: ItemKind::WrittenBook,
            amount: 1,
            meta: Some(SimBookMeta::signed(title, author, pages)),
        }
    }

    pub fn material(name: &str, amount: u8) -> Self {
        SimItem {
            kind: ItemKind::other(name),
            amount,
            meta: None,
        }
    }

    /// Rebuild an item from its persisted parts
    pub(crate) fn from_parts(kind: ItemKind, amount: u8, meta: Option<SimBookMeta>) -> Self {
        SimItem { kind, amount, meta }
    }

    pub fn meta(&self) -> Option<&SimBookMeta> {
        self.meta.as_ref()
    }

    /// Size of the book pages in UTF-8, zero for non-books
    pub fn payload_size(&self) -> usize {
        self.meta
            .as_ref()
            .map(|m| bookguard_core::measure(m.page_text()))
            .unwrap_or(0)
    }
}

impl ItemStack for SimItem {
    type Meta = SimBookMeta;

    fn kind(&self) -> ItemKind {
        self.kind.clone()
    }

    fn book_meta(&self) -> Option<SimBookMeta> {
        self.meta.clone()
    }

    fn set_book_meta(&mut self, meta: SimBookMeta) -> HostResult<()> {
        if !self.kind.is_book() {
            return Err(HostError::NotABook);
        }
        self.meta = Some(meta);
        Ok(())
    }
}

/// Container identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(pub u32);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "container#{}", self.0)
    }
}

/// Fixed-size slotted container
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Container {
    pub id: ContainerId,
    slots: Vec<Option<SimItem>>,
}

impl Container {
    pub fn new(id: ContainerId, size: usize) -> Self {
        Container {
            id,
            slots: vec![None; size],
        }
    }

    pub(crate) fn from_slots(id: ContainerId, slots: Vec<Option<SimItem>>) -> Self {
        Container { id, slots }
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, slot: usize) -> Option<&SimItem> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut SimItem> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    /// Put `item` into `slot`, returning what was there
    pub fn set(&mut self, slot: usize, item: SimItem) -> Option<SimItem> {
        self.slots.get_mut(slot).and_then(|s| s.replace(item))
    }

    pub fn take(&mut self, slot: usize) -> Option<SimItem> {
        self.slots.get_mut(slot).and_then(Option::take)
    }

    pub fn first_empty(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    pub fn slots(&self) -> &[Option<SimItem>] {
        &self.slots
    }

    /// Move the contents out, leaving every slot empty
    pub(crate) fn take_contents(&mut self) -> Vec<Option<SimItem>> {
        let size = self.slots.len();
        std::mem::replace(&mut self.slots, vec![None; size])
    }

    pub(crate) fn restore_contents(&mut self, contents: Vec<Option<SimItem>>) {
        self.slots = contents;
    }

    pub fn items(&self) -> impl Iterator<Item = &SimItem> {
        self.slots.iter().flatten()
    }

    /// Total amount of a named material
    pub fn count_material(&self, name: &str) -> u32 {
        self.items()
            .filter(|item| matches!(&item.kind, ItemKind::Other(n) if n == name))
            .map(|item| u32::from(item.amount))
            .sum()
    }

    /// Largest book payload in the container, in UTF-8 bytes
    pub fn largest_payload(&self) -> usize {
        self.items().map(SimItem::payload_size).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_page_bounds() {
        let mut meta = SimBookMeta::new(vec!["a".into(), "b".into()]);
        assert!(meta.set_page(2, "z").is_ok());
        assert_eq!(meta.page_text(), &["a", "z"]);
        assert_eq!(
            meta.set_page(0, "z"),
            Err(HostError::PageOutOfRange { page: 0, count: 2 })
        );
        assert_eq!(
            meta.set_page(3, "z"),
            Err(HostError::PageOutOfRange { page: 3, count: 2 })
        );
    }

    #[test]
    fn test_books_are_capped() {
        let pages = vec!["p".to_string(); MAX_BOOK_PAGES + 50];
        let book = SimItem::written_book("Long", "anon", pages.clone());
        assert_eq!(book.meta().unwrap().page_count(), MAX_BOOK_PAGES);

        let mut meta = SimBookMeta::default();
        meta.replace_pages(pages);
        assert_eq!(meta.page_count(), MAX_BOOK_PAGES);
        assert_eq!(MAX_BOOK_PAGES, bookguard_core::DEFAULT_MAX_PAGES);
    }

    #[test]
    fn test_non_book_rejects_meta() {
        let mut sword = SimItem::material("iron_sword", 1);
        assert_eq!(
            sword.set_book_meta(SimBookMeta::default()),
            Err(HostError::NotABook)
        );
        assert_eq!(sword.payload_size(), 0);
    }

    #[test]
    fn test_container_slots() {
        let mut chest = Container::new(ContainerId(1), 3);
        assert_eq!(chest.first_empty(), Some(0));

        chest.set(0, SimItem::material("diamond", 64));
        chest.set(2, SimItem::material("diamond", 10));
        assert_eq!(chest.first_empty(), Some(1));
        assert_eq!(chest.count_material("diamond"), 74);

        let taken = chest.take(0).unwrap();
        assert_eq!(taken.amount, 64);
        assert_eq!(chest.count_material("diamond"), 10);
        assert!(chest.set(7, taken).is_none());
    }

    #[test]
    fn test_largest_payload() {
        let mut chest = Container::new(ContainerId(1), 2);
        chest.set(0, SimItem::writable_book(vec!["abc".into(), "de".into()]));
        chest.set(1, SimItem::written_book("t", "a", vec!["x".repeat(10)]));
        assert_eq!(chest.largest_payload(), 10);
    }
}
