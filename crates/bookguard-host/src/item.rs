//! Item and book metadata as seen through the host API
//!
//! The host owns every item. The guard reads page text through [`BookMeta`]
//! and commits changes back with [`ItemStack::set_book_meta`]; it never
//! assumes that mutating a fetched metadata copy is visible to the host.

use std::fmt;

use bookguard_core::Payload;

use crate::HostResult;

/// Item kind classification
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// Book and quill, still editable
    WritableBook,
    /// Signed book
    WrittenBook,
    /// Any other material, by host name
    Other(String),
}

impl ItemKind {
    pub fn other(name: impl Into<String>) -> Self {
        ItemKind::Other(name.into())
    }

    /// Can items of this kind carry a page payload?
    #[inline]
    pub fn is_book(&self) -> bool {
        matches!(self, ItemKind::WritableBook | ItemKind::WrittenBook)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::WritableBook => f.write_str("writable_book"),
            ItemKind::WrittenBook => f.write_str("written_book"),
            ItemKind::Other(name) => f.write_str(name),
        }
    }
}

/// Book metadata handle
pub trait BookMeta: Clone {
    /// Page text in order
    fn pages(&self) -> Vec<String>;

    /// Replace the text of page `page`, counted from 1
    fn set_page(&mut self, page: usize, text: &str) -> HostResult<()>;

    fn page_count(&self) -> usize {
        self.pages().len()
    }

    /// Snapshot the pages as a payload
    fn payload(&self) -> Payload {
        Payload::new(self.pages())
    }
}

/// Host item stack
pub trait ItemStack {
    type Meta: BookMeta;

    fn kind(&self) -> ItemKind;

    /// Book metadata, if the item carries any
    fn book_meta(&self) -> Option<Self::Meta>;

    /// Commit book metadata onto the item
    fn set_book_meta(&mut self, meta: Self::Meta) -> HostResult<()>;
}

/// Write every page of `payload` onto `meta` through the 1-based page API
pub fn write_pages<M: BookMeta>(meta: &mut M, payload: &Payload) -> HostResult<()> {
    for (index, text) in payload.pages().iter().enumerate() {
        meta.set_page(index + 1, text)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HostError;

    #[derive(Clone, Debug)]
    struct Pages(Vec<String>);

    impl BookMeta for Pages {
        fn pages(&self) -> Vec<String> {
            self.0.clone()
        }

        fn set_page(&mut self, page: usize, text: &str) -> HostResult<()> {
            let count = self.0.len();
            let slot = page
                .checked_sub(1)
                .and_then(|i| self.0.get_mut(i))
                .ok_or(HostError::PageOutOfRange { page, count })?;
            *slot = text.to_string();
            Ok(())
        }
    }

    #[test]
    fn test_book_kinds() {
        assert!(ItemKind::WritableBook.is_book());
        assert!(ItemKind::WrittenBook.is_book());
        assert!(!ItemKind::other("iron_sword").is_book());
        assert_eq!(ItemKind::other("iron_sword").to_string(), "iron_sword");
    }

    #[test]
    fn test_write_pages_is_one_based() {
        let mut meta = Pages(vec!["a".into(), "b".into()]);
        write_pages(&mut meta, &Payload::from_pages(["x", "y"])).unwrap();
        assert_eq!(meta.pages(), vec!["x", "y"]);
    }

    #[test]
    fn test_write_pages_propagates_range_error() {
        let mut meta = Pages(vec!["a".into()]);
        let err = write_pages(&mut meta, &Payload::from_pages(["x", "y"])).unwrap_err();
        assert_eq!(err, HostError::PageOutOfRange { page: 2, count: 1 });
    }

    #[test]
    fn test_default_payload_snapshot() {
        let meta = Pages(vec!["one".into(), "two".into()]);
        assert_eq!(meta.page_count(), 2);
        assert_eq!(meta.payload().measure(), 6);
    }
}
