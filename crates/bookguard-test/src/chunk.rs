//! Chunk store with a per-record size limit
//!
//! Reproduces the save failure being guarded against: when any item record
//! in a container encodes larger than the record limit, the whole save is
//! refused and the previously persisted snapshot stays on disk.
//!
//! Container layout:
//! - id: u32, slot count: u16
//! - per slot: present flag (u8), then record length (u32) + record
//!
//! Item record layout:
//! - kind tag (u8), material name for other kinds
//! - amount (u8), meta flag (u8)
//! - optional title and author, page count (u16), pages
//!
//! Strings are a u32 length followed by UTF-8 bytes.

use std::collections::HashMap;

use bookguard_host::ItemKind;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{Container, ContainerId, SimBookMeta, SimItem};

/// Record size at which the simulated save routine gives up
pub const DEFAULT_RECORD_LIMIT: usize = 32_767;

const KIND_WRITABLE_BOOK: u8 = 0x01;
const KIND_WRITTEN_BOOK: u8 = 0x02;
const KIND_OTHER: u8 = 0x03;

/// Chunk save errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SaveError {
    #[error("{container} slot {slot}: record is {size} bytes, over the {limit} byte limit")]
    RecordTooLarge {
        container: ContainerId,
        slot: usize,
        size: usize,
        limit: usize,
    },

    #[error("{container} slot {slot}: a field is too long to encode")]
    FieldTooLarge { container: ContainerId, slot: usize },

    #[error("{0} has too many slots to encode")]
    TooManySlots(ContainerId),
}

/// Persisted container snapshots
pub struct ChunkStore {
    record_limit: usize,
    saved: HashMap<ContainerId, Bytes>,
    failed_saves: u64,
}

impl ChunkStore {
    pub fn new(record_limit: usize) -> Self {
        ChunkStore {
            record_limit,
            saved: HashMap::new(),
            failed_saves: 0,
        }
    }

    pub fn record_limit(&self) -> usize {
        self.record_limit
    }

    pub fn failed_saves(&self) -> u64 {
        self.failed_saves
    }

    /// Persist a snapshot of `container`, returning the encoded size.
    ///
    /// On failure the previous snapshot is kept.
    pub fn save(&mut self, container: &Container) -> Result<usize, SaveError> {
        match self.encode(container) {
            Ok(bytes) => {
                let len = bytes.len();
                debug!(container = %container.id, bytes = len, "chunk saved");
                self.saved.insert(container.id, bytes);
                Ok(len)
            }
            Err(err) => {
                self.failed_saves += 1;
                warn!(error = %err, "chunk save failed, keeping previous snapshot");
                Err(err)
            }
        }
    }

    /// Load the last successful snapshot of `id`
    pub fn load(&self, id: ContainerId) -> Option<Container> {
        let mut buf = self.saved.get(&id)?.clone();
        decode_container(&mut buf)
    }

    pub fn has_snapshot(&self, id: ContainerId) -> bool {
        self.saved.contains_key(&id)
    }

    fn encode(&self, container: &Container) -> Result<Bytes, SaveError> {
        let slot_count =
            u16::try_from(container.size()).map_err(|_| SaveError::TooManySlots(container.id))?;

        let mut buf = BytesMut::new();
        buf.put_u32(container.id.0);
        buf.put_u16(slot_count);

        for (slot, item) in container.slots().iter().enumerate() {
            let Some(item) = item else {
                buf.put_u8(0);
                continue;
            };

            let record = encode_item(item).ok_or(SaveError::FieldTooLarge {
                container: container.id,
                slot,
            })?;
            if record.len() > self.record_limit {
                return Err(SaveError::RecordTooLarge {
                    container: container.id,
                    slot,
                    size: record.len(),
                    limit: self.record_limit,
                });
            }
            let len = u32::try_from(record.len()).map_err(|_| SaveError::FieldTooLarge {
                container: container.id,
                slot,
            })?;
            buf.put_u8(1);
            buf.put_u32(len);
            buf.put(record);
        }

        Ok(buf.freeze())
    }
}

impl Default for ChunkStore {
    fn default() -> Self {
        Self::new(DEFAULT_RECORD_LIMIT)
    }
}

/// Encode one item record, or `None` if a length does not fit its prefix
pub fn encode_item(item: &SimItem) -> Option<Bytes> {
    let mut buf = BytesMut::new();

    match &item.kind {
        ItemKind::WritableBook => buf.put_u8(KIND_WRITABLE_BOOK),
        ItemKind::WrittenBook => buf.put_u8(KIND_WRITTEN_BOOK),
        ItemKind::Other(name) => {
            buf.put_u8(KIND_OTHER);
            put_str(&mut buf, name)?;
        }
    }
    buf.put_u8(item.amount);

    match item.meta() {
        None => buf.put_u8(0),
        Some(meta) => {
            buf.put_u8(1);
            put_opt_str(&mut buf, meta.title.as_deref())?;
            put_opt_str(&mut buf, meta.author.as_deref())?;
            put_u16_len(&mut buf, meta.page_text().len())?;
            for page in meta.page_text() {
                put_str(&mut buf, page)?;
            }
        }
    }

    Some(buf.freeze())
}

fn decode_item(buf: &mut Bytes) -> Option<SimItem> {
    let kind = match get_u8(buf)? {
        KIND_WRITABLE_BOOK => ItemKind::WritableBook,
        KIND_WRITTEN_BOOK => ItemKind::WrittenBook,
        KIND_OTHER => ItemKind::Other(get_str(buf)?),
        _ => return None,
    };
    let amount = get_u8(buf)?;

    let meta = match get_u8(buf)? {
        0 => None,
        _ => {
            let title = get_opt_str(buf)?;
            let author = get_opt_str(buf)?;
            if buf.remaining() < 2 {
                return None;
            }
            let count = buf.get_u16() as usize;
            let pages = (0..count).map(|_| get_str(buf)).collect::<Option<Vec<_>>>()?;
            let mut meta = SimBookMeta::new(pages);
            meta.title = title;
            meta.author = author;
            Some(meta)
        }
    };

    Some(SimItem::from_parts(kind, amount, meta))
}

fn decode_container(buf: &mut Bytes) -> Option<Container> {
    if buf.remaining() < 6 {
        return None;
    }
    let id = ContainerId(buf.get_u32());
    let slot_count = buf.get_u16() as usize;

    let mut slots = Vec::with_capacity(slot_count);
    for _ in 0..slot_count {
        if get_u8(buf)? == 0 {
            slots.push(None);
            continue;
        }
        if buf.remaining() < 4 {
            return None;
        }
        let len = buf.get_u32() as usize;
        if buf.remaining() < len {
            return None;
        }
        let mut record = buf.split_to(len);
        slots.push(Some(decode_item(&mut record)?));
    }

    Some(Container::from_slots(id, slots))
}

fn put_u16_len(buf: &mut BytesMut, len: usize) -> Option<()> {
    buf.put_u16(u16::try_from(len).ok()?);
    Some(())
}

fn put_str(buf: &mut BytesMut, s: &str) -> Option<()> {
    buf.put_u32(u32::try_from(s.len()).ok()?);
    buf.put_slice(s.as_bytes());
    Some(())
}

fn put_opt_str(buf: &mut BytesMut, s: Option<&str>) -> Option<()> {
    match s {
        None => buf.put_u8(0),
        Some(s) => {
            buf.put_u8(1);
            put_str(buf, s)?;
        }
    }
    Some(())
}

fn get_u8(buf: &mut Bytes) -> Option<u8> {
    if buf.has_remaining() {
        Some(buf.get_u8())
    } else {
        None
    }
}

fn get_str(buf: &mut Bytes) -> Option<String> {
    if buf.remaining() < 4 {
        return None;
    }
    let len = buf.get_u32() as usize;
    if buf.remaining() < len {
        return None;
    }
    String::from_utf8(buf.split_to(len).to_vec()).ok()
}

fn get_opt_str(buf: &mut Bytes) -> Option<Option<String>> {
    match get_u8(buf)? {
        0 => Some(None),
        _ => get_str(buf).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chest_with(items: Vec<Option<SimItem>>) -> Container {
        Container::from_slots(ContainerId(7), items)
    }

    #[test]
    fn test_save_and_load() {
        let mut store = ChunkStore::default();
        let chest = chest_with(vec![
            Some(SimItem::material("diamond", 64)),
            None,
            Some(SimItem::written_book("Notes", "steve", vec!["hello".into()])),
        ]);

        assert!(store.save(&chest).is_ok());
        assert_eq!(store.load(ContainerId(7)), Some(chest));
    }

    #[test]
    fn test_oversized_record_keeps_previous_snapshot() {
        let mut store = ChunkStore::default();
        let mut chest = chest_with(vec![Some(SimItem::material("diamond", 64)), None]);
        store.save(&chest).unwrap();

        chest.take(0);
        chest.set(1, SimItem::writable_book(vec!["x".repeat(40_000)]));

        let err = store.save(&chest).unwrap_err();
        assert!(matches!(err, SaveError::RecordTooLarge { slot: 1, .. }));
        assert_eq!(store.failed_saves(), 1);

        let reloaded = store.load(ContainerId(7)).unwrap();
        assert_eq!(reloaded.count_material("diamond"), 64);
    }

    #[test]
    fn test_threshold_sized_book_saves() {
        let mut store = ChunkStore::default();
        let chest = chest_with(vec![Some(SimItem::written_book(
            "Long",
            "alex",
            vec!["y".repeat(14_000), "y".repeat(14_000)],
        ))]);
        assert!(store.save(&chest).is_ok());
    }

    #[test]
    fn test_length_prefix_overflow_writes_nothing() {
        let mut buf = BytesMut::new();
        assert_eq!(put_u16_len(&mut buf, usize::from(u16::MAX) + 1), None);
        assert!(buf.is_empty());

        assert_eq!(put_u16_len(&mut buf, usize::from(u16::MAX)), Some(()));
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn test_load_missing() {
        let store = ChunkStore::default();
        assert!(store.load(ContainerId(1)).is_none());
        assert!(!store.has_snapshot(ContainerId(1)));
    }

    #[test]
    fn test_truncated_snapshot_does_not_decode() {
        let item = encode_item(&SimItem::written_book("t", "a", vec!["page".into()])).unwrap();
        let mut truncated = item.slice(..item.len() - 2);
        assert!(decode_item(&mut truncated).is_none());
    }
}
