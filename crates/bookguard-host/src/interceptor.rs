//! Event interceptors
//!
//! Three thin adapters from host events to the shared [`Policy`]. Every
//! adapter follows the same steps:
//! 1. Extract the book metadata carried by the event
//! 2. Snapshot its pages and enforce the policy
//! 3. If neutralized, write pages back (1-based) and commit onto the event
//!
//! Nothing here ever fails the host operation. Missing items or metadata are
//! skipped, and commits the host refuses are logged and counted.

use std::sync::Arc;

use bookguard_core::{Policy, Verdict};
use tracing::{debug, trace, warn};

use crate::{
    write_pages, BookEditEvent, BookMeta, GuardStats, HostError, HostResult, InterceptionPoint,
    InventoryOpenEvent, ItemStack, ItemTransferEvent,
};

/// Result of running one interceptor on one event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterceptOutcome {
    /// The event carried no book payload
    Skipped,
    /// Every payload was at or below the threshold
    Clean,
    /// `slots` payloads were neutralized and committed
    Neutralized { slots: usize },
    /// A neutralized payload could not be committed back to the host
    Failed,
}

/// The three interceptors, sharing one policy
#[derive(Debug)]
pub struct Interceptors {
    policy: Policy,
    stats: Arc<GuardStats>,
}

impl Interceptors {
    pub fn new(policy: Policy, stats: Arc<GuardStats>) -> Self {
        Interceptors { policy, stats }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn stats(&self) -> &GuardStats {
        &self.stats
    }

    /// Enforce on a book edit before the host commits it
    pub fn on_book_edit<E: BookEditEvent>(&self, event: &mut E) -> InterceptOutcome {
        let point = InterceptionPoint::Edit;
        self.stats.record_event(point);

        let Some(mut meta) = event.new_book_meta() else {
            trace!(%point, "edit event without book metadata");
            return InterceptOutcome::Skipped;
        };

        let committed = self
            .neutralize(&mut meta, point)
            .and_then(|changed| {
                if changed {
                    event.set_new_book_meta(meta)?;
                }
                Ok(changed)
            });

        self.conclude(point, committed)
    }

    /// Sweep every book in a container being opened
    pub fn on_inventory_open<E: InventoryOpenEvent>(&self, event: &mut E) -> InterceptOutcome {
        let point = InterceptionPoint::Open;
        self.stats.record_event(point);

        let mut books = 0;
        let mut neutralized = 0;
        let mut failed = 0;

        for slot in 0..event.slot_count() {
            let Some(item) = event.slot_mut(slot) else {
                continue;
            };
            if !item.kind().is_book() {
                continue;
            }
            books += 1;

            match self.guard_item(item, point) {
                Ok(true) => {
                    neutralized += 1;
                    self.stats.record_neutralized(point);
                }
                Ok(false) => {}
                Err(err) => {
                    failed += 1;
                    self.write_failed(point, &err);
                }
            }
        }

        match (books, neutralized, failed) {
            (0, _, _) => InterceptOutcome::Skipped,
            (_, 0, 0) => InterceptOutcome::Clean,
            (_, 0, _) => InterceptOutcome::Failed,
            (_, slots, _) => InterceptOutcome::Neutralized { slots },
        }
    }

    /// Enforce on an item moving between inventories
    pub fn on_item_transfer<E: ItemTransferEvent>(&self, event: &mut E) -> InterceptOutcome {
        let point = InterceptionPoint::Transfer;
        self.stats.record_event(point);

        let Some(mut item) = event.item() else {
            trace!(%point, "transfer event without an item");
            return InterceptOutcome::Skipped;
        };
        if !item.kind().is_book() {
            return InterceptOutcome::Skipped;
        }

        let committed = self
            .guard_item(&mut item, point)
            .and_then(|changed| {
                if changed {
                    event.set_item(item)?;
                }
                Ok(changed)
            });

        self.conclude(point, committed)
    }

    /// Neutralize an item's book metadata and commit it onto the item
    fn guard_item<I: ItemStack>(&self, item: &mut I, point: InterceptionPoint) -> HostResult<bool> {
        let Some(mut meta) = item.book_meta() else {
            trace!(%point, kind = %item.kind(), "book without metadata");
            return Ok(false);
        };

        if !self.neutralize(&mut meta, point)? {
            return Ok(false);
        }
        item.set_book_meta(meta)?;
        Ok(true)
    }

    /// Enforce the policy on `meta`; returns whether its pages were rewritten
    fn neutralize<M: BookMeta>(&self, meta: &mut M, point: InterceptionPoint) -> HostResult<bool> {
        let mut payload = meta.payload();
        self.stats.record_checked(point);

        match self.policy.enforce(&mut payload) {
            Verdict::Neutralized { size, pages } => {
                debug!(
                    %point,
                    size = ?size,
                    threshold = self.policy.threshold(),
                    pages,
                    "neutralizing oversized book"
                );
                write_pages(meta, &payload)?;
                Ok(true)
            }
            Verdict::Untouched { .. } | Verdict::Unmeasured => Ok(false),
        }
    }

    fn conclude(&self, point: InterceptionPoint, committed: HostResult<bool>) -> InterceptOutcome {
        match committed {
            Ok(true) => {
                self.stats.record_neutralized(point);
                InterceptOutcome::Neutralized { slots: 1 }
            }
            Ok(false) => InterceptOutcome::Clean,
            Err(err) => {
                self.write_failed(point, &err);
                InterceptOutcome::Failed
            }
        }
    }

    fn write_failed(&self, point: InterceptionPoint, err: &HostError) {
        self.stats.record_write_failure(point);
        warn!(%point, error = %err, "could not commit neutralized book");
    }
}
