//! Plugin lifecycle
//!
//! [`Guard`] owns the shared interceptors and the subscriptions it holds on a
//! host event bus. All three interceptors are registered at
//! [`Priority::Highest`] so they rewrite a book before any other listener,
//! and before persistence, sees it.

use std::sync::Arc;

use bookguard_core::{GuardConfig, Policy};
use tracing::info;

use crate::{EventBus, GuardStats, HostResult, Interceptors, Priority, SubscriptionId};

/// Bookguard plugin
pub struct Guard {
    interceptors: Arc<Interceptors>,
    stats: Arc<GuardStats>,
    subscriptions: Vec<SubscriptionId>,
}

impl Guard {
    /// Create a guard from a configuration, validating it first
    pub fn new(config: GuardConfig) -> HostResult<Self> {
        Ok(Self::with_policy(Policy::new(config)?))
    }

    pub fn with_policy(policy: Policy) -> Self {
        let stats = Arc::new(GuardStats::new());
        Guard {
            interceptors: Arc::new(Interceptors::new(policy, Arc::clone(&stats))),
            stats,
            subscriptions: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    pub fn interceptors(&self) -> &Arc<Interceptors> {
        &self.interceptors
    }

    pub fn stats(&self) -> &GuardStats {
        &self.stats
    }

    /// Register the three interceptors on `bus`. Does nothing if already active.
    pub fn activate<B: EventBus>(&mut self, bus: &mut B) {
        if self.is_active() {
            return;
        }

        let edit = Arc::clone(&self.interceptors);
        let open = Arc::clone(&self.interceptors);
        let transfer = Arc::clone(&self.interceptors);

        self.subscriptions = vec![
            bus.on_book_edit(
                Priority::Highest,
                Box::new(move |event: &mut B::Edit| {
                    edit.on_book_edit(event);
                }),
            ),
            bus.on_inventory_open(
                Priority::Highest,
                Box::new(move |event: &mut B::Open| {
                    open.on_inventory_open(event);
                }),
            ),
            bus.on_item_transfer(
                Priority::Highest,
                Box::new(move |event: &mut B::Transfer| {
                    transfer.on_item_transfer(event);
                }),
            ),
        ];

        let policy = self.interceptors.policy();
        info!(
            threshold = policy.threshold(),
            encoding = %policy.config().encoding,
            fail_closed = policy.config().fail_closed,
            "bookguard enabled"
        );
    }

    /// Unregister every interceptor from `bus`. Does nothing if inactive.
    pub fn deactivate<B: EventBus>(&mut self, bus: &mut B) {
        if !self.is_active() {
            return;
        }

        for id in self.subscriptions.drain(..) {
            bus.unsubscribe(id);
        }

        let total = self.stats.total();
        info!(
            events = total.events,
            neutralized = total.neutralized,
            "bookguard disabled"
        );
    }
}
