//! Payload Fuzzer - Randomized host traffic against an active guard
//!
//! Tests:
//! - Edited books never commit above the threshold
//! - Opened containers never hold a book above the threshold
//! - Transferred books never land above the threshold
//! - Every container saves once it has been swept by an open

use bookguard_core::{GuardConfig, Policy};
use bookguard_host::{BookMeta, Guard, ItemKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{ContainerId, ScenarioResult, SimItem, SimulatedServer, MAX_BOOK_PAGES};

const PAGE_CHARS: [char; 4] = ['a', 'é', '日', '🦀'];

/// Fuzzer configuration
#[derive(Clone, Debug)]
pub struct FuzzerConfig {
    /// Number of containers
    pub containers: usize,
    /// Slots per container
    pub slots: usize,
    /// Number of actions to run
    pub steps: usize,
    /// Probability that a generated book is oversized (0.0 - 1.0)
    pub oversize_prob: f64,
    /// Probability that page text uses non-ASCII characters
    pub unicode_prob: f64,
    /// Random seed
    pub seed: u64,
}

impl Default for FuzzerConfig {
    fn default() -> Self {
        FuzzerConfig {
            containers: 4,
            slots: 9,
            steps: 500,
            oversize_prob: 0.3,
            unicode_prob: 0.3,
            seed: 42,
        }
    }
}

impl FuzzerConfig {
    /// Light fuzzing for quick tests
    pub fn light() -> Self {
        FuzzerConfig {
            containers: 2,
            slots: 5,
            steps: 100,
            oversize_prob: 0.3,
            unicode_prob: 0.2,
            seed: 42,
        }
    }

    /// Heavy fuzzing for thorough testing
    pub fn heavy() -> Self {
        FuzzerConfig {
            containers: 8,
            slots: 27,
            steps: 5000,
            oversize_prob: 0.5,
            unicode_prob: 0.5,
            seed: 42,
        }
    }
}

/// Result of a fuzzing run
#[derive(Debug, Default)]
pub struct FuzzReport {
    pub placements: u64,
    pub edits: u64,
    pub opens: u64,
    pub transfers: u64,
    pub neutralized: u64,
    pub failed_saves: usize,
    pub violations: Vec<String>,
}

impl FuzzReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty() && self.failed_saves == 0
    }
}

/// Payload fuzzer
pub struct PayloadFuzzer {
    config: FuzzerConfig,
    server: SimulatedServer,
    containers: Vec<ContainerId>,
    guard: Guard,
    rng: StdRng,
}

impl PayloadFuzzer {
    pub fn new(config: FuzzerConfig, guard_config: GuardConfig) -> ScenarioResult<Self> {
        let mut server = SimulatedServer::new();
        let mut guard = Guard::new(guard_config)?;
        guard.activate(server.bus_mut());
        let containers = (0..config.containers.max(2))
            .map(|_| server.add_container(config.slots.max(1)))
            .collect();
        let rng = StdRng::seed_from_u64(config.seed);

        Ok(PayloadFuzzer {
            config,
            server,
            containers,
            guard,
            rng,
        })
    }

    fn policy(&self) -> &Policy {
        self.guard.interceptors().policy()
    }

    /// Does `item` carry a payload the policy would neutralize?
    fn oversized(&self, item: &SimItem) -> Option<usize> {
        let meta = item.meta()?;
        let policy = self.policy();
        match policy.measure(&meta.payload()) {
            Ok(size) if size <= policy.threshold() => None,
            Ok(size) => Some(size),
            Err(_) => Some(usize::MAX),
        }
    }

    fn random_container(&mut self) -> ContainerId {
        self.containers[self.rng.gen_range(0..self.containers.len())]
    }

    /// Page counts cover the host cap and a little beyond it, where the host
    /// drops extra pages and refuses edits
    fn random_pages(&mut self) -> Vec<String> {
        let count = if self.rng.gen_bool(0.2) {
            MAX_BOOK_PAGES
        } else {
            self.rng.gen_range(1..=MAX_BOOK_PAGES + 20)
        };
        let threshold = self.policy().threshold();
        let oversized = self.rng.gen_bool(self.config.oversize_prob);

        (0..count)
            .map(|_| {
                if oversized {
                    // ASCII is one byte or more in every encoding
                    let len = threshold / count + self.rng.gen_range(1..2_000);
                    "o".repeat(len)
                } else {
                    // At most six bytes per character in any encoding
                    let max = (threshold / count / 6).max(1);
                    let len = self.rng.gen_range(0..=max);
                    let c = if self.rng.gen_bool(self.config.unicode_prob) {
                        PAGE_CHARS[self.rng.gen_range(1..PAGE_CHARS.len())]
                    } else {
                        PAGE_CHARS[0]
                    };
                    std::iter::repeat(c).take(len).collect()
                }
            })
            .collect()
    }

    fn random_book(&mut self) -> SimItem {
        let pages = self.random_pages();
        if self.rng.gen_bool(0.5) {
            SimItem::writable_book(pages)
        } else {
            SimItem::written_book("Fuzz", "fuzzer", pages)
        }
    }

    fn place(&mut self, report: &mut FuzzReport) {
        let id = self.random_container();
        let slot = self.rng.gen_range(0..self.config.slots.max(1));
        let item = if self.rng.gen_bool(0.7) {
            self.random_book()
        } else {
            SimItem::material("cobblestone", self.rng.gen_range(1..=64))
        };
        if self.server.place(id, slot, item).is_ok() {
            report.placements += 1;
        }
    }

    fn edit(&mut self, step: usize, report: &mut FuzzReport) {
        let id = self.random_container();
        let Ok(container) = self.server.container(id) else {
            return;
        };
        let writable = (0..container.size()).find(|&slot| {
            container
                .get(slot)
                .is_some_and(|item| item.kind == ItemKind::WritableBook)
        });

        let slot = match writable.or_else(|| container.first_empty()) {
            Some(slot) => slot,
            None => return,
        };
        if writable.is_none() {
            let blank = SimItem::writable_book(Vec::new());
            if self.server.place(id, slot, blank).is_err() {
                return;
            }
        }

        let pages = self.random_pages();
        if self.server.edit_book(id, slot, pages).is_err() {
            return;
        }
        report.edits += 1;

        let edited = self.server.container(id).ok().and_then(|c| c.get(slot));
        if let Some(size) = edited.and_then(|item| self.oversized(item)) {
            report.violations.push(format!(
                "step {step}: edit committed a {size} byte book to {id}[{slot}]"
            ));
        }
    }

    fn open(&mut self, step: usize, report: &mut FuzzReport) {
        let id = self.random_container();
        if self.server.open(id).is_err() {
            return;
        }
        report.opens += 1;
        self.check_container(step, id, report);
    }

    fn transfer(&mut self, step: usize, report: &mut FuzzReport) {
        let from = self.random_container();
        let to = self.random_container();
        if from == to {
            return;
        }
        let Ok(source) = self.server.container(from) else {
            return;
        };
        let occupied: Vec<usize> = (0..source.size())
            .filter(|&s| source.get(s).is_some())
            .collect();
        if occupied.is_empty() {
            return;
        }
        let slot = occupied[self.rng.gen_range(0..occupied.len())];

        let Ok(dest_slot) = self.server.transfer(from, slot, to) else {
            return;
        };
        report.transfers += 1;

        let moved = self.server.container(to).ok().and_then(|c| c.get(dest_slot));
        if let Some(size) = moved.and_then(|item| self.oversized(item)) {
            report.violations.push(format!(
                "step {step}: transfer landed a {size} byte book in {to}[{dest_slot}]"
            ));
        }
    }

    fn check_container(&self, step: usize, id: ContainerId, report: &mut FuzzReport) {
        let Ok(container) = self.server.container(id) else {
            return;
        };
        for (slot, item) in container.slots().iter().enumerate() {
            if let Some(size) = item.as_ref().and_then(|item| self.oversized(item)) {
                report.violations.push(format!(
                    "step {step}: opened {id} still holds a {size} byte book in slot {slot}"
                ));
            }
        }
    }

    /// Run the configured number of steps, then sweep and save everything
    pub fn run(&mut self) -> FuzzReport {
        let mut report = FuzzReport::default();

        for step in 0..self.config.steps {
            match self.rng.gen_range(0..4) {
                0 => self.place(&mut report),
                1 => self.edit(step, &mut report),
                2 => self.open(step, &mut report),
                _ => self.transfer(step, &mut report),
            }
        }

        let sweep = self.config.steps;
        for id in self.containers.clone() {
            if self.server.open(id).is_ok() {
                self.check_container(sweep, id, &mut report);
            }
        }
        report.failed_saves = self.server.save_all().len();
        report.neutralized = self.guard.stats().total().neutralized;

        report
    }
}
