//! End-to-end rollback exploit scenarios
//!
//! Each scenario smuggles an oversized book into a chest that also holds
//! diamonds, moves the diamonds into a player inventory, saves and restarts.
//! If the chest fails to save it reloads with the diamonds still inside while
//! the player keeps theirs: the diamonds are duplicated.

use bookguard_core::GuardConfig;
use bookguard_host::{Guard, HostError};
use thiserror::Error;

use crate::{ContainerId, SaveError, ServerError, SimItem, SimulatedServer};

/// Scenario setup errors
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("Baseline save failed: {0}")]
    Baseline(SaveError),
}

pub type ScenarioResult<T> = Result<T, ScenarioError>;

/// How the oversized book reaches the chest
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SmuggleRoute {
    /// Written in the player's own inventory, then moved into the chest
    EditedBook,
    /// Put directly into the chest by a command, then the chest is opened
    PlantedBook,
    /// Carried in by a hopper from a container filled by a command
    HopperBook,
}

impl SmuggleRoute {
    pub fn all() -> &'static [SmuggleRoute] {
        &[
            SmuggleRoute::EditedBook,
            SmuggleRoute::PlantedBook,
            SmuggleRoute::HopperBook,
        ]
    }
}

/// Outcome of one exploit attempt
#[derive(Debug)]
pub struct RollbackReport {
    pub route: SmuggleRoute,
    pub failed_saves: Vec<(ContainerId, SaveError)>,
    pub diamonds_before: u32,
    pub diamonds_after_restart: u32,
    pub neutralized: u64,
}

impl RollbackReport {
    pub fn duplicated(&self) -> bool {
        self.diamonds_after_restart > self.diamonds_before
    }
}

/// Page payload of about `total` ASCII bytes split over `pages` pages
pub fn oversized_pages(total: usize, pages: usize) -> Vec<String> {
    let pages = pages.max(1);
    let per_page = total.div_ceil(pages);
    (0..pages).map(|_| "w".repeat(per_page)).collect()
}

/// Bytes written into smuggled books, beyond what the chunk store can save
pub const SMUGGLED_BYTES: usize = 40_000;

/// Register a guard on `server`, if configured
pub fn install(
    server: &mut SimulatedServer,
    config: Option<GuardConfig>,
) -> ScenarioResult<Option<Guard>> {
    let Some(config) = config else {
        return Ok(None);
    };
    let mut guard = Guard::new(config)?;
    guard.activate(server.bus_mut());
    Ok(Some(guard))
}

/// Run the exploit along `route`, optionally with the guard active
pub fn run_rollback_exploit(
    route: SmuggleRoute,
    config: Option<GuardConfig>,
) -> ScenarioResult<RollbackReport> {
    let mut server = SimulatedServer::new();
    let guard = install(&mut server, config)?;

    let player = server.add_container(36);
    let chest = server.add_container(27);
    let hopper = server.add_container(5);

    server.place(chest, 0, SimItem::material("diamond", 64))?;
    if let Some((_, err)) = server.save_all().into_iter().next() {
        return Err(ScenarioError::Baseline(err));
    }
    let diamonds_before = server.count_material("diamond");

    let book = || {
        SimItem::written_book("Diary", "mallory", oversized_pages(SMUGGLED_BYTES, 4))
    };
    match route {
        SmuggleRoute::EditedBook => {
            server.place(player, 0, SimItem::writable_book(Vec::new()))?;
            server.edit_book(player, 0, oversized_pages(SMUGGLED_BYTES, 4))?;
            server.transfer(player, 0, chest)?;
        }
        SmuggleRoute::PlantedBook => {
            server.place(chest, 1, book())?;
            server.open(chest)?;
        }
        SmuggleRoute::HopperBook => {
            server.place(hopper, 0, book())?;
            server.transfer(hopper, 0, chest)?;
        }
    }

    server.transfer(chest, 0, player)?;
    let failed_saves = server.save_all();
    server.restart();

    Ok(RollbackReport {
        route,
        failed_saves,
        diamonds_before,
        diamonds_after_restart: server.count_material("diamond"),
        neutralized: guard.map(|g| g.stats().total().neutralized).unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_BOOK_PAGES;
    use proptest::prelude::*;

    /// Hopper a book into a guarded chest, open it twice, take the diamonds
    /// out, then save and restart
    fn hopper_then_reopen(pages: Vec<String>) -> (SimulatedServer, RollbackReport) {
        let mut server = SimulatedServer::new();
        let guard = install(&mut server, Some(GuardConfig::default()))
            .unwrap()
            .unwrap();
        let player = server.add_container(36);
        let chest = server.add_container(27);
        let hopper = server.add_container(5);

        server.place(chest, 0, SimItem::material("diamond", 64)).unwrap();
        assert!(server.save_all().is_empty());

        server
            .place(hopper, 0, SimItem::written_book("Tome", "mallory", pages))
            .unwrap();
        server.transfer(hopper, 0, chest).unwrap();
        server.open(chest).unwrap();
        server.open(chest).unwrap();
        server.transfer(chest, 0, player).unwrap();

        let failed_saves = server.save_all();
        server.restart();
        let report = RollbackReport {
            route: SmuggleRoute::HopperBook,
            failed_saves,
            diamonds_before: 64,
            diamonds_after_restart: server.count_material("diamond"),
            neutralized: guard.stats().total().neutralized,
        };
        (server, report)
    }

    #[test]
    fn test_full_page_book_stays_neutralized() {
        // 100 pages of 300 bytes: every page is small, the book is not
        let (server, report) = hopper_then_reopen(vec!["m".repeat(300); MAX_BOOK_PAGES]);

        assert!(report.failed_saves.is_empty());
        assert!(!report.duplicated());
        assert_eq!(report.neutralized, 1);
        let chest = server.container(ContainerId(1)).unwrap();
        assert!(chest.largest_payload() <= bookguard_core::DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_book_over_page_cap_stays_neutralized() {
        let (server, report) = hopper_then_reopen(vec!["m".repeat(300); 1_000]);

        assert!(report.failed_saves.is_empty());
        assert_eq!(report.diamonds_after_restart, 64);
        assert_eq!(report.neutralized, 1);
        let chest = server.container(ContainerId(1)).unwrap();
        let book = chest.items().find(|item| item.meta().is_some()).unwrap();
        assert_eq!(book.meta().unwrap().page_text().len(), MAX_BOOK_PAGES);
    }

    #[test]
    fn test_unguarded_routes_duplicate() {
        for &route in SmuggleRoute::all() {
            let report = run_rollback_exploit(route, None).unwrap();
            assert!(report.duplicated(), "{route:?} should duplicate without the guard");
            assert_eq!(report.failed_saves.len(), 1);
            assert_eq!(report.diamonds_after_restart, 128);
        }
    }

    #[test]
    fn test_guarded_routes_hold() {
        for &route in SmuggleRoute::all() {
            let report = run_rollback_exploit(route, Some(GuardConfig::default())).unwrap();
            assert!(!report.duplicated(), "{route:?} duplicated with the guard active");
            assert!(report.failed_saves.is_empty());
            assert_eq!(report.diamonds_after_restart, 64);
            assert_eq!(report.neutralized, 1);
        }
    }

    #[test]
    fn test_modified_utf8_guard_holds() {
        let report = run_rollback_exploit(
            SmuggleRoute::EditedBook,
            Some(GuardConfig::modified_utf8()),
        )
        .unwrap();
        assert!(!report.duplicated());
    }

    #[test]
    fn test_oversized_pages() {
        let pages = oversized_pages(40_000, 4);
        assert_eq!(pages.len(), 4);
        assert_eq!(bookguard_core::measure(&pages), 40_000);
        assert_eq!(oversized_pages(10, 0).len(), 1);
    }

    proptest! {
        #[test]
        fn prop_guarded_chest_always_saves(
            total in 0usize..120_000,
            pages in 1usize..=2 * MAX_BOOK_PAGES,
        ) {
            let mut server = SimulatedServer::new();
            let _guard = install(&mut server, Some(GuardConfig::default())).unwrap();
            let hopper = server.add_container(1);
            let chest = server.add_container(3);

            let book = SimItem::written_book("Any", "anyone", oversized_pages(total, pages));
            server.place(hopper, 0, book).unwrap();
            server.transfer(hopper, 0, chest).unwrap();

            prop_assert!(server.save_all().is_empty());
            let stored = server.container(chest).unwrap().largest_payload();
            prop_assert!(stored <= bookguard_core::DEFAULT_THRESHOLD);
        }
    }
}
