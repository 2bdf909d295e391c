//! # Explorer
//!
//! The selection-and-view-synchronization state machine: search boxes,
//! detail fan-out, the drilldown modal and the aggregate filter view.
//!
//! Every component owns its state behind a `std::sync::Mutex` that is never
//! held across an `.await`. A request takes a [`Generation`] ticket before it
//! suspends; on resumption the component re-locks and writes to the page only
//! if the ticket is still current, so a superseded response is dropped.

pub mod detail;
pub mod drilldown;
pub mod filters;
pub mod overview;
pub mod suggest;
pub mod targets;
pub mod views;

pub use detail::{DetailPart, EntityDetailLoader, LoadPhase, LoadReport, PartOutcome};
pub use drilldown::{DrilldownContext, DrilldownModal, ModalOutcome, ModalState};
pub use filters::{ApplyOutcome, FilterComposer};
pub use overview::{OverviewBoard, OverviewSection};
pub use suggest::{InputOutcome, SuggestionController};
pub use views::{AnalyticsExplorer, EntityExplorer, InstitutionExplorer};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Monotonically increasing tag identifying the latest request of a
/// component. Also used as the ticket a request carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Generation(u64);

impl Generation {
    /// Move to the next generation and return it as a ticket.
    pub fn advance(&mut self) -> Generation {
        self.0 += 1;
        *self
    }

    /// Whether `ticket` was issued by the latest [`Generation::advance`].
    pub fn is_current(&self, ticket: Generation) -> bool {
        self.0 == ticket.0
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lock a component's state, recovering the data if a panicking task
/// poisoned the mutex.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_advances_monotonically() {
        let mut generation = Generation::default();
        let first = generation.advance();
        let second = generation.advance();
        assert!(second > first);
        assert!(!generation.is_current(first));
        assert!(generation.is_current(second));
        assert_eq!(generation.value(), 2);
    }

    #[test]
    fn test_fresh_generation_rejects_nothing_issued() {
        let generation = Generation::default();
        assert!(generation.is_current(Generation::default()));
        assert_eq!(generation.to_string(), "#0");
    }
}
