//! Change-detection pipeline.
//!
//! - `diff`: select entries absent from the seen-store
//! - `cycle`: one Fetch → Extract → Diff → Notify → Persist pass
//! - `scheduler`: runs cycles on a timer and on demand, never overlapping

pub mod cycle;
pub mod diff;
pub mod scheduler;

pub use cycle::{CycleOutcome, CycleReport, Watcher};
pub use diff::fresh_entries;
pub use scheduler::{Scheduler, SchedulerHandle, SchedulerState};
