//! Conflict detection and day analysis.
//!
//! Scans the visits of one day for overlaps, infeasible travel, capacity
//! overruns and business-hours violations, and rates the day.
//!
//! # Severity model
//!
//! | Check | Severity |
//! |-------|----------|
//! | Overlap, same location | CRITICAL |
//! | Overlap, travel above threshold | CRITICAL |
//! | Overlap, otherwise | HIGH |
//! | Insufficient travel time | HIGH |
//! | Capacity exceeded | MEDIUM, HIGH when substantially over |
//! | Before opening / after closing | MEDIUM |
//! | Across lunch | LOW |
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 1-2
//! - Allahverdi et al. (2008), "A survey of scheduling problems with setup times"

mod analysis;
mod detector;

pub use analysis::{
    DayConflictReport, DayStatus, ProductivityAnalysis, ProductivityRating, ScheduleAnalysis,
    ScheduleRating,
};
pub use detector::ConflictDetector;

pub(crate) use detector::usable_visits;
