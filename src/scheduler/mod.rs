//! Slot generation, scoring and the scheduler facade.
//!
//! # Pipeline
//!
//! | Stage | Type | Output |
//! |-------|------|--------|
//! | Enumerate | [`SlotGenerator`] | Free windows clear of other visits by a buffer |
//! | Score | [`SlotScorer`] | Five component scores combined by criterion weights |
//! | Rank | [`VisitScheduler`] | Top slots, best first |
//! | Advise | [`RescheduleAdvisor`] | Same-day and future-date options per serious conflict |
//!
//! Every operation reads visits fresh from the repository and keeps no
//! state between calls.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4
//! - Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

mod facade;
mod reschedule;
mod scoring;
mod slots;

pub use facade::{
    DayOptimization, ImprovementMetrics, OptimizationStatus, SlotRequest, VisitOptimization,
    VisitScheduler,
};
pub use reschedule::{
    AlternativeDate, AlternativeSlot, Availability, RescheduleAdvice, RescheduleAdvisor,
    RescheduleStatus, VisitRescheduleAdvice,
};
pub use scoring::{travel_score, SlotScore, SlotScorer};
pub use slots::SlotGenerator;
