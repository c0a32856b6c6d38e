//! Field-visit scheduling core.
//!
//! Detects conflicts between scheduled survey visits and ranks free time
//! slots for new or moved visits. Visits are read through a
//! [`VisitRepository`]; everything else is pure computation over a travel
//! table, business-hours profiles and a [`SchedulingPolicy`].
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Visit`, `TimeWindow`, `Conflict`,
//!   `ScheduleSlot`, `BusinessHoursProfile`
//! - **`travel`**: Travel-time table and shared estimator
//! - **`policy`**: Thresholds, criterion weights, TOML loading
//! - **`conflict`**: `ConflictDetector` and day reports
//! - **`scheduler`**: Slot generation, scoring, `VisitScheduler`, reschedule advice
//! - **`repository`**: Visit source trait and in-memory store
//! - **`validation`**: Input integrity checks
//!
//! # Example
//!
//! ```
//! use chrono::{NaiveDate, NaiveTime};
//! use visit_schedule::{InMemoryVisitRepository, TravelEstimator, Visit, VisitScheduler};
//!
//! let date = NaiveDate::from_ymd_opt(2024, 10, 14).unwrap();
//! let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
//! let repo = InMemoryVisitRepository::with_visits(vec![
//!     Visit::new(1, "Itajaí", date, t(9, 0), t(10, 30)),
//!     Visit::new(2, "Itajaí", date, t(10, 0), t(11, 0)),
//! ]);
//! let scheduler = VisitScheduler::new(repo, TravelEstimator::default());
//!
//! let report = scheduler.detect_conflicts_for_day(date);
//! assert_eq!(report.critical_conflicts, 1);
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Allahverdi et al. (2008), "A survey of scheduling problems with setup times"

pub mod conflict;
pub mod error;
pub mod models;
pub mod policy;
pub mod repository;
pub mod scheduler;
pub mod travel;
pub mod validation;

pub use conflict::{ConflictDetector, DayConflictReport, DayStatus};
pub use error::{ScheduleError, ScheduleResult};
pub use models::{Conflict, ScheduleSlot, TimeWindow, Visit, VisitCandidate};
pub use policy::{Criterion, SchedulingPolicy};
pub use repository::{InMemoryVisitRepository, VisitRepository};
pub use scheduler::{SlotRequest, VisitScheduler};
pub use travel::{TravelEstimator, TravelTable};
