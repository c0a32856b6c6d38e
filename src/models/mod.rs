//! Visit-scheduling domain models.
//!
//! Provides the data types the conflict detector and slot optimizer read
//! and produce. Visits are inputs owned by the persistence layer; conflicts
//! and slots are outputs created fresh on every call.
//!
//! # Domain Mappings
//!
//! | visit-schedule | Job-shop analogue |
//! |----------------|-------------------|
//! | Visit | Assigned activity |
//! | Location | Machine / setup category |
//! | Travel table | Transition (setup-time) matrix |
//! | Business-hours profile | Resource calendar |
//! | Conflict | Constraint violation |

pub(crate) mod calendar;
mod conflict;
mod profile;
mod slot;
mod visit;

pub use calendar::{format_minutes, minutes_of, time_at, TimeWindow, MINUTES_PER_DAY};
pub use conflict::{
    max_severity, sort_by_severity, Conflict, ConflictDetails, ConflictType, Severity,
};
pub use profile::{BusinessHoursProfile, EntityType};
pub use slot::{
    DayPeriod, ScheduleSlot, ScoreComponents, SlotMetadata, SuggestionKind, TravelImpact,
    TravelLeg,
};
pub use visit::{LocationId, Priority, Visit, VisitCandidate, VisitId, VisitStatus};
