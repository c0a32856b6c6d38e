//! Field visit model.
//!
//! A visit is one scheduled appointment with an informant at a location
//! (municipality or entity). Visits are owned by the persistence layer;
//! the scheduling core only reads them.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{EntityType, TimeWindow};

/// Visit identifier as assigned by the persistence layer.
pub type VisitId = u64;

/// Location identifier (municipality or entity name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(String);

impl LocationId {
    /// Creates a location identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is blank.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LocationId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for LocationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Lifecycle status of a visit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisitStatus {
    /// Booked with the informant.
    #[default]
    Scheduled,
    /// Materials and questionnaires being prepared.
    InPreparation,
    /// Visit under way.
    InProgress,
    /// Visit carried out.
    Completed,
    /// Questionnaires validated and closed.
    Finalized,
    /// Called off.
    Cancelled,
    /// Moved to another date; the new booking is a separate visit.
    Rescheduled,
}

impl VisitStatus {
    /// Whether the visit still occupies its time window.
    ///
    /// Only active visits take part in conflict and travel reasoning.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            VisitStatus::Scheduled | VisitStatus::InPreparation | VisitStatus::InProgress
        )
    }
}

/// Priority tier of a visit (P1 = most important).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Mandatory, high-priority informant.
    P1,
    /// Regular informant.
    #[default]
    P2,
    /// Optional informant.
    P3,
}

impl Priority {
    /// Whether this is the top tier.
    pub fn is_high(&self) -> bool {
        matches!(self, Priority::P1)
    }
}

/// A scheduled field visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    /// Unique visit identifier.
    pub id: VisitId,
    /// Municipality or entity visited.
    pub location: LocationId,
    /// Calendar date of the visit.
    pub date: NaiveDate,
    /// Start time.
    pub start_time: NaiveTime,
    /// End time.
    pub end_time: NaiveTime,
    /// Planned duration (minutes).
    pub duration_minutes: u32,
    /// Lifecycle status.
    pub status: VisitStatus,
    /// Kind of informant, selects the business-hours profile.
    pub entity_type: EntityType,
    /// Priority tier.
    pub priority: Priority,
}

impl Visit {
    /// Creates a scheduled visit; duration is derived from the window.
    pub fn new(
        id: VisitId,
        location: impl Into<LocationId>,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Self {
        let duration = TimeWindow::from_times(start_time, end_time)
            .duration_min()
            .max(0);
        Self {
            id,
            location: location.into(),
            date,
            start_time,
            end_time,
            duration_minutes: duration as u32,
            status: VisitStatus::Scheduled,
            entity_type: EntityType::default(),
            priority: Priority::default(),
        }
    }

    /// Sets the status.
    pub fn with_status(mut self, status: VisitStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the entity type.
    pub fn with_entity_type(mut self, entity_type: EntityType) -> Self {
        self.entity_type = entity_type;
        self
    }

    /// Sets the priority tier.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Overrides the planned duration.
    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = minutes;
        self
    }

    /// The visit's time window, or `None` when end is not after start.
    pub fn window(&self) -> Option<TimeWindow> {
        let w = TimeWindow::from_times(self.start_time, self.end_time);
        w.is_valid().then_some(w)
    }

    /// Whether the visit still occupies its slot.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Planned duration, or `default_minutes` when none was planned.
    pub fn effective_duration(&self, default_minutes: u32) -> i64 {
        if self.duration_minutes > 0 {
            i64::from(self.duration_minutes)
        } else {
            i64::from(default_minutes)
        }
    }

    /// This visit viewed as a placement candidate at its current window.
    pub fn as_candidate(&self) -> Option<VisitCandidate> {
        self.window().map(|window| VisitCandidate {
            id: Some(self.id),
            location: self.location.clone(),
            date: self.date,
            window,
            entity_type: self.entity_type,
        })
    }
}

/// A visit placement under evaluation.
///
/// Either an existing visit at its current window (`id` set) or a
/// hypothetical new visit (`id` is `None`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitCandidate {
    /// Existing visit id, `None` for a new booking.
    pub id: Option<VisitId>,
    /// Location of the visit.
    pub location: LocationId,
    /// Calendar date.
    pub date: NaiveDate,
    /// Time window being evaluated.
    pub window: TimeWindow,
    /// Kind of informant.
    pub entity_type: EntityType,
}

impl VisitCandidate {
    /// Creates a candidate for a new visit.
    pub fn new(location: impl Into<LocationId>, date: NaiveDate, window: TimeWindow) -> Self {
        Self {
            id: None,
            location: location.into(),
            date,
            window,
            entity_type: EntityType::default(),
        }
    }

    /// Creates a candidate from a start time and duration.
    pub fn starting_at(
        location: impl Into<LocationId>,
        date: NaiveDate,
        start: NaiveTime,
        duration_minutes: u32,
    ) -> Self {
        let window = TimeWindow::starting_at(
            super::calendar::minutes_of(start),
            i64::from(duration_minutes),
        );
        Self::new(location, date, window)
    }

    /// Sets the existing visit id.
    pub fn with_id(mut self, id: VisitId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the entity type.
    pub fn with_entity_type(mut self, entity_type: EntityType) -> Self {
        self.entity_type = entity_type;
        self
    }

    /// Same candidate moved to another window.
    pub fn moved_to(&self, window: TimeWindow) -> Self {
        Self {
            window,
            ..self.clone()
        }
    }

    /// Id label used in conflict ids (`new` for hypothetical visits).
    pub fn label(&self) -> String {
        self.id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "new".to_string())
    }
}
