//! Candidate slot model.
//!
//! A slot is a proposed start/end window for a visit together with the
//! score that ranked it and the reasons behind that score.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::calendar::format_minutes;
use super::{LocationId, TimeWindow};

/// Per-component scores, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    /// Fit with the entity type's preferred hour.
    pub ideal_hour: f64,
    /// Travel to and from neighbouring visits.
    pub travel: f64,
    /// Lunch-break avoidance.
    pub productivity: f64,
    /// Absence of conflicts at this placement.
    pub conflict_free: f64,
    /// Fit with the entity type's hours to avoid.
    pub business_hours: f64,
}

impl ScoreComponents {
    /// Components in weight-vector order:
    /// ideal hour, travel, productivity, conflict-freeness, business hours.
    pub fn as_array(&self) -> [f64; 5] {
        [
            self.ideal_hour,
            self.travel,
            self.productivity,
            self.conflict_free,
            self.business_hours,
        ]
    }
}

/// One travel leg adjacent to a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelLeg {
    /// Origin location.
    pub from: LocationId,
    /// Destination location.
    pub to: LocationId,
    /// Estimated minutes.
    pub minutes: u32,
}

/// Travel cost of placing a visit in a slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TravelImpact {
    /// Sum of the adjacent legs (minutes).
    pub total_minutes: u32,
    /// Legs from the preceding visit and to the following visit.
    pub legs: Vec<TravelLeg>,
}

/// How a slot should be presented, by score band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionKind {
    /// Score ≥ 0.8.
    Ideal,
    /// Score ≥ 0.6.
    Viable,
    /// Score ≥ 0.4, worth it mainly for the route.
    RouteOptimization,
    /// Below 0.4, consider another day.
    Reschedule,
}

impl SuggestionKind {
    /// Classifies a final score.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            SuggestionKind::Ideal
        } else if score >= 0.6 {
            SuggestionKind::Viable
        } else if score >= 0.4 {
            SuggestionKind::RouteOptimization
        } else {
            SuggestionKind::Reschedule
        }
    }
}

/// Part of the working day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DayPeriod {
    /// Before 10:00.
    EarlyMorning,
    /// 10:00 to 12:00.
    Morning,
    /// 12:00 to 14:00.
    Lunch,
    /// 14:00 to 16:00.
    Afternoon,
    /// From 16:00.
    LateAfternoon,
}

impl DayPeriod {
    /// Period containing a start minute.
    pub fn of(start_min: i64) -> Self {
        match start_min {
            m if m < 10 * 60 => DayPeriod::EarlyMorning,
            m if m < 12 * 60 => DayPeriod::Morning,
            m if m < 14 * 60 => DayPeriod::Lunch,
            m if m < 16 * 60 => DayPeriod::Afternoon,
            _ => DayPeriod::LateAfternoon,
        }
    }
}

/// Placement context of a slot within its day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotMetadata {
    /// 1-based position among the day's visits once placed.
    pub position_in_day: usize,
    /// Visits on the day including this one.
    pub total_visits_in_day: usize,
    /// `HH:MM - HH:MM`.
    pub formatted_window: String,
    /// Part of the day.
    pub period: DayPeriod,
}

/// A ranked candidate time slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    /// Slot start.
    pub start: NaiveTime,
    /// Slot end (start + requested duration).
    pub end: NaiveTime,
    /// Slot window in minutes since midnight.
    pub window: TimeWindow,
    /// Final weighted score in `[0, 1]`.
    pub score: f64,
    /// Component scores that produced `score`.
    pub components: ScoreComponents,
    /// Why this slot was picked.
    pub reasons: Vec<String>,
    /// Advantages of the slot.
    pub advantages: Vec<String>,
    /// Caveats of the slot.
    pub caveats: Vec<String>,
    /// Current-placement conflicts that this slot would clear.
    pub conflicts_resolved: Vec<String>,
    /// Travel breakdown.
    pub travel_impact: TravelImpact,
    /// Presentation band.
    pub kind: SuggestionKind,
    /// Placement context.
    pub metadata: SlotMetadata,
}

impl ScheduleSlot {
    /// Requested duration of the slot (minutes).
    pub fn duration_min(&self) -> i64 {
        self.window.duration_min()
    }

    /// `HH:MM - HH:MM` label.
    pub fn label(&self) -> String {
        format!(
            "{} - {}",
            format_minutes(self.window.start_min),
            format_minutes(self.window.end_min)
        )
    }
}
