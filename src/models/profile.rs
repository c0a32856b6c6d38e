//! Entity types and their business-hours profiles.
//!
//! Each kind of informant keeps its own opening hours, lunch break,
//! preferred visiting hour and hours to avoid. The table is closed: every
//! [`EntityType`] maps to exactly one [`BusinessHoursProfile`], so a
//! profile lookup cannot miss.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::calendar::{format_minutes, time_at};
use super::TimeWindow;
use crate::error::ScheduleError;

/// Kind of informant being visited.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum EntityType {
    /// City hall or municipal department.
    #[default]
    MunicipalOffice,
    /// Company contracted by the municipality (e.g., waste collection).
    ContractedCompany,
    /// Waste pickers' association or cooperative.
    WastePickersAssociation,
    /// Private company without a municipal contract.
    UnaffiliatedCompany,
}

impl EntityType {
    /// All entity types, in declaration order.
    pub const ALL: [EntityType; 4] = [
        EntityType::MunicipalOffice,
        EntityType::ContractedCompany,
        EntityType::WastePickersAssociation,
        EntityType::UnaffiliatedCompany,
    ];

    /// Canonical kebab-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::MunicipalOffice => "municipal-office",
            EntityType::ContractedCompany => "contracted-company",
            EntityType::WastePickersAssociation => "waste-pickers-association",
            EntityType::UnaffiliatedCompany => "unaffiliated-company",
        }
    }

    /// Parses a name, falling back to the municipal-office profile.
    ///
    /// Unknown names are logged as a degraded estimate.
    pub fn resolve(name: &str) -> Self {
        match name.parse() {
            Ok(entity_type) => entity_type,
            Err(_) => {
                let fallback = EntityType::default();
                log::warn!(
                    "{}",
                    ScheduleError::degraded(format!(
                        "unknown entity type '{name}', using '{}' profile",
                        fallback.as_str()
                    ))
                );
                fallback
            }
        }
    }

    /// Business-hours profile of this entity type.
    pub fn profile(&self) -> BusinessHoursProfile {
        const MON_FRI: &[Weekday] = &[
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ];
        const MON_SAT: &[Weekday] = &[
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
        ];

        match self {
            EntityType::MunicipalOffice => BusinessHoursProfile {
                opening_hours: TimeWindow::new(8 * 60, 17 * 60),
                lunch: TimeWindow::new(12 * 60, 13 * 60),
                operating_days: MON_FRI.to_vec(),
                best_start_min: 9 * 60,
                avoid_starts_min: vec![12 * 60, 17 * 60],
            },
            EntityType::ContractedCompany => BusinessHoursProfile {
                opening_hours: TimeWindow::new(8 * 60, 18 * 60),
                lunch: TimeWindow::new(12 * 60, 13 * 60),
                operating_days: MON_SAT.to_vec(),
                best_start_min: 14 * 60,
                avoid_starts_min: vec![12 * 60],
            },
            EntityType::WastePickersAssociation => BusinessHoursProfile {
                opening_hours: TimeWindow::new(7 * 60, 16 * 60),
                lunch: TimeWindow::new(11 * 60 + 30, 12 * 60 + 30),
                operating_days: MON_SAT.to_vec(),
                best_start_min: 9 * 60,
                avoid_starts_min: vec![11 * 60 + 30, 16 * 60],
            },
            EntityType::UnaffiliatedCompany => BusinessHoursProfile {
                opening_hours: TimeWindow::new(8 * 60, 17 * 60 + 30),
                lunch: TimeWindow::new(12 * 60, 13 * 60),
                operating_days: MON_FRI.to_vec(),
                best_start_min: 10 * 60,
                avoid_starts_min: vec![12 * 60, 17 * 60],
            },
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        EntityType::ALL
            .into_iter()
            .find(|e| e.as_str() == normalized)
            .ok_or_else(|| ScheduleError::input(format!("unknown entity type '{s}'")))
    }
}

/// Operating hours of one kind of entity.
///
/// All times are minutes since midnight (see [`TimeWindow`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHoursProfile {
    /// Opening to closing time.
    pub opening_hours: TimeWindow,
    /// Lunch break.
    pub lunch: TimeWindow,
    /// Weekdays the entity is open.
    pub operating_days: Vec<Weekday>,
    /// Preferred visit start.
    pub best_start_min: i64,
    /// Each entry blocks the hour starting at that minute.
    pub avoid_starts_min: Vec<i64>,
}

impl BusinessHoursProfile {
    /// Opening time.
    pub fn opening(&self) -> Option<NaiveTime> {
        self.opening_hours.start_time()
    }

    /// Closing time.
    pub fn closing(&self) -> Option<NaiveTime> {
        self.opening_hours.end_time()
    }

    /// Preferred visit start.
    pub fn best_hour(&self) -> Option<NaiveTime> {
        time_at(self.best_start_min)
    }

    /// Whether the entity is open on a weekday.
    pub fn is_operating_day(&self, day: Weekday) -> bool {
        self.operating_days.contains(&day)
    }

    /// Whether a start minute lies within `tolerance_min` of the best hour.
    pub fn is_near_best_hour(&self, start_min: i64, tolerance_min: i64) -> bool {
        (start_min - self.best_start_min).abs() <= tolerance_min
    }

    /// Whether a start minute falls inside one of the avoided hours.
    pub fn is_avoided_start(&self, start_min: i64) -> bool {
        self.avoid_starts_min
            .iter()
            .any(|&avoid| TimeWindow::starting_at(avoid, 60).contains(start_min))
    }

    /// Whether a start minute lies between opening and closing (inclusive).
    pub fn is_within_opening(&self, start_min: i64) -> bool {
        start_min >= self.opening_hours.start_min && start_min <= self.opening_hours.end_min
    }

    /// `HH:MM - HH:MM` label of the opening hours.
    pub fn opening_label(&self) -> String {
        format!(
            "{} - {}",
            format_minutes(self.opening_hours.start_min),
            format_minutes(self.opening_hours.end_min)
        )
    }
}
