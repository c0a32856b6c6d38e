//! Reschedule proposals for serious conflicts.
//!
//! For every HIGH or CRITICAL conflict of a day, proposes the best free
//! windows on the same day and a short list of future weekdays with room
//! left, ranked by how busy they already are.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::facade::VisitScheduler;
use crate::models::{Conflict, ConflictType, LocationId, ScheduleSlot, Severity, Visit, VisitId};
use crate::repository::VisitRepository;

/// Whether the day needs rescheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RescheduleStatus {
    /// No conflicts on the day.
    NoConflicts,
    /// At least one conflict.
    ConflictsDetected,
}

/// Room left on an alternative date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Availability {
    /// Few visits booked.
    Good,
    /// Bookable but busy.
    Moderate,
}

/// A same-day alternative window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeSlot {
    /// Start time.
    pub start: chrono::NaiveTime,
    /// End time.
    pub end: chrono::NaiveTime,
    /// `HH:MM - HH:MM`.
    pub window: String,
    /// Slot score.
    pub score: f64,
    /// Leading advantages of the slot.
    pub advantages: Vec<String>,
}

impl AlternativeSlot {
    fn from_slot(slot: ScheduleSlot) -> Self {
        Self {
            start: slot.start,
            end: slot.end,
            window: slot.label(),
            score: slot.score,
            advantages: slot.advantages.into_iter().take(2).collect(),
        }
    }
}

/// A future date with room for the visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeDate {
    /// Proposed date.
    pub date: NaiveDate,
    /// Day of the week.
    pub weekday: Weekday,
    /// Active visits already booked.
    pub existing_visits: usize,
    /// Room left.
    pub availability: Availability,
}

/// Options for one conflicting visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRescheduleAdvice {
    /// Visit to move.
    pub visit_id: VisitId,
    /// Conflict that triggered the advice.
    pub conflict_id: String,
    /// Visit location.
    pub location: LocationId,
    /// `HH:MM - HH:MM` of the current placement.
    pub current_window: String,
    /// Best free windows on the same day.
    pub same_day_alternatives: Vec<AlternativeSlot>,
    /// Future dates with room.
    pub alternative_dates: Vec<AlternativeDate>,
    /// Conflict description.
    pub reason: String,
    /// Conflict impact.
    pub estimated_impact: String,
}

/// Reschedule proposals for a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescheduleAdvice {
    /// Analysed date.
    pub date: NaiveDate,
    /// Whether any conflict was found.
    pub status: RescheduleStatus,
    /// All conflicts of the day.
    pub total_conflicts: usize,
    /// CRITICAL conflicts of the day.
    pub critical_conflicts: usize,
    /// Conflicts, most severe first.
    pub conflicts: Vec<Conflict>,
    /// One entry per HIGH or CRITICAL conflict.
    pub advice: Vec<VisitRescheduleAdvice>,
    /// Conflict count per type.
    pub problem_summary: BTreeMap<ConflictType, usize>,
}

/// Builds [`RescheduleAdvice`] on top of a [`VisitScheduler`].
#[derive(Debug)]
pub struct RescheduleAdvisor<'a, R> {
    scheduler: &'a VisitScheduler<R>,
}

impl<'a, R: VisitRepository> RescheduleAdvisor<'a, R> {
    /// Creates an advisor.
    pub fn new(scheduler: &'a VisitScheduler<R>) -> Self {
        Self { scheduler }
    }

    /// Reschedule proposals for the conflicts of `date`.
    pub fn advise(&self, date: NaiveDate) -> RescheduleAdvice {
        let visits = self.scheduler.load_day(date).unwrap_or_else(|e| {
            log::warn!("Reschedule advice for {date} built without visits: {e}");
            Vec::new()
        });
        let report = self.scheduler.detector().detect_for_day(date, &visits);

        let mut problem_summary = BTreeMap::new();
        for c in &report.conflicts {
            *problem_summary.entry(c.conflict_type).or_insert(0) += 1;
        }

        let serious: Vec<&Conflict> = report.conflicts_at_least(Severity::High).collect();
        let occupancy = if serious.is_empty() {
            Vec::new()
        } else {
            self.future_occupancy(date)
        };

        let advice: Vec<VisitRescheduleAdvice> = serious
            .into_iter()
            .filter_map(|conflict| {
                let Some(visit) = conflict
                    .principal_visit
                    .and_then(|id| visits.iter().find(|v| v.id == id))
                else {
                    log::debug!("Conflict {} has no movable visit", conflict.id);
                    return None;
                };
                Some(self.visit_advice(conflict, visit, &visits, &occupancy))
            })
            .collect();

        let status = if report.total_conflicts == 0 {
            RescheduleStatus::NoConflicts
        } else {
            RescheduleStatus::ConflictsDetected
        };
        log::info!(
            "Reschedule advice for {date}: {} conflict(s), {} proposal(s)",
            report.total_conflicts,
            advice.len()
        );

        RescheduleAdvice {
            date,
            status,
            total_conflicts: report.total_conflicts,
            critical_conflicts: report.critical_conflicts,
            conflicts: report.conflicts,
            advice,
            problem_summary,
        }
    }

    fn visit_advice(
        &self,
        conflict: &Conflict,
        visit: &Visit,
        same_day: &[Visit],
        occupancy: &[(NaiveDate, usize)],
    ) -> VisitRescheduleAdvice {
        let policy = &self.scheduler.policy().reschedule;
        let same_day_alternatives = self
            .scheduler
            .rank_slots(&self.scheduler.request_for(visit), same_day)
            .into_iter()
            .take(policy.same_day_alternatives)
            .map(AlternativeSlot::from_slot)
            .collect();

        VisitRescheduleAdvice {
            visit_id: visit.id,
            conflict_id: conflict.id.clone(),
            location: visit.location.clone(),
            current_window: visit
                .window()
                .map(|w| w.label())
                .unwrap_or_default(),
            same_day_alternatives,
            alternative_dates: self.alternative_dates(visit, occupancy),
            reason: conflict.description.clone(),
            estimated_impact: conflict.estimated_impact.clone(),
        }
    }

    /// Dates with room, good availability first.
    fn alternative_dates(
        &self,
        visit: &Visit,
        occupancy: &[(NaiveDate, usize)],
    ) -> Vec<AlternativeDate> {
        let policy = &self.scheduler.policy().reschedule;
        let profile = visit.entity_type.profile();

        let mut dates: Vec<AlternativeDate> = occupancy
            .iter()
            .filter(|(date, count)| {
                profile.is_operating_day(date.weekday()) && *count < policy.max_day_occupancy
            })
            .map(|&(date, count)| AlternativeDate {
                date,
                weekday: date.weekday(),
                existing_visits: count,
                availability: if count < policy.good_occupancy {
                    Availability::Good
                } else {
                    Availability::Moderate
                },
            })
            .collect();

        dates.sort_by_key(|d| d.availability != Availability::Good);
        dates.truncate(policy.max_alternative_dates);
        dates
    }

    /// Active visit counts for the weekdays after `date`.
    ///
    /// Dates whose fetch fails are left out.
    fn future_occupancy(&self, date: NaiveDate) -> Vec<(NaiveDate, usize)> {
        let horizon = self.scheduler.policy().reschedule.horizon_days;
        (1..=u64::from(horizon))
            .filter_map(|offset| date.checked_add_days(Days::new(offset)))
            .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .filter_map(|d| match self.scheduler.load_day(d) {
                Ok(visits) => Some((d, visits.len())),
                Err(e) => {
                    log::warn!("Skipping {d} as an alternative date: {e}");
                    None
                }
            })
            .collect()
    }
}
