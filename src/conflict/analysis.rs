//! Day-level schedule quality analysis.
//!
//! Computes productivity indicators for the visits of one day and
//! classifies the day from its conflicts and productivity.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Visit minutes | Sum of planned visit durations |
//! | Travel minutes | Sum of estimates between consecutive visits |
//! | Productivity ratio | visit / (visit + travel) |
//! | Productivity score | min(100, ratio·100) − 20 over capacity − 15 when travel > visit |
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{minutes_of, Conflict, LocationId, Severity, Visit, VisitId};
use crate::policy::{ConflictPolicy, DayStatusPolicy};
use crate::travel::TravelTable;

/// Overall classification of a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DayStatus {
    /// No visits scheduled.
    Free,
    /// No conflicts and high productivity.
    Optimal,
    /// Minor conflicts or slightly reduced productivity.
    Good,
    /// Several conflicts or low productivity.
    NeedsReview,
    /// Many HIGH conflicts or very low productivity.
    Problematic,
    /// At least one CRITICAL conflict.
    Critical,
}

impl DayStatus {
    /// Classifies a day from its conflicts and productivity ratio.
    ///
    /// Rules are evaluated most severe first; the first match wins.
    pub fn classify(
        total_visits: usize,
        conflicts: &[Conflict],
        productivity_ratio: f64,
        policy: &DayStatusPolicy,
    ) -> Self {
        if total_visits == 0 {
            return DayStatus::Free;
        }
        let critical = count_severity(conflicts, Severity::Critical);
        let high = count_severity(conflicts, Severity::High);

        if critical > 0 {
            DayStatus::Critical
        } else if high > policy.problematic_high_conflicts
            || productivity_ratio < policy.problematic_productivity
        {
            DayStatus::Problematic
        } else if conflicts.len() > policy.needs_review_conflicts
            || productivity_ratio < policy.review_productivity
        {
            DayStatus::NeedsReview
        } else if !conflicts.is_empty() || productivity_ratio < policy.optimal_productivity {
            DayStatus::Good
        } else {
            DayStatus::Optimal
        }
    }
}

fn count_severity(conflicts: &[Conflict], severity: Severity) -> usize {
    conflicts.iter().filter(|c| c.severity == severity).count()
}

/// Qualitative productivity band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductivityRating {
    /// Score ≥ 85.
    Excellent,
    /// Score ≥ 70.
    Good,
    /// Score ≥ 50.
    Average,
    /// Below 50.
    Low,
}

impl ProductivityRating {
    /// Band of a 0–100 productivity score.
    pub fn from_score(score: f64) -> Self {
        if score >= 85.0 {
            ProductivityRating::Excellent
        } else if score >= 70.0 {
            ProductivityRating::Good
        } else if score >= 50.0 {
            ProductivityRating::Average
        } else {
            ProductivityRating::Low
        }
    }
}

/// Productivity indicators of one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductivityAnalysis {
    /// Visits analysed.
    pub total_visits: usize,
    /// Sum of visit durations (minutes).
    pub visit_minutes: i64,
    /// Sum of travel between consecutive visits (minutes).
    pub travel_minutes: i64,
    /// `visit_minutes / (visit_minutes + travel_minutes)`, 1.0 for an empty day.
    pub productivity_ratio: f64,
    /// Ratio as a percentage, one decimal.
    pub efficiency_percent: f64,
    /// Efficiency minus penalties, in `[0, 100]`.
    pub productivity_score: f64,
    /// Band of the score.
    pub rating: ProductivityRating,
}

impl ProductivityAnalysis {
    /// Computes productivity for chronologically ordered visits.
    pub fn calculate(visits: &[&Visit], table: &TravelTable, policy: &ConflictPolicy) -> Self {
        let max_visits_per_day = policy.max_visits_per_day;
        let visit_minutes: i64 = visits
            .iter()
            .map(|v| v.effective_duration(policy.default_visit_minutes))
            .sum();
        let travel_minutes = consecutive_travel(visits, table);
        let total = visit_minutes + travel_minutes;

        let ratio = if total > 0 {
            visit_minutes as f64 / total as f64
        } else {
            1.0
        };

        let mut score = (ratio * 100.0).min(100.0);
        if visits.len() > max_visits_per_day {
            score -= 20.0;
        }
        if travel_minutes > visit_minutes {
            score -= 15.0;
        }
        let score = round1(score.max(0.0));

        Self {
            total_visits: visits.len(),
            visit_minutes,
            travel_minutes,
            productivity_ratio: ratio,
            efficiency_percent: round1(ratio * 100.0),
            productivity_score: score,
            rating: ProductivityRating::from_score(score),
        }
    }
}

/// Every conflict of a day with its analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayConflictReport {
    /// Analysed date.
    pub date: NaiveDate,
    /// Active, well-formed visits on the day.
    pub total_visits: usize,
    /// Number of conflicts.
    pub total_conflicts: usize,
    /// Number of CRITICAL conflicts.
    pub critical_conflicts: usize,
    /// Conflicts, most severe first.
    pub conflicts: Vec<Conflict>,
    /// Conflict ids per involved visit.
    pub conflicts_by_visit: BTreeMap<VisitId, Vec<String>>,
    /// Productivity indicators.
    pub productivity: ProductivityAnalysis,
    /// Human-readable optimization hints.
    pub optimization_hints: Vec<String>,
    /// Overall classification.
    pub status: DayStatus,
}

impl DayConflictReport {
    /// Assembles a report from chronologically ordered visits and their conflicts.
    pub fn assemble(
        date: NaiveDate,
        visits: &[&Visit],
        conflicts: Vec<Conflict>,
        table: &TravelTable,
        conflict_policy: &ConflictPolicy,
        status_policy: &DayStatusPolicy,
    ) -> Self {
        let productivity = ProductivityAnalysis::calculate(visits, table, conflict_policy);

        let mut conflicts_by_visit: BTreeMap<VisitId, Vec<String>> = BTreeMap::new();
        for conflict in &conflicts {
            for id in conflict.involved_visits() {
                conflicts_by_visit
                    .entry(id)
                    .or_default()
                    .push(conflict.id.clone());
            }
        }

        let status = DayStatus::classify(
            visits.len(),
            &conflicts,
            productivity.productivity_ratio,
            status_policy,
        );
        let optimization_hints =
            optimization_hints(visits, &conflicts, conflict_policy, status_policy);

        Self {
            date,
            total_visits: visits.len(),
            total_conflicts: conflicts.len(),
            critical_conflicts: count_severity(&conflicts, Severity::Critical),
            conflicts,
            conflicts_by_visit,
            productivity,
            optimization_hints,
            status,
        }
    }

    /// Conflicts at or above a severity.
    pub fn conflicts_at_least(&self, severity: Severity) -> impl Iterator<Item = &Conflict> {
        self.conflicts.iter().filter(move |c| c.severity >= severity)
    }
}

fn optimization_hints(
    visits: &[&Visit],
    conflicts: &[Conflict],
    conflict_policy: &ConflictPolicy,
    policy: &DayStatusPolicy,
) -> Vec<String> {
    if visits.is_empty() {
        return vec!["Free day, available for planning".to_string()];
    }

    let mut hints = Vec::new();
    if !conflicts.is_empty() {
        hints.push(format!(
            "{} conflict(s) detected, review the bookings",
            conflicts.len()
        ));
    }

    if visits.len() > conflict_policy.max_visits_per_day {
        hints.push(format!(
            "Many visits ({}), consider redistributing",
            visits.len()
        ));
    } else if visits.len() < policy.few_visits {
        hints.push("Few visits, room to add more".to_string());
    }

    let locations: BTreeSet<&LocationId> = visits.iter().map(|v| &v.location).collect();
    if locations.len() > policy.max_locations {
        hints.push("Many municipalities, order the route by proximity".to_string());
    }

    let early = minutes_of(policy.early_start);
    let late = minutes_of(policy.late_end);
    if visits.iter().any(|v| minutes_of(v.start_time) < early) {
        hints.push("Very early visits, confirm the informant is open".to_string());
    }
    if visits.iter().any(|v| minutes_of(v.end_time) > late) {
        hints.push("Very late visits, confirm the informant is available".to_string());
    }

    if hints.is_empty() {
        hints.push("Schedule is well organized".to_string());
    }
    hints
}

/// Quality band of a day's current schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScheduleRating {
    /// Efficiency ≥ 80% with 3 to 6 visits.
    Optimal,
    /// Efficiency ≥ 60% with at most 7 visits.
    Good,
    /// Efficiency ≥ 40%.
    Fair,
    /// Below 40% efficiency.
    NeedsOptimization,
}

/// Summary of a day's current schedule before re-optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleAnalysis {
    /// Visits on the day.
    pub total_visits: usize,
    /// Sum of visit durations (minutes).
    pub visit_minutes: i64,
    /// Travel between consecutive visits (minutes).
    pub travel_minutes: i64,
    /// Visit share of the working time, one decimal.
    pub efficiency_percent: f64,
    /// Start of the first visit.
    pub first_start: Option<NaiveTime>,
    /// End of the last visit.
    pub last_end: Option<NaiveTime>,
    /// Distinct locations visited, sorted.
    pub locations: Vec<LocationId>,
    /// Quality band.
    pub rating: ScheduleRating,
}

impl ScheduleAnalysis {
    /// Analyses chronologically ordered visits.
    ///
    /// Visits without a planned duration count as `default_visit_minutes`.
    pub fn calculate(visits: &[&Visit], table: &TravelTable, default_visit_minutes: u32) -> Self {
        let visit_minutes: i64 = visits
            .iter()
            .map(|v| v.effective_duration(default_visit_minutes))
            .sum();
        let travel_minutes = consecutive_travel(visits, table);
        let efficiency = if travel_minutes > 0 {
            visit_minutes as f64 / (visit_minutes + travel_minutes) as f64 * 100.0
        } else {
            100.0
        };
        let efficiency = round1(efficiency);

        let locations: BTreeSet<LocationId> = visits.iter().map(|v| v.location.clone()).collect();
        let n = visits.len();
        let rating = if efficiency >= 80.0 && (3..=6).contains(&n) {
            ScheduleRating::Optimal
        } else if efficiency >= 60.0 && n <= 7 {
            ScheduleRating::Good
        } else if efficiency >= 40.0 {
            ScheduleRating::Fair
        } else {
            ScheduleRating::NeedsOptimization
        };

        Self {
            total_visits: n,
            visit_minutes,
            travel_minutes,
            efficiency_percent: efficiency,
            first_start: visits.first().map(|v| v.start_time),
            last_end: visits.last().map(|v| v.end_time),
            locations: locations.into_iter().collect(),
            rating,
        }
    }
}

fn consecutive_travel(visits: &[&Visit], table: &TravelTable) -> i64 {
    visits
        .windows(2)
        .map(|pair| i64::from(table.estimate(&pair[0].location, &pair[1].location)))
        .sum()
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
