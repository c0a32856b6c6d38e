//! Pairwise and day-level conflict detection.
//!
//! # Algorithm
//!
//! For a placement P against each other active visit O on the same day:
//!
//! 1. **Overlap**: `P ∩ O ≠ ∅` (half-open). Same location is CRITICAL;
//!    different locations are CRITICAL when the travel estimate exceeds
//!    the impossible-travel threshold, else HIGH.
//! 2. **Travel**: for the chronologically adjacent, non-overlapping
//!    neighbours, `gap < travel + buffer` is HIGH with
//!    `deficit = required − available`.
//! 3. **Capacity**: more visits than the daily maximum is MEDIUM, HIGH
//!    from `capacity_high_excess` over.
//! 4. **Business hours**: start before opening or end after closing is
//!    MEDIUM; intersecting the lunch break is LOW.
//!
//! Day detection runs checks 1 and 2 once per pair of visits rather than
//! once per visit, so each problem is reported exactly once.
//!
//! Complexity: O(n²) pairs for n visits; n is bounded by daily capacity.

use chrono::NaiveDate;
use std::cmp::Reverse;

use super::analysis::DayConflictReport;
use crate::models::{
    format_minutes, sort_by_severity, Conflict, ConflictDetails, ConflictType, LocationId,
    Severity, TimeWindow, Visit, VisitCandidate, VisitId,
};
use crate::policy::{ConflictPolicy, DayStatusPolicy};
use crate::travel::{TravelEstimator, TravelTable};
use crate::validation::validate_visit;

/// A visit viewed as an interval at a location.
#[derive(Debug, Clone)]
struct Placement<'a> {
    id: Option<VisitId>,
    label: String,
    location: &'a LocationId,
    window: TimeWindow,
}

impl<'a> Placement<'a> {
    fn of_visit(visit: &'a Visit, window: TimeWindow) -> Self {
        Self {
            id: Some(visit.id),
            label: visit.id.to_string(),
            location: &visit.location,
            window,
        }
    }

    fn of_candidate(candidate: &'a VisitCandidate) -> Self {
        Self {
            id: candidate.id,
            label: candidate.label(),
            location: &candidate.location,
            window: candidate.window,
        }
    }
}

/// Detects scheduling conflicts among same-day visits.
///
/// Stateless apart from its policy and a handle to the shared travel
/// table; safe to call from several threads at once.
#[derive(Debug, Clone, Default)]
pub struct ConflictDetector {
    travel: TravelEstimator,
    policy: ConflictPolicy,
    day_status: DayStatusPolicy,
}

impl ConflictDetector {
    /// Creates a detector.
    pub fn new(travel: TravelEstimator, policy: ConflictPolicy) -> Self {
        Self {
            travel,
            policy,
            day_status: DayStatusPolicy::default(),
        }
    }

    /// Sets the day classification cutoffs.
    pub fn with_day_status(mut self, day_status: DayStatusPolicy) -> Self {
        self.day_status = day_status;
        self
    }

    /// Conflict thresholds in use.
    pub fn policy(&self) -> &ConflictPolicy {
        &self.policy
    }

    /// Travel estimator in use.
    pub fn travel(&self) -> &TravelEstimator {
        &self.travel
    }

    /// Conflicts a candidate placement would have against `same_day`.
    ///
    /// Visits that are inactive, dated on another day, malformed, or that
    /// are the candidate itself are ignored. Conflicts are returned most
    /// severe first.
    pub fn detect_for_visit(&self, candidate: &VisitCandidate, same_day: &[Visit]) -> Vec<Conflict> {
        if !candidate.window.is_valid() {
            log::warn!(
                "Skipping conflict detection for visit {}: invalid window {}",
                candidate.label(),
                candidate.window.label()
            );
            return Vec::new();
        }

        let table = self.travel.snapshot();
        let principal = Placement::of_candidate(candidate);
        let others: Vec<Placement<'_>> = usable_visits(same_day, candidate.date)
            .filter(|(v, _)| Some(v.id) != candidate.id)
            .map(|(v, w)| Placement::of_visit(v, w))
            .collect();

        let mut conflicts = Vec::new();

        for other in &others {
            if principal.window.overlaps(&other.window) {
                conflicts.push(self.overlap_conflict(&table, &principal, other));
            }
        }

        let previous = latest_before(&others, principal.window.start_min);
        let next = others
            .iter()
            .filter(|o| o.window.start_min >= principal.window.end_min)
            .min_by_key(|o| o.window.start_min);
        for neighbour in previous.into_iter().chain(next) {
            if let Some(c) = self.travel_conflict(&table, &principal, neighbour) {
                conflicts.push(c);
            }
        }

        let total = others.len() + 1;
        let others_ids: Vec<VisitId> = others.iter().filter_map(|o| o.id).collect();
        if let Some(c) = self.capacity_conflict(candidate.date, principal.id, others_ids, total) {
            conflicts.push(c);
        }

        conflicts.extend(self.business_hours_conflicts(&principal));

        sort_by_severity(&mut conflicts);
        log::debug!(
            "Visit {} at {}: {} conflict(s) against {} visit(s)",
            principal.label,
            principal.window.label(),
            conflicts.len(),
            others.len()
        );
        conflicts
    }

    /// Every conflict of a day, with productivity analysis and day status.
    ///
    /// Invalid visits are skipped with a warning; an empty day is classified
    /// as free.
    pub fn detect_for_day(&self, date: NaiveDate, visits: &[Visit]) -> DayConflictReport {
        let table = self.travel.snapshot();
        let mut day: Vec<(&Visit, TimeWindow)> = usable_visits(visits, date).collect();
        day.sort_by_key(|(v, w)| (w.start_min, v.id));

        let placements: Vec<Placement<'_>> =
            day.iter().map(|(v, w)| Placement::of_visit(v, *w)).collect();
        let conflicts = self.day_conflicts(&table, date, &placements);

        let ordered: Vec<&Visit> = day.iter().map(|(v, _)| *v).collect();
        let report = DayConflictReport::assemble(
            date,
            &ordered,
            conflicts,
            &table,
            &self.policy,
            &self.day_status,
        );

        log::info!(
            "Day {date}: {} visit(s), {} conflict(s), status {:?}",
            report.total_visits,
            report.total_conflicts,
            report.status
        );
        report
    }

    fn day_conflicts(
        &self,
        table: &TravelTable,
        date: NaiveDate,
        placements: &[Placement<'_>],
    ) -> Vec<Conflict> {
        let mut conflicts = Vec::new();

        for (i, a) in placements.iter().enumerate() {
            for b in &placements[i + 1..] {
                if a.window.overlaps(&b.window) {
                    conflicts.push(self.overlap_conflict(table, a, b));
                }
            }
        }

        // Each visit against the visit it actually follows, which need not
        // be its neighbour in start order when visits nest.
        for later in placements {
            if let Some(earlier) = latest_before(placements, later.window.start_min) {
                if let Some(c) = self.travel_conflict(table, earlier, later) {
                    conflicts.push(c);
                }
            }
        }

        if let Some(last) = placements.last() {
            let all_ids: Vec<VisitId> = placements.iter().filter_map(|p| p.id).collect();
            if let Some(c) = self.capacity_conflict(date, last.id, all_ids, placements.len()) {
                conflicts.push(c);
            }
        }

        for p in placements {
            conflicts.extend(self.business_hours_conflicts(p));
        }

        sort_by_severity(&mut conflicts);
        conflicts
    }

    // ================================
    // Individual checks
    // ================================

    fn overlap_conflict(
        &self,
        table: &TravelTable,
        principal: &Placement<'_>,
        other: &Placement<'_>,
    ) -> Conflict {
        let same_location = principal.location == other.location;
        let travel_minutes = table.estimate(principal.location, other.location);

        let (severity, description) = if same_location {
            (
                Severity::Critical,
                format!(
                    "Double booking at {}: {} overlaps {}",
                    principal.location,
                    principal.window.label(),
                    other.window.label()
                ),
            )
        } else if travel_minutes > self.policy.impossible_travel_minutes {
            (
                Severity::Critical,
                format!(
                    "Overlapping visits at {} and {} are {travel_minutes} min apart",
                    principal.location, other.location
                ),
            )
        } else {
            (
                Severity::High,
                format!(
                    "Visit at {} ({}) overlaps visit at {} ({})",
                    principal.location,
                    principal.window.label(),
                    other.location,
                    other.window.label()
                ),
            )
        };

        let mut resolutions = vec![
            "Reschedule one of the two visits".to_string(),
            "Shorten the earlier visit".to_string(),
        ];
        if !same_location {
            resolutions.push("Confirm faster transport between the locations".to_string());
        }

        Conflict {
            id: format!("overlap_{}_{}", principal.label, other.label),
            conflict_type: ConflictType::Overlap,
            severity,
            principal_visit: principal.id,
            conflicting_visits: other.id.into_iter().collect(),
            description,
            suggested_resolutions: resolutions,
            estimated_impact: match severity {
                Severity::Critical => "Visit cannot take place as scheduled".to_string(),
                _ => "Visit will start late or be cut short".to_string(),
            },
            details: ConflictDetails::Overlap {
                location: principal.location.clone(),
                other_location: other.location.clone(),
                window: principal.window.label(),
                other_window: other.window.label(),
                travel_minutes,
            },
        }
    }

    /// Travel check between a placement and a non-overlapping neighbour.
    fn travel_conflict(
        &self,
        table: &TravelTable,
        principal: &Placement<'_>,
        other: &Placement<'_>,
    ) -> Option<Conflict> {
        if principal.window.overlaps(&other.window) {
            return None;
        }
        let (earlier, later) = if principal.window.end_min <= other.window.start_min {
            (principal, other)
        } else {
            (other, principal)
        };

        let available = earlier.window.gap_until(&later.window);
        let travel = table.estimate(earlier.location, later.location);
        let required = i64::from(travel) + self.policy.travel_buffer_minutes;
        if available >= required {
            return None;
        }
        let deficit = required - available;

        Some(Conflict {
            id: format!("travel_{}_{}", earlier.label, later.label),
            conflict_type: ConflictType::TravelInfeasible,
            severity: Severity::High,
            principal_visit: principal.id,
            conflicting_visits: other.id.into_iter().collect(),
            description: format!(
                "Insufficient travel time from {} to {}: {available} min available, {required} min needed",
                earlier.location, later.location
            ),
            suggested_resolutions: vec![
                "Reorder visits by proximity".to_string(),
                format!("Start the later visit {deficit} min later"),
                "Confirm alternate transport".to_string(),
            ],
            estimated_impact: format!("Delay of about {deficit} min"),
            details: ConflictDetails::Travel {
                origin: earlier.location.clone(),
                destination: later.location.clone(),
                available_minutes: available,
                required_minutes: required,
                deficit_minutes: deficit,
            },
        })
    }

    fn capacity_conflict(
        &self,
        date: NaiveDate,
        principal: Option<VisitId>,
        others: Vec<VisitId>,
        total: usize,
    ) -> Option<Conflict> {
        let maximum = self.policy.max_visits_per_day;
        if total <= maximum {
            return None;
        }
        let excess = total - maximum;
        let severity = if excess >= self.policy.capacity_high_excess {
            Severity::High
        } else {
            Severity::Medium
        };

        Some(Conflict {
            id: format!("capacity_{date}"),
            conflict_type: ConflictType::CapacityExceeded,
            severity,
            principal_visit: principal,
            conflicting_visits: others,
            description: format!("{total} visits scheduled, recommended maximum is {maximum}"),
            suggested_resolutions: vec![
                format!("Move {excess} visit(s) to another day"),
                "Keep P1 informants and postpone the rest".to_string(),
            ],
            estimated_impact: match severity {
                Severity::High => "Working day will overrun".to_string(),
                _ => "Longer working day with risk of delays".to_string(),
            },
            details: ConflictDetails::Capacity {
                total_visits: total,
                maximum,
                excess,
            },
        })
    }

    fn business_hours_conflicts(&self, p: &Placement<'_>) -> Vec<Conflict> {
        let mut conflicts = Vec::new();
        let hours = self.policy.business_hours();
        let lunch = self.policy.lunch();

        if p.window.start_min < hours.start_min {
            let opening = format_minutes(hours.start_min);
            conflicts.push(self.hours_conflict(
                p,
                format!("early_{}", p.label),
                Severity::Medium,
                format!(
                    "Visit starts at {}, before opening at {opening}",
                    format_minutes(p.window.start_min)
                ),
                format!("from {opening}"),
                vec![
                    format!("Start at or after {opening}"),
                    "Confirm the informant is available early".to_string(),
                ],
            ));
        }

        if p.window.end_min > hours.end_min {
            let closing = format_minutes(hours.end_min);
            conflicts.push(self.hours_conflict(
                p,
                format!("late_{}", p.label),
                Severity::Medium,
                format!(
                    "Visit ends at {}, after closing at {closing}",
                    format_minutes(p.window.end_min)
                ),
                format!("until {closing}"),
                vec![
                    format!("Finish by {closing}"),
                    "Confirm the informant is available late".to_string(),
                ],
            ));
        }

        if p.window.overlaps(&lunch) {
            conflicts.push(self.hours_conflict(
                p,
                format!("lunch_{}", p.label),
                Severity::Low,
                format!(
                    "Visit {} overlaps the lunch break {}",
                    p.window.label(),
                    lunch.label()
                ),
                lunch.label(),
                vec![
                    format!("Move the visit outside {}", lunch.label()),
                    "Confirm the informant is available over lunch".to_string(),
                ],
            ));
        }

        conflicts
    }

    fn hours_conflict(
        &self,
        p: &Placement<'_>,
        id: String,
        severity: Severity,
        description: String,
        recommended: String,
        resolutions: Vec<String>,
    ) -> Conflict {
        Conflict {
            id,
            conflict_type: ConflictType::BusinessHoursViolation,
            severity,
            principal_visit: p.id,
            conflicting_visits: Vec::new(),
            description,
            suggested_resolutions: resolutions,
            estimated_impact: match severity {
                Severity::Low => "Informant may be unavailable".to_string(),
                _ => "Informant likely unavailable".to_string(),
            },
            details: ConflictDetails::BusinessHours {
                window: p.window.label(),
                recommended,
            },
        }
    }
}

/// Active, well-formed visits dated `date`, paired with their windows.
///
/// Malformed visits are logged and skipped.
pub(crate) fn usable_visits(
    visits: &[Visit],
    date: NaiveDate,
) -> impl Iterator<Item = (&Visit, TimeWindow)> + '_ {
    visits.iter().filter_map(move |v| {
        if !v.is_active() || v.date != date {
            return None;
        }
        if let Err(errors) = validate_visit(v) {
            for e in errors {
                log::warn!("Skipping visit {}: {e}", v.id);
            }
            return None;
        }
        v.window().map(|w| (v, w))
    })
}

/// Placement ending last at or before `start_min`, lowest id on ties.
fn latest_before<'p, 'a>(
    placements: &'p [Placement<'a>],
    start_min: i64,
) -> Option<&'p Placement<'a>> {
    placements
        .iter()
        .filter(|p| p.window.end_min <= start_min)
        .max_by_key(|p| (p.window.end_min, Reverse(p.id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::DayStatus;
    use crate::models::VisitStatus;
    use chrono::NaiveTime;

    fn d() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 14).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn visit(id: VisitId, loc: &str, start: (u32, u32), end: (u32, u32)) -> Visit {
        Visit::new(id, loc, d(), t(start.0, start.1), t(end.0, end.1))
    }

    fn detector(table: TravelTable) -> ConflictDetector {
        ConflictDetector::new(TravelEstimator::new(table), ConflictPolicy::default())
    }

    fn xy_table(minutes: u32) -> TravelTable {
        TravelTable::new().with_route("X", "Y", minutes)
    }

    #[test]
    fn test_travel_infeasible_scenario() {
        let visits = vec![visit(1, "X", (9, 0), (10, 30)), visit(2, "Y", (10, 45), (12, 0))];
        let report = detector(xy_table(60)).detect_for_day(d(), &visits);

        let travel: Vec<&Conflict> = report
            .conflicts
            .iter()
            .filter(|c| c.conflict_type == ConflictType::TravelInfeasible)
            .collect();
        assert_eq!(travel.len(), 1);
        assert_eq!(travel[0].severity, Severity::High);
        assert_eq!(travel[0].id, "travel_1_2");
        match &travel[0].details {
            ConflictDetails::Travel {
                available_minutes,
                required_minutes,
                deficit_minutes,
                ..
            } => {
                assert_eq!(*available_minutes, 15);
                assert_eq!(*required_minutes, 75);
                assert_eq!(*deficit_minutes, 60);
            }
            other => panic!("unexpected details: {other:?}"),
        }
    }

    #[test]
    fn test_same_location_overlap_is_critical() {
        let visits = vec![
            visit(1, "Penha", (9, 0), (10, 30)),
            visit(2, "Penha", (10, 0), (11, 0)),
        ];
        let report = detector(TravelTable::new()).detect_for_day(d(), &visits);
        let overlap = report
            .conflicts
            .iter()
            .find(|c| c.conflict_type == ConflictType::Overlap)
            .unwrap();
        assert_eq!(overlap.severity, Severity::Critical);
        assert_eq!(overlap.principal_visit, Some(1));
        assert_eq!(overlap.conflicting_visits, vec![2]);
        assert_eq!(report.status, DayStatus::Critical);
        assert_eq!(report.critical_conflicts, 1);
    }

    #[test]
    fn test_overlap_severity_by_travel() {
        let visits = vec![visit(1, "X", (9, 0), (10, 30)), visit(2, "Y", (10, 0), (11, 0))];

        let near = detector(xy_table(30)).detect_for_day(d(), &visits);
        let c = &near.conflicts[0];
        assert_eq!(c.conflict_type, ConflictType::Overlap);
        assert_eq!(c.severity, Severity::High);
        assert!(c
            .suggested_resolutions
            .iter()
            .any(|r| r.contains("faster transport")));

        let far = detector(xy_table(61)).detect_for_day(d(), &visits);
        assert_eq!(far.conflicts[0].severity, Severity::Critical);

        // Exactly at the threshold is not impossible.
        let edge = detector(xy_table(60)).detect_for_day(d(), &visits);
        assert_eq!(edge.conflicts[0].severity, Severity::High);
    }

    #[test]
    fn test_touching_visits_do_not_overlap() {
        let visits = vec![
            visit(1, "Penha", (9, 0), (10, 0)),
            visit(2, "Penha", (10, 0), (11, 0)),
        ];
        let report = detector(TravelTable::new()).detect_for_day(d(), &visits);
        assert!(report
            .conflicts
            .iter()
            .all(|c| c.conflict_type != ConflictType::Overlap));
        // Same location still needs 5 + 15 min between visits.
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].conflict_type, ConflictType::TravelInfeasible);
    }

    #[test]
    fn test_enough_gap_is_clean() {
        let visits = vec![visit(1, "X", (9, 0), (10, 0)), visit(2, "Y", (11, 15), (12, 0))];
        let report = detector(xy_table(60)).detect_for_day(d(), &visits);
        assert!(report.conflicts.is_empty());
        // 105 visit minutes against 60 travel minutes
        assert_eq!(report.status, DayStatus::Good);
    }

    #[test]
    fn test_travel_only_between_adjacent_visits() {
        // 1 -> 2 is fine, 2 -> 3 is fine; 1 -> 3 is never compared.
        let table = TravelTable::new()
            .with_route("A", "B", 10)
            .with_route("B", "C", 10)
            .with_route("A", "C", 120);
        let visits = vec![
            visit(1, "A", (8, 30), (9, 0)),
            visit(2, "B", (9, 30), (10, 0)),
            visit(3, "C", (10, 30), (11, 0)),
        ];
        let report = detector(table).detect_for_day(d(), &visits);
        assert!(report.conflicts.is_empty());
    }

    #[test]
    fn test_travel_after_nested_visit() {
        // Visit 2 sits inside visit 1; visit 3 really follows visit 1.
        let visits = vec![
            visit(1, "X", (9, 0), (12, 0)),
            visit(2, "X", (9, 30), (10, 0)),
            visit(3, "Y", (12, 5), (12, 50)),
        ];
        let det = detector(xy_table(45));
        let report = det.detect_for_day(d(), &visits);
        let travel: Vec<&str> = report
            .conflicts
            .iter()
            .filter(|c| c.conflict_type == ConflictType::TravelInfeasible)
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(travel, vec!["travel_1_3"]);

        let single = det.detect_for_visit(&visits[2].as_candidate().unwrap(), &visits);
        assert!(single.iter().any(|c| c.id == "travel_1_3"));
    }

    #[test]
    fn test_capacity_seventh_visit() {
        let visits: Vec<Visit> = (0..6u32)
            .map(|i| {
                let start = 8 * 60 + 30 + i * 75;
                Visit::new(
                    u64::from(i) + 1,
                    "Itajaí",
                    d(),
                    t(start / 60, start % 60),
                    t((start + 45) / 60, (start + 45) % 60),
                )
            })
            .collect();

        let candidate =
            VisitCandidate::starting_at("Itajaí", d(), t(16, 0), 30).with_id(7);
        let conflicts = detector(TravelTable::new()).detect_for_visit(&candidate, &visits);
        let capacity = conflicts
            .iter()
            .find(|c| c.conflict_type == ConflictType::CapacityExceeded)
            .unwrap();
        assert!(capacity.severity >= Severity::Medium);
        let mut ids = capacity.involved_visits();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7]);

        // The same seven visits as a day.
        let mut day = visits.clone();
        day.push(Visit::new(7, "Itajaí", d(), t(16, 0), t(16, 30)));
        let report = detector(TravelTable::new()).detect_for_day(d(), &day);
        let capacity = report
            .conflicts
            .iter()
            .find(|c| c.conflict_type == ConflictType::CapacityExceeded)
            .unwrap();
        assert_eq!(capacity.severity, Severity::Medium);
        assert_eq!(capacity.conflicting_visits.len(), 7);
        assert_eq!(capacity.principal_visit, Some(7));
    }

    #[test]
    fn test_capacity_high_when_substantially_over() {
        let visits: Vec<Visit> = (0..8u32)
            .map(|i| {
                let start = 8 * 60 + i * 60;
                Visit::new(
                    u64::from(i) + 1,
                    "Itajaí",
                    d(),
                    t(start / 60, 0),
                    t(start / 60, 20),
                )
            })
            .collect();
        let report = detector(TravelTable::new()).detect_for_day(d(), &visits);
        let capacity = report
            .conflicts
            .iter()
            .find(|c| c.conflict_type == ConflictType::CapacityExceeded)
            .unwrap();
        assert_eq!(capacity.severity, Severity::High);
    }

    #[test]
    fn test_business_hours() {
        let table = TravelTable::new();
        let det = detector(table);

        let early = VisitCandidate::starting_at("Penha", d(), t(7, 30), 60);
        let conflicts = det.detect_for_visit(&early, &[]);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].id, "early_new");
        assert_eq!(conflicts[0].severity, Severity::Medium);

        let late = VisitCandidate::starting_at("Penha", d(), t(16, 30), 60);
        let conflicts = det.detect_for_visit(&late, &[]);
        assert_eq!(conflicts[0].id, "late_new");

        let lunch = VisitCandidate::starting_at("Penha", d(), t(11, 30), 60);
        let conflicts = det.detect_for_visit(&lunch, &[]);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].severity, Severity::Low);

        let fine = VisitCandidate::starting_at("Penha", d(), t(9, 0), 90);
        assert!(det.detect_for_visit(&fine, &[]).is_empty());
    }

    #[test]
    fn test_candidate_ignores_itself_and_inactive_visits() {
        let visits = vec![
            visit(1, "Penha", (9, 0), (10, 0)),
            visit(2, "Penha", (9, 30), (10, 30)).with_status(VisitStatus::Cancelled),
        ];
        let me = visits[0].as_candidate().unwrap();
        assert!(detector(TravelTable::new())
            .detect_for_visit(&me, &visits)
            .is_empty());
    }

    #[test]
    fn test_candidate_travel_to_both_neighbours() {
        let visits = vec![visit(1, "X", (9, 0), (10, 0)), visit(2, "X", (12, 0), (13, 0))];
        let candidate = VisitCandidate::starting_at("Y", d(), t(10, 30), 60);
        let conflicts = detector(xy_table(30)).detect_for_visit(&candidate, &visits);
        let ids: Vec<&str> = conflicts
            .iter()
            .filter(|c| c.conflict_type == ConflictType::TravelInfeasible)
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["travel_1_new", "travel_new_2"]);
    }

    #[test]
    fn test_invalid_visits_are_skipped() {
        let visits = vec![
            visit(1, "Penha", (9, 0), (10, 0)),
            visit(2, "Penha", (11, 0), (10, 0)),
        ];
        let report = detector(TravelTable::new()).detect_for_day(d(), &visits);
        assert_eq!(report.total_visits, 1);
        assert!(report.conflicts.is_empty());
    }

    #[test]
    fn test_empty_day_is_free() {
        let report = detector(TravelTable::new()).detect_for_day(d(), &[]);
        assert_eq!(report.total_visits, 0);
        assert!(report.conflicts.is_empty());
        assert_eq!(report.status, DayStatus::Free);
    }

    #[test]
    fn test_day_detection_is_idempotent() {
        let visits = vec![
            visit(3, "Penha", (10, 0), (11, 0)),
            visit(1, "X", (9, 0), (10, 30)),
            visit(2, "Y", (10, 45), (12, 30)),
            visit(4, "Penha", (16, 0), (17, 30)),
        ];
        let det = detector(xy_table(60));
        let first = serde_json::to_string(&det.detect_for_day(d(), &visits)).unwrap();
        let second = serde_json::to_string(&det.detect_for_day(d(), &visits)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_conflicts_sorted_by_severity() {
        let visits = vec![
            visit(1, "Penha", (11, 30), (12, 30)),
            visit(2, "Penha", (12, 0), (13, 0)),
        ];
        let report = detector(TravelTable::new()).detect_for_day(d(), &visits);
        let severities: Vec<Severity> = report.conflicts.iter().map(|c| c.severity).collect();
        let mut sorted = severities.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(severities, sorted);
        assert_eq!(severities[0], Severity::Critical);
    }
}
