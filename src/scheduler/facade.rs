//! Scheduler facade.
//!
//! # Algorithm
//!
//! `suggest_slots`:
//! 1. Enumerate free windows for the requested duration.
//! 2. Score each window as a hypothetical placement of the visit.
//! 3. Stable-sort by descending score and keep the top N.
//!
//! `reoptimize_day`: for each visit, hold the others fixed, rank its
//! alternative windows, and compare the best against the visit's current
//! placement.
//!
//! Every public operation catches errors at its boundary, logs a warning
//! and returns an empty or default result.
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 4: Priority Dispatching

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::reschedule::{RescheduleAdvice, RescheduleAdvisor};
use super::scoring::{SlotScore, SlotScorer};
use super::slots::SlotGenerator;
use crate::conflict::{usable_visits, ConflictDetector, DayConflictReport, ScheduleAnalysis};
use crate::error::{ScheduleError, ScheduleResult};
use crate::models::{
    Conflict, DayPeriod, EntityType, LocationId, Priority, ScheduleSlot, SlotMetadata,
    SuggestionKind, TimeWindow, Visit, VisitCandidate, VisitId,
};
use crate::policy::{Criterion, SchedulingPolicy};
use crate::repository::VisitRepository;
use crate::travel::TravelEstimator;
use crate::validation::{validate_day, validate_slot_request};

/// Input for a slot suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotRequest {
    /// Location to visit.
    pub location: LocationId,
    /// Day to search.
    pub date: NaiveDate,
    /// Visit duration (minutes).
    pub duration_minutes: u32,
    /// Kind of informant.
    pub entity_type: EntityType,
    /// Priority tier.
    pub priority: Priority,
    /// Weight preset; `None` picks one from the priority.
    pub criterion: Option<Criterion>,
    /// Existing visit being moved, ignored as an obstacle.
    pub exclude_visit: Option<VisitId>,
}

impl SlotRequest {
    /// Creates a request for a new visit.
    pub fn new(location: impl Into<LocationId>, date: NaiveDate, duration_minutes: u32) -> Self {
        Self {
            location: location.into(),
            date,
            duration_minutes,
            entity_type: EntityType::default(),
            priority: Priority::default(),
            criterion: None,
            exclude_visit: None,
        }
    }

    /// Request to move an existing visit within its day.
    ///
    /// A visit without a planned duration is moved as `default_minutes` long.
    pub fn for_visit(visit: &Visit, default_minutes: u32) -> Self {
        Self {
            location: visit.location.clone(),
            date: visit.date,
            duration_minutes: u32::try_from(visit.effective_duration(default_minutes))
                .unwrap_or(default_minutes),
            entity_type: visit.entity_type,
            priority: visit.priority,
            criterion: None,
            exclude_visit: Some(visit.id),
        }
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

    /// Sets the weight preset.
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = Some(criterion);
        self
    }

    /// Sets an optional weight preset.
    pub fn with_optional_criterion(mut self, criterion: Option<Criterion>) -> Self {
        self.criterion = criterion;
        self
    }

    /// Ignores an existing visit as an obstacle.
    pub fn excluding(mut self, visit_id: VisitId) -> Self {
        self.exclude_visit = Some(visit_id);
        self
    }

    /// Criterion used for this request.
    pub fn effective_criterion(&self) -> Criterion {
        Criterion::effective(self.criterion, self.priority)
    }

    fn candidate(&self, window: TimeWindow) -> VisitCandidate {
        VisitCandidate {
            id: self.exclude_visit,
            location: self.location.clone(),
            date: self.date,
            window,
            entity_type: self.entity_type,
        }
    }
}

/// Best alternative placement of one visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitOptimization {
    /// Visit id.
    pub visit_id: VisitId,
    /// Visit location.
    pub location: LocationId,
    /// `HH:MM - HH:MM` of the current placement.
    pub current_window: String,
    /// Score of the current placement.
    pub current_score: f64,
    /// Best alternative window, if any is free.
    pub best: Option<ScheduleSlot>,
    /// `best.score − current_score`, 0 without an alternative.
    pub score_delta: f64,
    /// Whether moving the visit is worth it.
    pub recommended: bool,
}

/// Whether applying a day optimization is advised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptimizationStatus {
    /// No visits on the day.
    FreeDay,
    /// Overall score above the recommendation floor.
    Recommended,
    /// Current schedule is acceptable.
    Optional,
}

/// Current versus optimized day quality.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImprovementMetrics {
    /// Current efficiency as a score in `[0, 1]`.
    pub current_score: f64,
    /// Mean best-alternative score.
    pub optimized_score: f64,
    /// `optimized_score − current_score`.
    pub delta: f64,
    /// Visits recommended to move.
    pub visits_affected: usize,
}

/// Result of re-optimizing one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayOptimization {
    /// Optimized date.
    pub date: NaiveDate,
    /// Analysis of the current schedule, `None` for a free day.
    pub analysis: Option<ScheduleAnalysis>,
    /// Conflicts of the current schedule.
    pub conflicts: Vec<Conflict>,
    /// Per-visit alternatives, chronological.
    pub suggestions: Vec<VisitOptimization>,
    /// Mean score of the best alternatives, three decimals.
    pub overall_score: f64,
    /// Visits recommended to move.
    pub visits_to_move: usize,
    /// Whether applying the optimization is advised.
    pub status: OptimizationStatus,
    /// Before/after comparison.
    pub improvement: ImprovementMetrics,
    /// Human-readable recommendations.
    pub recommendations: Vec<String>,
}

impl DayOptimization {
    fn free_day(date: NaiveDate) -> Self {
        Self {
            date,
            analysis: None,
            conflicts: Vec::new(),
            suggestions: Vec::new(),
            overall_score: 0.0,
            visits_to_move: 0,
            status: OptimizationStatus::FreeDay,
            improvement: ImprovementMetrics::default(),
            recommendations: vec!["Free day, available for new visits".to_string()],
        }
    }
}

/// Entry point for conflict detection and slot optimization.
///
/// Reads visits from a [`VisitRepository`] on every call; holds no
/// per-call state and may be shared across threads.
///
/// # Example
///
/// ```
/// use chrono::{NaiveDate, NaiveTime};
/// use visit_schedule::models::Visit;
/// use visit_schedule::repository::InMemoryVisitRepository;
/// use visit_schedule::scheduler::{SlotRequest, VisitScheduler};
/// use visit_schedule::travel::{TravelEstimator, TravelTable};
///
/// let date = NaiveDate::from_ymd_opt(2024, 10, 14).unwrap();
/// let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
/// let repo = InMemoryVisitRepository::with_visits(vec![
///     Visit::new(1, "Itajaí", date, t(9, 0), t(10, 30)),
/// ]);
/// let scheduler = VisitScheduler::new(repo, TravelEstimator::new(TravelTable::itajai_microregion()));
///
/// let slots = scheduler.suggest_slots(&SlotRequest::new("Penha", date, 90));
/// assert!(!slots.is_empty());
/// assert!(slots.windows(2).all(|w| w[0].score >= w[1].score));
/// ```
#[derive(Debug, Clone)]
pub struct VisitScheduler<R> {
    repository: R,
    policy: SchedulingPolicy,
    generator: SlotGenerator,
    scorer: SlotScorer,
}

impl<R: VisitRepository> VisitScheduler<R> {
    /// Creates a scheduler with the default policy.
    pub fn new(repository: R, travel: TravelEstimator) -> Self {
        Self::with_policy(repository, travel, SchedulingPolicy::default())
    }

    /// Creates a scheduler with an explicit policy.
    pub fn with_policy(repository: R, travel: TravelEstimator, policy: SchedulingPolicy) -> Self {
        let detector = ConflictDetector::new(travel, policy.conflict.clone())
            .with_day_status(policy.day_status.clone());
        Self {
            repository,
            generator: SlotGenerator::new(policy.slots.clone()),
            scorer: SlotScorer::new(detector, policy.scoring.clone()),
            policy,
        }
    }

    /// Policy in use.
    pub fn policy(&self) -> &SchedulingPolicy {
        &self.policy
    }

    /// Conflict detector in use.
    pub fn detector(&self) -> &ConflictDetector {
        self.scorer.detector()
    }

    /// Visit repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Request to move `visit` within its day, with the policy's duration
    /// fallback.
    pub fn request_for(&self, visit: &Visit) -> SlotRequest {
        SlotRequest::for_visit(visit, self.policy.conflict.default_visit_minutes)
    }

    /// Advisor for reschedule proposals.
    pub fn reschedule_advisor(&self) -> RescheduleAdvisor<'_, R> {
        RescheduleAdvisor::new(self)
    }

    // ================================
    // Public operations
    // ================================

    /// Top-ranked free slots for a visit, best first.
    ///
    /// An empty result means no conflict-free slot exists under the current
    /// constraints, or the request could not be served.
    pub fn suggest_slots(&self, request: &SlotRequest) -> Vec<ScheduleSlot> {
        let result = validate_slot_request(request, &self.policy.slots)
            .map_err(ScheduleError::from)
            .and_then(|()| self.load_day(request.date));
        match result {
            Ok(visits) => {
                let slots = self.rank_slots(request, &visits);
                log::info!(
                    "Suggested {} slot(s) for {} on {}",
                    slots.len(),
                    request.location,
                    request.date
                );
                slots
            }
            Err(e) => {
                log::warn!("No slots suggested for {} on {}: {e}", request.location, request.date);
                Vec::new()
            }
        }
    }

    /// Conflicts a visit or hypothetical booking would have on its day.
    pub fn detect_conflicts_for_visit(&self, candidate: &VisitCandidate) -> Vec<Conflict> {
        match self.load_day(candidate.date) {
            Ok(visits) => self.detector().detect_for_visit(candidate, &visits),
            Err(e) => {
                log::warn!("Conflict check for visit {} skipped: {e}", candidate.label());
                Vec::new()
            }
        }
    }

    /// Conflict report for a whole day.
    pub fn detect_conflicts_for_day(&self, date: NaiveDate) -> DayConflictReport {
        let visits = self.load_day(date).unwrap_or_else(|e| {
            log::warn!("Day report for {date} built without visits: {e}");
            Vec::new()
        });
        self.detector().detect_for_day(date, &visits)
    }

    /// Best alternative window for every visit of a day.
    ///
    /// `criterion` of `None` picks a preset per visit from its priority.
    pub fn reoptimize_day(&self, date: NaiveDate, criterion: Option<Criterion>) -> DayOptimization {
        match self.load_day(date) {
            Ok(visits) => self.optimize_visits(date, &visits, criterion),
            Err(e) => {
                log::warn!("Re-optimization of {date} skipped: {e}");
                DayOptimization::free_day(date)
            }
        }
    }

    /// Same-day and future-date alternatives for visits in serious conflict.
    pub fn suggest_reschedule(&self, date: NaiveDate) -> RescheduleAdvice {
        self.reschedule_advisor().advise(date)
    }

    // ================================
    // Pure computations
    // ================================

    /// Ranks free slots for `request` against already loaded visits.
    pub fn rank_slots(&self, request: &SlotRequest, same_day: &[Visit]) -> Vec<ScheduleSlot> {
        let criterion = request.effective_criterion();
        let windows = self.generator.generate_excluding(
            request.date,
            request.duration_minutes,
            same_day,
            request.exclude_visit,
        );

        let current_conflicts: Vec<Conflict> = request
            .exclude_visit
            .and_then(|id| same_day.iter().find(|v| v.id == id))
            .and_then(Visit::as_candidate)
            .map(|c| self.detector().detect_for_visit(&c, same_day))
            .unwrap_or_default();

        let others: Vec<TimeWindow> = usable_visits(same_day, request.date)
            .filter(|(v, _)| Some(v.id) != request.exclude_visit)
            .map(|(_, w)| w)
            .collect();

        let mut slots: Vec<ScheduleSlot> = windows
            .into_iter()
            .filter_map(|window| {
                let candidate = request.candidate(window);
                let score = self.scorer.score(&candidate, same_day, criterion);
                build_slot(window, score, &current_conflicts, &others)
            })
            .collect();

        slots.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        slots.truncate(self.policy.slots.max_suggestions);
        slots
    }

    /// Scores a placement with the scheduler's scorer.
    pub fn score_placement(
        &self,
        candidate: &VisitCandidate,
        same_day: &[Visit],
        criterion: Criterion,
    ) -> SlotScore {
        self.scorer.score(candidate, same_day, criterion)
    }

    /// Visits of a day from the repository.
    ///
    /// Integrity problems are logged; only the first visit with a given id
    /// is kept.
    pub(crate) fn load_day(&self, date: NaiveDate) -> ScheduleResult<Vec<Visit>> {
        let mut visits: Vec<Visit> = self
            .repository
            .fetch_visits_for_date(date)?
            .into_iter()
            .filter(Visit::is_active)
            .collect();

        if let Err(errors) = validate_day(date, &visits) {
            for e in &errors {
                log::warn!("Visit data for {date}: {e}");
            }
            let mut seen = HashSet::new();
            visits.retain(|v| seen.insert(v.id));
        }
        Ok(visits)
    }

    fn optimize_visits(
        &self,
        date: NaiveDate,
        visits: &[Visit],
        criterion: Option<Criterion>,
    ) -> DayOptimization {
        let mut day: Vec<&Visit> = usable_visits(visits, date).map(|(v, _)| v).collect();
        if day.is_empty() {
            return DayOptimization::free_day(date);
        }
        day.sort_by_key(|v| (v.start_time, v.id));

        let table = self.detector().travel().snapshot();
        let analysis =
            ScheduleAnalysis::calculate(&day, &table, self.policy.conflict.default_visit_minutes);
        let report = self.detector().detect_for_day(date, visits);
        let scoring = &self.policy.scoring;

        let suggestions: Vec<VisitOptimization> = day
            .iter()
            .filter_map(|visit| {
                let current = visit.as_candidate()?;
                let request = self.request_for(visit).with_optional_criterion(criterion);
                let effective = request.effective_criterion();
                let current_score = self.scorer.score(&current, visits, effective).total;
                let best = self.rank_slots(&request, visits).into_iter().next();

                let score_delta = best
                    .as_ref()
                    .map(|b| round3(b.score - current_score))
                    .unwrap_or(0.0);
                let recommended = best.as_ref().is_some_and(|b| {
                    score_delta > scoring.recommend_min_gain && b.score > scoring.recommend_min_score
                });

                Some(VisitOptimization {
                    visit_id: visit.id,
                    location: visit.location.clone(),
                    current_window: current.window.label(),
                    current_score,
                    best,
                    score_delta,
                    recommended,
                })
            })
            .collect();

        let best_scores: Vec<f64> = suggestions
            .iter()
            .filter_map(|s| s.best.as_ref().map(|b| b.score))
            .collect();
        let overall_score = if best_scores.is_empty() {
            0.0
        } else {
            round3(best_scores.iter().sum::<f64>() / best_scores.len() as f64)
        };
        let visits_to_move = suggestions.iter().filter(|s| s.recommended).count();
        let status = if overall_score > scoring.recommend_min_score {
            OptimizationStatus::Recommended
        } else {
            OptimizationStatus::Optional
        };

        let current_score = analysis.efficiency_percent / 100.0;
        let improvement = ImprovementMetrics {
            current_score,
            optimized_score: overall_score,
            delta: round3(overall_score - current_score),
            visits_affected: visits_to_move,
        };
        let recommendations = self.day_recommendations(&analysis, &report);

        log::info!(
            "Re-optimized {date}: {} visit(s), overall {overall_score:.3}, {visits_to_move} to move",
            suggestions.len()
        );

        DayOptimization {
            date,
            analysis: Some(analysis),
            conflicts: report.conflicts,
            suggestions,
            overall_score,
            visits_to_move,
            status,
            improvement,
            recommendations,
        }
    }

    fn day_recommendations(
        &self,
        analysis: &ScheduleAnalysis,
        report: &DayConflictReport,
    ) -> Vec<String> {
        let mut recommendations = Vec::new();
        if report.total_conflicts > 0 {
            recommendations.push(format!(
                "Resolve {} detected conflict(s)",
                report.total_conflicts
            ));
        }
        if analysis.efficiency_percent < 60.0 {
            recommendations.push("Reorder visits to cut travel time".to_string());
        }
        if analysis.total_visits > self.policy.conflict.max_visits_per_day {
            recommendations.push("Redistribute visits, the day is overloaded".to_string());
        }
        if recommendations.is_empty() {
            recommendations.push("Schedule is well structured".to_string());
        }
        recommendations
    }
}

/// Turns a scored window into a presented slot.
fn build_slot(
    window: TimeWindow,
    score: SlotScore,
    current_conflicts: &[Conflict],
    others: &[TimeWindow],
) -> Option<ScheduleSlot> {
    let (start, end) = match (window.start_time(), window.end_time()) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            log::debug!("Slot {} falls outside the day", window.label());
            return None;
        }
    };

    let signatures: Vec<_> = score.conflicts.iter().map(Conflict::signature).collect();
    let conflicts_resolved: Vec<String> = current_conflicts
        .iter()
        .filter(|c| !signatures.contains(&c.signature()))
        .map(|c| c.id.clone())
        .collect();

    let mut advantages = score.advantages;
    if !conflicts_resolved.is_empty() {
        advantages.push(format!(
            "Resolves {} current conflict(s)",
            conflicts_resolved.len()
        ));
    }

    let metadata = SlotMetadata {
        position_in_day: others
            .iter()
            .filter(|w| w.start_min < window.start_min)
            .count()
            + 1,
        total_visits_in_day: others.len() + 1,
        formatted_window: window.label(),
        period: DayPeriod::of(window.start_min),
    };

    Some(ScheduleSlot {
        start,
        end,
        window,
        score: score.total,
        components: score.components,
        reasons: score.reasons,
        advantages,
        caveats: score.caveats,
        conflicts_resolved,
        travel_impact: score.travel_impact,
        kind: SuggestionKind::from_score(score.total),
        metadata,
    })
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VisitStatus;
    use crate::repository::InMemoryVisitRepository;
    use crate::travel::TravelTable;
    use chrono::NaiveTime;

    fn d() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 14).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn scheduler(visits: Vec<Visit>) -> VisitScheduler<InMemoryVisitRepository> {
        VisitScheduler::new(
            InMemoryVisitRepository::with_visits(visits),
            TravelEstimator::new(TravelTable::itajai_microregion()),
        )
    }

    fn unlimited(visits: Vec<Visit>) -> VisitScheduler<InMemoryVisitRepository> {
        let mut policy = SchedulingPolicy::default();
        policy.slots.max_suggestions = usize::MAX;
        VisitScheduler::with_policy(
            InMemoryVisitRepository::with_visits(visits),
            TravelEstimator::new(TravelTable::itajai_microregion()),
            policy,
        )
    }

    #[test]
    fn test_empty_day_all_slots_travel_free() {
        let s = unlimited(Vec::new());
        let slots = s.suggest_slots(&SlotRequest::new("Penha", d(), 90));
        assert_eq!(slots.len(), 15);
        for slot in &slots {
            assert!((slot.components.travel - 1.0).abs() < 1e-10);
            assert!(slot.travel_impact.legs.is_empty());
            assert_eq!(slot.duration_min(), 90);
            assert_eq!(slot.metadata.total_visits_in_day, 1);
        }
    }

    #[test]
    fn test_suggestions_are_sorted_and_stable() {
        let s = unlimited(Vec::new());
        let slots = s.suggest_slots(&SlotRequest::new("Penha", d(), 60));
        for pair in slots.windows(2) {
            assert!(pair[0].score >= pair[1].score);
            if (pair[0].score - pair[1].score).abs() < 1e-12 {
                assert!(pair[0].window.start_min < pair[1].window.start_min);
            }
        }
    }

    #[test]
    fn test_default_returns_top_five() {
        let s = scheduler(Vec::new());
        let slots = s.suggest_slots(&SlotRequest::new("Penha", d(), 90));
        assert_eq!(slots.len(), 5);
        assert_eq!(slots[0].kind, SuggestionKind::Ideal);
    }

    #[test]
    fn test_slots_keep_buffer_from_visits() {
        let visits = vec![
            Visit::new(1, "Itajaí", d(), t(9, 0), t(10, 30)),
            Visit::new(2, "Navegantes", d(), t(13, 0), t(14, 0)),
            Visit::new(3, "Penha", d(), t(15, 30), t(16, 0)),
        ];
        let busy: Vec<TimeWindow> = visits.iter().filter_map(Visit::window).collect();
        let s = unlimited(visits);
        let slots = s.suggest_slots(&SlotRequest::new("Penha", d(), 60));
        assert!(!slots.is_empty());
        for slot in &slots {
            let guarded = slot.window.buffered(30);
            assert!(busy.iter().all(|b| !guarded.overlaps(b)), "{}", slot.label());
        }
    }

    #[test]
    fn test_neighbouring_travel_is_reported() {
        let visits = vec![Visit::new(1, "Itajaí", d(), t(8, 30), t(9, 30))];
        let s = unlimited(visits);
        let slots = s.suggest_slots(&SlotRequest::new("Penha", d(), 60));
        let slot = slots
            .iter()
            .find(|s| s.window.start_min == 10 * 60)
            .unwrap();
        assert_eq!(slot.travel_impact.total_minutes, 20);
        assert!((slot.components.travel - 0.9).abs() < 1e-10);
        assert_eq!(slot.metadata.position_in_day, 2);
        assert_eq!(slot.metadata.total_visits_in_day, 2);
    }

    #[test]
    fn test_invalid_request_yields_empty() {
        let s = scheduler(Vec::new());
        assert!(s.suggest_slots(&SlotRequest::new("", d(), 90)).is_empty());
        assert!(s.suggest_slots(&SlotRequest::new("Penha", d(), 0)).is_empty());
    }

    #[test]
    fn test_repository_failure_yields_empty() {
        let repo = InMemoryVisitRepository::new();
        let s = VisitScheduler::new(repo.clone(), TravelEstimator::default());
        repo.set_available(false);

        assert!(s.suggest_slots(&SlotRequest::new("Penha", d(), 90)).is_empty());
        let report = s.detect_conflicts_for_day(d());
        assert!(report.conflicts.is_empty());
        assert_eq!(
            s.reoptimize_day(d(), None).status,
            OptimizationStatus::FreeDay
        );
        let c = VisitCandidate::starting_at("Penha", d(), t(7, 0), 60);
        assert!(s.detect_conflicts_for_visit(&c).is_empty());
    }

    struct FixedRepository(Vec<Visit>);

    impl VisitRepository for FixedRepository {
        fn fetch_visits_for_date(&self, _date: NaiveDate) -> ScheduleResult<Vec<Visit>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_duplicate_visit_ids_keep_first() {
        let s = VisitScheduler::new(
            FixedRepository(vec![
                Visit::new(1, "Penha", d(), t(9, 0), t(10, 0)),
                Visit::new(1, "Penha", d(), t(14, 0), t(15, 0)),
                Visit::new(2, "Navegantes", d(), t(11, 0), t(12, 0)),
            ]),
            TravelEstimator::new(TravelTable::itajai_microregion()),
        );
        let report = s.detect_conflicts_for_day(d());
        assert_eq!(report.total_visits, 2);
        assert!(report.conflicts.is_empty());
    }

    #[test]
    fn test_unplanned_visit_moves_with_default_duration() {
        let visit = Visit::new(3, "Penha", d(), t(9, 0), t(10, 0)).with_duration(0);
        let s = scheduler(Vec::new());
        assert_eq!(s.request_for(&visit).duration_minutes, 90);

        let mut policy = SchedulingPolicy::default();
        policy.conflict.default_visit_minutes = 45;
        let s = VisitScheduler::with_policy(
            InMemoryVisitRepository::new(),
            TravelEstimator::default(),
            policy,
        );
        assert_eq!(s.request_for(&visit).duration_minutes, 45);
        assert_eq!(SlotRequest::for_visit(&visit.with_duration(60), 45).duration_minutes, 60);
    }

    #[test]
    fn test_detect_conflicts_for_visit_uses_repository() {
        let s = scheduler(vec![Visit::new(1, "Penha", d(), t(9, 0), t(10, 0))]);
        let c = VisitCandidate::starting_at("Penha", d(), t(9, 30), 60);
        let conflicts = s.detect_conflicts_for_visit(&c);
        assert_eq!(conflicts[0].id, "overlap_new_1");
    }

    #[test]
    fn test_conflicts_resolved_by_moving() {
        let visits = vec![
            Visit::new(1, "Itajaí", d(), t(9, 0), t(10, 0)),
            Visit::new(2, "Penha", d(), t(10, 0), t(11, 0)),
        ];
        let s = unlimited(visits.clone());
        let request = s.request_for(&visits[1]);
        let slots = s.rank_slots(&request, &visits);
        assert!(!slots.is_empty());
        // 10:30 leaves 30 min after visit 1, short of 20 min travel plus buffer.
        for slot in &slots {
            if slot.window.start_min == 10 * 60 + 30 {
                assert!(slot.conflicts_resolved.is_empty());
            } else {
                assert_eq!(slot.conflicts_resolved, vec!["travel_1_2".to_string()]);
                assert!(slot.advantages.iter().any(|a| a.starts_with("Resolves")));
            }
        }
    }

    #[test]
    fn test_criterion_defaults_by_priority() {
        let request = SlotRequest::new("Penha", d(), 60).with_priority(Priority::P1);
        assert_eq!(request.effective_criterion(), Criterion::PriorityMode);
        let request = request.with_criterion(Criterion::TimeMinimum);
        assert_eq!(request.effective_criterion(), Criterion::TimeMinimum);
        assert_eq!(
            SlotRequest::new("Penha", d(), 60).effective_criterion(),
            Criterion::Balanced
        );
    }

    #[test]
    fn test_reoptimize_free_day() {
        let s = scheduler(vec![
            Visit::new(1, "Penha", d(), t(9, 0), t(10, 0)).with_status(VisitStatus::Completed)
        ]);
        let result = s.reoptimize_day(d(), None);
        assert_eq!(result.status, OptimizationStatus::FreeDay);
        assert!(result.suggestions.is_empty());
        assert!(result.analysis.is_none());
    }

    #[test]
    fn test_reoptimize_recommends_moving_bad_placement() {
        // Visit 2 overlaps lunch and leaves no time to travel from visit 1.
        let visits = vec![
            Visit::new(1, "Itajaí", d(), t(10, 30), t(11, 30)),
            Visit::new(2, "Penha", d(), t(11, 30), t(12, 30)),
        ];
        let s = scheduler(visits);
        let result = s.reoptimize_day(d(), Some(Criterion::Balanced));

        assert_eq!(result.suggestions.len(), 2);
        let second = &result.suggestions[1];
        assert_eq!(second.visit_id, 2);
        let best = second.best.as_ref().unwrap();
        assert!(best.score > second.current_score);
        assert!((second.score_delta - round3(best.score - second.current_score)).abs() < 1e-10);
        assert!(second.recommended);
        assert!(result.visits_to_move >= 1);
        assert!(!result.conflicts.is_empty());
        assert!(result.recommendations[0].starts_with("Resolve"));

        let mean = result
            .suggestions
            .iter()
            .filter_map(|s| s.best.as_ref().map(|b| b.score))
            .sum::<f64>()
            / 2.0;
        assert!((result.overall_score - round3(mean)).abs() < 1e-10);
    }

    #[test]
    fn test_parallel_calls() {
        let visits = vec![
            Visit::new(1, "Itajaí", d(), t(9, 0), t(10, 30)),
            Visit::new(2, "Penha", d(), t(10, 45), t(12, 0)),
        ];
        let s = scheduler(visits);
        let expected = serde_json::to_string(&s.detect_conflicts_for_day(d())).unwrap();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(|| {
                        let report = s.detect_conflicts_for_day(d());
                        let slots = s.suggest_slots(&SlotRequest::new("Ilhota", d(), 60));
                        (serde_json::to_string(&report).unwrap(), slots.len())
                    })
                })
                .collect();
            for h in handles {
                let (report, n) = h.join().unwrap();
                assert_eq!(report, expected);
                assert!(n <= 5);
            }
        });
    }
}
