//! Multi-criteria slot scoring.
//!
//! Scores a placement on five independent components and combines them
//! with the weight vector of the selected [`Criterion`].
//!
//! # Components
//!
//! | Component | Scores |
//! |-----------|--------|
//! | Ideal hour | 0.9 near the best hour, 0.7 within opening hours, else 0.3 |
//! | Travel | step function of adjacent travel minutes |
//! | Productivity | 0.8 clear of lunch, else 0.4 |
//! | Conflict-free | 1.0 − penalty per conflict, floored |
//! | Business hours | 0.8, or 0.3 inside an avoided hour |
//!
//! The final score is the weighted sum, clamped to `[0, 1]` and rounded to
//! three decimals.
//!
//! # Reference
//! Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

use crate::conflict::{usable_visits, ConflictDetector};
use crate::models::{Conflict, ScoreComponents, TravelImpact, TravelLeg, Visit, VisitCandidate};
use crate::policy::{Criterion, ScoringPolicy};

/// Maps adjacent travel minutes to a score.
pub fn travel_score(total_minutes: u32) -> f64 {
    match total_minutes {
        0 => 1.0,
        1..=30 => 0.9,
        31..=60 => 0.7,
        61..=120 => 0.5,
        _ => 0.2,
    }
}

/// Score of one placement with its explanation.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotScore {
    /// Weighted total in `[0, 1]`, three decimals.
    pub total: f64,
    /// Component scores.
    pub components: ScoreComponents,
    /// Why the placement scores as it does.
    pub reasons: Vec<String>,
    /// Advantages.
    pub advantages: Vec<String>,
    /// Caveats.
    pub caveats: Vec<String>,
    /// Travel legs to the neighbouring visits.
    pub travel_impact: TravelImpact,
    /// Conflicts found at the placement.
    pub conflicts: Vec<Conflict>,
}

/// Scores placements of a visit.
#[derive(Debug, Clone, Default)]
pub struct SlotScorer {
    detector: ConflictDetector,
    policy: ScoringPolicy,
}

impl SlotScorer {
    /// Creates a scorer using `detector` for conflict-freeness and travel.
    pub fn new(detector: ConflictDetector, policy: ScoringPolicy) -> Self {
        Self { detector, policy }
    }

    /// Scoring policy in use.
    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Detector used for conflict-freeness.
    pub fn detector(&self) -> &ConflictDetector {
        &self.detector
    }

    /// Scores `candidate` against the other visits of its day.
    pub fn score(
        &self,
        candidate: &VisitCandidate,
        same_day: &[Visit],
        criterion: Criterion,
    ) -> SlotScore {
        let mut reasons = Vec::new();
        let mut advantages = Vec::new();
        let mut caveats = Vec::new();

        let profile = candidate.entity_type.profile();
        let start = candidate.window.start_min;

        // 1. Ideal hour
        let ideal_hour =
            if profile.is_near_best_hour(start, self.policy.best_hour_tolerance_minutes) {
                reasons.push(format!("Ideal hour for {}", candidate.entity_type));
                advantages.push("Best moment to meet the informant".to_string());
                0.9
            } else if profile.is_within_opening(start) {
                reasons.push(format!("Within opening hours {}", profile.opening_label()));
                0.7
            } else {
                caveats.push(format!("Outside opening hours {}", profile.opening_label()));
                0.3
            };

        // 2. Travel
        let travel_impact = self.travel_impact(candidate, same_day);
        let travel = travel_score(travel_impact.total_minutes);
        if travel_impact.legs.is_empty() {
            reasons.push("No neighbouring visits on the day".to_string());
        }
        if travel_impact.total_minutes < 30 {
            advantages.push("Little travel time".to_string());
        } else if travel_impact.total_minutes > 90 {
            caveats.push(format!(
                "Significant travel time ({} min)",
                travel_impact.total_minutes
            ));
        }

        // 3. Productivity
        let productivity = if candidate.window.overlaps(&profile.lunch) {
            caveats.push(format!("Overlaps the lunch break {}", profile.lunch.label()));
            0.4
        } else {
            advantages.push("Does not interfere with lunch".to_string());
            0.8
        };

        // 4. Conflict-freeness
        let conflicts = self.detector.detect_for_visit(candidate, same_day);
        let conflict_free = if conflicts.is_empty() {
            advantages.push("No conflicts detected".to_string());
            1.0
        } else {
            for c in &conflicts {
                caveats.push(format!("Conflict: {}", c.description));
            }
            (1.0 - self.policy.conflict_penalty * conflicts.len() as f64)
                .max(self.policy.conflict_floor)
        };

        // 5. Business hours
        let business_hours = if profile.is_avoided_start(start) {
            caveats.push(format!("Hour not recommended for {}", candidate.entity_type));
            0.3
        } else {
            0.8
        };

        let components = ScoreComponents {
            ideal_hour,
            travel,
            productivity,
            conflict_free,
            business_hours,
        };
        let weighted = self.policy.weights.get(criterion).combine(&components);
        let total = (weighted.clamp(0.0, 1.0) * 1000.0).round() / 1000.0;

        SlotScore {
            total,
            components,
            reasons,
            advantages,
            caveats,
            travel_impact,
            conflicts,
        }
    }

    /// Travel from the preceding visit and to the following visit.
    pub fn travel_impact(&self, candidate: &VisitCandidate, same_day: &[Visit]) -> TravelImpact {
        let window = candidate.window;
        let others: Vec<_> = usable_visits(same_day, candidate.date)
            .filter(|(v, _)| Some(v.id) != candidate.id)
            .collect();

        let previous = others
            .iter()
            .filter(|(_, w)| w.end_min <= window.start_min)
            .max_by_key(|(_, w)| w.end_min);
        let next = others
            .iter()
            .filter(|(_, w)| w.start_min >= window.end_min)
            .min_by_key(|(_, w)| w.start_min);

        let table = self.detector.travel().snapshot();
        let mut legs = Vec::new();
        if let Some((v, _)) = previous {
            legs.push(TravelLeg {
                from: v.location.clone(),
                to: candidate.location.clone(),
                minutes: table.estimate(&v.location, &candidate.location),
            });
        }
        if let Some((v, _)) = next {
            legs.push(TravelLeg {
                from: candidate.location.clone(),
                to: v.location.clone(),
                minutes: table.estimate(&candidate.location, &v.location),
            });
        }

        TravelImpact {
            total_minutes: legs.iter().map(|l| l.minutes).sum(),
            legs,
        }
    }
}
