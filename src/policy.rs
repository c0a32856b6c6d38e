//! Scheduling policy: every tunable threshold and weight.
//!
//! The detector, generator and scorer take their numbers from a
//! [`SchedulingPolicy`] instead of hardcoding them, so thresholds can be
//! tuned and tested independently of the algorithms. Defaults reproduce
//! the field team's working rules; a TOML file may override any subset.
//!
//! ```toml
//! [conflict]
//! max_visits_per_day = 5
//!
//! [slots]
//! step_minutes = 15
//!
//! [scoring.weights.balanced]
//! ideal_hour = 0.3
//! travel = 0.3
//! productivity = 0.2
//! conflict_free = 0.1
//! business_hours = 0.1
//! ```

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{ScheduleError, ScheduleResult};
use crate::models::{minutes_of, Priority, ScoreComponents, TimeWindow};

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

// ================================
// Criteria and weights
// ================================

/// Named weight-vector preset controlling which score component dominates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Criterion {
    /// Travel-dominant.
    TimeMinimum,
    /// Lunch avoidance and preferred hour dominant.
    ProductivityMaximum,
    /// Travel and conflict-freeness dominant.
    LeastTravel,
    /// Roughly equal weights.
    #[default]
    Balanced,
    /// Business-hours fit and conflict-freeness dominant, for P1 informants.
    PriorityMode,
}

impl Criterion {
    /// All criteria, in declaration order.
    pub const ALL: [Criterion; 5] = [
        Criterion::TimeMinimum,
        Criterion::ProductivityMaximum,
        Criterion::LeastTravel,
        Criterion::Balanced,
        Criterion::PriorityMode,
    ];

    /// Kebab-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::TimeMinimum => "time-minimum",
            Criterion::ProductivityMaximum => "productivity-maximum",
            Criterion::LeastTravel => "least-travel",
            Criterion::Balanced => "balanced",
            Criterion::PriorityMode => "priority-mode",
        }
    }

    /// Criterion to use when the caller did not pick one.
    ///
    /// P1 visits rank by priority mode; everything else is balanced.
    pub fn effective(requested: Option<Criterion>, priority: Priority) -> Criterion {
        match requested {
            Some(criterion) => criterion,
            None if priority.is_high() => Criterion::PriorityMode,
            None => Criterion::Balanced,
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Criterion {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Criterion::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| ScheduleError::input(format!("unknown criterion '{s}'")))
    }
}

/// Weights of the five score components. A valid preset sums to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriterionWeights {
    /// Weight of the ideal-hour fit.
    pub ideal_hour: f64,
    /// Weight of the travel impact.
    pub travel: f64,
    /// Weight of lunch avoidance.
    pub productivity: f64,
    /// Weight of conflict-freeness.
    pub conflict_free: f64,
    /// Weight of the business-hours fit.
    pub business_hours: f64,
}

impl CriterionWeights {
    /// Creates a weight vector in component order.
    pub const fn new(
        ideal_hour: f64,
        travel: f64,
        productivity: f64,
        conflict_free: f64,
        business_hours: f64,
    ) -> Self {
        Self {
            ideal_hour,
            travel,
            productivity,
            conflict_free,
            business_hours,
        }
    }

    /// Weights in component order.
    pub fn as_array(&self) -> [f64; 5] {
        [
            self.ideal_hour,
            self.travel,
            self.productivity,
            self.conflict_free,
            self.business_hours,
        ]
    }

    /// Sum of the weights.
    pub fn sum(&self) -> f64 {
        self.as_array().iter().sum()
    }

    /// Weighted sum of component scores.
    pub fn combine(&self, components: &ScoreComponents) -> f64 {
        self.as_array()
            .iter()
            .zip(components.as_array())
            .map(|(w, c)| w * c)
            .sum()
    }
}

/// One weight vector per [`Criterion`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct WeightPresets {
    /// Travel-dominant preset.
    pub time_minimum: CriterionWeights,
    /// Lunch/best-hour dominant preset.
    pub productivity_maximum: CriterionWeights,
    /// Travel and conflict dominant preset.
    pub least_travel: CriterionWeights,
    /// Near-equal preset.
    pub balanced: CriterionWeights,
    /// Business-hours and conflict dominant preset.
    pub priority_mode: CriterionWeights,
}

impl Default for WeightPresets {
    fn default() -> Self {
        Self {
            time_minimum: CriterionWeights::new(0.2, 0.5, 0.1, 0.1, 0.1),
            productivity_maximum: CriterionWeights::new(0.3, 0.0, 0.4, 0.1, 0.2),
            least_travel: CriterionWeights::new(0.1, 0.6, 0.1, 0.2, 0.0),
            balanced: CriterionWeights::new(0.25, 0.25, 0.2, 0.2, 0.1),
            priority_mode: CriterionWeights::new(0.3, 0.05, 0.1, 0.25, 0.3),
        }
    }
}

impl WeightPresets {
    /// Weights for a criterion.
    pub fn get(&self, criterion: Criterion) -> &CriterionWeights {
        match criterion {
            Criterion::TimeMinimum => &self.time_minimum,
            Criterion::ProductivityMaximum => &self.productivity_maximum,
            Criterion::LeastTravel => &self.least_travel,
            Criterion::Balanced => &self.balanced,
            Criterion::PriorityMode => &self.priority_mode,
        }
    }
}

// ================================
// Policy sections
// ================================

/// Thresholds for conflict detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictPolicy {
    /// Recommended maximum visits per day.
    pub max_visits_per_day: usize,
    /// Excess over the maximum at which capacity becomes HIGH.
    pub capacity_high_excess: usize,
    /// Minutes added on top of estimated travel.
    pub travel_buffer_minutes: i64,
    /// Travel above this makes an overlap between locations CRITICAL.
    pub impossible_travel_minutes: u32,
    /// Global opening bound.
    pub opening: NaiveTime,
    /// Global closing bound.
    pub closing: NaiveTime,
    /// Global lunch start.
    pub lunch_start: NaiveTime,
    /// Global lunch end.
    pub lunch_end: NaiveTime,
    /// Duration assumed for visits without a planned duration.
    pub default_visit_minutes: u32,
}

impl Default for ConflictPolicy {
    fn default() -> Self {
        Self {
            max_visits_per_day: 6,
            capacity_high_excess: 2,
            travel_buffer_minutes: 15,
            impossible_travel_minutes: 60,
            opening: hm(8, 0),
            closing: hm(17, 0),
            lunch_start: hm(12, 0),
            lunch_end: hm(13, 0),
            default_visit_minutes: 90,
        }
    }
}

impl ConflictPolicy {
    /// Global lunch window.
    pub fn lunch(&self) -> TimeWindow {
        TimeWindow::from_times(self.lunch_start, self.lunch_end)
    }

    /// Global opening-to-closing window.
    pub fn business_hours(&self) -> TimeWindow {
        TimeWindow::from_times(self.opening, self.closing)
    }
}

/// Bounds for candidate slot enumeration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotPolicy {
    /// First candidate start.
    pub window_start: NaiveTime,
    /// Every candidate must end by this time.
    pub window_end: NaiveTime,
    /// Absolute latest end.
    ///
    /// Only binds when `window_end` is later than it; with the defaults
    /// (17:00 window end, 18:00 hard end) the working window decides.
    pub hard_end: NaiveTime,
    /// Increment between candidate starts.
    pub step_minutes: i64,
    /// Clearance kept around existing visits.
    pub buffer_minutes: i64,
    /// Number of ranked slots returned.
    pub max_suggestions: usize,
}

impl Default for SlotPolicy {
    fn default() -> Self {
        Self {
            window_start: hm(8, 30),
            window_end: hm(17, 0),
            hard_end: hm(18, 0),
            step_minutes: 30,
            buffer_minutes: 30,
            max_suggestions: 5,
        }
    }
}

impl SlotPolicy {
    /// Working window for enumeration.
    pub fn working_window(&self) -> TimeWindow {
        TimeWindow::from_times(self.window_start, self.window_end)
    }

    /// Hard outer bound in minutes.
    pub fn hard_end_min(&self) -> i64 {
        minutes_of(self.hard_end)
    }
}

/// Weights and constants of the slot scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    /// Weight presets per criterion.
    pub weights: WeightPresets,
    /// Distance from the best hour still counted as ideal.
    pub best_hour_tolerance_minutes: i64,
    /// Score lost per conflict at the placement.
    pub conflict_penalty: f64,
    /// Lowest conflict-freeness score.
    pub conflict_floor: f64,
    /// Gain over the current placement needed to recommend a move.
    pub recommend_min_gain: f64,
    /// Absolute score needed to recommend a move.
    pub recommend_min_score: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            weights: WeightPresets::default(),
            best_hour_tolerance_minutes: 60,
            conflict_penalty: 0.2,
            conflict_floor: 0.1,
            recommend_min_gain: 0.1,
            recommend_min_score: 0.7,
        }
    }
}

/// Cutoffs of the day-status classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DayStatusPolicy {
    /// More HIGH conflicts than this makes the day problematic.
    pub problematic_high_conflicts: usize,
    /// More conflicts than this makes the day need review.
    pub needs_review_conflicts: usize,
    /// Productivity ratio required for an optimal day.
    pub optimal_productivity: f64,
    /// Productivity ratio below which the day needs review.
    pub review_productivity: f64,
    /// Productivity ratio below which the day is problematic.
    pub problematic_productivity: f64,
    /// Days with fewer visits get an "add more visits" hint.
    pub few_visits: usize,
    /// Days with more distinct locations get a routing hint.
    pub max_locations: usize,
    /// Visits starting earlier get an availability hint.
    pub early_start: NaiveTime,
    /// Visits ending later get an availability hint.
    pub late_end: NaiveTime,
}

impl Default for DayStatusPolicy {
    fn default() -> Self {
        Self {
            problematic_high_conflicts: 2,
            needs_review_conflicts: 3,
            optimal_productivity: 0.8,
            review_productivity: 0.6,
            problematic_productivity: 0.4,
            few_visits: 3,
            max_locations: 4,
            early_start: hm(8, 30),
            late_end: hm(16, 30),
        }
    }
}

/// Limits for reschedule proposals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReschedulePolicy {
    /// Calendar days searched for alternative dates.
    pub horizon_days: u32,
    /// Alternative dates returned per conflict.
    pub max_alternative_dates: usize,
    /// Days with this many visits or more are not proposed.
    pub max_day_occupancy: usize,
    /// Days below this occupancy are rated as good availability.
    pub good_occupancy: usize,
    /// Same-day alternatives returned per conflict.
    pub same_day_alternatives: usize,
}

impl Default for ReschedulePolicy {
    fn default() -> Self {
        Self {
            horizon_days: 14,
            max_alternative_dates: 5,
            max_day_occupancy: 5,
            good_occupancy: 3,
            same_day_alternatives: 3,
        }
    }
}

// ================================
// Policy root
// ================================

/// All scheduling thresholds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingPolicy {
    /// Conflict detection thresholds.
    pub conflict: ConflictPolicy,
    /// Slot enumeration bounds.
    pub slots: SlotPolicy,
    /// Scorer weights and constants.
    pub scoring: ScoringPolicy,
    /// Day classification cutoffs.
    pub day_status: DayStatusPolicy,
    /// Reschedule limits.
    pub reschedule: ReschedulePolicy,
}

impl SchedulingPolicy {
    /// Parses and validates a policy from TOML. Missing keys keep defaults.
    pub fn from_toml_str(content: &str) -> ScheduleResult<Self> {
        let policy: SchedulingPolicy = toml::from_str(content)
            .map_err(|e| ScheduleError::policy(format!("Failed to parse policy: {e}")))?;
        policy.validate()?;
        Ok(policy)
    }

    /// Loads and validates a policy from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ScheduleResult<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ScheduleError::policy(format!("Failed to read policy file: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Checks internal consistency.
    ///
    /// Every weight preset must be non-negative and sum to 1.0, windows must
    /// be non-empty, and the slot step must be positive.
    pub fn validate(&self) -> ScheduleResult<()> {
        let mut problems = Vec::new();

        for criterion in Criterion::ALL {
            let weights = self.scoring.weights.get(criterion);
            if weights.as_array().iter().any(|w| *w < 0.0) {
                problems.push(format!("{criterion} has a negative weight"));
            }
            if (weights.sum() - 1.0).abs() > 1e-6 {
                problems.push(format!(
                    "{criterion} weights sum to {:.3}, expected 1.0",
                    weights.sum()
                ));
            }
        }

        if !self.conflict.business_hours().is_valid() {
            problems.push("conflict.opening must be before conflict.closing".to_string());
        }
        if !self.conflict.lunch().is_valid() {
            problems.push("conflict.lunch_start must be before conflict.lunch_end".to_string());
        }
        if !self.slots.working_window().is_valid() {
            problems.push("slots.window_start must be before slots.window_end".to_string());
        }
        if self.slots.step_minutes <= 0 {
            problems.push("slots.step_minutes must be positive".to_string());
        }
        if self.slots.buffer_minutes < 0 || self.conflict.travel_buffer_minutes < 0 {
            problems.push("buffers must not be negative".to_string());
        }
        if !(0.0..=1.0).contains(&self.scoring.conflict_floor) {
            problems.push("scoring.conflict_floor must lie in [0, 1]".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ScheduleError::policy(problems.join("; ")))
        }
    }
}
