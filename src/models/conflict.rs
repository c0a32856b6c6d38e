//! Scheduling conflict model.
//!
//! A conflict is a detected problem between two or more visits, or
//! between a visit and a global constraint (daily capacity, business
//! hours). Conflicts are recomputed on every detection call and never
//! persisted.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{LocationId, VisitId};

/// Classification of scheduling conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictType {
    /// Two visits occupy overlapping time windows.
    Overlap,
    /// Not enough time to travel between consecutive visits.
    TravelInfeasible,
    /// More visits on the day than the configured maximum.
    CapacityExceeded,
    /// Visit outside opening hours or across the lunch break.
    BusinessHoursViolation,
}

impl ConflictType {
    /// Kebab-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictType::Overlap => "overlap",
            ConflictType::TravelInfeasible => "travel-infeasible",
            ConflictType::CapacityExceeded => "capacity-exceeded",
            ConflictType::BusinessHoursViolation => "business-hours-violation",
        }
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How blocking a conflict is.
///
/// Totally ordered: `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Warning only.
    Low,
    /// Feasible but not recommended.
    Medium,
    /// Very hard to carry out, needs reorganizing.
    High,
    /// Impossible as scheduled.
    Critical,
}

impl Severity {
    /// Whether the conflict warrants a reschedule proposal.
    pub fn is_blocking(&self) -> bool {
        *self >= Severity::High
    }
}

/// Structured facts behind a conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ConflictDetails {
    /// Overlapping windows.
    Overlap {
        /// Location of the principal visit.
        location: LocationId,
        /// Location of the other visit.
        other_location: LocationId,
        /// `HH:MM - HH:MM` of the principal visit.
        window: String,
        /// `HH:MM - HH:MM` of the other visit.
        other_window: String,
        /// Estimated travel between the two locations.
        travel_minutes: u32,
    },
    /// Insufficient gap between consecutive visits.
    Travel {
        /// Location of the earlier visit.
        origin: LocationId,
        /// Location of the later visit.
        destination: LocationId,
        /// Gap between the two visits.
        available_minutes: i64,
        /// Travel estimate plus buffer.
        required_minutes: i64,
        /// `required - available`.
        deficit_minutes: i64,
    },
    /// Too many visits on the day.
    Capacity {
        /// Visits counted, including a candidate being added.
        total_visits: usize,
        /// Configured maximum.
        maximum: usize,
        /// `total - maximum`.
        excess: usize,
    },
    /// Visit outside the global business hours.
    BusinessHours {
        /// Offending visit window.
        window: String,
        /// Recommended bound or lunch break.
        recommended: String,
    },
}

/// A detected scheduling conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    /// Stable textual identifier, e.g. `travel_3_4`.
    pub id: String,
    /// Conflict classification.
    pub conflict_type: ConflictType,
    /// Severity.
    pub severity: Severity,
    /// The visit the conflict is reported against (`None` for a new booking).
    pub principal_visit: Option<VisitId>,
    /// Other visits involved.
    pub conflicting_visits: Vec<VisitId>,
    /// Human-readable description.
    pub description: String,
    /// Suggested resolutions for this type of conflict.
    pub suggested_resolutions: Vec<String>,
    /// Qualitative impact estimate.
    pub estimated_impact: String,
    /// Structured details.
    pub details: ConflictDetails,
}

impl Conflict {
    /// Every visit referenced by this conflict, principal first, without duplicates.
    pub fn involved_visits(&self) -> Vec<VisitId> {
        let mut ids: Vec<VisitId> = self.principal_visit.into_iter().collect();
        for &id in &self.conflicting_visits {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    /// Whether a visit is referenced by this conflict.
    pub fn involves(&self, visit_id: VisitId) -> bool {
        self.principal_visit == Some(visit_id) || self.conflicting_visits.contains(&visit_id)
    }

    /// Key identifying "the same problem" across placements of a visit:
    /// the conflict type plus the other visits involved.
    pub fn signature(&self) -> (ConflictType, Vec<VisitId>) {
        let mut others = self.conflicting_visits.clone();
        others.sort_unstable();
        (self.conflict_type, others)
    }
}

/// Sorts conflicts most severe first, keeping detection order among equals.
pub fn sort_by_severity(conflicts: &mut [Conflict]) {
    conflicts.sort_by(|a, b| b.severity.cmp(&a.severity));
}

/// Highest severity in a list of conflicts.
pub fn max_severity(conflicts: &[Conflict]) -> Option<Severity> {
    conflicts.iter().map(|c| c.severity).max()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conflict(id: &str, severity: Severity, principal: Option<VisitId>) -> Conflict {
        Conflict {
            id: id.to_string(),
            conflict_type: ConflictType::Overlap,
            severity,
            principal_visit: principal,
            conflicting_visits: vec![2, 1],
            description: String::new(),
            suggested_resolutions: Vec::new(),
            estimated_impact: String::new(),
            details: ConflictDetails::Capacity {
                total_visits: 7,
                maximum: 6,
                excess: 1,
            },
        }
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert!(Severity::High.is_blocking());
        assert!(!Severity::Medium.is_blocking());
    }

    #[test]
    fn test_sort_by_severity_is_stable() {
        let mut cs = vec![
            conflict("a", Severity::Low, None),
            conflict("b", Severity::Critical, None),
            conflict("c", Severity::Low, None),
            conflict("d", Severity::High, None),
        ];
        sort_by_severity(&mut cs);
        let ids: Vec<&str> = cs.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
        assert_eq!(max_severity(&cs), Some(Severity::Critical));
        assert_eq!(max_severity(&[]), None);
    }

    #[test]
    fn test_involved_visits() {
        let c = conflict("x", Severity::High, Some(1));
        assert_eq!(c.involved_visits(), vec![1, 2]);
        assert!(c.involves(2));
        assert!(!c.involves(3));
        assert_eq!(c.signature(), (ConflictType::Overlap, vec![1, 2]));
    }

    #[test]
    fn test_serialized_names() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
        let json = serde_json::to_string(&ConflictType::TravelInfeasible).unwrap();
        assert_eq!(json, "\"travel-infeasible\"");
    }
}
