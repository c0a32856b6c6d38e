//! Candidate slot enumeration.
//!
//! # Algorithm
//!
//! Walk start times from the working-window start in fixed steps. A start
//! `s` yields the slot `[s, s + d)` when:
//! 1. the slot ends within the working window and by the hard outer bound;
//! 2. `[s − buffer, s + d + buffer)` overlaps no active visit of the day.
//!
//! Pure function of its inputs.

use chrono::NaiveDate;

use crate::conflict::usable_visits;
use crate::models::{TimeWindow, Visit, VisitId};
use crate::policy::SlotPolicy;

/// Enumerates free time windows on a day.
#[derive(Debug, Clone, Default)]
pub struct SlotGenerator {
    policy: SlotPolicy,
}

impl SlotGenerator {
    /// Creates a generator.
    pub fn new(policy: SlotPolicy) -> Self {
        Self { policy }
    }

    /// Enumeration bounds in use.
    pub fn policy(&self) -> &SlotPolicy {
        &self.policy
    }

    /// Free windows of `duration_minutes` on `date`, earliest first.
    pub fn generate(&self, date: NaiveDate, duration_minutes: u32, same_day: &[Visit]) -> Vec<TimeWindow> {
        self.generate_excluding(date, duration_minutes, same_day, None)
    }

    /// Like [`generate`](Self::generate), ignoring the visit being moved.
    pub fn generate_excluding(
        &self,
        date: NaiveDate,
        duration_minutes: u32,
        same_day: &[Visit],
        exclude: Option<VisitId>,
    ) -> Vec<TimeWindow> {
        let duration = i64::from(duration_minutes);
        if duration <= 0 || self.policy.step_minutes <= 0 {
            return Vec::new();
        }

        let busy: Vec<TimeWindow> = usable_visits(same_day, date)
            .filter(|(v, _)| Some(v.id) != exclude)
            .map(|(_, w)| w)
            .collect();

        let working = self.policy.working_window();
        let latest_end = working.end_min.min(self.policy.hard_end_min());

        let mut slots = Vec::new();
        let mut start = working.start_min;
        while start + duration <= latest_end {
            let slot = TimeWindow::starting_at(start, duration);
            let guarded = slot.buffered(self.policy.buffer_minutes);
            match busy.iter().find(|b| guarded.overlaps(b)) {
                Some(blocking) => log::debug!(
                    "Slot {} rejected: too close to {}",
                    slot.label(),
                    blocking.label()
                ),
                None => slots.push(slot),
            }
            start += self.policy.step_minutes;
        }
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn d() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 14).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_empty_day_slot_count() {
        let slots = SlotGenerator::default().generate(d(), 90, &[]);
        // floor((17:00 − 08:30 − 90) / 30) + 1
        assert_eq!(slots.len(), 15);
        assert_eq!(slots[0], TimeWindow::new(510, 600));
        assert_eq!(slots.last().copied(), Some(TimeWindow::new(930, 1020)));
        assert!(slots.iter().all(|s| s.duration_min() == 90));
    }

    #[test]
    fn test_buffer_excludes_neighbourhood() {
        let visits = vec![Visit::new(1, "Penha", d(), t(10, 0), t(11, 0))];
        let slots = SlotGenerator::default().generate(d(), 60, &visits);
        let busy = TimeWindow::new(600, 660);
        for s in &slots {
            assert!(!s.buffered(30).overlaps(&busy), "{}", s.label());
        }
        // 08:30-09:30 touches 09:30 and is allowed; 11:30 is the first start after.
        assert!(slots.contains(&TimeWindow::new(510, 570)));
        assert!(!slots.contains(&TimeWindow::new(540, 600)));
        assert!(slots.contains(&TimeWindow::new(690, 750)));
    }

    #[test]
    fn test_excluding_moved_visit() {
        let visits = vec![Visit::new(1, "Penha", d(), t(9, 0), t(16, 0))];
        let generator = SlotGenerator::default();
        assert!(generator.generate(d(), 60, &visits).is_empty());
        assert_eq!(
            generator.generate_excluding(d(), 60, &visits, Some(1)).len(),
            16
        );
    }

    #[test]
    fn test_inactive_and_other_day_visits_ignored() {
        let other_day = NaiveDate::from_ymd_opt(2024, 10, 15).unwrap();
        let visits = vec![
            Visit::new(1, "Penha", other_day, t(9, 0), t(16, 0)),
            Visit::new(2, "Penha", d(), t(9, 0), t(16, 0))
                .with_status(crate::models::VisitStatus::Completed),
        ];
        assert_eq!(SlotGenerator::default().generate(d(), 90, &visits).len(), 15);
    }

    #[test]
    fn test_hard_end_bounds_slots() {
        let policy = SlotPolicy {
            window_end: t(20, 0),
            ..SlotPolicy::default()
        };
        let slots = SlotGenerator::new(policy).generate(d(), 60, &[]);
        assert_eq!(slots.last().map(|s| s.end_min), Some(18 * 60));
    }

    #[test]
    fn test_too_long_or_zero_duration() {
        let generator = SlotGenerator::default();
        assert!(generator.generate(d(), 0, &[]).is_empty());
        assert!(generator.generate(d(), 600, &[]).is_empty());
    }
}
