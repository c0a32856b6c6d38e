//! Visit data access.
//!
//! The scheduling core reads visits through the [`VisitRepository`] trait
//! and never writes them back; applying a chosen slot is the caller's job.
//! [`InMemoryVisitRepository`] keeps visits in memory for tests and local
//! tooling.

use chrono::NaiveDate;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{ScheduleError, ScheduleResult};
use crate::models::Visit;

/// Source of scheduled visits.
pub trait VisitRepository: Send + Sync {
    /// Active visits (scheduled, in preparation, in progress) on `date`,
    /// ordered by start time.
    fn fetch_visits_for_date(&self, date: NaiveDate) -> ScheduleResult<Vec<Visit>>;
}

impl<R: VisitRepository + ?Sized> VisitRepository for Arc<R> {
    fn fetch_visits_for_date(&self, date: NaiveDate) -> ScheduleResult<Vec<Visit>> {
        (**self).fetch_visits_for_date(date)
    }
}

impl<R: VisitRepository + ?Sized> VisitRepository for &R {
    fn fetch_visits_for_date(&self, date: NaiveDate) -> ScheduleResult<Vec<Visit>> {
        (**self).fetch_visits_for_date(date)
    }
}

#[derive(Debug, Default)]
struct StoredVisits {
    by_date: BTreeMap<NaiveDate, Vec<Visit>>,
    unavailable: bool,
}

/// In-memory visit store.
///
/// Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVisitRepository {
    data: Arc<RwLock<StoredVisits>>,
}

impl InMemoryVisitRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository holding `visits`.
    pub fn with_visits(visits: impl IntoIterator<Item = Visit>) -> Self {
        let repo = Self::new();
        for visit in visits {
            repo.add(visit);
        }
        repo
    }

    /// Stores a visit, replacing any visit with the same id on that date.
    pub fn add(&self, visit: Visit) {
        let mut data = self.data.write();
        let day = data.by_date.entry(visit.date).or_default();
        day.retain(|v| v.id != visit.id);
        day.push(visit);
    }

    /// Number of stored visits, any status.
    pub fn len(&self) -> usize {
        self.data.read().by_date.values().map(Vec::len).sum()
    }

    /// Whether no visits are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Simulates an outage: every fetch fails while unavailable.
    pub fn set_available(&self, available: bool) {
        self.data.write().unavailable = !available;
    }
}

impl VisitRepository for InMemoryVisitRepository {
    fn fetch_visits_for_date(&self, date: NaiveDate) -> ScheduleResult<Vec<Visit>> {
        let data = self.data.read();
        if data.unavailable {
            return Err(ScheduleError::data_unavailable(format!(
                "visit store offline while fetching {date}"
            )));
        }

        let mut visits: Vec<Visit> = data
            .by_date
            .get(&date)
            .map(|day| day.iter().filter(|v| v.is_active()).cloned().collect())
            .unwrap_or_default();
        visits.sort_by_key(|v| (v.start_time, v.id));
        Ok(visits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VisitStatus;
    use chrono::NaiveTime;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_fetch_filters_and_orders() {
        let repo = InMemoryVisitRepository::with_visits(vec![
            Visit::new(2, "Penha", d(14), t(14, 0), t(15, 0)),
            Visit::new(1, "Itajaí", d(14), t(9, 0), t(10, 0)),
            Visit::new(3, "Ilhota", d(14), t(11, 0), t(12, 0)).with_status(VisitStatus::Cancelled),
            Visit::new(4, "Penha", d(15), t(9, 0), t(10, 0)),
        ]);

        let visits = repo.fetch_visits_for_date(d(14)).unwrap();
        let ids: Vec<u64> = visits.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(repo.len(), 4);
        assert!(repo.fetch_visits_for_date(d(16)).unwrap().is_empty());
    }

    #[test]
    fn test_add_replaces_same_id() {
        let repo = InMemoryVisitRepository::new();
        repo.add(Visit::new(1, "Penha", d(14), t(9, 0), t(10, 0)));
        repo.add(Visit::new(1, "Penha", d(14), t(11, 0), t(12, 0)));
        let visits = repo.fetch_visits_for_date(d(14)).unwrap();
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].start_time, t(11, 0));
    }

    #[test]
    fn test_unavailable() {
        let repo = InMemoryVisitRepository::new();
        let shared = Arc::new(repo.clone());
        repo.set_available(false);
        let err = shared.fetch_visits_for_date(d(14)).unwrap_err();
        assert!(err.is_retryable());
        repo.set_available(true);
        assert!(shared.fetch_visits_for_date(d(14)).is_ok());
    }
}
