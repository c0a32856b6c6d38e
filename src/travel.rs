//! Travel-time estimation between locations.
//!
//! A [`TravelTable`] maps `(origin, destination)` to estimated minutes.
//! Lookups are total: same-location pairs return a small constant, known
//! pairs return their stored value (trying both orderings), and unknown
//! pairs return a default. No network I/O is involved.
//!
//! [`TravelEstimator`] shares one table between concurrent callers. Readers
//! take a snapshot (`Arc<TravelTable>`) and never block each other; a
//! refresh builds a complete new table and swaps it in.
//!
//! # Reference
//! Allahverdi et al. (2008), "A survey of scheduling problems with
//! setup times or costs" (travel as sequence-dependent setup)

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::{ScheduleError, ScheduleResult};
use crate::models::LocationId;

/// Default minutes for a trip within the same location.
pub const DEFAULT_SAME_LOCATION_MINUTES: u32 = 5;
/// Default minutes for a pair with no stored estimate.
pub const DEFAULT_UNKNOWN_PAIR_MINUTES: u32 = 45;

/// One stored route, as written in configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Origin location.
    pub from: LocationId,
    /// Destination location.
    pub to: LocationId,
    /// Estimated minutes.
    pub minutes: u32,
}

/// File representation of a travel table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelTableFile {
    /// Minutes for same-location trips.
    #[serde(default = "default_same_location")]
    pub same_location_minutes: u32,
    /// Minutes for unknown pairs.
    #[serde(default = "default_unknown_pair")]
    pub default_minutes: u32,
    /// Stored routes.
    #[serde(default)]
    pub routes: Vec<Route>,
}

fn default_same_location() -> u32 {
    DEFAULT_SAME_LOCATION_MINUTES
}

fn default_unknown_pair() -> u32 {
    DEFAULT_UNKNOWN_PAIR_MINUTES
}

/// Immutable origin/destination travel-time table.
#[derive(Debug, Clone, PartialEq)]
pub struct TravelTable {
    routes: HashMap<(LocationId, LocationId), u32>,
    /// Minutes returned when origin equals destination.
    pub same_location_minutes: u32,
    /// Minutes returned for unknown pairs.
    pub default_minutes: u32,
}

impl From<TravelTableFile> for TravelTable {
    fn from(file: TravelTableFile) -> Self {
        let mut table = TravelTable::new()
            .with_same_location(file.same_location_minutes)
            .with_default(file.default_minutes);
        for route in file.routes {
            table.set_route(route.from, route.to, route.minutes);
        }
        table
    }
}

impl From<TravelTable> for TravelTableFile {
    fn from(table: TravelTable) -> Self {
        Self {
            same_location_minutes: table.same_location_minutes,
            default_minutes: table.default_minutes,
            routes: table.routes(),
        }
    }
}

impl Default for TravelTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TravelTable {
    /// Creates an empty table with the default fallbacks.
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            same_location_minutes: DEFAULT_SAME_LOCATION_MINUTES,
            default_minutes: DEFAULT_UNKNOWN_PAIR_MINUTES,
        }
    }

    /// Table for the coastal microregion around Itajaí (SC).
    pub fn itajai_microregion() -> Self {
        const ROUTES: &[(&str, &str, u32)] = &[
            ("Itajaí", "Navegantes", 15),
            ("Itajaí", "Balneário Camboriú", 25),
            ("Itajaí", "Camboriú", 30),
            ("Itajaí", "Penha", 20),
            ("Itajaí", "Piçarras", 25),
            ("Itajaí", "Bombinhas", 45),
            ("Itajaí", "Porto Belo", 35),
            ("Itajaí", "Itapema", 35),
            ("Itajaí", "Luiz Alves", 40),
            ("Itajaí", "Ilhota", 35),
            ("Navegantes", "Balneário Camboriú", 30),
            ("Navegantes", "Penha", 10),
            ("Navegantes", "Piçarras", 15),
            ("Penha", "Piçarras", 10),
            ("Balneário Camboriú", "Camboriú", 15),
            ("Balneário Camboriú", "Itapema", 20),
            ("Itapema", "Porto Belo", 15),
            ("Porto Belo", "Bombinhas", 20),
            ("Camboriú", "Luiz Alves", 25),
            ("Ilhota", "Luiz Alves", 20),
        ];

        ROUTES
            .iter()
            .fold(Self::new(), |table, &(from, to, minutes)| {
                table.with_route(from, to, minutes)
            })
    }

    /// Sets the same-location time.
    pub fn with_same_location(mut self, minutes: u32) -> Self {
        self.same_location_minutes = minutes;
        self
    }

    /// Sets the unknown-pair time.
    pub fn with_default(mut self, minutes: u32) -> Self {
        self.default_minutes = minutes;
        self
    }

    /// Builder: defines a route and returns self.
    pub fn with_route(
        mut self,
        from: impl Into<LocationId>,
        to: impl Into<LocationId>,
        minutes: u32,
    ) -> Self {
        self.set_route(from, to, minutes);
        self
    }

    /// Defines the travel time from one location to another.
    pub fn set_route(&mut self, from: impl Into<LocationId>, to: impl Into<LocationId>, minutes: u32) {
        self.routes.insert((from.into(), to.into()), minutes);
    }

    /// Stored estimate for a pair, trying both orderings.
    ///
    /// Returns `None` for unknown pairs; same-location pairs are only
    /// found if explicitly stored.
    pub fn lookup(&self, origin: &LocationId, destination: &LocationId) -> Option<u32> {
        self.routes
            .get(&(origin.clone(), destination.clone()))
            .or_else(|| self.routes.get(&(destination.clone(), origin.clone())))
            .copied()
    }

    /// Estimated travel minutes. Always returns a value.
    pub fn estimate(&self, origin: &LocationId, destination: &LocationId) -> u32 {
        if origin == destination {
            return self.same_location_minutes;
        }
        match self.lookup(origin, destination) {
            Some(minutes) => minutes,
            None => {
                log::debug!(
                    "no travel estimate for {origin} -> {destination}, using {} min",
                    self.default_minutes
                );
                self.default_minutes
            }
        }
    }

    /// Number of explicitly stored routes.
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Stored routes, sorted by origin then destination.
    pub fn routes(&self) -> Vec<Route> {
        let mut routes: Vec<Route> = self
            .routes
            .iter()
            .map(|((from, to), &minutes)| Route {
                from: from.clone(),
                to: to.clone(),
                minutes,
            })
            .collect();
        routes.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));
        routes
    }

    /// Parses a table from TOML.
    ///
    /// ```toml
    /// default_minutes = 45
    ///
    /// [[routes]]
    /// from = "Itajaí"
    /// to = "Navegantes"
    /// minutes = 15
    /// ```
    pub fn from_toml_str(content: &str) -> ScheduleResult<Self> {
        let file: TravelTableFile = toml::from_str(content)
            .map_err(|e| ScheduleError::policy(format!("Failed to parse travel table: {e}")))?;
        Ok(file.into())
    }

    /// Loads a table from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ScheduleResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            ScheduleError::policy(format!("Failed to read travel table file: {e}"))
        })?;
        Self::from_toml_str(&content)
    }
}

/// Shared, refreshable travel-time cache.
///
/// Cloning is cheap and clones share the same underlying table.
#[derive(Debug, Clone)]
pub struct TravelEstimator {
    current: Arc<RwLock<Arc<TravelTable>>>,
}

impl Default for TravelEstimator {
    fn default() -> Self {
        Self::new(TravelTable::new())
    }
}

impl TravelEstimator {
    /// Creates an estimator over a table.
    pub fn new(table: TravelTable) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(table))),
        }
    }

    /// The table currently in use.
    ///
    /// The snapshot stays valid and unchanged even if the table is
    /// replaced afterwards.
    pub fn snapshot(&self) -> Arc<TravelTable> {
        Arc::clone(&self.current.read())
    }

    /// Estimated travel minutes from the current table.
    pub fn estimate(&self, origin: &LocationId, destination: &LocationId) -> u32 {
        self.snapshot().estimate(origin, destination)
    }

    /// Swaps in a new table.
    pub fn replace(&self, table: TravelTable) {
        *self.current.write() = Arc::new(table);
    }

    /// Builds a new table from the current one and swaps it in.
    ///
    /// `build` runs outside the lock; concurrent refreshes are last-writer-wins.
    pub fn refresh_with<F>(&self, build: F)
    where
        F: FnOnce(&TravelTable) -> TravelTable,
    {
        let next = build(&self.snapshot());
        self.replace(next);
    }

    /// Returns the stored estimate, computing and caching it when absent.
    pub fn get_or_compute<F>(
        &self,
        origin: &LocationId,
        destination: &LocationId,
        compute: F,
    ) -> u32
    where
        F: FnOnce() -> u32,
    {
        let snapshot = self.snapshot();
        if origin == destination {
            return snapshot.same_location_minutes;
        }
        if let Some(minutes) = snapshot.lookup(origin, destination) {
            return minutes;
        }
        let minutes = compute();
        self.refresh_with(|table| {
            table
                .clone()
                .with_route(origin.clone(), destination.clone(), minutes)
        });
        minutes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn loc(s: &str) -> LocationId {
        LocationId::new(s)
    }

    #[test]
    fn test_travel_table_lookup() {
        let table = TravelTable::new()
            .with_default(45)
            .with_route("A", "B", 20)
            .with_route("B", "C", 30);

        assert_eq!(table.estimate(&loc("A"), &loc("B")), 20);
        assert_eq!(table.estimate(&loc("B"), &loc("A")), 20); // symmetric fallback
        assert_eq!(table.estimate(&loc("A"), &loc("C")), 45); // unknown pair
        assert_eq!(table.estimate(&loc("A"), &loc("A")), 5); // same location
        assert_eq!(table.route_count(), 2);
    }

    #[test]
    fn test_directional_value_wins() {
        let table = TravelTable::new()
            .with_route("A", "B", 20)
            .with_route("B", "A", 25);
        assert_eq!(table.estimate(&loc("A"), &loc("B")), 20);
        assert_eq!(table.estimate(&loc("B"), &loc("A")), 25);
    }

    #[test]
    fn test_microregion_table() {
        let table = TravelTable::itajai_microregion();
        assert_eq!(table.estimate(&loc("Navegantes"), &loc("Itajaí")), 15);
        assert_eq!(table.estimate(&loc("Bombinhas"), &loc("Porto Belo")), 20);
        assert_eq!(table.estimate(&loc("Penha"), &loc("Ilhota")), 45);
        assert_eq!(table.route_count(), 20);
    }

    #[test]
    fn test_travel_table_from_toml() {
        let table = TravelTable::from_toml_str(
            r#"
            same_location_minutes = 3
            default_minutes = 50

            [[routes]]
            from = "X"
            to = "Y"
            minutes = 60
            "#,
        )
        .unwrap();

        assert_eq!(table.estimate(&loc("Y"), &loc("X")), 60);
        assert_eq!(table.estimate(&loc("X"), &loc("X")), 3);
        assert_eq!(table.estimate(&loc("X"), &loc("Z")), 50);
    }

    #[test]
    fn test_travel_table_invalid_toml() {
        let err = TravelTable::from_toml_str("routes = 3").unwrap_err();
        assert!(matches!(err, ScheduleError::Policy(_)));
    }

    #[test]
    fn test_estimator_swap_keeps_old_snapshot() {
        let estimator = TravelEstimator::new(TravelTable::new().with_route("A", "B", 20));
        let before = estimator.snapshot();

        estimator.replace(TravelTable::new().with_route("A", "B", 35));

        assert_eq!(before.estimate(&loc("A"), &loc("B")), 20);
        assert_eq!(estimator.estimate(&loc("A"), &loc("B")), 35);
    }

    #[test]
    fn test_get_or_compute_caches() {
        let estimator = TravelEstimator::default();
        let shared = estimator.clone();

        let first = estimator.get_or_compute(&loc("A"), &loc("B"), || 12);
        let second = shared.get_or_compute(&loc("B"), &loc("A"), || 99);

        assert_eq!(first, 12);
        assert_eq!(second, 12); // served from the cached route
        assert_eq!(shared.snapshot().route_count(), 1);
    }

    #[test]
    fn test_concurrent_reads() {
        let estimator = TravelEstimator::new(TravelTable::itajai_microregion());
        thread::scope(|s| {
            for _ in 0..4 {
                let e = estimator.clone();
                s.spawn(move || {
                    for _ in 0..100 {
                        assert_eq!(e.estimate(&loc("Itajaí"), &loc("Penha")), 20);
                    }
                });
            }
            s.spawn(|| estimator.refresh_with(|t| t.clone().with_route("Z", "W", 1)));
        });
        assert_eq!(estimator.estimate(&loc("Z"), &loc("W")), 1);
    }
}
