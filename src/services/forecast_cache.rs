use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use dashmap::DashMap;

use crate::models::ForecastReport;

/// Identifies a forecast request: same series, same horizon, same start day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForecastKey {
    pub fingerprint: u64,
    pub horizon: usize,
    pub today: NaiveDate,
}

#[derive(Debug, Clone)]
struct CachedForecast {
    stored_at: DateTime<Utc>,
    report: ForecastReport,
}

/// Thread-safe cache of recent forecast reports
/// Repeated submissions of the same series skip model inference until the TTL lapses
#[derive(Clone)]
pub struct ForecastCache {
    cache: Arc<DashMap<ForecastKey, CachedForecast>>,
    ttl: Duration,
}

impl ForecastCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Return a cached report if it is still within TTL
    pub fn get(&self, key: &ForecastKey) -> Option<ForecastReport> {
        if let Some(entry) = self.cache.get(key) {
            let cached = entry.value().clone();
            if Utc::now() < cached.stored_at + self.ttl {
                return Some(cached.report);
            }
            // TTL expired, remove from cache
            drop(entry); // Release the read lock
            self.cache.remove(key);
        }
        None
    }

    pub fn insert(&self, key: ForecastKey, report: ForecastReport) {
        self.cache.insert(
            key,
            CachedForecast {
                stored_at: Utc::now(),
                report,
            },
        );
    }

    /// Clear all expired entries from the cache
    pub fn cleanup_expired(&self) {
        let now = Utc::now();
        let ttl = self.ttl;
        self.cache.retain(|_, cached| now < cached.stored_at + ttl);
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
