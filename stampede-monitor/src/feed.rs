//! Externally fed metrics and the time-ordered buffers holding them

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

use crate::types::MetricSample;

/// Anything stored in a [`TimeSeries`]
pub trait Timestamped {
    fn timestamp(&self) -> DateTime<Utc>;
}

impl Timestamped for MetricSample {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// One request observed by the service under test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetric {
    pub timestamp: DateTime<Utc>,
    /// Milliseconds
    pub response_time: f64,
    #[serde(default)]
    pub error: bool,
    /// Whether the request had to wait for a free handler
    #[serde(default)]
    pub queued: bool,
}

impl RequestMetric {
    pub fn new(response_time: f64, error: bool, queued: bool) -> Self {
        Self {
            timestamp: Utc::now(),
            response_time,
            error,
            queued,
        }
    }
}

/// One database query observed by the service under test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseMetric {
    pub timestamp: DateTime<Utc>,
    /// Milliseconds
    pub query_time: f64,
    /// Open connections when the query ran
    #[serde(default)]
    pub connections: u64,
    #[serde(default)]
    pub error: bool,
}

impl DatabaseMetric {
    pub fn new(query_time: f64, connections: u64, error: bool) -> Self {
        Self {
            timestamp: Utc::now(),
            query_time,
            connections,
            error,
        }
    }
}

/// One cache lookup observed by the service under test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetric {
    pub timestamp: DateTime<Utc>,
    pub hit: bool,
    /// Milliseconds
    #[serde(default)]
    pub response_time: f64,
}

impl CacheMetric {
    pub fn new(hit: bool, response_time: f64) -> Self {
        Self {
            timestamp: Utc::now(),
            hit,
            response_time,
        }
    }
}

impl Timestamped for RequestMetric {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl Timestamped for DatabaseMetric {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl Timestamped for CacheMetric {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

pub(crate) fn chrono_duration(duration: Duration) -> ChronoDuration {
    ChronoDuration::from_std(duration).unwrap_or(ChronoDuration::MAX)
}

/// `now - age`, saturating at the earliest representable instant
pub(crate) fn cutoff(now: DateTime<Utc>, age: Duration) -> DateTime<Utc> {
    now.checked_sub_signed(chrono_duration(age))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Bounded, time-ordered history of entries
///
/// Entries are expected in timestamp order; out-of-order pushes are
/// tolerated but may survive a prune slightly longer than their age allows.
#[derive(Debug, Clone)]
pub struct TimeSeries<T> {
    entries: VecDeque<T>,
}

impl<T> Default for TimeSeries<T> {
    fn default() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }
}

impl<T: Timestamped> TimeSeries<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: T) {
        self.entries.push_back(entry);
    }

    /// Drop entries older than `retention` before `now`
    pub fn prune(&mut self, now: DateTime<Utc>, retention: Duration) -> usize {
        let oldest = cutoff(now, retention);
        let before = self.entries.len();
        while self
            .entries
            .front()
            .is_some_and(|entry| entry.timestamp() < oldest)
        {
            self.entries.pop_front();
        }
        before - self.entries.len()
    }

    /// Entries within the trailing `window` ending at `now`
    pub fn window(&self, now: DateTime<Utc>, window: Duration) -> impl Iterator<Item = &T> {
        let start = cutoff(now, window);
        self.entries
            .iter()
            .filter(move |entry| entry.timestamp() >= start && entry.timestamp() <= now)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }
}

/// Arithmetic mean, `None` for an empty input
pub fn mean<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
