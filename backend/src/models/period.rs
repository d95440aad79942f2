//! Time intervals and interval algebra used throughout the planner.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::time::{duration_to_hours, duration_to_minutes};

/// A half-open UTC interval `[start, end)` during which something holds
/// (an object is visible, the Moon interferes, two objects are jointly visible).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityPeriod {
    /// Start time (UTC)
    pub start: DateTime<Utc>,
    /// End time (UTC)
    pub end: DateTime<Utc>,
}

impl VisibilityPeriod {
    /// Returns `None` when `start >= end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        if start < end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// Length of the interval.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn hours(&self) -> f64 {
        duration_to_hours(self.duration())
    }

    /// Check if a given instant lies inside this interval (inclusive start, exclusive end).
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }

    /// Check if `other` lies entirely inside this interval.
    pub fn contains_period(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Check if this interval overlaps with another.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Overlapping part of two intervals, if any.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        Self::new(self.start.max(other.start), self.end.min(other.end))
    }

    /// Amount of time shared by two intervals (zero when disjoint).
    pub fn overlap_duration(&self, other: &Self) -> Duration {
        self.intersection(other)
            .map(|p| p.duration())
            .unwrap_or_else(Duration::zero)
    }

    pub fn overlap_minutes(&self, other: &Self) -> f64 {
        duration_to_minutes(self.overlap_duration(other))
    }
}

/// Sum of the durations of a list of periods.
pub fn total_duration(periods: &[VisibilityPeriod]) -> Duration {
    periods
        .iter()
        .fold(Duration::zero(), |acc, p| acc + p.duration())
}

/// Longest single period in a list.
pub fn longest_period(periods: &[VisibilityPeriod]) -> Option<&VisibilityPeriod> {
    periods.iter().max_by_key(|p| p.duration())
}

/// Intersection of two period lists.
///
/// Every pair of periods across the two lists contributes its overlapping
/// sub-interval. The result is sorted by start time.
pub fn intersect_periods(a: &[VisibilityPeriod], b: &[VisibilityPeriod]) -> Vec<VisibilityPeriod> {
    let mut out: Vec<VisibilityPeriod> = a
        .iter()
        .flat_map(|pa| b.iter().filter_map(move |pb| pa.intersection(pb)))
        .collect();
    out.sort_by_key(|p| p.start);
    out
}

/// Run-length encode a boolean signal sampled at a fixed step over `[start, end]`.
///
/// Consecutive positive samples are merged into one period. A period ends at
/// the first negative sample; a period still open at `end` is closed at `end`.
/// Positive stretches shorter than `step` may be missed entirely.
pub fn sample_periods<F>(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
    mut predicate: F,
) -> Vec<VisibilityPeriod>
where
    F: FnMut(DateTime<Utc>) -> bool,
{
    let mut periods = Vec::new();
    if start >= end || step <= Duration::zero() {
        return periods;
    }

    let mut open: Option<DateTime<Utc>> = None;
    let mut t = start;
    while t <= end {
        let positive = predicate(t);
        match (positive, open) {
            (true, None) => open = Some(t),
            (false, Some(s)) => {
                periods.extend(VisibilityPeriod::new(s, t));
                open = None;
            }
            _ => {}
        }
        t += step;
    }

    if let Some(s) = open {
        periods.extend(VisibilityPeriod::new(s, end));
    }

    periods
}

/// Merge overlapping or touching periods into a sorted, disjoint list.
pub fn merge_periods(periods: &[VisibilityPeriod]) -> Vec<VisibilityPeriod> {
    let mut sorted = periods.to_vec();
    sorted.sort_by_key(|p| p.start);

    let mut merged: Vec<VisibilityPeriod> = Vec::with_capacity(sorted.len());
    for period in sorted {
        if let Some(last) = merged.last_mut() {
            if period.start <= last.end {
                if period.end > last.end {
                    last.end = period.end;
                }
                continue;
            }
        }
        merged.push(period);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, h, m, 0).unwrap()
    }

    fn period(h0: u32, m0: u32, h1: u32, m1: u32) -> VisibilityPeriod {
        VisibilityPeriod::new(at(h0, m0), at(h1, m1)).unwrap()
    }

    #[test]
    fn test_new_rejects_empty_interval() {
        assert!(VisibilityPeriod::new(at(1, 0), at(1, 0)).is_none());
        assert!(VisibilityPeriod::new(at(2, 0), at(1, 0)).is_none());
    }

    #[test]
    fn test_contains_is_half_open() {
        let p = period(1, 0, 2, 0);
        assert!(p.contains(at(1, 0)));
        assert!(p.contains(at(1, 59)));
        assert!(!p.contains(at(2, 0)));
    }

    #[test]
    fn test_overlap_minutes() {
        let a = period(1, 0, 2, 0);
        let b = period(1, 45, 3, 0);
        let c = period(2, 0, 3, 0);
        assert!((a.overlap_minutes(&b) - 15.0).abs() < 1e-9);
        assert_eq!(a.overlap_minutes(&c), 0.0);
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_intersect_periods() {
        let a = vec![period(0, 0, 2, 0), period(4, 0, 6, 0)];
        let b = vec![period(1, 0, 5, 0)];
        let out = intersect_periods(&a, &b);
        assert_eq!(out, vec![period(1, 0, 2, 0), period(4, 0, 5, 0)]);
    }

    #[test]
    fn test_intersect_disjoint_is_empty() {
        let a = vec![period(0, 0, 1, 0)];
        let b = vec![period(2, 0, 3, 0)];
        assert!(intersect_periods(&a, &b).is_empty());
    }

    #[test]
    fn test_sample_periods_two_runs() {
        let start = at(0, 0);
        let end = at(1, 0);
        let periods = sample_periods(start, end, Duration::minutes(1), |t| {
            let m = (t - start).num_minutes();
            (10..20).contains(&m) || (40..50).contains(&m)
        });
        assert_eq!(periods, vec![period(0, 10, 0, 20), period(0, 40, 0, 50)]);
    }

    #[test]
    fn test_sample_periods_closes_open_run_at_end() {
        let start = at(0, 0);
        let end = at(1, 0);
        let periods = sample_periods(start, end, Duration::minutes(1), |t| t >= at(0, 30));
        assert_eq!(periods, vec![period(0, 30, 1, 0)]);
    }

    #[test]
    fn test_sample_periods_degenerate_inputs() {
        assert!(sample_periods(at(1, 0), at(0, 0), Duration::minutes(1), |_| true).is_empty());
        assert!(sample_periods(at(0, 0), at(1, 0), Duration::zero(), |_| true).is_empty());
    }

    #[test]
    fn test_merge_periods() {
        let merged = merge_periods(&[period(3, 0, 4, 0), period(1, 0, 2, 0), period(1, 30, 3, 0)]);
        assert_eq!(merged, vec![period(1, 0, 4, 0)]);
    }

    #[test]
    fn test_total_and_longest() {
        let periods = vec![period(0, 0, 1, 0), period(2, 0, 4, 0)];
        assert_eq!(total_duration(&periods).num_minutes(), 180);
        assert_eq!(longest_period(&periods), Some(&period(2, 0, 4, 0)));
    }
}
