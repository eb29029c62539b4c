//! Ordered media time ranges (buffered, seekable, played)

use serde::{Deserialize, Serialize};

/// Ordered list of non-overlapping `[start, end]` ranges in seconds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeRanges(Vec<(f64, f64)>);

impl TimeRanges {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Build from arbitrary ranges: drops invalid pairs, sorts and merges overlaps
    pub fn from_ranges(ranges: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let mut items: Vec<(f64, f64)> = ranges
            .into_iter()
            .filter(|(start, end)| start.is_finite() && !end.is_nan() && end >= start)
            .collect();
        items.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut merged: Vec<(f64, f64)> = Vec::with_capacity(items.len());
        for (start, end) in items {
            match merged.last_mut() {
                Some(last) if start <= last.1 => last.1 = last.1.max(end),
                _ => merged.push((start, end)),
            }
        }
        Self(merged)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn start(&self, index: usize) -> Option<f64> {
        self.0.get(index).map(|r| r.0)
    }

    pub fn end(&self, index: usize) -> Option<f64> {
        self.0.get(index).map(|r| r.1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(f64, f64)> {
        self.0.iter()
    }

    /// End of the last range, or 0 when empty
    pub fn last_end(&self) -> f64 {
        self.0.last().map(|r| r.1).unwrap_or(0.0)
    }

    /// Whether `time` falls inside any range
    pub fn contains(&self, time: f64) -> bool {
        self.0.iter().any(|(start, end)| time >= *start && time <= *end)
    }
}

impl From<Vec<(f64, f64)>> for TimeRanges {
    fn from(ranges: Vec<(f64, f64)>) -> Self {
        Self::from_ranges(ranges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_ranges_sorts_and_merges() {
        let ranges = TimeRanges::from_ranges(vec![(10.0, 20.0), (0.0, 5.0), (4.0, 8.0)]);
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges.start(0), Some(0.0));
        assert_eq!(ranges.end(0), Some(8.0));
        assert_eq!(ranges.last_end(), 20.0);
    }

    #[test]
    fn test_invalid_pairs_dropped() {
        let ranges = TimeRanges::from_ranges(vec![(5.0, 1.0), (f64::NAN, 2.0), (0.0, 1.0)]);
        assert_eq!(ranges.len(), 1);
    }

    #[test]
    fn test_empty_last_end_is_zero() {
        assert_eq!(TimeRanges::new().last_end(), 0.0);
        assert!(!TimeRanges::new().contains(0.0));
    }
}
