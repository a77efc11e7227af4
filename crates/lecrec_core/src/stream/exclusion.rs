//! Exclusion intervals and playback/byte position translation.
//!
//! Exclusions are a logical overlay: the underlying bytes are never
//! rewritten. Intervals are kept in milliseconds exactly as they were added;
//! the byte view is derived from them for a given [`AudioFormat`] and data
//! length, sorted, clamped and merged.
//!
//! Two coordinate systems are used:
//!
//! - *physical* offsets address the stored sample data;
//! - *virtual* offsets address what playback sees once excluded ranges
//!   are removed.

use crate::error::{RecordingError, RecordingResult};
use crate::stream::format::AudioFormat;
use std::ops::Range;

/// A half-open time range `[start, end)` in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MillisInterval {
    start: u64,
    end: u64,
}

impl MillisInterval {
    /// Creates an interval.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `start > end`.
    pub fn new(start: u64, end: u64) -> RecordingResult<Self> {
        if start > end {
            return Err(RecordingError::invalid_argument(format!(
                "interval start {start} ms is after end {end} ms"
            )));
        }
        Ok(Self { start, end })
    }

    /// Inclusive start.
    #[must_use]
    pub const fn start(&self) -> u64 {
        self.start
    }

    /// Exclusive end.
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.end
    }

    /// Length in milliseconds.
    #[must_use]
    pub const fn duration(&self) -> u64 {
        self.end - self.start
    }

    /// Returns whether the interval covers no time.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns whether `millis` falls inside the interval.
    #[must_use]
    pub const fn contains(&self, millis: u64) -> bool {
        self.start <= millis && millis < self.end
    }
}

/// The set of time ranges skipped during playback and export.
///
/// Intervals are stored as added, so overlapping intervals can be removed
/// one at a time and the remaining ones still apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    intervals: Vec<MillisInterval>,
}

impl ExclusionSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an interval. Empty intervals are ignored.
    pub fn add(&mut self, interval: MillisInterval) {
        if !interval.is_empty() {
            self.intervals.push(interval);
        }
    }

    /// Removes one interval equal to `interval`. Returns whether one was found.
    pub fn remove(&mut self, interval: &MillisInterval) -> bool {
        match self.intervals.iter().position(|iv| iv == interval) {
            Some(index) => {
                self.intervals.remove(index);
                true
            }
            None => false,
        }
    }

    /// Removes every interval.
    pub fn clear(&mut self) {
        self.intervals.clear();
    }

    /// The intervals in insertion order.
    #[must_use]
    pub fn intervals(&self) -> &[MillisInterval] {
        &self.intervals
    }

    /// Returns whether no interval is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Number of stored intervals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Translates the set into merged byte ranges over `data_len` bytes.
    #[must_use]
    pub fn to_byte_map(&self, format: &AudioFormat, data_len: u64) -> ByteExclusions {
        let mut ranges: Vec<Range<u64>> = self
            .intervals
            .iter()
            .map(|iv| {
                let start = format.millis_to_bytes(iv.start).min(data_len);
                let end = format.millis_to_bytes(iv.end).min(data_len);
                start..end
            })
            .filter(|r| r.start < r.end)
            .collect();
        ranges.sort_by_key(|r| r.start);

        let mut merged: Vec<Range<u64>> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match merged.last_mut() {
                Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
                _ => merged.push(range),
            }
        }

        ByteExclusions {
            ranges: merged,
            data_len,
        }
    }
}

/// Sorted, merged, non-empty excluded byte ranges over a track's data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteExclusions {
    ranges: Vec<Range<u64>>,
    data_len: u64,
}

impl ByteExclusions {
    /// A map with no exclusions.
    #[must_use]
    pub fn none(data_len: u64) -> Self {
        Self {
            ranges: Vec::new(),
            data_len,
        }
    }

    /// The merged ranges in ascending order.
    #[must_use]
    pub fn ranges(&self) -> &[Range<u64>] {
        &self.ranges
    }

    /// Physical data length.
    #[must_use]
    pub fn data_len(&self) -> u64 {
        self.data_len
    }

    /// Total number of excluded bytes.
    #[must_use]
    pub fn excluded_bytes(&self) -> u64 {
        self.ranges.iter().map(|r| r.end - r.start).sum()
    }

    /// Number of bytes playback sees.
    #[must_use]
    pub fn virtual_len(&self) -> u64 {
        self.data_len - self.excluded_bytes()
    }

    /// Maps a playback offset to a physical offset.
    ///
    /// Offsets landing on the start of an excluded range map past it.
    #[must_use]
    pub fn virtual_to_physical(&self, virtual_pos: u64) -> u64 {
        let mut physical = virtual_pos;
        for range in &self.ranges {
            if range.start <= physical {
                physical += range.end - range.start;
            } else {
                break;
            }
        }
        physical.min(self.data_len)
    }

    /// Maps a physical offset to a playback offset, `None` if it is excluded.
    #[must_use]
    pub fn physical_to_virtual(&self, physical: u64) -> Option<u64> {
        let mut virtual_pos = physical;
        for range in &self.ranges {
            if range.end <= physical {
                virtual_pos -= range.end - range.start;
            } else if range.start <= physical {
                return None;
            } else {
                break;
            }
        }
        Some(virtual_pos)
    }

    /// Moves `physical` past the excluded range containing it, if any.
    #[must_use]
    pub fn skip_excluded(&self, physical: u64) -> u64 {
        self.ranges
            .iter()
            .find(|r| r.contains(&physical))
            .map_or(physical, |r| r.end)
    }

    /// Start of the first excluded range beginning after `physical`.
    #[must_use]
    pub fn next_boundary(&self, physical: u64) -> Option<u64> {
        self.ranges
            .iter()
            .map(|r| r.start)
            .find(|start| *start > physical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// 1 byte per millisecond keeps the arithmetic readable.
    fn one_byte_per_ms() -> AudioFormat {
        AudioFormat::pcm(1000, 1, 8)
    }

    fn iv(start: u64, end: u64) -> MillisInterval {
        MillisInterval::new(start, end).unwrap()
    }

    #[test]
    fn interval_validation() {
        assert!(MillisInterval::new(5, 4).is_err());
        let interval = iv(10, 20);
        assert_eq!(interval.duration(), 10);
        assert!(interval.contains(10));
        assert!(!interval.contains(20));
        assert!(iv(3, 3).is_empty());
    }

    #[test]
    fn empty_intervals_are_ignored() {
        let mut set = ExclusionSet::new();
        set.add(iv(4, 4));
        assert!(set.is_empty());
    }

    #[test]
    fn overlapping_intervals_merge_in_byte_view() {
        let mut set = ExclusionSet::new();
        set.add(iv(30, 50));
        set.add(iv(10, 20));
        set.add(iv(15, 35));

        let map = set.to_byte_map(&one_byte_per_ms(), 100);
        assert_eq!(map.ranges(), &[10..50]);
        assert_eq!(map.excluded_bytes(), 40);
        assert_eq!(map.virtual_len(), 60);
    }

    #[test]
    fn removal_is_exact_after_overlap() {
        let mut set = ExclusionSet::new();
        set.add(iv(10, 30));
        set.add(iv(20, 40));

        assert!(set.remove(&iv(10, 30)));
        assert!(!set.remove(&iv(10, 30)));

        let map = set.to_byte_map(&one_byte_per_ms(), 100);
        assert_eq!(map.ranges(), &[20..40]);
    }

    #[test]
    fn ranges_are_clamped_to_data() {
        let mut set = ExclusionSet::new();
        set.add(iv(90, 500));
        set.add(iv(200, 300));

        let map = set.to_byte_map(&one_byte_per_ms(), 100);
        assert_eq!(map.ranges(), &[90..100]);
        assert_eq!(map.virtual_len(), 90);
    }

    #[test]
    fn translation() {
        let mut set = ExclusionSet::new();
        set.add(iv(10, 20));
        set.add(iv(50, 60));
        let map = set.to_byte_map(&one_byte_per_ms(), 100);

        assert_eq!(map.virtual_to_physical(5), 5);
        assert_eq!(map.virtual_to_physical(10), 20);
        assert_eq!(map.virtual_to_physical(45), 65);
        assert_eq!(map.virtual_to_physical(80), 100);

        assert_eq!(map.physical_to_virtual(5), Some(5));
        assert_eq!(map.physical_to_virtual(15), None);
        assert_eq!(map.physical_to_virtual(20), Some(10));
        assert_eq!(map.physical_to_virtual(65), Some(45));

        assert_eq!(map.skip_excluded(12), 20);
        assert_eq!(map.skip_excluded(25), 25);
        assert_eq!(map.next_boundary(20), Some(50));
        assert_eq!(map.next_boundary(55), None);
    }

    proptest! {
        #[test]
        fn virtual_physical_round_trip(
            raw in proptest::collection::vec((0u64..400, 0u64..80), 0..6),
            data_len in 0u64..400,
        ) {
            let mut set = ExclusionSet::new();
            for (start, len) in raw {
                set.add(MillisInterval::new(start, start + len).unwrap());
            }
            let map = set.to_byte_map(&one_byte_per_ms(), data_len);

            prop_assert!(map.excluded_bytes() <= data_len);
            for v in 0..map.virtual_len() {
                let p = map.virtual_to_physical(v);
                prop_assert!(p < data_len);
                prop_assert_eq!(map.physical_to_virtual(p), Some(v));
            }
        }
    }
}
