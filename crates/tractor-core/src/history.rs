//! Bounded rolling history of telemetry samples.

use crate::error::{CoreError, CoreResult};
use crate::sample::TelemetrySample;
use std::collections::vec_deque;
use std::collections::VecDeque;

/// Default number of samples kept for trend display.
pub const HISTORY_CAPACITY: usize = 50;

/// Fixed-capacity FIFO of samples, oldest evicted first.
///
/// Samples are kept in arrival order. The buffer never reorders by
/// timestamp and offers no removal other than eviction.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryBuffer {
    samples: VecDeque<TelemetrySample>,
    capacity: usize,
}

impl HistoryBuffer {
    /// Create a buffer holding at most `capacity` samples.
    pub fn with_capacity(capacity: usize) -> CoreResult<Self> {
        if capacity == 0 {
            return Err(CoreError::InvalidCapacity(capacity));
        }
        Ok(Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Append a sample, evicting the oldest one when full.
    pub fn push(&mut self, sample: TelemetrySample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Append samples in iteration order.
    pub fn extend<I>(&mut self, samples: I)
    where
        I: IntoIterator<Item = TelemetrySample>,
    {
        for sample in samples {
            self.push(sample);
        }
    }

    /// Place `older` ahead of the samples already held.
    ///
    /// Used when a bootstrap history arrives after live samples did. The
    /// combined sequence is trimmed from the front to capacity.
    pub fn seed_front(&mut self, older: Vec<TelemetrySample>) {
        let live = std::mem::take(&mut self.samples);
        self.samples.reserve(self.capacity);
        self.extend(older.into_iter().chain(live));
    }

    pub fn iter(&self) -> vec_deque::Iter<'_, TelemetrySample> {
        self.samples.iter()
    }

    /// Borrow the contents as two contiguous slices (oldest first).
    pub fn as_slices(&self) -> (&[TelemetrySample], &[TelemetrySample]) {
        self.samples.as_slices()
    }

    /// Owned copy of the contents, oldest first.
    pub fn to_vec(&self) -> Vec<TelemetrySample> {
        self.samples.iter().cloned().collect()
    }

    /// Most recently appended sample.
    pub fn latest(&self) -> Option<&TelemetrySample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self {
            samples: VecDeque::with_capacity(HISTORY_CAPACITY),
            capacity: HISTORY_CAPACITY,
        }
    }
}

impl<'a> IntoIterator for &'a HistoryBuffer {
    type Item = &'a TelemetrySample;
    type IntoIter = vec_deque::Iter<'a, TelemetrySample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
