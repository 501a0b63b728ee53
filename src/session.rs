//! User-editable comparison ranges owned by one session.
//!
//! Every edit returns a new list; the previous value is left untouched so a
//! view can keep rendering it until the new one is ready.

use crate::{compare::ComparisonPeriod, error::DashboardError, window::TimeWindow};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonRanges {
    ranges: Vec<TimeWindow>,
}

impl ComparisonRanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ranges(&self) -> &[TimeWindow] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    #[must_use]
    pub fn add(&self, window: TimeWindow) -> Self {
        let mut ranges = self.ranges.clone();
        ranges.push(window);
        Self { ranges }
    }

    pub fn remove(&self, index: usize) -> Result<Self, DashboardError> {
        self.check_index(index)?;
        let mut ranges = self.ranges.clone();
        ranges.remove(index);
        Ok(Self { ranges })
    }

    pub fn edit(&self, index: usize, window: TimeWindow) -> Result<Self, DashboardError> {
        self.check_index(index)?;
        let mut ranges = self.ranges.clone();
        ranges[index] = window;
        Ok(Self { ranges })
    }

    pub fn periods(&self) -> Vec<ComparisonPeriod> {
        self.ranges
            .iter()
            .copied()
            .map(ComparisonPeriod::Range)
            .collect()
    }

    fn check_index(&self, index: usize) -> Result<(), DashboardError> {
        if index < self.ranges.len() {
            Ok(())
        } else {
            Err(DashboardError::RangeIndex {
                index,
                len: self.ranges.len(),
            })
        }
    }
}

impl FromIterator<TimeWindow> for ComparisonRanges {
    fn from_iter<I: IntoIterator<Item = TimeWindow>>(iter: I) -> Self {
        iter.into_iter()
            .fold(ComparisonRanges::new(), |ranges, window| ranges.add(window))
    }
}
