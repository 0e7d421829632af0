//! Tab stop bookkeeping (HTS, TBC, CHT/CBT targets)

use serde::{Deserialize, Serialize};

/// Column tab stops. Defaults to one stop every `width` columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabStops {
    stops: Vec<bool>,
    width: usize,
}

impl TabStops {
    pub fn new(cols: usize, width: usize) -> Self {
        let width = width.max(1);
        let mut tabs = Self {
            stops: vec![false; cols],
            width,
        };
        tabs.reset();
        tabs
    }

    /// Restore the periodic default stops.
    pub fn reset(&mut self) {
        self.stops.fill(false);
        let mut col = 0;
        while col < self.stops.len() {
            self.stops[col] = true;
            col += self.width;
        }
    }

    pub fn set(&mut self, col: usize) {
        if let Some(stop) = self.stops.get_mut(col) {
            *stop = true;
        }
    }

    pub fn clear(&mut self, col: usize) {
        if let Some(stop) = self.stops.get_mut(col) {
            *stop = false;
        }
    }

    pub fn clear_all(&mut self) {
        self.stops.fill(false);
    }

    /// Next stop strictly after `col`, or the last column.
    pub fn next(&self, col: usize) -> usize {
        let last = self.stops.len().saturating_sub(1);
        (col + 1..self.stops.len())
            .find(|&c| self.stops[c])
            .unwrap_or(last)
    }

    /// Previous stop strictly before `col`, or column 0.
    pub fn previous(&self, col: usize) -> usize {
        (0..col.min(self.stops.len())).rev().find(|&c| self.stops[c]).unwrap_or(0)
    }

    /// Grow/shrink with the page, seeding default stops in new columns.
    pub fn resize(&mut self, cols: usize) {
        let old = self.stops.len();
        self.stops.resize(cols, false);
        for col in old..cols {
            self.stops[col] = col % self.width == 0;
        }
    }

    /// 1-based columns of all stops, for the DECTABSR report.
    pub fn report(&self) -> Vec<usize> {
        self.stops
            .iter()
            .enumerate()
            .filter_map(|(col, &set)| set.then_some(col + 1))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stops_every_eight() {
        let tabs = TabStops::new(24, 8);
        assert_eq!(tabs.next(0), 8);
        assert_eq!(tabs.next(8), 16);
        assert_eq!(tabs.next(16), 23);
        assert_eq!(tabs.previous(16), 8);
        assert_eq!(tabs.previous(3), 0);
    }

    #[test]
    fn test_set_clear() {
        let mut tabs = TabStops::new(20, 8);
        tabs.set(3);
        assert_eq!(tabs.next(0), 3);
        tabs.clear(3);
        assert_eq!(tabs.next(0), 8);
        tabs.clear_all();
        assert_eq!(tabs.next(0), 19);
    }

    #[test]
    fn test_report_is_one_based() {
        let mut tabs = TabStops::new(20, 8);
        tabs.clear_all();
        tabs.set(0);
        tabs.set(7);
        assert_eq!(tabs.report(), vec![1, 8]);
    }

    #[test]
    fn test_resize_seeds_new_columns() {
        let mut tabs = TabStops::new(8, 8);
        tabs.resize(20);
        assert_eq!(tabs.next(8), 16);
    }
}
