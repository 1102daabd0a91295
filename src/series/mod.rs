// src/series/mod.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::categories::Category;

pub mod store;

pub use store::SeriesStore;

/// One day's price in a category's history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub date: NaiveDate,
    pub rate: f64,
}

/// What `merge` did to a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The series already covers `today`; nothing changed.
    AlreadyCurrent,
    /// `filled` carried-forward days were appended before today's entry;
    /// `observed` says whether today's price came from the document.
    Appended { filled: usize, observed: bool },
    /// Empty series and nothing observed; there is no price to carry.
    NoHistory,
}

impl MergeOutcome {
    pub fn changed(self) -> bool {
        matches!(self, MergeOutcome::Appended { .. })
    }
}

/// A category's price history, ascending by date with one entry per date.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub category: Category,
    points: Vec<Point>,
}

impl Series {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            points: Vec::new(),
        }
    }

    /// Build from stored points; they must be strictly ascending by date.
    pub fn from_points(category: Category, points: Vec<Point>) -> Result<Self, NaiveDate> {
        if let Some(bad) = points.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(bad[1].date);
        }
        Ok(Self { category, points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last(&self) -> Option<Point> {
        self.points.last().copied()
    }

    pub fn rate_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].rate)
    }

    /// True if every consecutive pair of entries is exactly one day apart.
    pub fn is_contiguous(&self) -> bool {
        self.points
            .windows(2)
            .all(|w| w[0].date.succ_opt() == Some(w[1].date))
    }

    /// Append `today`, carrying the last known rate over any missing days
    /// (and over today itself when nothing was observed).
    pub fn merge(&mut self, observed: Option<f64>, today: NaiveDate) -> MergeOutcome {
        let last = match self.last() {
            Some(last) if last.date >= today => return MergeOutcome::AlreadyCurrent,
            Some(last) => last,
            None => {
                return match observed {
                    Some(rate) => {
                        self.points.push(Point { date: today, rate });
                        MergeOutcome::Appended {
                            filled: 0,
                            observed: true,
                        }
                    }
                    None => MergeOutcome::NoHistory,
                };
            }
        };

        let mut filled = 0;
        let mut day = last.date;
        while let Some(next) = day.succ_opt() {
            if next >= today {
                break;
            }
            self.points.push(Point {
                date: next,
                rate: last.rate,
            });
            filled += 1;
            day = next;
        }

        self.points.push(Point {
            date: today,
            rate: observed.unwrap_or(last.rate),
        });
        MergeOutcome::Appended {
            filled,
            observed: observed.is_some(),
        }
    }
}
