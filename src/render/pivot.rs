use anyhow::{bail, Result};
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};

use crate::source::Column;

/// Month × category grid of summed values.
///
/// Every month that appears in the input is crossed with every category that
/// appears; pairs without rows hold 0.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonthlyPivot {
    /// First day of each month, ascending.
    pub months: Vec<NaiveDate>,
    /// Category labels, ascending. A null category is the empty label.
    pub categories: Vec<String>,
    /// `values[month][category]`.
    pub values: Vec<Vec<f64>>,
}

impl MonthlyPivot {
    /// Pivot three parallel columns. Dates are truncated to the first of the
    /// month and duplicate (month, category) pairs are summed. Rows with a
    /// null month are skipped; a null value still registers its pair.
    pub fn from_columns(month: &Column, category: &Column, value: &Column) -> Result<Self> {
        let mut months = BTreeSet::new();
        let mut categories = BTreeSet::new();
        let mut sums: BTreeMap<(NaiveDate, String), f64> = BTreeMap::new();

        for ((m, c), v) in month.values.iter().zip(&category.values).zip(&value.values) {
            if m.is_null() {
                continue;
            }
            let Some(day) = m.as_date() else {
                bail!("`{}` value {:?} is not a date", month.name, m);
            };
            let bucket = first_of_month(day);
            let label = c.to_string();

            months.insert(bucket);
            categories.insert(label.clone());
            let slot = sums.entry((bucket, label)).or_insert(0.0);
            if let Some(x) = v.as_f64() {
                *slot += x;
            }
        }

        let months: Vec<NaiveDate> = months.into_iter().collect();
        let categories: Vec<String> = categories.into_iter().collect();
        let values = months
            .iter()
            .map(|m| {
                categories
                    .iter()
                    .map(|c| sums.get(&(*m, c.clone())).copied().unwrap_or(0.0))
                    .collect()
            })
            .collect();

        Ok(Self {
            months,
            categories,
            values,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty() || self.categories.is_empty()
    }

    /// Value for (`month`, `category`) by index.
    pub fn get(&self, month: usize, category: usize) -> Option<f64> {
        self.values.get(month)?.get(category).copied()
    }

    /// One category's values across all months, as `(month_index, value)`.
    pub fn series(&self, category: usize) -> Vec<(usize, f64)> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, row)| row.get(category).map(|v| (i, *v)))
            .collect()
    }

    pub fn max_value(&self) -> f64 {
        self.values
            .iter()
            .flatten()
            .copied()
            .fold(0.0, f64::max)
    }

    /// `YYYY-MM` label for a month index, empty when out of range.
    pub fn month_label(&self, month: usize) -> String {
        self.months
            .get(month)
            .map(|m| m.format("%Y-%m").to_string())
            .unwrap_or_default()
    }
}

fn first_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Scalar;

    fn day(y: i32, m: u32, d: u32) -> Scalar {
        Scalar::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn pivot(rows: Vec<(Scalar, &str, Scalar)>) -> MonthlyPivot {
        let month = Column::new("month", rows.iter().map(|r| r.0.clone()).collect());
        let category = Column::new("category_name", rows.iter().map(|r| r.1.into()).collect());
        let value = Column::new("revenue", rows.iter().map(|r| r.2.clone()).collect());
        MonthlyPivot::from_columns(&month, &category, &value).unwrap()
    }

    #[test]
    fn test_missing_pairs_are_zero_filled() {
        let p = pivot(vec![
            (day(2024, 1, 1), "Books", Scalar::Float(20.0)),
            (day(2024, 1, 1), "Electronics", Scalar::Float(1500.0)),
            (day(2024, 2, 1), "Books", Scalar::Float(40.0)),
            (day(2024, 3, 1), "Electronics", Scalar::Float(500.0)),
        ]);
        assert_eq!(p.months.len(), 3);
        assert_eq!(p.categories, vec!["Books", "Electronics"]);
        // Feb Electronics and Mar Books had no rows
        assert_eq!(p.get(1, 1), Some(0.0));
        assert_eq!(p.get(2, 0), Some(0.0));
        // nothing present was dropped
        assert_eq!(p.get(0, 0), Some(20.0));
        assert_eq!(p.get(0, 1), Some(1500.0));
        assert_eq!(p.get(1, 0), Some(40.0));
        assert_eq!(p.get(2, 1), Some(500.0));
        assert_eq!(p.max_value(), 1500.0);
    }

    #[test]
    fn test_dates_truncate_and_duplicates_sum() {
        let p = pivot(vec![
            (day(2024, 5, 3), "Books", Scalar::Int(10)),
            (day(2024, 5, 28), "Books", Scalar::Int(5)),
            (
                Scalar::Timestamp(
                    NaiveDate::from_ymd_opt(2024, 5, 31)
                        .unwrap()
                        .and_hms_opt(23, 0, 0)
                        .unwrap(),
                ),
                "Books",
                Scalar::Float(0.5),
            ),
        ]);
        assert_eq!(p.months, vec![NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()]);
        assert_eq!(p.get(0, 0), Some(15.5));
        assert_eq!(p.month_label(0), "2024-05");
        assert_eq!(p.month_label(9), "");
    }

    #[test]
    fn test_null_value_keeps_its_pair() {
        let p = pivot(vec![
            (day(2024, 1, 1), "Books", Scalar::Null),
            (day(2024, 2, 1), "Toys", Scalar::Int(3)),
        ]);
        assert_eq!(p.categories, vec!["Books", "Toys"]);
        assert_eq!(p.get(0, 0), Some(0.0));
        assert_eq!(p.series(1), vec![(0, 0.0), (1, 3.0)]);
    }

    #[test]
    fn test_non_date_month_rejected() {
        let month = Column::new("month", vec![Scalar::Int(3)]);
        let category = Column::new("c", vec!["a".into()]);
        let value = Column::new("v", vec![Scalar::Int(1)]);
        assert!(MonthlyPivot::from_columns(&month, &category, &value).is_err());
    }
}
