//! Scalar reductions and chart-ready binning.

use polars::prelude::*;
use serde::Serialize;

use crate::aggregate::{LabelCount, RfmRow};
use crate::error::Result;
use crate::record::{self, CASUAL, CNT, REGISTERED};
use crate::table::RentalFrame;

/// Dashboard histograms use twenty bins.
pub const DEFAULT_BINS: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HeadlineMetrics {
    pub casual: i64,
    pub registered: i64,
    pub total: i64,
}

/// Casual, registered and grand totals. Zero for an empty view.
pub fn headline(table: &impl RentalFrame) -> Result<HeadlineMetrics> {
    let df = table
        .lazy()
        .select([col(CASUAL).sum(), col(REGISTERED).sum(), col(CNT).sum()])
        .collect()?;
    let first = |name| -> Result<i64> {
        Ok(record::ints(&df, name)?.first().copied().unwrap_or(0))
    };
    Ok(HeadlineMetrics {
        casual: first(CASUAL)?,
        registered: first(REGISTERED)?,
        total: first(CNT)?,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RfmSummary {
    /// Mean days before the latest date, to one decimal.
    pub recency: f64,
    /// Mean count of days sharing the same total, to two decimals.
    pub frequency: f64,
    /// Mean `cnt * registered`, unrounded.
    pub monetary: f64,
}

impl RfmSummary {
    pub fn from_rows(rows: &[RfmRow]) -> Self {
        if rows.is_empty() {
            return RfmSummary::default();
        }
        let n = rows.len() as f64;
        let mean = |f: fn(&RfmRow) -> i64| rows.iter().map(|r| f(r) as f64).sum::<f64>() / n;
        RfmSummary {
            recency: round_to(mean(|r| r.recency_days), 1),
            frequency: round_to(mean(|r| r.frequency), 2),
            monetary: mean(|r| r.monetary),
        }
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width bins spanning `[min, max]`; the last bin is closed on the right.
///
/// A constant series lands in a single bin, and no values means no bins.
pub fn histogram(values: &[f64], bins: usize) -> Vec<Bin> {
    let Some(min) = values.iter().copied().reduce(f64::min) else {
        return Vec::new();
    };
    let max = values.iter().copied().fold(min, f64::max);
    if min == max {
        return vec![Bin {
            lower: min,
            upper: max,
            count: values.len(),
        }];
    }

    let bins = bins.max(1);
    let width = (max - min) / bins as f64;
    let mut out: Vec<Bin> = (0..bins)
        .map(|i| Bin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();
    for v in values {
        let i = (((v - min) / width) as usize).min(bins - 1);
        out[i].count += 1;
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share {
    pub label: String,
    pub percent: f64,
}

/// Each label's percentage of the split total.
pub fn shares(split: &[LabelCount]) -> Vec<Share> {
    let total: i64 = split.iter().map(|s| s.count).sum();
    split
        .iter()
        .map(|s| Share {
            label: s.label.clone(),
            percent: if total == 0 {
                0.0
            } else {
                s.count as f64 * 100.0 / total as f64
            },
        })
        .collect()
}
