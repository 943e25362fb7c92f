use std::fmt;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use chrono::NaiveDate;
use log::{debug, info, warn};
use polars::prelude::*;
use serde::Serialize;

use crate::error::{RentalError, Result};
use crate::record::{
    self, Month, CASUAL, CNT, COUNT_COLUMNS, DTEDAY, LABEL_COLUMNS, MNTH, REGISTERED,
};

/// Anything the aggregations can run over: the full table or a filtered view.
pub trait RentalFrame {
    fn frame(&self) -> &DataFrame;

    fn lazy(&self) -> LazyFrame {
        self.frame().clone().lazy()
    }

    fn len(&self) -> usize {
        self.frame().height()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Inclusive range of days. `start > end` is allowed and selects nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    pub fn single(day: NaiveDate) -> Self {
        DateRange::new(day, day)
    }

    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Pulls both ends inside `bounds`.
    pub fn clamp_to(&self, bounds: DateRange) -> DateRange {
        DateRange {
            start: self.start.clamp(bounds.start, bounds.end),
            end: self.end.clamp(bounds.start, bounds.end),
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} .. {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// The loaded dataset, sorted by `dteday`.
#[derive(Debug, Clone)]
pub struct RentalTable {
    df: DataFrame,
    bounds: DateRange,
    inconsistent_totals: usize,
}

impl RentalTable {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("loading rental data: {:?}", path);
        let file = File::open(path)?;
        let df = csv_options().into_reader_with_file_handle(file).finish()?;
        Self::from_frame(df)
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let cursor = Cursor::new(bytes.into());
        let df = csv_options().into_reader_with_file_handle(cursor).finish()?;
        Self::from_frame(df)
    }

    fn from_frame(df: DataFrame) -> Result<Self> {
        let names = df.get_column_names();
        if let Some(missing) = record::REQUIRED_COLUMNS
            .iter()
            .find(|column| !names.contains(*column))
        {
            return Err(RentalError::Schema {
                column: missing.to_string(),
            });
        }
        if df.height() == 0 {
            return Err(RentalError::DataFormat("dataset contains no rows".into()));
        }
        check_dates(df.column(DTEDAY)?)?;

        let mut casts = vec![col(DTEDAY).cast(DataType::Date)];
        casts.extend(COUNT_COLUMNS.map(|c| col(c).strict_cast(DataType::Int64)));
        casts.extend(LABEL_COLUMNS.map(|c| col(c).cast(DataType::String)));
        let df = df
            .lazy()
            .with_columns(casts)
            .sort([DTEDAY], SortMultipleOptions::default())
            .collect()?;
        check_complete(&df)?;
        check_months(&df)?;

        let days = record::dates(&df, DTEDAY)?;
        let (Some(&min), Some(&max)) = (days.first(), days.last()) else {
            return Err(RentalError::DataFormat("dataset contains no rows".into()));
        };

        let inconsistent_totals = df
            .clone()
            .lazy()
            .filter(col(CNT).neq(col(CASUAL) + col(REGISTERED)))
            .collect()?
            .height();
        if inconsistent_totals > 0 {
            warn!(
                "{} rows where cnt != casual + registered",
                inconsistent_totals
            );
        }

        let table = RentalTable {
            df,
            bounds: DateRange::new(min, max),
            inconsistent_totals,
        };
        info!("loaded {} rows, {}", table.len(), table.bounds);
        Ok(table)
    }

    pub fn min_date(&self) -> NaiveDate {
        self.bounds.start
    }

    pub fn max_date(&self) -> NaiveDate {
        self.bounds.end
    }

    /// `[min(dteday), max(dteday)]`, the default filter.
    pub fn full_range(&self) -> DateRange {
        self.bounds
    }

    /// Rows breaking `cnt == casual + registered`.
    pub fn inconsistent_totals(&self) -> usize {
        self.inconsistent_totals
    }

    pub fn filter(&self, range: DateRange) -> Result<FilteredView> {
        debug!("filter {}", range);
        let df = self
            .lazy()
            .filter(
                col(DTEDAY)
                    .gt_eq(lit(range.start).cast(DataType::Date))
                    .and(col(DTEDAY).lt_eq(lit(range.end).cast(DataType::Date))),
            )
            .collect()?;
        Ok(FilteredView { range, df })
    }
}

impl RentalFrame for RentalTable {
    fn frame(&self) -> &DataFrame {
        &self.df
    }
}

/// Read-only slice of a [`RentalTable`] bounded by a [`DateRange`].
#[derive(Debug, Clone)]
pub struct FilteredView {
    range: DateRange,
    df: DataFrame,
}

impl FilteredView {
    pub fn range(&self) -> DateRange {
        self.range
    }
}

impl RentalFrame for FilteredView {
    fn frame(&self) -> &DataFrame {
        &self.df
    }
}

fn csv_options() -> CsvReadOptions {
    // dates are only recognised when every sampled value parses, so sample all rows
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .map_parse_options(|o| o.with_try_parse_dates(true))
}

fn check_dates(dates: &Series) -> Result<()> {
    match dates.dtype() {
        DataType::Date | DataType::Datetime(_, _) => {}
        DataType::String => {
            let bad = dates
                .str()?
                .into_iter()
                .flatten()
                .find(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").is_err())
                .map(str::to_string);
            return Err(RentalError::DataFormat(match bad {
                Some(v) => format!("`{DTEDAY}` holds a value that is not a date: `{v}`"),
                None => format!("`{DTEDAY}` could not be parsed as dates"),
            }));
        }
        other => {
            return Err(RentalError::DataFormat(format!(
                "`{DTEDAY}` must hold calendar dates, found {other}"
            )))
        }
    }
    if dates.null_count() > 0 {
        return Err(RentalError::DataFormat(format!(
            "`{DTEDAY}` has {} missing values",
            dates.null_count()
        )));
    }
    Ok(())
}

/// Counts and labels must be present on every row.
fn check_complete(df: &DataFrame) -> Result<()> {
    for name in COUNT_COLUMNS.iter().chain(LABEL_COLUMNS.iter()) {
        let nulls = df.column(name)?.null_count();
        if nulls > 0 {
            return Err(RentalError::DataFormat(format!(
                "`{name}` has {nulls} missing values"
            )));
        }
    }
    Ok(())
}

fn check_months(df: &DataFrame) -> Result<()> {
    for label in record::labels(df, MNTH)? {
        label.parse::<Month>()?;
    }
    Ok(())
}
