//! Column layout of the daily rental dataset and the value types read from it.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;

use crate::error::{RentalError, Result};

pub const INSTANT: &str = "instant";
pub const DTEDAY: &str = "dteday";
pub const SEASON: &str = "season";
pub const YR: &str = "yr";
pub const MNTH: &str = "mnth";
pub const HOLIDAY: &str = "holiday";
pub const WEEKDAY: &str = "weekday";
pub const WORKINGDAY: &str = "workingday";
pub const WEATHERSIT: &str = "weathersit";
pub const TEMP: &str = "temp";
pub const ATEMP: &str = "atemp";
pub const HUM: &str = "hum";
pub const WINDSPEED: &str = "windspeed";
pub const CASUAL: &str = "casual";
pub const REGISTERED: &str = "registered";
pub const CNT: &str = "cnt";

/// Every column the loader insists on, in file order.
pub const REQUIRED_COLUMNS: [&str; 16] = [
    INSTANT, DTEDAY, SEASON, YR, MNTH, HOLIDAY, WEEKDAY, WORKINGDAY, WEATHERSIT, TEMP, ATEMP,
    HUM, WINDSPEED, CASUAL, REGISTERED, CNT,
];

/// Count columns, read as `Int64`.
pub(crate) const COUNT_COLUMNS: [&str; 5] = [INSTANT, YR, CASUAL, REGISTERED, CNT];

/// Categorical columns, kept as their string labels ("1", "Spring", ...).
pub(crate) const LABEL_COLUMNS: [&str; 6] = [SEASON, MNTH, HOLIDAY, WEEKDAY, WORKINGDAY, WEATHERSIT];

// 1970-01-01 counted from 0001-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Month {
    January = 1,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    pub fn number(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }

    pub fn abbrev(self) -> &'static str {
        &self.name()[..3]
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts `1`..`12`, full English names and three-letter abbreviations,
/// case-insensitively.
impl FromStr for Month {
    type Err = RentalError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(n) = s.parse::<usize>() {
            return match n {
                1..=12 => Ok(Month::ALL[n - 1]),
                _ => Err(RentalError::DataFormat(format!("month number out of range: {n}"))),
            };
        }
        Month::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s) || m.abbrev().eq_ignore_ascii_case(s))
            .ok_or_else(|| RentalError::DataFormat(format!("unknown month `{s}`")))
    }
}

pub(crate) fn date_from_epoch_days(days: i32) -> Result<NaiveDate> {
    days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or_else(|| RentalError::DataFormat(format!("date out of range: {days} days")))
}

pub(crate) fn dates(df: &DataFrame, name: &str) -> Result<Vec<NaiveDate>> {
    let days = df.column(name)?.cast(&DataType::Int32)?;
    let values = days
        .i32()?
        .into_iter()
        .map(|d| {
            d.ok_or_else(|| null_in(name)).and_then(date_from_epoch_days)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(values)
}

fn null_in(name: &str) -> RentalError {
    RentalError::DataFormat(format!("null value in `{name}`"))
}

pub(crate) fn ints(df: &DataFrame, name: &str) -> Result<Vec<i64>> {
    let series = df.column(name)?.cast(&DataType::Int64)?;
    let values = series
        .i64()?
        .into_iter()
        .map(|v| v.ok_or_else(|| null_in(name)))
        .collect::<Result<Vec<_>>>()?;
    Ok(values)
}

pub(crate) fn floats(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let series = df.column(name)?.cast(&DataType::Float64)?;
    let values = series
        .f64()?
        .into_iter()
        .map(|v| v.ok_or_else(|| null_in(name)))
        .collect::<Result<Vec<_>>>()?;
    Ok(values)
}

pub(crate) fn labels(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let series = df.column(name)?.cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string).ok_or_else(|| null_in(name)))
        .collect::<Result<Vec<_>>>()?;
    Ok(values)
}
