//! Grouping aggregations over a [`RentalFrame`].
//!
//! Each operation runs one polars lazy query and converts the collected
//! frame into plain rows. Nothing is cached: every call re-derives its
//! result from the frame it is given.

use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;

use crate::error::Result;
use crate::record::{
    self, Month, CASUAL, CNT, DTEDAY, HOLIDAY, INSTANT, MNTH, REGISTERED, SEASON, WEATHERSIT,
    WEEKDAY, WORKINGDAY, YR,
};
use crate::table::RentalFrame;

pub const RECENCY: &str = "recency";
pub const FREQUENCY: &str = "frequency";
pub const MONETARY: &str = "monetary";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    pub year: i64,
    pub month: Month,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonWeatherMean {
    pub season: String,
    pub weather: String,
    pub mean: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearlyUserMean {
    pub year: i64,
    pub casual: f64,
    pub registered: f64,
}

/// Summed count per categorical label (holiday / working-day flag).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

/// Mean count per categorical label (weekday).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelMean {
    pub label: String,
    pub mean: f64,
}

/// Per-day recency / frequency / monetary proxy.
///
/// These are not customer RFM scores: `frequency` is the number of days
/// sharing this day's exact `cnt`, and `monetary` is `cnt * registered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RfmRow {
    pub instant: i64,
    pub recency_days: i64,
    pub frequency: i64,
    pub monetary: i64,
}

fn daily_sum(table: &impl RentalFrame, column: &str) -> Result<Vec<DailyCount>> {
    let df = table
        .lazy()
        .group_by([col(DTEDAY)])
        .agg([col(column).sum()])
        .sort([DTEDAY], SortMultipleOptions::default())
        .collect()?;
    let rows = record::dates(&df, DTEDAY)?
        .into_iter()
        .zip(record::ints(&df, column)?)
        .map(|(date, count)| DailyCount { date, count })
        .collect();
    Ok(rows)
}

/// Total rentals per day, in date order.
pub fn daily_total(table: &impl RentalFrame) -> Result<Vec<DailyCount>> {
    daily_sum(table, CNT)
}

pub fn daily_casual(table: &impl RentalFrame) -> Result<Vec<DailyCount>> {
    daily_sum(table, CASUAL)
}

pub fn daily_registered(table: &impl RentalFrame) -> Result<Vec<DailyCount>> {
    daily_sum(table, REGISTERED)
}

/// Total rentals per (year, month) present in the table, ordered by year
/// and then January through December.
pub fn monthly_trend(table: &impl RentalFrame) -> Result<Vec<MonthlyCount>> {
    let df = table
        .lazy()
        .group_by([col(YR), col(MNTH)])
        .agg([col(CNT).sum()])
        .collect()?;
    let mut rows = record::ints(&df, YR)?
        .into_iter()
        .zip(record::labels(&df, MNTH)?)
        .zip(record::ints(&df, CNT)?)
        .map(|((year, month), count)| -> Result<MonthlyCount> {
            Ok(MonthlyCount {
                year,
                month: month.parse()?,
                count,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    rows.sort_by_key(|r| (r.year, r.month));
    Ok(rows)
}

pub fn season_weather_means(table: &impl RentalFrame) -> Result<Vec<SeasonWeatherMean>> {
    let df = table
        .lazy()
        .group_by([col(SEASON), col(WEATHERSIT)])
        .agg([col(CNT).mean()])
        .sort([SEASON, WEATHERSIT], SortMultipleOptions::default())
        .collect()?;
    let rows = record::labels(&df, SEASON)?
        .into_iter()
        .zip(record::labels(&df, WEATHERSIT)?)
        .zip(record::floats(&df, CNT)?)
        .map(|((season, weather), mean)| SeasonWeatherMean {
            season,
            weather,
            mean,
        })
        .collect();
    Ok(rows)
}

/// Average casual and registered rentals per day, by year.
pub fn yearly_user_means(table: &impl RentalFrame) -> Result<Vec<YearlyUserMean>> {
    let df = table
        .lazy()
        .group_by([col(YR)])
        .agg([col(CASUAL).mean(), col(REGISTERED).mean()])
        .sort([YR], SortMultipleOptions::default())
        .collect()?;
    let rows = record::ints(&df, YR)?
        .into_iter()
        .zip(record::floats(&df, CASUAL)?)
        .zip(record::floats(&df, REGISTERED)?)
        .map(|((year, casual), registered)| YearlyUserMean {
            year,
            casual,
            registered,
        })
        .collect();
    Ok(rows)
}

fn label_sum(table: &impl RentalFrame, label: &str) -> Result<Vec<LabelCount>> {
    let df = table
        .lazy()
        .group_by([col(label)])
        .agg([col(CNT).sum()])
        .sort([label], SortMultipleOptions::default())
        .collect()?;
    let rows = record::labels(&df, label)?
        .into_iter()
        .zip(record::ints(&df, CNT)?)
        .map(|(label, count)| LabelCount { label, count })
        .collect();
    Ok(rows)
}

pub fn holiday_split(table: &impl RentalFrame) -> Result<Vec<LabelCount>> {
    label_sum(table, HOLIDAY)
}

pub fn working_day_split(table: &impl RentalFrame) -> Result<Vec<LabelCount>> {
    label_sum(table, WORKINGDAY)
}

pub fn weekday_means(table: &impl RentalFrame) -> Result<Vec<LabelMean>> {
    let df = table
        .lazy()
        .group_by([col(WEEKDAY)])
        .agg([col(CNT).mean()])
        .sort([WEEKDAY], SortMultipleOptions::default())
        .collect()?;
    let rows = record::labels(&df, WEEKDAY)?
        .into_iter()
        .zip(record::floats(&df, CNT)?)
        .map(|(label, mean)| LabelMean { label, mean })
        .collect();
    Ok(rows)
}

/// One [`RfmRow`] per table row, in table order.
pub fn rfm_proxy(table: &impl RentalFrame) -> Result<Vec<RfmRow>> {
    if table.is_empty() {
        return Ok(Vec::new());
    }
    let days = || col(DTEDAY).cast(DataType::Int32);
    let df = table
        .lazy()
        .select([
            col(INSTANT),
            (days().max() - days()).cast(DataType::Int64).alias(RECENCY),
            col(CNT)
                .len()
                .over([col(CNT)])
                .cast(DataType::Int64)
                .alias(FREQUENCY),
            (col(CNT) * col(REGISTERED)).alias(MONETARY),
        ])
        .collect()?;
    let rows = record::ints(&df, INSTANT)?
        .into_iter()
        .zip(record::ints(&df, RECENCY)?)
        .zip(record::ints(&df, FREQUENCY)?)
        .zip(record::ints(&df, MONETARY)?)
        .map(|(((instant, recency_days), frequency), monetary)| RfmRow {
            instant,
            recency_days,
            frequency,
            monetary,
        })
        .collect();
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::headline;
    use crate::table::testdata::*;
    use crate::table::DateRange;

    #[test]
    fn daily_aggregates_follow_date_order() {
        let table = days();
        let totals = daily_total(&table).unwrap();
        assert_eq!(
            totals,
            vec![
                DailyCount { date: ymd(2011, 1, 1), count: 400 },
                DailyCount { date: ymd(2011, 1, 2), count: 400 },
                DailyCount { date: ymd(2011, 2, 1), count: 200 },
                DailyCount { date: ymd(2012, 1, 15), count: 600 },
                DailyCount { date: ymd(2012, 3, 1), count: 200 },
            ]
        );
        let casual: Vec<i64> = daily_casual(&table).unwrap().iter().map(|d| d.count).collect();
        assert_eq!(casual, vec![100, 120, 50, 80, 30]);
        let registered: Vec<i64> = daily_registered(&table)
            .unwrap()
            .iter()
            .map(|d| d.count)
            .collect();
        assert_eq!(registered, vec![300, 280, 150, 520, 170]);
    }

    #[test]
    fn two_day_totals() {
        let table = two_days();
        assert_eq!(
            daily_total(&table).unwrap(),
            vec![
                DailyCount { date: ymd(2011, 1, 1), count: 400 },
                DailyCount { date: ymd(2011, 1, 2), count: 200 },
            ]
        );
        let metrics = headline(&table).unwrap();
        assert_eq!(metrics.total, 600);
        assert_eq!(metrics.casual, 150);
        assert_eq!(metrics.registered, 450);
    }

    #[test]
    fn daily_total_sums_to_grand_total() {
        let table = days();
        let sum: i64 = daily_total(&table).unwrap().iter().map(|d| d.count).sum();
        assert_eq!(sum, headline(&table).unwrap().total);
        assert_eq!(sum, 1800);
    }

    #[test]
    fn full_range_filter_reproduces_unfiltered_aggregates() {
        let table = days();
        let view = table.filter(table.full_range()).unwrap();
        assert_eq!(daily_total(&view).unwrap(), daily_total(&table).unwrap());
        assert_eq!(monthly_trend(&view).unwrap(), monthly_trend(&table).unwrap());
        assert_eq!(holiday_split(&view).unwrap(), holiday_split(&table).unwrap());
        assert_eq!(weekday_means(&view).unwrap(), weekday_means(&table).unwrap());
        assert_eq!(rfm_proxy(&view).unwrap(), rfm_proxy(&table).unwrap());
    }

    #[test]
    fn single_day_filter_returns_that_day() {
        let table = days();
        let day = ymd(2011, 1, 2);
        let view = table.filter(DateRange::single(day)).unwrap();
        assert_eq!(daily_total(&view).unwrap(), vec![DailyCount { date: day, count: 400 }]);
        assert_eq!(daily_casual(&view).unwrap(), vec![DailyCount { date: day, count: 120 }]);
        assert_eq!(
            daily_registered(&view).unwrap(),
            vec![DailyCount { date: day, count: 280 }]
        );
    }

    #[test]
    fn monthly_trend_orders_months_by_calendar() {
        let trend = monthly_trend(&days()).unwrap();
        let keys: Vec<(i64, Month, i64)> =
            trend.iter().map(|r| (r.year, r.month, r.count)).collect();
        assert_eq!(
            keys,
            vec![
                (0, Month::January, 800),
                (0, Month::February, 200),
                (1, Month::January, 600),
                (1, Month::March, 200),
            ]
        );
    }

    #[test]
    fn monthly_trend_accepts_numeric_months() {
        let trend = monthly_trend(&two_days()).unwrap();
        assert_eq!(
            trend,
            vec![MonthlyCount { year: 0, month: Month::January, count: 600 }]
        );
    }

    #[test]
    fn season_weather_and_yearly_means() {
        let table = days();
        let means = season_weather_means(&table).unwrap();
        let flat: Vec<(&str, &str, f64)> = means
            .iter()
            .map(|m| (m.season.as_str(), m.weather.as_str(), m.mean))
            .collect();
        assert_eq!(
            flat,
            vec![
                ("Spring", "Clear", 400.0),
                ("Spring", "Light Rain", 200.0),
                ("Spring", "Mist", 400.0),
            ]
        );

        let users = yearly_user_means(&table).unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].year, 0);
        assert!((users[0].casual - 90.0).abs() < 1e-9);
        assert!((users[0].registered - 730.0 / 3.0).abs() < 1e-9);
        assert_eq!(users[1].year, 1);
        assert!((users[1].casual - 55.0).abs() < 1e-9);
        assert!((users[1].registered - 345.0).abs() < 1e-9);
    }

    #[test]
    fn holiday_and_working_day_splits_partition_the_total() {
        let table = days();
        let holiday = holiday_split(&table).unwrap();
        assert_eq!(
            holiday,
            vec![
                LabelCount { label: "0".into(), count: 1400 },
                LabelCount { label: "1".into(), count: 400 },
            ]
        );
        let working = working_day_split(&table).unwrap();
        assert_eq!(
            working,
            vec![
                LabelCount { label: "0".into(), count: 1400 },
                LabelCount { label: "1".into(), count: 400 },
            ]
        );
        let total = headline(&table).unwrap().total;
        assert_eq!(holiday.iter().map(|s| s.count).sum::<i64>(), total);
        assert_eq!(working.iter().map(|s| s.count).sum::<i64>(), total);
    }

    #[test]
    fn weekday_means_by_label() {
        let means = weekday_means(&days()).unwrap();
        let flat: Vec<(&str, f64)> = means.iter().map(|m| (m.label.as_str(), m.mean)).collect();
        assert_eq!(flat, vec![("0", 500.0), ("2", 200.0), ("4", 200.0), ("6", 400.0)]);
    }

    #[test]
    fn rfm_proxy_per_row() {
        let rows = rfm_proxy(&days()).unwrap();
        assert_eq!(
            rows,
            vec![
                RfmRow { instant: 1, recency_days: 425, frequency: 2, monetary: 120_000 },
                RfmRow { instant: 2, recency_days: 424, frequency: 2, monetary: 112_000 },
                RfmRow { instant: 3, recency_days: 394, frequency: 2, monetary: 30_000 },
                RfmRow { instant: 5, recency_days: 46, frequency: 1, monetary: 312_000 },
                RfmRow { instant: 4, recency_days: 0, frequency: 2, monetary: 34_000 },
            ]
        );
    }

    #[test]
    fn empty_view_gives_empty_aggregates() {
        let table = days();
        let view = table
            .filter(DateRange::new(table.max_date(), table.min_date()))
            .unwrap();
        assert!(daily_total(&view).unwrap().is_empty());
        assert!(daily_casual(&view).unwrap().is_empty());
        assert!(monthly_trend(&view).unwrap().is_empty());
        assert!(season_weather_means(&view).unwrap().is_empty());
        assert!(yearly_user_means(&view).unwrap().is_empty());
        assert!(holiday_split(&view).unwrap().is_empty());
        assert!(working_day_split(&view).unwrap().is_empty());
        assert!(weekday_means(&view).unwrap().is_empty());
        assert!(rfm_proxy(&view).unwrap().is_empty());
    }
}
