use log::debug;
use polars::prelude::*;
use serde::Serialize;

use crate::aggregate::*;
use crate::error::Result;
use crate::record::{
    CASUAL, CNT, DTEDAY, HOLIDAY, MNTH, REGISTERED, SEASON, WEATHERSIT, WEEKDAY, WORKINGDAY, YR,
};
use crate::state::AppState;
use crate::summary::{headline, histogram, shares, Bin, HeadlineMetrics, RfmSummary, Share};
use crate::table::DateRange;

/// Everything the presentation layer draws for one range.
///
/// Headline metrics and daily series cover the active range. The RFM
/// summary and every chart are computed over the whole table, independent
/// of the range.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub range: DateRange,
    pub headline: HeadlineMetrics,
    pub daily_total: Vec<DailyCount>,
    pub daily_casual: Vec<DailyCount>,
    pub daily_registered: Vec<DailyCount>,
    pub rfm: RfmSummary,
    pub recency_histogram: Vec<Bin>,
    pub frequency_histogram: Vec<Bin>,
    pub monetary_histogram: Vec<Bin>,
    pub monthly_trend: Vec<MonthlyCount>,
    pub season_weather: Vec<SeasonWeatherMean>,
    pub yearly_users: Vec<YearlyUserMean>,
    pub holiday_split: Vec<LabelCount>,
    pub holiday_shares: Vec<Share>,
    pub working_day_split: Vec<LabelCount>,
    pub working_day_shares: Vec<Share>,
    pub weekday_means: Vec<LabelMean>,
}

impl Dashboard {
    pub fn compute(state: &AppState, bins: usize) -> Result<Self> {
        debug!("recomputing dashboard for {}", state.range());
        let view = state.view()?;
        let full = state.table();

        let rfm_rows = rfm_proxy(full)?;
        let column = |f: fn(&RfmRow) -> i64| -> Vec<f64> {
            rfm_rows.iter().map(|r| f(r) as f64).collect()
        };
        let holiday = holiday_split(full)?;
        let working_day = working_day_split(full)?;

        Ok(Dashboard {
            range: state.range(),
            headline: headline(&view)?,
            daily_total: daily_total(&view)?,
            daily_casual: daily_casual(&view)?,
            daily_registered: daily_registered(&view)?,
            rfm: RfmSummary::from_rows(&rfm_rows),
            recency_histogram: histogram(&column(|r| r.recency_days), bins),
            frequency_histogram: histogram(&column(|r| r.frequency), bins),
            monetary_histogram: histogram(&column(|r| r.monetary), bins),
            monthly_trend: monthly_trend(full)?,
            season_weather: season_weather_means(full)?,
            yearly_users: yearly_user_means(full)?,
            holiday_shares: shares(&holiday),
            holiday_split: holiday,
            working_day_shares: shares(&working_day),
            working_day_split: working_day,
            weekday_means: weekday_means(full)?,
        })
    }

    /// Named frames for tabular output, one per aggregate.
    pub fn frames(&self) -> Result<Vec<(&'static str, DataFrame)>> {
        let daily = |rows: &[DailyCount], name: &str| {
            df!(
                DTEDAY => rows.iter().map(|r| r.date).collect::<Vec<_>>(),
                name => rows.iter().map(|r| r.count).collect::<Vec<_>>()
            )
        };
        let split = |rows: &[LabelCount], name: &str| {
            df!(
                name => rows.iter().map(|r| r.label.clone()).collect::<Vec<_>>(),
                CNT => rows.iter().map(|r| r.count).collect::<Vec<_>>()
            )
        };
        let bins = |bins: &[Bin]| {
            df!(
                "lower" => bins.iter().map(|b| b.lower).collect::<Vec<_>>(),
                "upper" => bins.iter().map(|b| b.upper).collect::<Vec<_>>(),
                "count" => bins.iter().map(|b| b.count as u64).collect::<Vec<_>>()
            )
        };

        Ok(vec![
            ("daily_total", daily(&self.daily_total, CNT)?),
            ("daily_casual", daily(&self.daily_casual, CASUAL)?),
            ("daily_registered", daily(&self.daily_registered, REGISTERED)?),
            ("recency_histogram", bins(&self.recency_histogram)?),
            ("frequency_histogram", bins(&self.frequency_histogram)?),
            ("monetary_histogram", bins(&self.monetary_histogram)?),
            (
                "monthly_trend",
                df!(
                    YR => self.monthly_trend.iter().map(|r| r.year).collect::<Vec<_>>(),
                    MNTH => self.monthly_trend.iter().map(|r| r.month.name()).collect::<Vec<_>>(),
                    CNT => self.monthly_trend.iter().map(|r| r.count).collect::<Vec<_>>()
                )?,
            ),
            (
                "season_weather",
                df!(
                    SEASON => self.season_weather.iter().map(|r| r.season.clone()).collect::<Vec<_>>(),
                    WEATHERSIT => self.season_weather.iter().map(|r| r.weather.clone()).collect::<Vec<_>>(),
                    CNT => self.season_weather.iter().map(|r| r.mean).collect::<Vec<_>>()
                )?,
            ),
            (
                "yearly_users",
                df!(
                    YR => self.yearly_users.iter().map(|r| r.year).collect::<Vec<_>>(),
                    CASUAL => self.yearly_users.iter().map(|r| r.casual).collect::<Vec<_>>(),
                    REGISTERED => self.yearly_users.iter().map(|r| r.registered).collect::<Vec<_>>()
                )?,
            ),
            ("holiday_split", split(&self.holiday_split, HOLIDAY)?),
            ("working_day_split", split(&self.working_day_split, WORKINGDAY)?),
            (
                "weekday_means",
                df!(
                    WEEKDAY => self.weekday_means.iter().map(|r| r.label.clone()).collect::<Vec<_>>(),
                    CNT => self.weekday_means.iter().map(|r| r.mean).collect::<Vec<_>>()
                )?,
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::DEFAULT_BINS;
    use crate::table::testdata::*;

    #[test]
    fn filtered_metrics_and_unfiltered_charts() {
        let state = AppState::with_bounds(days(), Some(ymd(2012, 1, 1)), None);
        let dash = Dashboard::compute(&state, DEFAULT_BINS).unwrap();

        assert_eq!(dash.headline.total, 800);
        assert_eq!(dash.daily_total.len(), 2);
        // charts ignore the range
        assert_eq!(dash.monthly_trend.len(), 4);
        assert_eq!(dash.rfm.recency, 257.8);
        assert_eq!(
            dash.recency_histogram.iter().map(|b| b.count).sum::<usize>(),
            5
        );
        assert_eq!(dash.holiday_split.iter().map(|s| s.count).sum::<i64>(), 1800);
        assert_eq!(dash.holiday_shares.len(), 2);
    }

    #[test]
    fn empty_range_still_computes() {
        let state = AppState::with_bounds(days(), Some(ymd(2011, 1, 3)), Some(ymd(2011, 1, 31)));
        let dash = Dashboard::compute(&state, DEFAULT_BINS).unwrap();
        assert_eq!(dash.headline, HeadlineMetrics::default());
        assert!(dash.daily_total.is_empty());
        assert_eq!(dash.weekday_means.len(), 4);
    }

    #[test]
    fn frames_cover_every_aggregate() {
        let dash = Dashboard::compute(&AppState::new(days()), 4).unwrap();
        let frames = dash.frames().unwrap();
        let names: Vec<&str> = frames.iter().map(|(n, _)| *n).collect();
        assert_eq!(names.len(), 12);
        assert!(names.contains(&"monthly_trend"));

        let (_, monthly) = frames.iter().find(|(n, _)| *n == "monthly_trend").unwrap();
        assert_eq!(monthly.height(), 4);
        assert_eq!(monthly.get_column_names(), vec![YR, MNTH, CNT]);

        let (_, daily) = &frames[0];
        assert_eq!(daily.column(DTEDAY).unwrap().dtype(), &DataType::Date);
        assert_eq!(daily.height(), 5);
    }
}
