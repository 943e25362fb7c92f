use config::CurrencyFormat;
use rental::Dashboard;
use serde::Serialize;

use crate::currency::format_currency;

pub const DAILY_SECTION: &str = "Daily rentals";
pub const RFM_SECTION: &str = "RFM (instant / record index)";

/// One labelled metric as shown in the overview table and metric exports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Data {
    pub section: String,
    pub metric: String,
    pub value: String,
}

impl Data {
    fn new(section: &str, metric: &str, value: String) -> Self {
        Data {
            section: section.to_string(),
            metric: metric.to_string(),
            value,
        }
    }

    pub const fn ref_array(&self) -> [&String; 3] {
        [&self.section, &self.metric, &self.value]
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Headline totals for the active range, then the RFM summary of the whole
/// table with the monetary mean printed as currency.
pub fn metric_rows(dashboard: &Dashboard, currency: &CurrencyFormat) -> Vec<Data> {
    let headline = &dashboard.headline;
    let rfm = &dashboard.rfm;
    vec![
        Data::new(DAILY_SECTION, "Casual users", headline.casual.to_string()),
        Data::new(DAILY_SECTION, "Registered users", headline.registered.to_string()),
        Data::new(DAILY_SECTION, "All users", headline.total.to_string()),
        Data::new(RFM_SECTION, "Average recency (days)", format!("{:.1}", rfm.recency)),
        Data::new(RFM_SECTION, "Average frequency", format!("{:.2}", rfm.frequency)),
        Data::new(
            RFM_SECTION,
            "Average monetary",
            format_currency(rfm.monetary, currency),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rental::{AppState, RentalTable};

    const TWO_DAYS: &str = r##"instant,dteday,season,yr,mnth,holiday,weekday,workingday,weathersit,temp,atemp,hum,windspeed,casual,registered,cnt
1,2011-01-01,1,0,1,0,6,0,2,0.34,0.36,0.80,0.16,100,300,400
2,2011-01-02,1,0,1,0,0,0,2,0.36,0.35,0.69,0.25,50,150,200
"##;

    #[test]
    fn metric_rows_format_headline_and_rfm() {
        let state = AppState::new(RentalTable::from_bytes(TWO_DAYS).unwrap());
        let dashboard = Dashboard::compute(&state, 20).unwrap();
        let rows = metric_rows(&dashboard, &CurrencyFormat::default());

        let values: Vec<(&str, &str)> = rows.iter().map(|r| (r.metric(), r.value())).collect();
        // recency 1 and 0, frequency 1 each, monetary 400*300 and 200*150
        assert_eq!(
            values,
            vec![
                ("Casual users", "150"),
                ("Registered users", "450"),
                ("All users", "600"),
                ("Average recency (days)", "0.5"),
                ("Average frequency", "1.00"),
                ("Average monetary", "AUD\u{a0}75.000,00"),
            ]
        );
        assert_eq!(rows[0].section(), DAILY_SECTION);
        assert_eq!(rows[5].ref_array()[0], RFM_SECTION);
    }
}
