use chrono::{Days, Months, NaiveDate};
use log::{debug, warn};

use crate::error::Result;
use crate::table::{DateRange, FilteredView, RentalTable};

/// How far one range adjustment moves an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    DayBack,
    DayForward,
    MonthBack,
    MonthForward,
}

impl Step {
    fn apply(self, day: NaiveDate) -> Option<NaiveDate> {
        match self {
            Step::DayBack => day.checked_sub_days(Days::new(1)),
            Step::DayForward => day.checked_add_days(Days::new(1)),
            Step::MonthBack => day.checked_sub_months(Months::new(1)),
            Step::MonthForward => day.checked_add_months(Months::new(1)),
        }
    }
}

/// The loaded table and the active filter, threaded through every call.
#[derive(Debug, Clone)]
pub struct AppState {
    table: RentalTable,
    range: DateRange,
}

impl AppState {
    pub fn new(table: RentalTable) -> Self {
        let range = table.full_range();
        AppState { table, range }
    }

    /// Starts from the requested bounds, falling back to the table's own
    /// and clamping anything outside them.
    pub fn with_bounds(
        table: RentalTable,
        since: Option<NaiveDate>,
        until: Option<NaiveDate>,
    ) -> Self {
        let bounds = table.full_range();
        let requested = DateRange::new(
            since.unwrap_or(bounds.start),
            until.unwrap_or(bounds.end),
        );
        let range = requested.clamp_to(bounds);
        if range != requested {
            warn!("range {} clamped to {}", requested, range);
        }
        AppState { table, range }
    }

    pub fn table(&self) -> &RentalTable {
        &self.table
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn view(&self) -> Result<FilteredView> {
        self.table.filter(self.range)
    }

    pub fn shift_start(&mut self, step: Step) {
        if let Some(day) = step.apply(self.range.start) {
            self.range.start = clamp_day(day, self.table.full_range());
        }
        debug!("range now {}", self.range);
    }

    pub fn shift_end(&mut self, step: Step) {
        if let Some(day) = step.apply(self.range.end) {
            self.range.end = clamp_day(day, self.table.full_range());
        }
        debug!("range now {}", self.range);
    }

    pub fn reset(&mut self) {
        self.range = self.table.full_range();
    }
}

fn clamp_day(day: NaiveDate, bounds: DateRange) -> NaiveDate {
    day.clamp(bounds.start, bounds.end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::testdata::*;
    use crate::table::RentalFrame;

    #[test]
    fn new_state_covers_full_range() {
        let state = AppState::new(days());
        assert_eq!(state.range(), DateRange::new(ymd(2011, 1, 1), ymd(2012, 3, 1)));
        assert_eq!(state.view().unwrap().len(), 5);
    }

    #[test]
    fn requested_bounds_are_clamped() {
        let state = AppState::with_bounds(days(), Some(ymd(2010, 1, 1)), Some(ymd(2011, 6, 30)));
        assert_eq!(state.range(), DateRange::new(ymd(2011, 1, 1), ymd(2011, 6, 30)));
        assert_eq!(state.view().unwrap().len(), 3);

        let state = AppState::with_bounds(days(), None, None);
        assert_eq!(state.range(), state.table().full_range());
    }

    #[test]
    fn shifting_moves_and_clamps_endpoints() {
        let mut state = AppState::new(days());
        state.shift_start(Step::MonthForward);
        assert_eq!(state.range().start, ymd(2011, 2, 1));
        state.shift_start(Step::DayForward);
        assert_eq!(state.range().start, ymd(2011, 2, 2));
        state.shift_end(Step::DayForward);
        assert_eq!(state.range().end, ymd(2012, 3, 1));
        state.shift_end(Step::MonthBack);
        assert_eq!(state.range().end, ymd(2012, 2, 1));
        assert_eq!(state.view().unwrap().len(), 1);

        state.reset();
        assert_eq!(state.range(), state.table().full_range());
    }

    #[test]
    fn start_can_pass_end_and_view_goes_empty() {
        let mut state = AppState::with_bounds(days(), Some(ymd(2011, 1, 2)), Some(ymd(2011, 1, 2)));
        state.shift_start(Step::DayForward);
        assert!(state.range().is_inverted());
        assert!(state.view().unwrap().is_empty());
    }
}
