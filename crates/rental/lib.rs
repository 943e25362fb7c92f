//! Aggregation engine for daily bike-rental records.
//!
//! A [`RentalTable`] is loaded once from CSV and never mutated. Every
//! aggregation is a polars lazy query over either the full table or a
//! [`FilteredView`] cut to a [`DateRange`], recomputed on each call.

pub mod aggregate;
pub mod dashboard;
pub mod error;
pub mod record;
pub mod state;
pub mod summary;
pub mod table;

pub use aggregate::*;
pub use dashboard::Dashboard;
pub use error::{RentalError, Result};
pub use record::Month;
pub use state::{AppState, Step};
pub use summary::{
    headline, histogram, shares, Bin, HeadlineMetrics, RfmSummary, Share, DEFAULT_BINS,
};
pub use table::{DateRange, FilteredView, RentalFrame, RentalTable};
