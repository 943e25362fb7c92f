pub mod currency;
pub mod data;
pub mod tui;
