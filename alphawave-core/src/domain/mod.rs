//! Domain types shared by the ingestors and the dashboard.

pub mod bar;
pub mod market;

pub use bar::{check_symbol_order, BarError, PriceBar};
pub use market::Market;
