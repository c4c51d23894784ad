// West Java birth records: cleaning, aggregation, ARIMA(1,1,1) forecast
// and the dashboard pages built on top of them.

pub mod aggregate;
pub mod chart;
pub mod cleaning;
pub mod config;
pub mod error;
pub mod forecast;
pub mod geo;
pub mod output;
pub mod shell;
pub mod types;
pub mod util;
pub mod views;

pub use config::AppConfig;
pub use error::{ForecastError, ReportError, Result};
pub use types::BirthRecord;
