//! Daily-report extraction for Brazilian investment funds.
//!
//! Downloads the CVM monthly `inf_diario_fi` archives covering a date range,
//! keeps one fund's rows and writes them with return and flow totals to an
//! `.xlsx` report.

use anyhow::Error;

pub mod cnpj;
pub mod config;
pub mod fetch;
pub mod period;
pub mod prompt;
pub mod record;
pub mod report;
pub mod request;
pub mod summary;

pub use config::Config;
pub use fetch::{CvmClient, DataSource, FetchError};
pub use period::YearMonth;
pub use record::FundRecord;
pub use request::{run_request, FundRequest, RequestError};
pub use summary::{summarize, FundMetrics, FundSummary, SummaryError};

pub type Result<T> = std::result::Result<T, Error>;
