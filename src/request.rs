use thiserror::Error;
use time::Date;
use tracing::{info, warn};

use crate::{
    cnpj,
    fetch::{DataSource, FetchError},
    period::{months_between, YearMonth},
    summary::{summarize, FundSummary, SummaryError},
};

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("invalid CNPJ: {0}")]
    InvalidCnpj(String),

    #[error("end date {end} is before start date {start}")]
    InvalidRange { start: Date, end: Date },

    #[error("failed to fetch daily report for {period}: {source}")]
    Fetch {
        period: YearMonth,
        #[source]
        source: FetchError,
    },

    #[error(transparent)]
    Summary(#[from] SummaryError),
}

/// A validated query for one fund over an inclusive date range.
#[derive(Debug, Clone, PartialEq)]
pub struct FundRequest {
    cnpj: String,
    start: Date,
    end: Date,
}

impl FundRequest {
    pub fn new(cnpj: impl Into<String>, start: Date, end: Date) -> Result<Self, RequestError> {
        let cnpj = cnpj.into();
        if !cnpj::is_valid(&cnpj) {
            return Err(RequestError::InvalidCnpj(cnpj));
        }
        if end < start {
            return Err(RequestError::InvalidRange { start, end });
        }
        Ok(Self { cnpj, start, end })
    }

    pub fn cnpj(&self) -> &str {
        &self.cnpj
    }

    pub fn start(&self) -> Date {
        self.start
    }

    pub fn end(&self) -> Date {
        self.end
    }
}

/// Fetches every month touched by the request, one after the other, and
/// summarizes the fund's records.
///
/// The first failing month aborts the request; no partial summary is built.
pub fn run_request(
    source: &dyn DataSource,
    request: &FundRequest,
) -> Result<FundSummary, RequestError> {
    let mut records = Vec::new();
    for period in months_between(request.start, request.end) {
        let monthly = source
            .fetch_month(period)
            .map_err(|err| RequestError::Fetch { period, source: err })?;
        if monthly.is_empty() {
            warn!(%period, "no daily report available");
        }
        records.extend(monthly);
    }
    info!(
        cnpj = request.cnpj(),
        fetched = records.len(),
        "summarizing fund records"
    );
    Ok(summarize(records, &request.cnpj, request.start, request.end)?)
}
