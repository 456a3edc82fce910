use rust_decimal::Decimal;
use thiserror::Error;
use time::Date;

use crate::{cnpj, record::FundRecord};

#[derive(Debug, Error, PartialEq)]
pub enum SummaryError {
    #[error("no records with subscribers for CNPJ {fund_id} between {start} and {end}")]
    NoMatchingRecords {
        fund_id: String,
        start: Date,
        end: Date,
    },

    #[error("quota value on {date} is zero, return is undefined")]
    ZeroStartingQuota { date: Date },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FundMetrics {
    /// Quota appreciation between the first and last retained day, in percent.
    pub return_pct: f64,
    pub total_inflow: Decimal,
    pub total_outflow: Decimal,
    pub net_flow: Decimal,
}

impl FundMetrics {
    /// Return rounded to two decimal places, as printed and written to the report.
    pub fn return_pct_rounded(&self) -> f64 {
        (self.return_pct * 100.).round() / 100.
    }
}

#[derive(Debug, Clone)]
pub struct FundSummary {
    /// Retained records, ordered by report date.
    pub records: Vec<FundRecord>,
    pub metrics: FundMetrics,
}

/// Keeps the records of `fund_id` with at least one subscriber reported
/// within `start..=end`, and aggregates them.
///
/// Identifiers are compared on their digits only. Retained records keep
/// their input order among equal dates.
pub fn summarize(
    records: Vec<FundRecord>,
    fund_id: &str,
    start: Date,
    end: Date,
) -> Result<FundSummary, SummaryError> {
    let wanted = cnpj::digits(fund_id);
    let mut retained: Vec<FundRecord> = records
        .into_iter()
        .filter(|r| {
            r.subscriber_count >= 1
                && r.report_date >= start
                && r.report_date <= end
                && cnpj::digits(&r.fund_id) == wanted
        })
        .collect();
    retained.sort_by_key(|r| r.report_date);

    let (Some(first), Some(last)) = (retained.first(), retained.last()) else {
        return Err(SummaryError::NoMatchingRecords {
            fund_id: fund_id.to_string(),
            start,
            end,
        });
    };
    if first.quota_value == 0. {
        return Err(SummaryError::ZeroStartingQuota {
            date: first.report_date,
        });
    }
    let return_pct = ((last.quota_value / first.quota_value) - 1.) * 100.;

    let total_inflow: Decimal = retained.iter().map(|r| r.daily_inflow).sum();
    let total_outflow: Decimal = retained.iter().map(|r| r.daily_outflow).sum();

    Ok(FundSummary {
        metrics: FundMetrics {
            return_pct,
            total_inflow,
            total_outflow,
            net_flow: total_inflow - total_outflow,
        },
        records: retained,
    })
}
