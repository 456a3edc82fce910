use rust_decimal::Decimal;
use time::Date;

/// One row of the CVM daily report: a fund's position on one reporting day.
#[derive(Debug, Clone, PartialEq)]
pub struct FundRecord {
    /// CNPJ as written in the source row; compare through [`crate::cnpj::digits`].
    pub fund_id: String,
    pub report_date: Date,
    pub fund_type: String,
    pub subscriber_count: u32,
    pub quota_value: f64,
    pub net_asset_value: Decimal,
    pub daily_inflow: Decimal,
    pub daily_outflow: Decimal,
}
