//! Download and decoding of the monthly CVM daily-report archives.
//!
//! Each month is published as a zip holding a single semicolon-separated
//! file. Columns are located by header name, so both the legacy layout
//! (`CNPJ_FUNDO`, `TP_FUNDO`) and the class-based one (`CNPJ_FUNDO_CLASSE`,
//! `TP_FUNDO_CLASSE`) decode into the same [`FundRecord`].

use std::{
    io::{Cursor, Read},
    str::FromStr,
};

use rust_decimal::Decimal;
use thiserror::Error;
use time::{format_description::BorrowedFormatItem, macros::format_description, Date};
use tracing::{debug, info};

use crate::{config::Config, period::YearMonth, record::FundRecord};

static CSV_DATE_FMT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("archive has no entries")]
    EmptyArchive,

    #[error("failed to read archive entry: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing column {0}")]
    MissingColumn(&'static str),

    #[error("line {line}, column {column}: {reason}")]
    Row {
        line: u64,
        column: &'static str,
        reason: String,
    },
}

/// Source of monthly daily-report records.
pub trait DataSource {
    /// Records published for `period`. A month with nothing published yields
    /// an empty vector, not an error.
    fn fetch_month(&self, period: YearMonth) -> Result<Vec<FundRecord>, FetchError>;
}

/// [`DataSource`] backed by the CVM open-data portal.
pub struct CvmClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl CvmClient {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn archive_url(&self, period: YearMonth) -> String {
        format!("{}/{}", self.base_url, period.archive_name())
    }
}

impl DataSource for CvmClient {
    fn fetch_month(&self, period: YearMonth) -> Result<Vec<FundRecord>, FetchError> {
        let url = self.archive_url(period);
        info!(%period, %url, "downloading daily report");
        let response = self.client.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            debug!(%period, %status, "no daily report published");
            return Ok(Vec::new());
        }
        let body = response.bytes()?;
        let records = parse_archive(&body)?;
        info!(%period, records = records.len(), "daily report decoded");
        Ok(records)
    }
}

/// Decodes the first entry of an in-memory zip archive.
pub fn parse_archive(bytes: &[u8]) -> Result<Vec<FundRecord>, FetchError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    if archive.len() == 0 {
        return Err(FetchError::EmptyArchive);
    }
    let entry = archive.by_index(0)?;
    debug!(entry = entry.name(), size = entry.size(), "reading archive entry");
    parse_daily_report(entry)
}

/// Parses a semicolon-separated daily report with a header row.
///
/// Numbers use `.` as decimal separator and dates are `YYYY-MM-DD`,
/// regardless of the host locale. The first bad row fails the whole report.
pub fn parse_daily_report<R: Read>(reader: R) -> Result<Vec<FundRecord>, FetchError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .from_reader(reader);
    let columns = ColumnIndices::from_headers(rdr.byte_headers()?)?;

    let mut records = Vec::new();
    for row in rdr.byte_records() {
        records.push(columns.parse_row(&row?)?);
    }
    Ok(records)
}

struct ColumnIndices {
    fund_id: usize,
    report_date: usize,
    fund_type: Option<usize>,
    subscriber_count: usize,
    quota_value: usize,
    net_asset_value: usize,
    daily_inflow: usize,
    daily_outflow: usize,
}

impl ColumnIndices {
    fn from_headers(headers: &csv::ByteRecord) -> Result<Self, FetchError> {
        let mut fund_id = None;
        let mut report_date = None;
        let mut fund_type = None;
        let mut subscriber_count = None;
        let mut quota_value = None;
        let mut net_asset_value = None;
        let mut daily_inflow = None;
        let mut daily_outflow = None;
        headers.iter().enumerate().for_each(|(pos, h)| {
            let h = String::from_utf8_lossy(h);
            match h.trim().trim_start_matches('\u{feff}') {
                "CNPJ_FUNDO" | "CNPJ_FUNDO_CLASSE" => fund_id = Some(pos),
                "DT_COMPTC" => report_date = Some(pos),
                "TP_FUNDO" | "TP_FUNDO_CLASSE" => fund_type = Some(pos),
                "NR_COTST" => subscriber_count = Some(pos),
                "VL_QUOTA" => quota_value = Some(pos),
                "VL_PATRIM_LIQ" => net_asset_value = Some(pos),
                "CAPTC_DIA" => daily_inflow = Some(pos),
                "RESG_DIA" => daily_outflow = Some(pos),
                _ => {}
            }
        });
        Ok(Self {
            fund_id: fund_id.ok_or(FetchError::MissingColumn("CNPJ_FUNDO"))?,
            report_date: report_date.ok_or(FetchError::MissingColumn("DT_COMPTC"))?,
            fund_type,
            subscriber_count: subscriber_count.ok_or(FetchError::MissingColumn("NR_COTST"))?,
            quota_value: quota_value.ok_or(FetchError::MissingColumn("VL_QUOTA"))?,
            net_asset_value: net_asset_value.ok_or(FetchError::MissingColumn("VL_PATRIM_LIQ"))?,
            daily_inflow: daily_inflow.ok_or(FetchError::MissingColumn("CAPTC_DIA"))?,
            daily_outflow: daily_outflow.ok_or(FetchError::MissingColumn("RESG_DIA"))?,
        })
    }

    fn parse_row(&self, row: &csv::ByteRecord) -> Result<FundRecord, FetchError> {
        let field = RowFields { row };
        Ok(FundRecord {
            fund_id: field.text(self.fund_id, "CNPJ_FUNDO")?,
            report_date: field.parse_with(self.report_date, "DT_COMPTC", |s| {
                Date::parse(s, &CSV_DATE_FMT).map_err(|e| e.to_string())
            })?,
            fund_type: match self.fund_type {
                Some(idx) => field.text(idx, "TP_FUNDO")?,
                None => String::new(),
            },
            subscriber_count: field.parse(self.subscriber_count, "NR_COTST")?,
            quota_value: field.quota(self.quota_value, "VL_QUOTA")?,
            net_asset_value: field.decimal(self.net_asset_value, "VL_PATRIM_LIQ")?,
            daily_inflow: field.decimal(self.daily_inflow, "CAPTC_DIA")?,
            daily_outflow: field.decimal(self.daily_outflow, "RESG_DIA")?,
        })
    }
}

struct RowFields<'a> {
    row: &'a csv::ByteRecord,
}

impl RowFields<'_> {
    fn error(&self, column: &'static str, reason: impl Into<String>) -> FetchError {
        FetchError::Row {
            line: self.row.position().map_or(0, |p| p.line()),
            column,
            reason: reason.into(),
        }
    }

    fn raw(&self, idx: usize, column: &'static str) -> Result<&[u8], FetchError> {
        self.row
            .get(idx)
            .ok_or_else(|| self.error(column, "field missing"))
    }

    fn text(&self, idx: usize, column: &'static str) -> Result<String, FetchError> {
        Ok(String::from_utf8_lossy(self.raw(idx, column)?).trim().to_string())
    }

    fn parse_with<T>(
        &self,
        idx: usize,
        column: &'static str,
        parse: impl FnOnce(&str) -> Result<T, String>,
    ) -> Result<T, FetchError> {
        let raw = std::str::from_utf8(self.raw(idx, column)?)
            .map_err(|_| self.error(column, "not valid UTF-8"))?
            .trim();
        parse(raw).map_err(|e| self.error(column, format!("{raw:?}: {e}")))
    }

    fn parse<T>(&self, idx: usize, column: &'static str) -> Result<T, FetchError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.parse_with(idx, column, |s| s.parse::<T>().map_err(|e| e.to_string()))
    }

    fn decimal(&self, idx: usize, column: &'static str) -> Result<Decimal, FetchError> {
        // from_str rejects exponents and thousands separators
        self.parse_with(idx, column, |s| {
            Decimal::from_str(s).map_err(|e| e.to_string())
        })
    }

    /// Plain decimal only: `inf`, `NaN` and exponents are rejected even
    /// though `f64::from_str` accepts them.
    fn quota(&self, idx: usize, column: &'static str) -> Result<f64, FetchError> {
        self.parse_with(idx, column, |s| {
            Decimal::from_str(s).map_err(|e| e.to_string())?;
            s.parse::<f64>().map_err(|e| e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use time::macros::date;

    const LEGACY_REPORT: &str = "\
TP_FUNDO;CNPJ_FUNDO;DT_COMPTC;VL_TOTAL;VL_QUOTA;VL_PATRIM_LIQ;CAPTC_DIA;RESG_DIA;NR_COTST
FI;00.017.024/0001-53;2023-07-03;1163476.66;32.619245000000;1158418.81;0.00;1500.50;12
FI;00.017.024/0001-53;2023-07-04;1164046.04;32.637134000000;1159054.96;250000.00;0.00;13
";

    const CLASS_REPORT: &str = "\
TP_FUNDO_CLASSE;CNPJ_FUNDO_CLASSE;ID_SUBCLASSE;DT_COMPTC;VL_TOTAL;VL_QUOTA;VL_PATRIM_LIQ;CAPTC_DIA;RESG_DIA;NR_COTST
CLASSES - FIF;00017024000153;;2024-05-02;1.00;1.5;2000000.123456;10.5;0;3
";

    fn zip_of(name: &str, content: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(name, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_parse_legacy_layout() {
        let records = parse_daily_report(LEGACY_REPORT.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        let first = &records[0];
        assert_eq!(first.fund_id, "00.017.024/0001-53");
        assert_eq!(first.report_date, date!(2023 - 07 - 03));
        assert_eq!(first.fund_type, "FI");
        assert_eq!(first.subscriber_count, 12);
        assert_eq!(first.quota_value, 32.619245);
        assert_eq!(first.net_asset_value, dec!(1158418.81));
        assert_eq!(first.daily_inflow, dec!(0.00));
        assert_eq!(first.daily_outflow, dec!(1500.50));
        assert_eq!(records[1].daily_inflow, dec!(250000.00));
    }

    #[test]
    fn test_parse_class_layout() {
        let records = parse_daily_report(CLASS_REPORT.as_bytes()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fund_id, "00017024000153");
        assert_eq!(records[0].fund_type, "CLASSES - FIF");
        assert_eq!(records[0].net_asset_value, dec!(2000000.123456));
        assert_eq!(records[0].report_date, date!(2024 - 05 - 02));
    }

    #[test]
    fn test_header_with_bom() {
        let report = format!("\u{feff}{LEGACY_REPORT}");
        assert_eq!(parse_daily_report(report.as_bytes()).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let report = "CNPJ_FUNDO;DT_COMPTC;VL_QUOTA\n00017024000153;2023-07-03;1.0\n";
        let err = parse_daily_report(report.as_bytes()).unwrap_err();
        assert!(matches!(err, FetchError::MissingColumn("NR_COTST")));
    }

    #[test]
    fn test_bad_row_fails_whole_report() {
        let report = LEGACY_REPORT.replace("2023-07-04", "04/07/2023");
        let err = parse_daily_report(report.as_bytes()).unwrap_err();
        match err {
            FetchError::Row { line, column, .. } => {
                assert_eq!(line, 3);
                assert_eq!(column, "DT_COMPTC");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_comma_decimal_rejected() {
        let report = LEGACY_REPORT.replace("1500.50", "1500,50");
        let err = parse_daily_report(report.as_bytes()).unwrap_err();
        assert!(matches!(err, FetchError::Row { column: "RESG_DIA", .. }));
    }

    #[test]
    fn test_non_decimal_quota_rejected() {
        for quota in ["inf", "-infinity", "NaN", "1e3", "0x1F", ""] {
            let report = LEGACY_REPORT.replace("32.637134000000", quota);
            let err = parse_daily_report(report.as_bytes()).unwrap_err();
            match err {
                FetchError::Row { line, column, .. } => {
                    assert_eq!(line, 3, "quota {quota:?}");
                    assert_eq!(column, "VL_QUOTA", "quota {quota:?}");
                }
                other => panic!("unexpected error for {quota:?}: {other}"),
            }
        }
    }

    #[test]
    fn test_parse_archive_reads_first_entry() {
        let bytes = zip_of("inf_diario_fi_202307.csv", LEGACY_REPORT);
        let records = parse_archive(&bytes).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_parse_archive_rejects_garbage() {
        let err = parse_archive(b"<html>not found</html>").unwrap_err();
        assert!(matches!(err, FetchError::Archive(_)));
    }

    #[test]
    fn test_archive_url() {
        let config = Config {
            base_url: "http://localhost:9/dados/".to_string(),
            ..Config::default()
        };
        let client = CvmClient::new(&config).unwrap();
        let period = YearMonth::new(2023, 7).unwrap();
        assert_eq!(
            client.archive_url(period),
            "http://localhost:9/dados/inf_diario_fi_202307.zip"
        );
    }
}
