//! Spreadsheet and console rendering of a [`FundSummary`].

use std::path::{Path, PathBuf};

use rust_decimal::{prelude::ToPrimitive, Decimal};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, XlsxError};
use thiserror::Error;
use time::{format_description::BorrowedFormatItem, macros::format_description, Date, OffsetDateTime};
use tracing::info;

use crate::{cnpj, summary::FundSummary};

pub const SHEET_NAME: &str = "Fundos";
pub const HEADERS: [&str; 8] = [
    "CNPJ_FUNDO",
    "DT_COMPTC",
    "TP_FUNDO",
    "NR_COTST",
    "VL_QUOTA",
    "VL_PATRIM_LIQ",
    "CAPTC_DIA",
    "RESG_DIA",
];

const DATE_NUM_FMT: &str = "dd-mm-yyyy";
const CURRENCY_NUM_FMT: &str = "#,##0.00";

const COL_DATE: u16 = 1;
// Money format goes on VL_PATRIM_LIQ (F), not VL_QUOTA (E); quotas keep
// their full precision.
const COL_NET_ASSET_VALUE: u16 = 5;
const COL_INFLOW: u16 = 6;
const COL_OUTFLOW: u16 = 7;
const COL_RETURN: u16 = 8;

static FILE_STAMP_FMT: &[BorrowedFormatItem] =
    format_description!("[year][month][day][hour][minute][second]");
static DISPLAY_DATE_FMT: &[BorrowedFormatItem] = format_description!("[day]/[month]/[year]");

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write spreadsheet: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("failed to format timestamp: {0}")]
    Format(#[from] time::error::Format),

    #[error("date {0} cannot be stored in a spreadsheet")]
    DateOutOfRange(Date),

    #[error("amount {0} cannot be stored in a spreadsheet")]
    AmountOutOfRange(Decimal),
}

/// `FundosFiltrados_{yyyyMMddHHmmss}.xlsx`
pub fn report_file_name(now: OffsetDateTime) -> Result<String, ReportError> {
    Ok(format!("FundosFiltrados_{}.xlsx", now.format(FILE_STAMP_FMT)?))
}

/// Local wall-clock time, falling back to UTC when the offset is unknown.
pub fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// Writes the report into `output_dir` with a name stamped by `now` and
/// returns its path.
pub fn generate_report(
    summary: &FundSummary,
    output_dir: &Path,
    now: OffsetDateTime,
) -> Result<PathBuf, ReportError> {
    let path = output_dir.join(report_file_name(now)?);
    write_report(summary, &path)?;
    info!(path = %path.display(), rows = summary.records.len(), "report written");
    Ok(path)
}

/// One row per record under a header row, followed by the four labelled
/// metrics in columns I to L.
pub fn write_report<P: AsRef<Path>>(summary: &FundSummary, path: P) -> Result<(), ReportError> {
    let date_fmt = Format::new().set_num_format(DATE_NUM_FMT);
    let currency_fmt = Format::new().set_num_format(CURRENCY_NUM_FMT);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    worksheet.set_column_format(COL_DATE, &date_fmt)?;
    for col in [COL_NET_ASSET_VALUE, COL_INFLOW, COL_OUTFLOW] {
        worksheet.set_column_format(col, &currency_fmt)?;
    }

    for (col, header) in (0u16..).zip(HEADERS) {
        worksheet.write_string(0, col, header)?;
    }

    for (row, r) in (1u32..).zip(&summary.records) {
        worksheet.write_string(row, 0, &r.fund_id)?;
        worksheet.write_datetime_with_format(row, COL_DATE, &excel_date(r.report_date)?, &date_fmt)?;
        worksheet.write_string(row, 2, &r.fund_type)?;
        worksheet.write_number(row, 3, r.subscriber_count)?;
        worksheet.write_number(row, 4, r.quota_value)?;
        worksheet.write_number_with_format(
            row,
            COL_NET_ASSET_VALUE,
            amount(r.net_asset_value)?,
            &currency_fmt,
        )?;
        worksheet.write_number_with_format(row, COL_INFLOW, amount(r.daily_inflow)?, &currency_fmt)?;
        worksheet.write_number_with_format(row, COL_OUTFLOW, amount(r.daily_outflow)?, &currency_fmt)?;
    }

    let m = &summary.metrics;
    worksheet.write_string(0, COL_RETURN, "Rentabilidade no Período:")?;
    worksheet.write_number(1, COL_RETURN, m.return_pct_rounded())?;
    let flows = [
        ("Captação no Período:", m.total_inflow),
        ("Resgates no Período:", m.total_outflow),
        ("Captação Líquida:", m.net_flow),
    ];
    for (col, (label, value)) in (COL_RETURN + 1..).zip(flows) {
        worksheet.write_string(0, col, label)?;
        worksheet.write_number_with_format(1, col, amount(value)?, &currency_fmt)?;
    }

    workbook.save(path.as_ref())?;
    Ok(())
}

fn excel_date(date: Date) -> Result<ExcelDateTime, ReportError> {
    let year = u16::try_from(date.year()).map_err(|_| ReportError::DateOutOfRange(date))?;
    ExcelDateTime::from_ymd(year, u8::from(date.month()), date.day())
        .map_err(|_| ReportError::DateOutOfRange(date))
}

fn amount(value: Decimal) -> Result<f64, ReportError> {
    value.to_f64().ok_or(ReportError::AmountOutOfRange(value))
}

pub fn print_summary(cnpj: &str, summary: &FundSummary) {
    let (first, last) = match (summary.records.first(), summary.records.last()) {
        (Some(first), Some(last)) => (first.report_date, last.report_date),
        _ => return,
    };
    let fund = cnpj::format(cnpj).unwrap_or_else(|| cnpj.to_string());
    let m = &summary.metrics;
    println!(
        "\n=== {} DE {} A {} ({} registros) ===\n",
        fund,
        first.format(DISPLAY_DATE_FMT).unwrap_or_default(),
        last.format(DISPLAY_DATE_FMT).unwrap_or_default(),
        summary.records.len()
    );
    println!("Rentabilidade no período: {:.2}%", m.return_pct_rounded());
    println!("Captação no período: R$ {:.2}", m.total_inflow);
    println!("Resgates no período: R$ {:.2}", m.total_outflow);
    println!("Captação líquida: R$ {:.2}\n", m.net_flow);
}
