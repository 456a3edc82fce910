#![allow(dead_code)]

use std::{
    collections::HashMap,
    io::{BufRead, BufReader, Cursor, Write},
    net::TcpListener,
    thread,
};

use rust_decimal::Decimal;
use time::Date;

use cvm_fund_report::FundRecord;

pub const FUND: &str = "00.017.024/0001-53";
pub const OTHER_FUND: &str = "11.111.111/1111-80";

pub fn record(fund_id: &str, date: Date, quota: f64, inflow: Decimal, outflow: Decimal) -> FundRecord {
    FundRecord {
        fund_id: fund_id.to_string(),
        report_date: date,
        fund_type: "FI".to_string(),
        subscriber_count: 10,
        quota_value: quota,
        net_asset_value: Decimal::new(1_000_000_00, 2),
        daily_inflow: inflow,
        daily_outflow: outflow,
    }
}

/// Renders records in the legacy daily-report layout.
pub fn daily_report_csv(records: &[FundRecord]) -> String {
    let mut csv = String::from(
        "TP_FUNDO;CNPJ_FUNDO;DT_COMPTC;VL_TOTAL;VL_QUOTA;VL_PATRIM_LIQ;CAPTC_DIA;RESG_DIA;NR_COTST\n",
    );
    for r in records {
        csv.push_str(&format!(
            "{};{};{};{};{};{};{};{};{}\n",
            r.fund_type,
            r.fund_id,
            r.report_date,
            r.net_asset_value,
            r.quota_value,
            r.net_asset_value,
            r.daily_inflow,
            r.daily_outflow,
            r.subscriber_count
        ));
    }
    csv
}

pub fn zip_of(name: &str, content: &str) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file(name, zip::write::SimpleFileOptions::default())
        .unwrap();
    writer.write_all(content.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

/// Serves canned responses keyed by request path on a local port and
/// returns the base URL. Unknown paths get a 404.
pub fn serve(routes: HashMap<String, (u16, Vec<u8>)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            loop {
                let mut header = String::new();
                if reader.read_line(&mut header).unwrap() == 0 || header == "\r\n" {
                    break;
                }
            }
            let path = request_line.split_whitespace().nth(1).unwrap_or("/");
            let (status, body) = routes.get(path).cloned().unwrap_or((404, Vec::new()));
            let head = format!(
                "HTTP/1.1 {status} Stub\r\nContent-Type: application/zip\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(&body).unwrap();
            stream.flush().unwrap();
        }
    });
    format!("http://{addr}/dados")
}
