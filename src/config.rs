use std::{path::PathBuf, time::Duration};

pub const DEFAULT_BASE_URL: &str = "https://dados.cvm.gov.br/dados/FI/DOC/INF_DIARIO/DADOS";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_USER_AGENT: &str = concat!("cvm_fund_report/", env!("CARGO_PKG_VERSION"));

/// Runtime settings. The binary always runs with [`Config::default`]; tests
/// point `base_url` and `output_dir` elsewhere.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory that holds the monthly `inf_diario_fi_YYYYMM.zip` archives.
    pub base_url: String,
    /// Where generated spreadsheets are written.
    pub output_dir: PathBuf,
    /// Whole-request timeout; monthly archives run to tens of megabytes.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            output_dir: PathBuf::from("."),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}
