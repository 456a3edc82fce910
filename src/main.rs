use std::io;

use anyhow::Context;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cvm_fund_report::{
    prompt::Prompter,
    report::{generate_report, local_now, print_summary},
    run_request, Config, CvmClient, Result,
};

fn main() -> Result<()> {
    init_tracing();

    let config = Config::default();
    let source = CvmClient::new(&config).context("failed to build HTTP client")?;
    let mut prompter = Prompter::new(io::stdin().lock(), io::stdout());

    loop {
        let request = prompter.ask_request()?;
        match run_request(&source, &request) {
            Ok(summary) => match generate_report(&summary, &config.output_dir, local_now()) {
                Ok(path) => {
                    prompter.say(&format!("Arquivo gerado com sucesso: {}", path.display()))?;
                    print_summary(request.cnpj(), &summary);
                }
                Err(e) => {
                    error!(error = %e, "report not written");
                    prompter.say(&format!("Não foi possível gravar o relatório: {e}"))?;
                }
            },
            Err(e) => {
                error!(error = %e, cnpj = request.cnpj(), "request failed");
                prompter.say(&format!("Não foi possível gerar o relatório: {e}"))?;
            }
        }
        if !prompter.ask_continue()? {
            break;
        }
    }

    Ok(())
}

/// Diagnostics go to stderr so they do not interleave with the prompts.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cvm_fund_report=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}
