//! Line-oriented operator prompts.

use std::io::{BufRead, Write};

use anyhow::{Context, Error};
use time::{format_description::BorrowedFormatItem, macros::format_description, Date};

use crate::{cnpj, request::FundRequest, Result};

static INPUT_DATE_FMT: &[BorrowedFormatItem] = format_description!("[day][month][year]");

/// Asks for requests on `input`, echoing prompts and messages on `output`.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Prompts until a valid CNPJ and a non-empty date range are entered.
    pub fn ask_request(&mut self) -> Result<FundRequest> {
        let cnpj = self.ask_cnpj()?;
        let start = self.ask_date("Digite a data inicial (ex: 01072023): ")?;
        let end = loop {
            let end = self.ask_date("Digite a data final (ex: 31072023): ")?;
            if end >= start {
                break end;
            }
            self.say("A data final deve ser igual ou posterior à data inicial.")?;
        };
        Ok(FundRequest::new(cnpj, start, end)?)
    }

    /// True when the operator answers `S` (any case). End of input means no.
    pub fn ask_continue(&mut self) -> Result<bool> {
        let answer = self.read_answer("Deseja gerar nova solicitação? (S/N): ")?;
        Ok(answer.is_some_and(|a| a.eq_ignore_ascii_case("s")))
    }

    pub fn say(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "{message}")?;
        Ok(())
    }

    fn ask_cnpj(&mut self) -> Result<String> {
        loop {
            let answer = self.ask("Digite o CNPJ do fundo (ex: 00.017.024/0001-53): ")?;
            if cnpj::is_valid(&answer) {
                return Ok(answer);
            }
            self.say("CNPJ inválido, verifique o formato e insira novamente.")?;
        }
    }

    fn ask_date(&mut self, prompt: &str) -> Result<Date> {
        loop {
            let answer = self.ask(prompt)?;
            match Date::parse(&answer, &INPUT_DATE_FMT) {
                Ok(date) => return Ok(date),
                Err(_) => self.say("Data inválida, verifique o formato e insira novamente.")?,
            }
        }
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        self.read_answer(prompt)?
            .ok_or_else(|| Error::msg("input closed"))
    }

    /// `None` at end of input.
    fn read_answer(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("failed to read operator input")?;
        Ok((read > 0).then(|| line.trim().to_string()))
    }
}
