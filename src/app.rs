use std::io::Write;
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use clap::Parser;

use crate::broker::tinkoff::{ParserConfig, TinkoffParser, DEFAULT_BROKER_NAME};
use crate::ofx::{Currency, Statement, StatementTrn};
use crate::util::basic::SError;
use crate::util::date::render_date_time;
use crate::util::rw::WriteHandle;

/// Extracts the statement for one settlement currency from a Tinkoff
/// Investments broker report, and prints the statement lines as CSV.
///
/// The report is the .xlsx document produced by the broker's web terminal.
/// Run once per currency present in the report.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Broker report file (.xlsx)
    #[arg(required = true)]
    pub report_file: PathBuf,

    /// Settlement currency to extract (e.g. RUB, USD)
    #[arg(short, long)]
    pub currency: String,

    /// Account id to record on the statement
    #[arg(short, long)]
    pub account: String,

    /// Broker display name to record on the statement
    #[arg(long, default_value = DEFAULT_BROKER_NAME)]
    pub broker: String,

    /// Select which sheet in the report file to use (1-based)
    #[arg(long, default_value_t = 1)]
    pub sheet: usize,
}

/// Sheet here is a 1-based index.
fn read_xl_file(path: &Path, sheet: usize) -> Result<Range<Data>, SError> {
    let mut workbook: Xlsx<_> =
        open_workbook(path).map_err(|e| format!("{e}"))?;
    let sheet_index = sheet - 1;

    let sheet_names = workbook.sheet_names();
    let sheet_name = sheet_names
        .get(sheet_index)
        .ok_or(format!("No sheet {sheet_index}"))?
        .clone();

    workbook.worksheet_range(&sheet_name).map_err(|e| format!("{e}"))
}

pub fn write_statement_csv(
    stmt: &Statement,
    w: &mut dyn std::io::Write,
) -> Result<(), SError> {
    let mut csv_w = csv::Writer::from_writer(w);
    let werr = |e: csv::Error| format!("{e}");

    csv_w
        .write_record([
            "kind", "id", "date", "type", "detail", "security", "units",
            "unit price", "fees", "amount", "transfer to", "memo",
        ])
        .map_err(werr)?;

    for line in &stmt.lines {
        match line {
            StatementTrn::Bank(l) => {
                let account_to = l
                    .account_to
                    .as_ref()
                    .map(|a| a.acct_id.clone())
                    .unwrap_or_default();
                csv_w
                    .write_record([
                        "bank",
                        &l.id,
                        &render_date_time(&l.date),
                        l.trntype.as_str(),
                        "",
                        "",
                        "",
                        "",
                        "",
                        &l.amount.to_string(),
                        &account_to,
                        &l.memo,
                    ])
                    .map_err(werr)?;
            }
            StatementTrn::Invest(l) => {
                csv_w
                    .write_record([
                        "invest",
                        &l.id,
                        &render_date_time(&l.date),
                        l.trntype.as_str(),
                        l.trntype_detailed.as_str(),
                        &l.security_id,
                        &l.units.to_string(),
                        &l.unit_price.to_string(),
                        &l.fees.to_string(),
                        &l.amount.to_string(),
                        "",
                        &l.memo,
                    ])
                    .map_err(werr)?;
            }
        }
    }
    csv_w.flush().map_err(|e| format!("{e}"))
}

pub fn run_with_args(
    args: Args,
    mut out_w: WriteHandle,
    mut err_w: WriteHandle,
) -> Result<(), ()> {
    if !args.report_file.to_string_lossy().ends_with(".xlsx") {
        let _ = writeln!(
            err_w,
            "Invalid report file {}. Expected .xlsx",
            args.report_file.display()
        );
        return Err(());
    }

    let sheet = match read_xl_file(&args.report_file, args.sheet) {
        Ok(rg) => rg,
        Err(e) => {
            let _ = writeln!(err_w, "{e}");
            return Err(());
        }
    };

    let mut config =
        ParserConfig::new(Currency::new(&args.currency), args.account);
    config.broker = args.broker;

    let stmt = match TinkoffParser::new(&sheet, config).parse() {
        Ok(stmt) => stmt,
        Err(e) => {
            let _ = writeln!(err_w, "{e}");
            return Err(());
        }
    };

    if let Err(e) = write_statement_csv(&stmt, &mut out_w) {
        let _ = writeln!(err_w, "{e}");
        return Err(());
    }
    Ok(())
}

pub fn run() -> Result<(), ()> {
    let args = Args::parse();
    run_with_args(
        args,
        WriteHandle::stdout_write_handle(),
        WriteHandle::stderr_write_handle(),
    )
}
