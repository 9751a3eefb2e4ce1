use std::collections::HashMap;

use calamine::{Data, Range};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::{
    ofx::{
        generate_transaction_id, BankAccount, BankTrnType, Currency,
        InvestAction, InvestStatementLine, InvestTrnType, Statement,
        StatementLine, StatementTrn,
    },
    sheet::{
        common::{first_cell_str, remove_whitespace, SheetParseError},
        cursor::RowCursor,
        header::{ColumnMap, MappedRow},
    },
    util::date::{date_at_midnight, parse_report_date, parse_report_date_time},
};

use super::rules::{LabelAction, RuleSet, TINKOFF_RULES};

pub const DEFAULT_BROKER_NAME: &str = "Tinkoff Investments";

// Report sections are addressed by their exact printed headers.
const EXECUTED_TRADES_HEADER: &str =
    "1.1 Информация о совершенных и исполненных сделках на конец отчетного периода";
const UNFULFILLED_TRADES_HEADER: &str =
    "1.2 Информация о неисполненных сделках на конец отчетного периода";
const TRADES_END_HEADER: &str =
    "1.3 Сделки за расчетный период, обязательства из которых прекращены не в результате исполнения";
const CASHFLOW_HEADER: &str = "2. Операции с денежными средствами";
const CASHFLOW_END_HEADER: &str = "3.1 Движение по ценным бумагам инвестора";
const SECURITIES_HEADER: &str = "4.1 Информация о ценных бумагах";
const SECURITIES_END_HEADER: &str =
    "4.2 Информация об инструментах, не квалифицированных в качестве ценной бумаги";
// The securities table repeats its header row between printed pages.
const SECURITIES_MIDPAGE_FIRST_CELL: &str = "Сокращенное наименование актива";

// Logical column names, in whitespace-stripped form.
const DEAL_NUM_COL: &str = "Номерсделки";
const ORDER_NUM_COL: &str = "Номерпоручения";
const DEAL_DATE_COL: &str = "Датазаключения";
const DEAL_TIME_COL: &str = "Время";
const OPERATION_COL: &str = "Видсделки";
const ASSET_NAME_COL: &str = "Сокращенноенаименованиеактива";
const ASSET_CODE_COL: &str = "Кодактива";
const UNIT_PRICE_COL: &str = "Ценазаединицу";
const PRICE_CURRENCY_COL: &str = "Валютацены";
const QUANTITY_COL: &str = "Количество";
const AMOUNT_EX_ACCRUED_COL: &str = "Сумма(безНКД)";
const ACCRUED_INTEREST_COL: &str = "НКД";
const DEAL_AMOUNT_COL: &str = "Суммасделки";
const SETTLEMENT_CURRENCY_COL: &str = "Валютарасчетов";
const BROKER_FEE_COL: &str = "Комиссияброкера";

const EXEC_DATE_COL: &str = "Датаисполнения";
const CASH_OPERATION_COL: &str = "Операция";
const CREDIT_COL: &str = "Суммазачисления";
const DEBIT_COL: &str = "Суммасписания";
const NOTE_COL: &str = "Примечание";

const TRADE_COLUMNS: &[&str] = &[
    DEAL_NUM_COL,
    ORDER_NUM_COL,
    DEAL_DATE_COL,
    DEAL_TIME_COL,
    OPERATION_COL,
    ASSET_NAME_COL,
    ASSET_CODE_COL,
    UNIT_PRICE_COL,
    PRICE_CURRENCY_COL,
    QUANTITY_COL,
    AMOUNT_EX_ACCRUED_COL,
    ACCRUED_INTEREST_COL,
    DEAL_AMOUNT_COL,
    SETTLEMENT_CURRENCY_COL,
    BROKER_FEE_COL,
];

const CASHFLOW_COLUMNS: &[&str] = &[
    EXEC_DATE_COL,
    CASH_OPERATION_COL,
    CREDIT_COL,
    DEBIT_COL,
    NOTE_COL,
];

const SECURITIES_COLUMNS: &[&str] = &[ASSET_NAME_COL, ASSET_CODE_COL];

// Dividend notes name the paying security by its full display name,
// e.g. "Walmart-ао/ 3 шт.".
lazy_static! {
    static ref DIV_SECURITY_RE: Regex = Regex::new(r"(.+?)/ \d+").unwrap();
}

// Notes opening with this marker are planned payouts, not settled yet.
const PLANNED_NOTE_MARKER: &str = "План";

pub struct ParserConfig {
    pub currency: Currency,
    pub account_id: String,
    pub broker: String,
}

impl ParserConfig {
    pub fn new(currency: Currency, account_id: impl Into<String>) -> Self {
        ParserConfig {
            currency,
            account_id: account_id.into(),
            broker: DEFAULT_BROKER_NAME.to_string(),
        }
    }
}

/// Extracts the statement lines for one settlement currency from a Tinkoff
/// Investments broker report worksheet.
///
/// The worksheet is scanned twice, each time with a fresh forward-only
/// cursor: once to index the securities master (dividend rows reference
/// securities only by display name), then once for the trade and cash-flow
/// sections. One parser instance serves exactly one extraction.
pub struct TinkoffParser<'a> {
    sheet: &'a Range<Data>,
    config: ParserConfig,
    rules: &'a RuleSet,
    security_id_by_full_name: HashMap<String, String>,
}

impl<'a> TinkoffParser<'a> {
    pub fn new(sheet: &'a Range<Data>, config: ParserConfig) -> Self {
        Self::with_rules(sheet, config, &TINKOFF_RULES)
    }

    pub fn with_rules(
        sheet: &'a Range<Data>,
        config: ParserConfig,
        rules: &'a RuleSet,
    ) -> Self {
        TinkoffParser {
            sheet,
            config,
            rules,
            security_id_by_full_name: HashMap::new(),
        }
    }

    pub fn parse(mut self) -> Result<Statement, SheetParseError> {
        self.security_id_by_full_name = self.build_security_index()?;

        let mut lines = Vec::new();
        let mut cursor = RowCursor::new(self.sheet);
        self.scan_trades(&mut cursor, &mut lines)?;
        info!("Finished parsing buy-sells transactions, now extracting cash flows");
        self.scan_cashflow(&mut cursor, &mut lines)?;

        info!(
            "Parsed {} statement lines for {}",
            lines.len(),
            self.config.currency
        );
        Ok(Statement {
            currency: self.config.currency,
            account_id: self.config.account_id,
            broker_id: self.config.broker,
            lines,
        })
    }

    /// Maps each security's full display name to its transformed ticker.
    /// Later duplicates of a name win.
    fn build_security_index(
        &self,
    ) -> Result<HashMap<String, String>, SheetParseError> {
        let mut cursor = RowCursor::new(self.sheet);
        cursor.skip_until(SECURITIES_HEADER)?;
        let col_map = header_map(&mut cursor, SECURITIES_COLUMNS)?;

        let mut index = HashMap::new();
        while let Some(row) = cursor.next_row() {
            let first = first_cell_str(row);
            if first == SECURITIES_END_HEADER {
                info!("Found next section at row {}", cursor.row_num());
                break;
            }
            if first == SECURITIES_MIDPAGE_FIRST_CELL {
                continue; // header row repeated between pages
            }
            let mapped = col_map.map_row(row, cursor.row_num());
            let full_name = mapped.get_str(ASSET_NAME_COL);
            let ticker = self
                .rules
                .transform_ticker(&mapped.get_str(ASSET_CODE_COL), &self.config.currency);
            index.insert(full_name, ticker);
        }
        info!("Indexed {} securities", index.len());
        Ok(index)
    }

    fn scan_trades(
        &self,
        cursor: &mut RowCursor<'a>,
        out: &mut Vec<StatementTrn>,
    ) -> Result<(), SheetParseError> {
        cursor.skip_until(EXECUTED_TRADES_HEADER)?;
        let mut col_map = header_map(cursor, TRADE_COLUMNS)?;

        while let Some(row) = cursor.next_row() {
            let first = remove_whitespace(&first_cell_str(row));
            if first == DEAL_NUM_COL {
                continue; // header row repeated between pages
            }
            if first == remove_whitespace(UNFULFILLED_TRADES_HEADER) {
                // Executed deals still being settled. The columns are the
                // same, but at new offsets.
                col_map = header_map(cursor, TRADE_COLUMNS)?;
                continue;
            }
            if first == remove_whitespace(TRADES_END_HEADER) {
                info!("Found next section at row {}", cursor.row_num());
                break;
            }
            let mapped = col_map.map_row(row, cursor.row_num());
            self.classify_trade_row(&mapped, out)?;
        }
        Ok(())
    }

    fn classify_trade_row(
        &self,
        row: &MappedRow,
        out: &mut Vec<StatementTrn>,
    ) -> Result<(), SheetParseError> {
        if self.try_currency_exchange(row, out)? {
            return Ok(());
        }

        let settlement = Currency::new(&row.get_str(SETTLEMENT_CURRENCY_COL));
        if settlement != self.config.currency {
            debug!(
                "Row {}: deal settles in {}, not {}",
                row.row_num(),
                settlement,
                self.config.currency
            );
            return Ok(());
        }

        let label = row.get_str(OPERATION_COL);
        let date = trade_date_time(row)?;
        let unit_price = row.get_dec(UNIT_PRICE_COL)?;
        let fees = row.get_dec(BROKER_FEE_COL)?;
        let units = row.get_dec(QUANTITY_COL)?;
        let amount = row.get_dec(DEAL_AMOUNT_COL)?;

        let memo = format!(
            "{} {} {} ({}) по {} {}. Сумма: {} {}, комиссия {} {}, \
             номер сделки: {}, номер поручения: {}",
            label,
            row.get_str(QUANTITY_COL),
            row.get_str(ASSET_NAME_COL),
            row.get_str(ASSET_CODE_COL),
            row.get_str(SETTLEMENT_CURRENCY_COL),
            row.get_str(UNIT_PRICE_COL),
            row.get_str(SETTLEMENT_CURRENCY_COL),
            row.get_str(DEAL_AMOUNT_COL),
            row.get_str(SETTLEMENT_CURRENCY_COL),
            fees,
            row.get_str(DEAL_NUM_COL),
            row.get_str(ORDER_NUM_COL),
        );

        let (trntype, detailed, amount, units) =
            match self.rules.label_action(&label) {
                // Buys deduct money and add securities; sells do the
                // opposite. Fees reduce the net amount either way.
                Some(LabelAction::Buy) => (
                    InvestTrnType::BuyStock,
                    InvestAction::Buy,
                    -amount.abs() - fees,
                    units.abs(),
                ),
                Some(LabelAction::Sell) => (
                    InvestTrnType::SellStock,
                    InvestAction::Sell,
                    amount.abs() - fees,
                    -units.abs(),
                ),
                Some(LabelAction::Skip) => return Ok(()),
                Some(_) | None => {
                    warn!(
                        "Row {}: deal type \"{}\" can not be mapped to a known type, skipping",
                        row.row_num(),
                        label
                    );
                    return Ok(());
                }
            };

        out.push(StatementTrn::Invest(InvestStatementLine {
            id: row.get_str(DEAL_NUM_COL),
            date,
            amount,
            memo,
            trntype,
            trntype_detailed: detailed,
            security_id: self
                .rules
                .transform_ticker(&row.get_str(ASSET_CODE_COL), &self.config.currency),
            unit_price,
            units,
            fees,
        }));
        Ok(())
    }

    /// Trade-section rows whose instrument is a currency pair are
    /// conversions, not security deals: they become an XFER to the other
    /// currency's account, plus a FEE line when the commission is nonzero.
    /// Returns whether the row was consumed.
    fn try_currency_exchange(
        &self,
        row: &MappedRow,
        out: &mut Vec<StatementTrn>,
    ) -> Result<bool, SheetParseError> {
        let full_name = row.get_str(ASSET_NAME_COL);
        let pair_rule = match self.rules.currency_pair(&full_name) {
            Some(rule) => rule,
            None => return Ok(false),
        };

        let settlement = Currency::new(&row.get_str(SETTLEMENT_CURRENCY_COL));
        if settlement != self.config.currency {
            return Ok(false);
        }

        let other_currency = match pair_rule.other_currency(&settlement) {
            Some(c) => c,
            None => {
                warn!(
                    "Row {}: {} matched a currency pair not containing {}, \
                     can't find other currency",
                    row.row_num(),
                    full_name,
                    settlement
                );
                return Ok(false);
            }
        };

        let label = row.get_str(OPERATION_COL);
        let negate = match self.rules.label_action(&label) {
            // Buying the foreign currency spends this one.
            Some(LabelAction::Buy) => true,
            Some(LabelAction::Sell) => false,
            _ => {
                warn!(
                    "Row {}: deal type \"{}\" can not be mapped to a known type, skipping",
                    row.row_num(),
                    label
                );
                return Ok(true);
            }
        };

        let date = trade_date_time(row)?;
        let deal_num = row.get_str(DEAL_NUM_COL);
        let mut amount = row.get_dec(DEAL_AMOUNT_COL)?.abs();
        if negate {
            amount = -amount;
        }

        let deal_desc = format!(
            "{} {} {} по {} {}. Сумма: {} {}, номер сделки: {}, номер поручения: {}",
            label,
            row.get_str(QUANTITY_COL),
            other_currency,
            row.get_str(SETTLEMENT_CURRENCY_COL),
            row.get_str(UNIT_PRICE_COL),
            row.get_str(SETTLEMENT_CURRENCY_COL),
            row.get_str(DEAL_AMOUNT_COL),
            deal_num,
            row.get_str(ORDER_NUM_COL),
        );

        out.push(StatementTrn::Bank(StatementLine {
            id: deal_num.clone(),
            date,
            amount,
            memo: deal_desc.clone(),
            trntype: BankTrnType::Xfer,
            account_to: Some(BankAccount {
                bank_id: None,
                acct_id: other_currency.to_string(),
            }),
        }));

        let fees = row.get_dec(BROKER_FEE_COL)?.abs();
        if !fees.is_zero() {
            out.push(StatementTrn::Bank(StatementLine {
                id: format!("{deal_num}-fees"),
                date,
                amount: -fees,
                memo: format!("Комиссия за {deal_desc}"),
                trntype: BankTrnType::Fee,
                account_to: None,
            }));
        }
        Ok(true)
    }

    fn scan_cashflow(
        &self,
        cursor: &mut RowCursor<'a>,
        out: &mut Vec<StatementTrn>,
    ) -> Result<(), SheetParseError> {
        cursor.skip_until(CASHFLOW_HEADER)?;
        // The currency-summary table's own header row.
        next_required_row(cursor, "cash-flow summary header")?;

        // The summary terminates without an empty line, directly with the
        // detail table of the first currency; the repeat of that currency's
        // code is the stop signal.
        let mut summary_currencies: Vec<String> = Vec::new();
        loop {
            let row = next_required_row(cursor, "cash-flow currency summary")?;
            let currency = first_cell_str(row);
            if summary_currencies.contains(&currency) {
                break;
            }
            summary_currencies.push(currency);
        }

        let position = match summary_currencies
            .iter()
            .position(|c| c == self.config.currency.as_str())
        {
            Some(p) => p,
            None => {
                warn!(
                    "Requested currency {} is not present in the report",
                    self.config.currency
                );
                return Ok(());
            }
        };

        let terminator = if position == summary_currencies.len() - 1 {
            // The last currency's detail block runs to the next major
            // section.
            CASHFLOW_END_HEADER.to_string()
        } else {
            summary_currencies[position + 1].clone()
        };

        // The cursor already stands inside the first currency's detail
        // table; only later blocks need a seek.
        if position > 0 {
            cursor.skip_until(self.config.currency.as_str())?;
        }
        let col_map = header_map(cursor, CASHFLOW_COLUMNS)?;

        while let Some(row) = cursor.next_row() {
            if first_cell_str(row) == terminator {
                info!(
                    "Found next section {} at row {}",
                    terminator,
                    cursor.row_num()
                );
                break;
            }
            let mapped = col_map.map_row(row, cursor.row_num());
            self.classify_cashflow_row(&mapped, out)?;
        }
        Ok(())
    }

    fn classify_cashflow_row(
        &self,
        row: &MappedRow,
        out: &mut Vec<StatementTrn>,
    ) -> Result<(), SheetParseError> {
        enum CashShape {
            Div(String),
            Bank(BankTrnType),
        }

        let label = row.get_str(CASH_OPERATION_COL);
        let shape = match self.rules.label_action(&label) {
            Some(LabelAction::Skip) => return Ok(()),
            Some(LabelAction::Div) => {
                let note = row.get_str(NOTE_COL);
                if note.starts_with(PLANNED_NOTE_MARKER) {
                    return Ok(()); // planned payout, nothing settled yet
                }
                let full_name =
                    match DIV_SECURITY_RE.captures(&note).and_then(|c| c.get(1)) {
                        Some(m) => m.as_str().to_string(),
                        None => {
                            warn!(
                                "Row {}: unable to match the security name from \"{}\"",
                                row.row_num(),
                                note
                            );
                            return Ok(());
                        }
                    };
                match self.security_id_by_full_name.get(&full_name) {
                    Some(security_id) => CashShape::Div(security_id.clone()),
                    None => {
                        warn!(
                            "Row {}: unknown security \"{}\"",
                            row.row_num(),
                            full_name
                        );
                        return Ok(());
                    }
                }
            }
            Some(LabelAction::Bank(trntype)) => CashShape::Bank(trntype),
            Some(LabelAction::Buy) | Some(LabelAction::Sell) => {
                warn!(
                    "Row {}: operation \"{}\" is a deal type, not a cash operation, skipping",
                    row.row_num(),
                    label
                );
                return Ok(());
            }
            None => {
                warn!(
                    "Row {}: operation \"{}\" can not be mapped to a known type, skipping",
                    row.row_num(),
                    label
                );
                return Ok(());
            }
        };

        let date_str = row.get_str(EXEC_DATE_COL);
        let date = date_at_midnight(parse_report_date(&date_str).map_err(
            |e| {
                SheetParseError::new(
                    row.row_num(),
                    format!("Unable to parse date \"{date_str}\": {e}"),
                )
            },
        )?);
        let credit = row.get_dec(CREDIT_COL)?;
        let debit = row.get_dec(DEBIT_COL)?;
        let amount = credit - debit;

        let memo = format!(
            "{} {}, зачислено {}, списано {}, дата исполнения: {}",
            label,
            row.get_str(NOTE_COL),
            row.get_str(CREDIT_COL),
            row.get_str(DEBIT_COL),
            row.get_str(EXEC_DATE_COL),
        );
        // The report carries no transaction ids for cash flows.
        let id = generate_transaction_id(&date, &amount, &memo);

        out.push(match shape {
            CashShape::Div(security_id) => {
                // Dividends go out as investment transactions so they get
                // linked to their security.
                StatementTrn::Invest(InvestStatementLine {
                    id,
                    date,
                    amount,
                    memo,
                    trntype: InvestTrnType::Income,
                    trntype_detailed: InvestAction::Div,
                    security_id,
                    unit_price: Decimal::ZERO,
                    units: Decimal::ZERO,
                    fees: Decimal::ZERO,
                })
            }
            CashShape::Bank(trntype) => StatementTrn::Bank(StatementLine {
                id,
                date,
                amount,
                memo,
                trntype,
                account_to: None,
            }),
        });
        Ok(())
    }
}

fn header_map(
    cursor: &mut RowCursor,
    expected: &[&str],
) -> Result<ColumnMap, SheetParseError> {
    let row = next_required_row(cursor, "column header row")?;
    Ok(ColumnMap::from_header_row(row, expected))
}

fn next_required_row<'a>(
    cursor: &mut RowCursor<'a>,
    what: &str,
) -> Result<&'a [Data], SheetParseError> {
    cursor.next_row().ok_or_else(|| {
        SheetParseError::new(
            cursor.row_num(),
            format!("Sheet ended while reading the {what}"),
        )
    })
}

fn trade_date_time(
    row: &MappedRow,
) -> Result<crate::util::date::PrimitiveDateTime, SheetParseError> {
    let dt_str = format!(
        "{} {}",
        row.get_str(DEAL_DATE_COL),
        row.get_str(DEAL_TIME_COL)
    );
    parse_report_date_time(&dt_str).map_err(|e| {
        SheetParseError::new(
            row.row_num(),
            format!("Unable to parse deal date \"{dt_str}\": {e}"),
        )
    })
}
