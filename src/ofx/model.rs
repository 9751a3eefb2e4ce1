use std::fmt::Display;

use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use time::PrimitiveDateTime;

use crate::util::date::render_date_time;

#[derive(Clone, Debug)]
enum CurrImpl {
    Static(&'static str),
    Dyn(String),
}

/// An ISO-4217-ish currency code, as printed in the report ("RUB", "USD").
#[derive(Clone, Debug)]
pub struct Currency(CurrImpl);

impl Currency {
    pub fn new(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "RUB" => Currency::rub(),
            "USD" => Currency::usd(),
            "EUR" => Currency::eur(),
            other => Currency(CurrImpl::Dyn(other.to_string())),
        }
    }

    pub fn rub() -> Self {
        Currency(CurrImpl::Static("RUB"))
    }

    pub fn usd() -> Self {
        Currency(CurrImpl::Static("USD"))
    }

    pub fn eur() -> Self {
        Currency(CurrImpl::Static("EUR"))
    }

    pub fn as_str(&self) -> &str {
        match &self.0 {
            CurrImpl::Static(s) => s,
            CurrImpl::Dyn(s) => s.as_str(),
        }
    }
}

impl PartialEq for Currency {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Currency {}

// Auto-implements to_string()
impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// OFX TRNTYPE values used for pure cash movements.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BankTrnType {
    Debit,
    Credit,
    SrvChg,
    Fee,
    Xfer,
    Other,
}

impl BankTrnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BankTrnType::Debit => "DEBIT",
            BankTrnType::Credit => "CREDIT",
            BankTrnType::SrvChg => "SRVCHG",
            BankTrnType::Fee => "FEE",
            BankTrnType::Xfer => "XFER",
            BankTrnType::Other => "OTHER",
        }
    }
}

impl Display for BankTrnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// OFX investment transaction aggregates.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InvestTrnType {
    BuyStock,
    SellStock,
    Income,
}

impl InvestTrnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestTrnType::BuyStock => "BUYSTOCK",
            InvestTrnType::SellStock => "SELLSTOCK",
            InvestTrnType::Income => "INCOME",
        }
    }
}

impl Display for InvestTrnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The detailed type carried inside an investment aggregate.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InvestAction {
    Buy,
    Sell,
    Div,
}

impl InvestAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestAction::Buy => "BUY",
            InvestAction::Sell => "SELL",
            InvestAction::Div => "DIV",
        }
    }
}

impl Display for InvestAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BankAccount {
    pub bank_id: Option<String>,
    pub acct_id: String,
}

/// A currency-settlement-only movement (deposit, withdrawal, fee, transfer
/// leg of a currency exchange).
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct StatementLine {
    pub id: String,
    pub date: PrimitiveDateTime,
    pub amount: Decimal,
    pub memo: String,
    pub trntype: BankTrnType,
    /// Destination of a transfer, when there is one.
    pub account_to: Option<BankAccount>,
}

/// A trade or income event tied to a security.
///
/// Units are signed: positive for acquisitions, negative for disposals.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct InvestStatementLine {
    pub id: String,
    pub date: PrimitiveDateTime,
    pub amount: Decimal,
    pub memo: String,
    pub trntype: InvestTrnType,
    pub trntype_detailed: InvestAction,
    pub security_id: String,
    pub unit_price: Decimal,
    pub units: Decimal,
    pub fees: Decimal,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum StatementTrn {
    Bank(StatementLine),
    Invest(InvestStatementLine),
}

impl StatementTrn {
    pub fn id(&self) -> &str {
        match self {
            StatementTrn::Bank(l) => &l.id,
            StatementTrn::Invest(l) => &l.id,
        }
    }

    pub fn date(&self) -> PrimitiveDateTime {
        match self {
            StatementTrn::Bank(l) => l.date,
            StatementTrn::Invest(l) => l.date,
        }
    }

    pub fn amount(&self) -> Decimal {
        match self {
            StatementTrn::Bank(l) => l.amount,
            StatementTrn::Invest(l) => l.amount,
        }
    }

    pub fn memo(&self) -> &str {
        match self {
            StatementTrn::Bank(l) => &l.memo,
            StatementTrn::Invest(l) => &l.memo,
        }
    }
}

/// The assembled document for one settlement currency, in source order.
/// Serialization into the interchange format is the consumer's concern.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Statement {
    pub currency: Currency,
    pub account_id: String,
    pub broker_id: String,
    pub lines: Vec<StatementTrn>,
}

impl Statement {
    /// Distinct security ids referenced by the investment lines, in first
    /// occurrence order. This feeds the security-list block of the output
    /// document.
    pub fn security_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for line in &self.lines {
            if let StatementTrn::Invest(l) = line {
                if !ids.contains(&l.security_id.as_str()) {
                    ids.push(&l.security_id);
                }
            }
        }
        ids
    }
}

/// Cash-flow rows carry no deal number, so their statement id is derived
/// from the transaction content itself. The memo already embeds every
/// mapped cell of the row, which makes the id a stable function of the row
/// alone.
pub fn generate_transaction_id(
    date: &PrimitiveDateTime,
    amount: &Decimal,
    memo: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(render_date_time(date).as_bytes());
    hasher.update(b"|");
    hasher.update(amount.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(memo.as_bytes());
    hex::encode(&hasher.finalize()[..16])
}
