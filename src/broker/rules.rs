use lazy_static::lazy_static;
use regex::Regex;

use crate::ofx::{BankTrnType, Currency};

/// What a free-text operation label classifies into.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LabelAction {
    /// A security purchase leg.
    Buy,
    /// A security sale leg.
    Sell,
    /// Dividend or coupon income.
    Div,
    /// A pure cash movement of the given type.
    Bank(BankTrnType),
    /// Recognized, and deliberately not imported.
    Skip,
}

pub struct LabelRule {
    pub label: &'static str,
    pub action: LabelAction,
}

/// One ticker rewrite step. Rules are tried in order; the first one whose
/// currency guard passes and whose pattern matches is applied, and the rest
/// are skipped.
pub struct TickerRule {
    /// When present, the rule only applies to statements extracted for a
    /// matching settlement currency.
    pub currency: Option<Regex>,
    pub pattern: Regex,
    pub substitution: &'static str,
}

/// Recognizes trade-section rows that are currency conversions rather than
/// security deals, by the instrument's display name.
pub struct CurrencyPairRule {
    pub name_pattern: Regex,
    pub pair: (&'static str, &'static str),
}

impl CurrencyPairRule {
    /// The pair member that is not the deal's settlement currency, i.e. the
    /// currency being bought or sold.
    pub fn other_currency(&self, settlement: &Currency) -> Option<&'static str> {
        let (a, b) = self.pair;
        if settlement.as_str() == a {
            Some(b)
        } else if settlement.as_str() == b {
            Some(a)
        } else {
            None
        }
    }
}

/// The classification tables driving one parse. Injected at parser
/// construction so tests can substitute their own.
pub struct RuleSet {
    pub labels: Vec<LabelRule>,
    pub tickers: Vec<TickerRule>,
    pub currency_pairs: Vec<CurrencyPairRule>,
}

impl RuleSet {
    pub fn label_action(&self, label: &str) -> Option<LabelAction> {
        self.labels
            .iter()
            .find(|rule| rule.label == label)
            .map(|rule| rule.action)
    }

    /// Rewrites a broker-native security code into the Yahoo Finance
    /// convention. Pure and idempotent; unmatched tickers pass through
    /// unchanged.
    pub fn transform_ticker(&self, ticker: &str, currency: &Currency) -> String {
        for rule in &self.tickers {
            if let Some(guard) = &rule.currency {
                if !guard.is_match(currency.as_str()) {
                    continue;
                }
            }
            if rule.pattern.is_match(ticker) {
                return rule
                    .pattern
                    .replace_all(ticker, rule.substitution)
                    .into_owned();
            }
        }
        ticker.to_string()
    }

    pub fn currency_pair(&self, security_full_name: &str) -> Option<&CurrencyPairRule> {
        self.currency_pairs
            .iter()
            .find(|rule| rule.name_pattern.is_match(security_full_name))
    }
}

fn label(label: &'static str, action: LabelAction) -> LabelRule {
    LabelRule { label, action }
}

fn ticker(
    currency: Option<&str>,
    pattern: &str,
    substitution: &'static str,
) -> TickerRule {
    TickerRule {
        currency: currency.map(|c| Regex::new(c).unwrap()),
        pattern: Regex::new(pattern).unwrap(),
        substitution,
    }
}

lazy_static! {
    /// The tables for Tinkoff Investments broker reports.
    pub static ref TINKOFF_RULES: RuleSet = RuleSet {
        labels: vec![
            // Buy/sell deals
            label("Покупка", LabelAction::Buy),
            label("Продажа", LabelAction::Sell),
            // REPO legs bloat the transaction log and make it hard to
            // reconcile; their charges and premiums surface through the
            // cash-flow summary instead.
            label("РЕПО 1 Покупка", LabelAction::Skip),
            label("РЕПО 2 Покупка", LabelAction::Skip),
            label("РЕПО 1 Продажа", LabelAction::Skip),
            label("РЕПО 2 Продажа", LabelAction::Skip),
            // Cash operations
            label("Пополнение счета", LabelAction::Bank(BankTrnType::Debit)),
            label("Вывод средств", LabelAction::Bank(BankTrnType::Credit)),
            label("Комиссия по тарифу", LabelAction::Bank(BankTrnType::SrvChg)),
            // Aggregate buy/sell and fee summary lines duplicate the
            // per-deal rows imported from the trade section.
            label("Покупка/продажа", LabelAction::Skip),
            label("Комиссия за сделки", LabelAction::Skip),
            label("РЕПО", LabelAction::Bank(BankTrnType::Debit)),
            label("Выплата дивидендов", LabelAction::Div),
            label("Выплата купонов", LabelAction::Div),
            // Dividends received while holding a short position are
            // clawed back.
            label(
                "Возмещение дохода по дивидендам - списание",
                LabelAction::Bank(BankTrnType::Fee),
            ),
            label("Налог", LabelAction::Bank(BankTrnType::Other)),
            label("Налог (купонный доход)", LabelAction::Bank(BankTrnType::Other)),
            label("Налог (дивиденды)", LabelAction::Bank(BankTrnType::Other)),
        ],
        tickers: vec![
            // EU listings appear as ticker@country; Yahoo Finance expects
            // ticker.country.
            ticker(Some("EUR"), "@", "."),
            // MOEX ETFs (SBSP, TMOS) don't follow the <ticker>.ME pattern
            // on Yahoo, and 6+ character codes are bonds with their own
            // price lookup; both stay as-is.
            ticker(Some("RUB"), r"(SBSP|TMOS|\w{6,})", "${1}"),
            // Other RUB listings resolve on Yahoo with a .ME suffix.
            ticker(Some("RUB"), r"(\w+)", "${1}.ME"),
            // TCS Group trades on MOEX in RUB but pays dividends in USD;
            // suffix it as if it were a RUB listing.
            ticker(Some("USD"), r"(TCSG)", "${1}.ME"),
            // Dotted US tickers (BRK.B) are dashed on Yahoo (BRK-B).
            ticker(Some("USD"), r"\.", "-"),
        ],
        currency_pairs: vec![
            CurrencyPairRule {
                name_pattern: Regex::new("USDRUB_").unwrap(),
                pair: ("USD", "RUB"),
            },
            CurrencyPairRule {
                name_pattern: Regex::new("EURRUB_").unwrap(),
                pair: ("EUR", "RUB"),
            },
        ],
    };
}
