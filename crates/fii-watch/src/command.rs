//! Chat command parsing
//!
//! Turns `/buy MXRF11 10 9,74 paper` style messages into typed commands.
//! Portuguese aliases are accepted alongside the English names.

use rust_decimal::Decimal;

use crate::error::{Result, WatchError};
use crate::model::normalize_ticker;
use crate::watch::parse_decimal;

pub const BUY_USAGE: &str = "/buy TICKER QTY PRICE (KIND)\nEx: /buy MXRF11 10 9.74 Paper";
pub const SELL_USAGE: &str = "/sell TICKER QTY";
pub const DIVIDEND_USAGE: &str = "/div TICKER AMOUNT";
pub const BOOK_VALUE_USAGE: &str = "/vp TICKER AMOUNT";
pub const QUOTE_USAGE: &str = "/quote TICKER\nEx: /quote MXRF11";

pub const HELP_TEXT: &str = "🏢 *FII watcher commands*\n\n\
/start - watch target prices in this chat\n\
/buy TICKER QTY PRICE (KIND) - record a purchase\n\
/sell TICKER QTY - record a sale\n\
/div TICKER AMOUNT - set the last dividend\n\
/vp TICKER AMOUNT - set the book value per share\n\
/status - portfolio summary\n\
/today - closing report\n\
/quote TICKER - current price";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Buy {
        ticker: String,
        quantity: u64,
        price: Decimal,
        kind: Option<String>,
    },
    Sell {
        ticker: String,
        quantity: u64,
    },
    Dividend {
        ticker: String,
        amount: Decimal,
    },
    BookValue {
        ticker: String,
        amount: Decimal,
    },
    Status,
    DailyReport,
    Quote {
        ticker: String,
    },
}

impl Command {
    /// Parse a chat message that starts with `/`.
    ///
    /// A `@BotName` suffix on the command is ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let mut words = text.split_whitespace();
        let head = words.next().unwrap_or_default();
        let name = head
            .strip_prefix('/')
            .ok_or_else(|| WatchError::UnknownCommand(head.to_string()))?;
        let name = name.split('@').next().unwrap_or_default().to_lowercase();
        let args: Vec<&str> = words.collect();

        match name.as_str() {
            "start" => Ok(Self::Start),
            "help" => Ok(Self::Help),
            "buy" | "comprar" => {
                let [ticker, quantity, price, rest @ ..] = args.as_slice() else {
                    return Err(WatchError::Usage(BUY_USAGE));
                };
                Ok(Self::Buy {
                    ticker: normalize_ticker(ticker),
                    quantity: parse_quantity(quantity).ok_or(WatchError::Usage(BUY_USAGE))?,
                    price: parse_positive(price).ok_or(WatchError::Usage(BUY_USAGE))?,
                    kind: rest.first().map(|k| (*k).to_string()),
                })
            }
            "sell" | "vender" => {
                let [ticker, quantity, ..] = args.as_slice() else {
                    return Err(WatchError::Usage(SELL_USAGE));
                };
                Ok(Self::Sell {
                    ticker: normalize_ticker(ticker),
                    quantity: parse_quantity(quantity).ok_or(WatchError::Usage(SELL_USAGE))?,
                })
            }
            "dividend" | "div" => {
                let [ticker, amount, ..] = args.as_slice() else {
                    return Err(WatchError::Usage(DIVIDEND_USAGE));
                };
                Ok(Self::Dividend {
                    ticker: normalize_ticker(ticker),
                    amount: parse_decimal(amount)
                        .filter(|a| *a >= Decimal::ZERO)
                        .ok_or(WatchError::Usage(DIVIDEND_USAGE))?,
                })
            }
            "bookvalue" | "vp" => {
                let [ticker, amount, ..] = args.as_slice() else {
                    return Err(WatchError::Usage(BOOK_VALUE_USAGE));
                };
                Ok(Self::BookValue {
                    ticker: normalize_ticker(ticker),
                    amount: parse_positive(amount).ok_or(WatchError::Usage(BOOK_VALUE_USAGE))?,
                })
            }
            "status" | "portfolio" | "carteira" => Ok(Self::Status),
            "today" | "hoje" | "dailyreport" => Ok(Self::DailyReport),
            "quote" | "fii" => {
                let [ticker, ..] = args.as_slice() else {
                    return Err(WatchError::Usage(QUOTE_USAGE));
                };
                Ok(Self::Quote {
                    ticker: normalize_ticker(ticker),
                })
            }
            _ => Err(WatchError::UnknownCommand(name)),
        }
    }
}

fn parse_quantity(text: &str) -> Option<u64> {
    text.trim().parse::<u64>().ok().filter(|q| *q > 0)
}

fn parse_positive(text: &str) -> Option<Decimal> {
    parse_decimal(text).filter(|p| *p > Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_buy() {
        let cmd = Command::parse("/comprar mxrf11 10 9,74 papel").unwrap();
        assert_eq!(
            cmd,
            Command::Buy {
                ticker: "MXRF11".into(),
                quantity: 10,
                price: dec!(9.74),
                kind: Some("papel".into()),
            }
        );

        let cmd = Command::parse("/buy@FiiBot HGLG11 2 157.3").unwrap();
        assert!(matches!(cmd, Command::Buy { kind: None, quantity: 2, .. }));
    }

    #[test]
    fn test_malformed_buy_gives_usage() {
        for text in ["/buy", "/buy MXRF11 ten 9.74", "/buy MXRF11 10 abc", "/buy MXRF11 -1 9", "/buy MXRF11 10 0"] {
            assert!(
                matches!(Command::parse(text), Err(WatchError::Usage(BUY_USAGE))),
                "{text}"
            );
        }
    }

    #[test]
    fn test_parse_sell_and_dividend() {
        assert_eq!(
            Command::parse("/vender knri11 3").unwrap(),
            Command::Sell {
                ticker: "KNRI11".into(),
                quantity: 3
            }
        );
        assert_eq!(
            Command::parse("/div KNRI11 1,10").unwrap(),
            Command::Dividend {
                ticker: "KNRI11".into(),
                amount: dec!(1.10)
            }
        );
        assert!(matches!(Command::parse("/sell KNRI11"), Err(WatchError::Usage(SELL_USAGE))));
        assert!(matches!(Command::parse("/div KNRI11 -2"), Err(WatchError::Usage(DIVIDEND_USAGE))));
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(Command::parse("/carteira").unwrap(), Command::Status);
        assert_eq!(Command::parse("/portfolio").unwrap(), Command::Status);
        assert_eq!(Command::parse("/hoje").unwrap(), Command::DailyReport);
        assert_eq!(Command::parse("/START").unwrap(), Command::Start);
        assert_eq!(
            Command::parse("/fii xplg11").unwrap(),
            Command::Quote {
                ticker: "XPLG11".into()
            }
        );
    }

    #[test]
    fn test_unknown_command() {
        assert!(matches!(Command::parse("/moon"), Err(WatchError::UnknownCommand(n)) if n == "moon"));
        assert!(matches!(Command::parse("hello"), Err(WatchError::UnknownCommand(_))));
    }
}
