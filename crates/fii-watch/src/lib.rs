//! # fii-watch
//!
//! Price watching and portfolio bookkeeping for Brazilian real-estate
//! funds (FIIs).
//!
//! ## How a tick works
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌──────────────┐   ┌────────────┐
//! │  timer   │──▶│ PriceWatcher │──▶│ QuoteSource  │   │  Notifier  │
//! └──────────┘   │ (all chats)  │──▶│ LedgerStore  │   └────────────┘
//!                │              │──▶│ AlertDebounce│──────────▲
//!                └──────────────┘   └──────────────┘
//! ```
//!
//! For every tracked `(ticker, target)` the watcher looks up the price,
//! stores it with its change against the previous observation, and sends
//! a buy-opportunity alert to every watched chat when the price is at or
//! below target. After a chat's first alert for a ticker, that chat hears
//! nothing more until the price drops at least another 1% below the price
//! it was last alerted at.
//!
//! ## Example: target R$ 100.00
//!
//! ```text
//! tick  price    change   alert?
//!  1    95.00     0.00%   yes (first time in range, margin 5%)
//!  2    94.00    -1.05%   yes (1.05% below last alert)
//!  3    94.00     0.00%   no
//!  4   105.00   +11.70%   no  (above target)
//! ```

pub mod command;
pub mod error;
pub mod ledger;
pub mod model;
pub mod notify;
pub mod portfolio;
pub mod quote;
pub mod report;
pub mod watch;

pub use command::Command;
pub use error::{Result, WatchError};
pub use ledger::{IfMissing, JsonFileLedger, LedgerStore, MemoryLedger};
pub use model::FundRecord;
pub use notify::{ChatId, LogNotifier, MemoryNotifier, Notifier};
pub use portfolio::Portfolio;
pub use quote::{MockQuoteSource, QuoteSource, YahooQuoteSource};
pub use report::PortfolioSummary;
pub use watch::{PriceWatcher, TickOutcome, TickReport, TrackedTargets, WatchConfig};
