//! Price Watch
//!
//! The recurring evaluation of tracked tickers against their target prices.

mod alert;
mod debounce;
mod engine;
mod targets;

pub use alert::{OpportunityAlert, Trend};
pub use debounce::{AlertDebounce, DEFAULT_REALERT_DROP_PERCENT};
pub use engine::{PriceWatcher, TickOutcome, TickReport, WatchConfig};
pub use targets::{parse_decimal, TrackedTargets};
