//! # Domain Models
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Stock`] | Tracked stock with last quote and alert thresholds |
//! | [`SearchResult`] | Symbol/name pair from a ticker lookup |
//! | [`AlertEvent`] | One-shot threshold crossing |
//! | [`Symbol`] | Validated, uppercase ticker |
//! | [`UtcDateTime`] | UTC timestamp |
//!
//! Constructors validate: prices are finite and non-negative, and alert
//! thresholds must sit on the correct side of the current price.

mod alert;
mod search_result;
mod stock;
mod symbol;
mod timestamp;

pub use alert::{AlertEvent, AlertKind};
pub use search_result::SearchResult;
pub use stock::{round_to_places, Stock};
pub(crate) use stock::validate_non_negative;
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
