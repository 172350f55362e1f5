//! Threshold evaluation run by the watch list during a merge.

use crate::{AlertEvent, AlertKind, Stock};

/// Checks a freshly priced stock against its thresholds.
///
/// The high threshold wins when both would fire, so at most one event is
/// produced per call. The threshold that fired is cleared on the stock, so
/// the same target never alerts twice.
pub fn evaluate(stock: &mut Stock) -> Option<AlertEvent> {
    let price = stock.price;

    if let Some(high) = stock.high_price_alert.filter(|high| price >= *high) {
        stock.high_price_alert = None;
        return Some(AlertEvent::new(stock.symbol.clone(), AlertKind::High, price, high));
    }

    if let Some(low) = stock.low_price_alert.filter(|low| price <= *low) {
        stock.low_price_alert = None;
        return Some(AlertEvent::new(stock.symbol.clone(), AlertKind::Low, price, low));
    }

    None
}
