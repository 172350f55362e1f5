//! The canonical, deduplicated list of tracked stocks.
//!
//! [`WatchList`] is the single-threaded store: insertion-ordered, unique by
//! symbol, grown only by `add` and shrunk only by `remove`. A merge
//! overwrites price fields in place and never changes size or order.
//!
//! [`WatchListHandle`] is the shared form handed to the scheduler and to
//! display collaborators. It serializes access behind a mutex, returns
//! copies from `list()`, and publishes [`WatchEvent::WatchListChanged`]
//! after user-driven changes. The scheduler owns notification for merges.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::alert;
use crate::domain::{round_to_places, validate_non_negative};
use crate::events::{EventBus, WatchEvent};
use crate::{AlertEvent, AlertKind, SearchResult, Stock, Symbol, ValidationError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchList {
    stocks: Vec<Stock>,
}

impl WatchList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `stock` unless its symbol is already tracked.
    pub fn add(&mut self, stock: Stock) -> bool {
        if self.position(&stock.symbol).is_some() {
            return false;
        }
        self.stocks.push(stock);
        true
    }

    pub fn remove(&mut self, symbol: &Symbol) -> bool {
        match self.position(symbol) {
            Some(index) => {
                self.stocks.remove(index);
                true
            }
            None => false,
        }
    }

    /// Writes fresh prices into matching entries and evaluates their alerts.
    ///
    /// Updates for symbols that are not tracked are ignored. At most one
    /// alert is returned per updated entry.
    pub fn merge_updates(&mut self, updates: &[Stock]) -> Vec<AlertEvent> {
        let mut alerts = Vec::new();
        for update in updates {
            let Some(index) = self.position(&update.symbol) else {
                continue;
            };
            let stock = &mut self.stocks[index];
            stock.apply_quote(update);
            if let Some(event) = alert::evaluate(stock) {
                alerts.push(event);
            }
        }
        alerts
    }

    /// Arms a price target, rounded to cents.
    ///
    /// A target below the current price becomes the low alert; anything at
    /// or above it becomes the high alert.
    pub fn set_price_alert(
        &mut self,
        symbol: &Symbol,
        target: f64,
    ) -> Result<AlertKind, ValidationError> {
        validate_non_negative("price_alert", target)?;
        let stock = self.get_mut(symbol)?;
        let target = round_to_places(target, 2);

        if target < stock.price {
            stock.set_low_price_alert(target)?;
            Ok(AlertKind::Low)
        } else {
            stock.set_high_price_alert(target)?;
            Ok(AlertKind::High)
        }
    }

    /// Disarms both thresholds. Returns false if nothing was armed.
    pub fn clear_price_alerts(&mut self, symbol: &Symbol) -> Result<bool, ValidationError> {
        let stock = self.get_mut(symbol)?;
        let had_alerts = stock.has_alerts();
        stock.low_price_alert = None;
        stock.high_price_alert = None;
        Ok(had_alerts)
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&Stock> {
        self.stocks.iter().find(|stock| &stock.symbol == symbol)
    }

    pub fn list(&self) -> &[Stock] {
        &self.stocks
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        self.stocks.iter().map(|stock| stock.symbol.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.stocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stocks.is_empty()
    }

    fn position(&self, symbol: &Symbol) -> Option<usize> {
        self.stocks.iter().position(|stock| &stock.symbol == symbol)
    }

    fn get_mut(&mut self, symbol: &Symbol) -> Result<&mut Stock, ValidationError> {
        self.stocks
            .iter_mut()
            .find(|stock| &stock.symbol == symbol)
            .ok_or_else(|| ValidationError::UnknownSymbol {
                symbol: symbol.to_string(),
            })
    }
}

/// Cloneable, thread-safe access to one [`WatchList`].
#[derive(Debug, Clone)]
pub struct WatchListHandle {
    inner: Arc<Mutex<WatchList>>,
    events: EventBus,
}

impl WatchListHandle {
    pub fn new(events: EventBus) -> Self {
        Self::with_list(WatchList::new(), events)
    }

    pub fn with_list(list: WatchList, events: EventBus) -> Self {
        Self {
            inner: Arc::new(Mutex::new(list)),
            events,
        }
    }

    pub fn add(&self, stock: Stock) -> bool {
        let added = self.lock().add(stock);
        if added {
            self.events.publish(WatchEvent::WatchListChanged);
        }
        added
    }

    /// Adopts a picked search result as an unpriced stock.
    pub fn add_search_result(&self, result: SearchResult) -> bool {
        self.add(Stock::from(result))
    }

    pub fn remove(&self, symbol: &Symbol) -> bool {
        let removed = self.lock().remove(symbol);
        if removed {
            self.events.publish(WatchEvent::WatchListChanged);
        }
        removed
    }

    /// Merges without publishing; the caller decides what to announce.
    pub fn merge_updates(&self, updates: &[Stock]) -> Vec<AlertEvent> {
        self.lock().merge_updates(updates)
    }

    pub fn set_price_alert(&self, symbol: &Symbol, target: f64) -> Result<AlertKind, ValidationError> {
        let kind = self.lock().set_price_alert(symbol, target)?;
        self.events.publish(WatchEvent::WatchListChanged);
        Ok(kind)
    }

    pub fn clear_price_alerts(&self, symbol: &Symbol) -> Result<bool, ValidationError> {
        let cleared = self.lock().clear_price_alerts(symbol)?;
        if cleared {
            self.events.publish(WatchEvent::WatchListChanged);
        }
        Ok(cleared)
    }

    /// Snapshot in display order.
    pub fn list(&self) -> Vec<Stock> {
        self.lock().list().to_vec()
    }

    pub fn get(&self, symbol: &Symbol) -> Option<Stock> {
        self.lock().get(symbol).cloned()
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        self.lock().symbols()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    // No method panics while holding the lock, so a poisoned list is still consistent.
    fn lock(&self) -> MutexGuard<'_, WatchList> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(raw: &str) -> Symbol {
        Symbol::parse(raw).expect("valid symbol")
    }

    fn stock(raw: &str, price: f64) -> Stock {
        Stock::new(symbol(raw), raw, price, 0.0, 0.0).expect("valid stock")
    }

    fn seeded() -> WatchList {
        let mut list = WatchList::new();
        list.add(stock("UWTI", 180.0));
        list.add(stock("GOOG", 180.0));
        list.add(stock("TSLA", 180.0));
        list
    }

    #[test]
    fn add_rejects_duplicate_symbol_in_any_case() {
        let mut list = seeded();
        assert!(!list.add(stock("goog", 1.0)));
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn remove_missing_symbol_is_a_no_op() {
        let mut list = seeded();
        assert!(!list.remove(&symbol("AAPL")));
        assert_eq!(list.len(), 3);
        assert!(list.remove(&symbol("goog")));
        assert_eq!(list.symbols(), vec![symbol("UWTI"), symbol("TSLA")]);
    }

    #[test]
    fn merge_keeps_size_order_and_identity_fields() {
        let mut list = seeded();
        let before = list.symbols();
        let updates = vec![
            Stock::new(symbol("TSLA"), "Tesla Motors", 250.0, 70.0, 38.9).expect("valid"),
            stock("AAPL", 101.5),
        ];

        let alerts = list.merge_updates(&updates);

        assert!(alerts.is_empty());
        assert_eq!(list.symbols(), before);
        let tsla = list.get(&symbol("TSLA")).expect("tracked");
        assert_eq!(tsla.price, 250.0);
        assert_eq!(tsla.net_change, 70.0);
        assert_eq!(tsla.name, "TSLA");
        assert!(list.get(&symbol("AAPL")).is_none());
    }

    #[test]
    fn merge_fires_each_threshold_once() {
        let mut list = WatchList::new();
        list.add(stock("AAPL", 100.0).with_high_price_alert(110.0).expect("valid"));

        let alerts = list.merge_updates(&[stock("AAPL", 110.0)]);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::High);
        assert_eq!(list.get(&symbol("AAPL")).and_then(|s| s.high_price_alert), None);

        assert!(list.merge_updates(&[stock("AAPL", 115.0)]).is_empty());
    }

    #[test]
    fn price_alert_side_follows_current_price() {
        let mut list = WatchList::new();
        list.add(stock("AAPL", 100.0));

        assert_eq!(list.set_price_alert(&symbol("AAPL"), 89.999), Ok(AlertKind::Low));
        assert_eq!(list.set_price_alert(&symbol("AAPL"), 100.0), Ok(AlertKind::High));

        let aapl = list.get(&symbol("AAPL")).expect("tracked");
        assert_eq!(aapl.low_price_alert, Some(90.0));
        assert_eq!(aapl.high_price_alert, Some(100.0));
    }

    #[test]
    fn price_alert_on_unknown_symbol_fails() {
        let mut list = WatchList::new();
        let err = list.set_price_alert(&symbol("AAPL"), 10.0).expect_err("unknown");
        assert!(matches!(err, ValidationError::UnknownSymbol { .. }));
        assert!(list.clear_price_alerts(&symbol("AAPL")).is_err());
    }

    #[test]
    fn handle_publishes_only_effective_changes() {
        let events = EventBus::new(8);
        let mut rx = events.subscribe();
        let handle = WatchListHandle::new(events);

        assert!(handle.add(stock("AAPL", 100.0)));
        assert!(!handle.add(stock("aapl", 100.0)));
        assert!(!handle.remove(&symbol("MSFT")));

        assert_eq!(rx.try_recv(), Ok(WatchEvent::WatchListChanged));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn handle_list_is_a_snapshot() {
        let handle = WatchListHandle::new(EventBus::default());
        handle.add(stock("AAPL", 100.0));

        let mut snapshot = handle.list();
        snapshot[0].price = 1.0;

        assert_eq!(handle.get(&symbol("AAPL")).map(|s| s.price), Some(100.0));
    }

    #[test]
    fn search_results_join_unpriced() {
        let handle = WatchListHandle::new(EventBus::default());
        handle.add_search_result(SearchResult::new(symbol("AAPL"), "Apple Inc."));

        let aapl = handle.get(&symbol("AAPL")).expect("tracked");
        assert_eq!(aapl.price, 0.0);
        assert_eq!(aapl.name, "Apple Inc.");
        assert!(!aapl.has_alerts());
    }
}
