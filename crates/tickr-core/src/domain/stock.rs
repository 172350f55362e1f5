use serde::{Deserialize, Serialize};

use crate::{SearchResult, Symbol, ValidationError};

/// A tracked stock: identity, last quote, and optional price-alert thresholds.
///
/// When set, `low_price_alert` sits strictly below `price` and
/// `high_price_alert` at or above it. The setters enforce this; a refresh
/// may later move the price across a threshold, which is what the alert
/// evaluator looks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    pub symbol: Symbol,
    pub name: String,
    pub price: f64,
    pub net_change: f64,
    pub net_change_percent: f64,
    pub low_price_alert: Option<f64>,
    pub high_price_alert: Option<f64>,
}

impl Stock {
    pub fn new(
        symbol: Symbol,
        name: impl Into<String>,
        price: f64,
        net_change: f64,
        net_change_percent: f64,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("price", price)?;
        validate_finite("net_change", net_change)?;
        validate_finite("net_change_percent", net_change_percent)?;

        Ok(Self {
            symbol,
            name: name.into(),
            price,
            net_change,
            net_change_percent,
            low_price_alert: None,
            high_price_alert: None,
        })
    }

    /// A freshly picked stock with zeroed price fields, filled by the next refresh.
    pub fn unpriced(symbol: Symbol, name: impl Into<String>) -> Self {
        Self {
            symbol,
            name: name.into(),
            price: 0.0,
            net_change: 0.0,
            net_change_percent: 0.0,
            low_price_alert: None,
            high_price_alert: None,
        }
    }

    pub fn set_low_price_alert(&mut self, threshold: f64) -> Result<(), ValidationError> {
        validate_non_negative("low_price_alert", threshold)?;
        if threshold >= self.price {
            return Err(ValidationError::LowAlertNotBelowPrice {
                threshold,
                price: self.price,
            });
        }
        self.low_price_alert = Some(threshold);
        Ok(())
    }

    pub fn set_high_price_alert(&mut self, threshold: f64) -> Result<(), ValidationError> {
        validate_non_negative("high_price_alert", threshold)?;
        if threshold < self.price {
            return Err(ValidationError::HighAlertBelowPrice {
                threshold,
                price: self.price,
            });
        }
        self.high_price_alert = Some(threshold);
        Ok(())
    }

    pub fn with_low_price_alert(mut self, threshold: f64) -> Result<Self, ValidationError> {
        self.set_low_price_alert(threshold)?;
        Ok(self)
    }

    pub fn with_high_price_alert(mut self, threshold: f64) -> Result<Self, ValidationError> {
        self.set_high_price_alert(threshold)?;
        Ok(self)
    }

    /// Copies the price fields of a fresher quote; identity, name and thresholds stay.
    pub fn apply_quote(&mut self, update: &Stock) {
        self.price = update.price;
        self.net_change = update.net_change;
        self.net_change_percent = update.net_change_percent;
    }

    pub fn has_alerts(&self) -> bool {
        self.low_price_alert.is_some() || self.high_price_alert.is_some()
    }
}

impl From<SearchResult> for Stock {
    fn from(result: SearchResult) -> Self {
        Self::unpriced(result.symbol, result.name)
    }
}

/// Rounds to the given number of decimal places.
pub fn round_to_places(value: f64, places: u32) -> f64 {
    let divisor = 10f64.powi(places as i32);
    (value * divisor).round() / divisor
}

pub(crate) fn validate_non_negative(
    field: &'static str,
    value: f64,
) -> Result<(), ValidationError> {
    validate_finite(field, value)?;
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

fn validate_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    Ok(())
}
