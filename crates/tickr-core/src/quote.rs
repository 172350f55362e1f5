//! Batched quote fetching and tolerant response parsing.
//!
//! One request covers every watched symbol. The upstream nests quotes under
//! `query.results.quote`, as a bare object when one symbol was asked for
//! and as an array otherwise; both shapes are normalized to a list before
//! records are read. A record missing its name, symbol or price is dropped
//! on its own. Change fields are optional and default to zero.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::http_client::{fetch_body, HttpClient, HttpRequest, ReqwestHttpClient};
use crate::{FetchError, RecordError, Stock, Symbol, TickrConfig};

/// Fetches current quotes for a batch of symbols.
#[derive(Clone)]
pub struct QuoteFetcher {
    http_client: Arc<dyn HttpClient>,
    endpoint: String,
    env: String,
    timeout_ms: u64,
}

impl QuoteFetcher {
    pub fn new(http_client: Arc<dyn HttpClient>, config: &TickrConfig) -> Self {
        Self {
            http_client,
            endpoint: config.quote_endpoint.clone(),
            env: config.quote_env.clone(),
            timeout_ms: config.request_timeout_ms,
        }
    }

    /// Fetcher on the production reqwest transport.
    pub fn from_config(config: &TickrConfig) -> Self {
        Self::new(Arc::new(ReqwestHttpClient::new()), config)
    }

    /// Fetches and parses quotes for `symbols`.
    ///
    /// An empty slice returns an empty list without touching the network.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Network`] on transport failure or a non-2xx status
    /// - [`FetchError::Decode`] when the body is not JSON
    /// - [`FetchError::UnexpectedShape`] when `query.results.quote` is absent
    pub async fn refresh(&self, symbols: &[Symbol]) -> Result<Vec<Stock>, FetchError> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.build_quote_url(symbols);
        tracing::debug!(symbols = symbols.len(), %url, "requesting quotes");

        let request = HttpRequest::get(url)
            .with_header("accept", "application/json")
            .with_timeout_ms(self.timeout_ms);
        let body = fetch_body(self.http_client.as_ref(), request).await?;

        let stocks = parse_quote_response(&body)?;
        tracing::debug!(requested = symbols.len(), parsed = stocks.len(), "quotes parsed");
        Ok(stocks)
    }

    /// Builds the single batched request URL for `symbols`.
    pub fn build_quote_url(&self, symbols: &[Symbol]) -> String {
        let tickers = symbols
            .iter()
            .map(|symbol| format!("\"{symbol}\""))
            .collect::<Vec<_>>()
            .join(",");
        let query = format!("select * from yahoo.finance.quotes where symbol in ({tickers})");

        format!(
            "{}?q={}&format=json&env={}",
            self.endpoint,
            urlencoding::encode(&query),
            urlencoding::encode(&self.env)
        )
    }
}

#[derive(Debug, Deserialize)]
struct YqlEnvelope {
    query: YqlQuery,
}

#[derive(Debug, Deserialize)]
struct YqlQuery {
    results: YqlResults,
}

#[derive(Debug, Deserialize)]
struct YqlResults {
    quote: OneOrMany,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<Value>),
    One(Map<String, Value>),
}

impl OneOrMany {
    fn into_records(self) -> Vec<Value> {
        match self {
            Self::Many(records) => records,
            Self::One(record) => vec![Value::Object(record)],
        }
    }
}

#[derive(Debug, Deserialize)]
struct YqlQuote {
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(default)]
    symbol: Option<String>,
    #[serde(rename = "LastTradePriceOnly", default)]
    last_trade_price: Option<NumericField>,
    #[serde(rename = "Change", default)]
    change: Option<NumericField>,
    #[serde(rename = "ChangeinPercent", default)]
    change_in_percent: Option<NumericField>,
}

/// Upstream numbers usually arrive as strings, occasionally as JSON numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumericField {
    Number(f64),
    Text(String),
}

/// Parses a raw quote response body into stocks.
///
/// Corrupt records are logged and skipped. Duplicate symbols keep their
/// first occurrence.
pub fn parse_quote_response(body: &str) -> Result<Vec<Stock>, FetchError> {
    let json: Value =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    let envelope: YqlEnvelope = serde_json::from_value(json).map_err(|e| {
        FetchError::UnexpectedShape(format!("expected query.results.quote: {e}"))
    })?;

    let mut seen = HashSet::new();
    let mut stocks = Vec::new();
    for record in envelope.query.results.quote.into_records() {
        let raw_symbol = record_symbol(&record);
        match parse_quote_record(record) {
            Ok(stock) => {
                if seen.insert(stock.symbol.clone()) {
                    stocks.push(stock);
                } else {
                    tracing::debug!(symbol = %stock.symbol, "duplicate quote record ignored");
                }
            }
            Err(error) => {
                tracing::warn!(symbol = raw_symbol.as_deref(), %error, "dropping quote record")
            }
        }
    }

    Ok(stocks)
}

/// Symbol as sent upstream, if the record carries one at all.
fn record_symbol(record: &Value) -> Option<String> {
    record
        .get("symbol")
        .and_then(Value::as_str)
        .map(str::to_owned)
}

fn parse_quote_record(record: Value) -> Result<Stock, RecordError> {
    let quote: YqlQuote = serde_json::from_value(record)
        .map_err(|e| RecordError::invalid("record", e.to_string()))?;

    let raw_symbol = quote.symbol.ok_or_else(|| RecordError::missing("symbol"))?;
    let symbol =
        Symbol::parse(&raw_symbol).map_err(|e| RecordError::invalid("symbol", e.to_string()))?;
    let name = quote.name.ok_or_else(|| RecordError::missing("Name"))?;
    let price = quote
        .last_trade_price
        .ok_or_else(|| RecordError::missing("LastTradePriceOnly"))
        .and_then(parse_price)?;

    let net_change = parse_change(quote.change, &symbol, "Change");
    let net_change_percent = parse_change(quote.change_in_percent, &symbol, "ChangeinPercent");

    Stock::new(symbol, name, price, net_change, net_change_percent)
        .map_err(|e| RecordError::invalid("LastTradePriceOnly", e.to_string()))
}

fn parse_price(field: NumericField) -> Result<f64, RecordError> {
    let value = match field {
        NumericField::Number(value) => value,
        NumericField::Text(text) => text.trim().parse::<f64>().map_err(|_| {
            RecordError::invalid("LastTradePriceOnly", format!("'{text}' is not numeric"))
        })?,
    };

    if !value.is_finite() || value < 0.0 {
        return Err(RecordError::invalid(
            "LastTradePriceOnly",
            format!("{value} is not a valid price"),
        ));
    }
    Ok(value)
}

fn parse_change(field: Option<NumericField>, symbol: &Symbol, key: &'static str) -> f64 {
    let parsed = match field {
        None => return 0.0,
        Some(NumericField::Number(value)) => Some(value).filter(|v| v.is_finite()),
        Some(NumericField::Text(text)) => strip_unit(&text),
    };

    parsed.unwrap_or_else(|| {
        tracing::debug!(%symbol, field = key, "unparsable change value, defaulting to 0");
        0.0
    })
}

/// Parses a signed number followed by unit characters, e.g. `"+1.5%"` or `"1.5+"`.
fn strip_unit(raw: &str) -> Option<f64> {
    let numeric = raw
        .trim()
        .trim_end_matches(|ch: char| !ch.is_ascii_digit() && ch != '.');
    numeric.parse::<f64>().ok().filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE: &str = r#"{"query":{"count":1,"results":{"quote":{"Name":"Apple","symbol":"AAPL","LastTradePriceOnly":"101.5","Change":"1.5+","ChangeinPercent":"1.5%+"}}}}"#;

    fn symbols(raw: &[&str]) -> Vec<Symbol> {
        raw.iter()
            .map(|s| Symbol::parse(s).expect("valid symbol"))
            .collect()
    }

    #[test]
    fn parses_single_object_response() {
        let stocks = parse_quote_response(SINGLE).expect("must parse");

        assert_eq!(stocks.len(), 1);
        let aapl = &stocks[0];
        assert_eq!(aapl.symbol.as_str(), "AAPL");
        assert_eq!(aapl.name, "Apple");
        assert_eq!(aapl.price, 101.5);
        assert_eq!(aapl.net_change, 1.5);
        assert_eq!(aapl.net_change_percent, 1.5);
    }

    #[test]
    fn bare_object_and_one_element_array_parse_identically() {
        let array = r#"{"query":{"results":{"quote":[{"Name":"Apple","symbol":"AAPL","LastTradePriceOnly":"101.5","Change":"1.5+","ChangeinPercent":"1.5%+"}]}}}"#;

        assert_eq!(
            parse_quote_response(SINGLE).expect("object"),
            parse_quote_response(array).expect("array")
        );
    }

    #[test]
    fn signed_change_values_keep_their_sign() {
        let body = r#"{"query":{"results":{"quote":{"Name":"Tesla","symbol":"TSLA","LastTradePriceOnly":"250.00","Change":"-3.20","ChangeinPercent":"-1.26%"}}}}"#;
        let stocks = parse_quote_response(body).expect("must parse");
        assert_eq!(stocks[0].net_change, -3.2);
        assert_eq!(stocks[0].net_change_percent, -1.26);
    }

    #[test]
    fn missing_change_fields_default_to_zero() {
        let body = r#"{"query":{"results":{"quote":{"Name":"Tesla","symbol":"TSLA","LastTradePriceOnly":250,"Change":null}}}}"#;
        let stocks = parse_quote_response(body).expect("must parse");
        assert_eq!(stocks[0].price, 250.0);
        assert_eq!(stocks[0].net_change, 0.0);
        assert_eq!(stocks[0].net_change_percent, 0.0);
    }

    #[test]
    fn corrupt_records_are_dropped_individually() {
        let body = r#"{"query":{"results":{"quote":[
            {"Name":"Apple","symbol":"AAPL","LastTradePriceOnly":"101.5"},
            {"Name":"Mystery","LastTradePriceOnly":"5.0"},
            {"Name":"Tesla","symbol":"TSLA","LastTradePriceOnly":"N/A"},
            "not a record",
            {"Name":"Google","symbol":"GOOG","LastTradePriceOnly":"700.1"}
        ]}}}"#;

        let stocks = parse_quote_response(body).expect("batch survives");
        let parsed: Vec<&str> = stocks.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(parsed, vec!["AAPL", "GOOG"]);
    }

    #[test]
    fn dropped_record_reports_its_raw_symbol_when_present() {
        let priced_badly: Value =
            serde_json::from_str(r#"{"Name":"Tesla","symbol":"TSLA","LastTradePriceOnly":"N/A"}"#)
                .expect("json");
        let nameless: Value =
            serde_json::from_str(r#"{"Name":"Mystery","LastTradePriceOnly":"5.0"}"#).expect("json");

        assert!(parse_quote_record(priced_badly.clone()).is_err());
        assert_eq!(record_symbol(&priced_badly).as_deref(), Some("TSLA"));
        assert_eq!(record_symbol(&nameless), None);
        assert_eq!(record_symbol(&Value::String(String::from("not a record"))), None);
    }

    #[test]
    fn digit_leading_tickers_are_kept() {
        let body = r#"{"query":{"results":{"quote":[
            {"Name":"Toyota Motor","symbol":"7203.T","LastTradePriceOnly":"2850.5"},
            {"Name":"Tencent","symbol":"0700.HK","LastTradePriceOnly":"372.4"}
        ]}}}"#;

        let stocks = parse_quote_response(body).expect("batch parses");
        let parsed: Vec<&str> = stocks.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(parsed, vec!["7203.T", "0700.HK"]);
    }

    #[test]
    fn duplicate_symbols_keep_first_occurrence() {
        let body = r#"{"query":{"results":{"quote":[
            {"Name":"Apple","symbol":"AAPL","LastTradePriceOnly":"101.5"},
            {"Name":"Apple again","symbol":"aapl","LastTradePriceOnly":"1.0"}
        ]}}}"#;

        let stocks = parse_quote_response(body).expect("must parse");
        assert_eq!(stocks.len(), 1);
        assert_eq!(stocks[0].price, 101.5);
    }

    #[test]
    fn non_json_body_is_a_decode_error() {
        let err = parse_quote_response("<html>down</html>").expect_err("must fail");
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn missing_nested_path_is_unexpected_shape() {
        for body in [
            r#"{"error":{"description":"no such table"}}"#,
            r#"{"query":{"count":0,"results":null}}"#,
            r#"{"query":{"results":{"quote":"AAPL"}}}"#,
        ] {
            let err = parse_quote_response(body).expect_err("must fail");
            assert!(err.is_no_data(), "{body} gave {err:?}");
        }
    }

    #[test]
    fn batched_url_quotes_and_encodes_every_symbol() {
        let fetcher = QuoteFetcher::from_config(&TickrConfig::default());
        let url = fetcher.build_quote_url(&symbols(&["AAPL", "TSLA"]));

        assert!(url.starts_with("https://query.yahooapis.com/v1/public/yql?q="));
        assert!(url.contains("%28%22AAPL%22%2C%22TSLA%22%29"), "{url}");
        assert!(url.ends_with("&format=json&env=http%3A%2F%2Fdatatables.org%2Falltables.env"));
    }

    #[test]
    fn strips_trailing_units() {
        assert_eq!(strip_unit("1.5%"), Some(1.5));
        assert_eq!(strip_unit("+0.75%"), Some(0.75));
        assert_eq!(strip_unit("1.5%+"), Some(1.5));
        assert_eq!(strip_unit("%"), None);
    }
}
