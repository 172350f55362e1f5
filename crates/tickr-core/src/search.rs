//! Single-term ticker lookup.
//!
//! Called on every keystroke of the search screen, so an empty term
//! short-circuits without a request. Rate shaping is the caller's job.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::http_client::{fetch_body, HttpClient, HttpRequest, ReqwestHttpClient};
use crate::{FetchError, RecordError, SearchResult, Symbol, TickrConfig};

#[derive(Clone)]
pub struct SymbolSearchClient {
    http_client: Arc<dyn HttpClient>,
    endpoint: String,
    timeout_ms: u64,
}

impl SymbolSearchClient {
    pub fn new(http_client: Arc<dyn HttpClient>, config: &TickrConfig) -> Self {
        Self {
            http_client,
            endpoint: config.search_endpoint.clone(),
            timeout_ms: config.request_timeout_ms,
        }
    }

    pub fn from_config(config: &TickrConfig) -> Self {
        Self::new(Arc::new(ReqwestHttpClient::new()), config)
    }

    /// Looks up candidate symbols for `term`.
    ///
    /// # Errors
    ///
    /// Same classification as the quote fetcher: `Network`, `Decode`, or
    /// `UnexpectedShape` when the body is not a JSON array.
    pub async fn search(&self, term: &str) -> Result<Vec<SearchResult>, FetchError> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let request = HttpRequest::get(self.build_search_url(term))
            .with_header("accept", "application/json")
            .with_timeout_ms(self.timeout_ms);
        let body = fetch_body(self.http_client.as_ref(), request).await?;

        let results = parse_search_response(&body)?;
        tracing::debug!(term, results = results.len(), "symbol search finished");
        Ok(results)
    }

    pub fn build_search_url(&self, term: &str) -> String {
        format!("{}{}", self.endpoint, urlencoding::encode(term.trim()))
    }
}

#[derive(Debug, Deserialize)]
struct SearchRecord {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    company: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Parses a JSON array of `{symbol, company}` records, skipping incomplete ones.
pub fn parse_search_response(body: &str) -> Result<Vec<SearchResult>, FetchError> {
    let json: Value =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    let Value::Array(records) = json else {
        return Err(FetchError::UnexpectedShape(String::from(
            "expected a JSON array of search results",
        )));
    };

    Ok(records
        .into_iter()
        .filter_map(|record| match parse_search_record(record) {
            Ok(result) => Some(result),
            Err(error) => {
                tracing::debug!(%error, "dropping search record");
                None
            }
        })
        .collect())
}

fn parse_search_record(record: Value) -> Result<SearchResult, RecordError> {
    let record: SearchRecord = serde_json::from_value(record)
        .map_err(|e| RecordError::invalid("record", e.to_string()))?;

    let raw_symbol = record.symbol.ok_or_else(|| RecordError::missing("symbol"))?;
    let symbol =
        Symbol::parse(&raw_symbol).map_err(|e| RecordError::invalid("symbol", e.to_string()))?;
    let name = record
        .company
        .or(record.name)
        .ok_or_else(|| RecordError::missing("company"))?;

    Ok(SearchResult::new(symbol, name))
}
