//! Shared test doubles for the behavior suites.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use tickr_core::{HttpClient, HttpError, HttpRequest, HttpResponse, Stock, Symbol};

/// Replays queued responses in order and records every request it sees.
///
/// Once the queue is drained the last response is repeated.
#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
    responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    last: Mutex<Option<Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replying(body: &str) -> Self {
        Self::new().then_ok(body)
    }

    pub fn then_ok(self, body: &str) -> Self {
        self.push(Ok(HttpResponse::ok_json(body)))
    }

    pub fn then_status(self, status: u16, body: &str) -> Self {
        self.push(Ok(HttpResponse {
            status,
            body: body.to_owned(),
        }))
    }

    pub fn then_transport_error(self, message: &str) -> Self {
        self.push(Err(HttpError::new(message)))
    }

    fn push(self, response: Result<HttpResponse, HttpError>) -> Self {
        self.responses
            .lock()
            .expect("response queue should not be poisoned")
            .push_back(response);
        self
    }

    pub fn recorded_requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.recorded_requests().len()
    }

    fn next_response(&self) -> Result<HttpResponse, HttpError> {
        let mut queue = self
            .responses
            .lock()
            .expect("response queue should not be poisoned");
        let mut last = self.last.lock().expect("last response should not be poisoned");

        if let Some(response) = queue.pop_front() {
            *last = Some(response.clone());
            return response;
        }
        last.clone()
            .unwrap_or_else(|| Err(HttpError::new("no scripted response")))
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .push(request);
        let response = self.next_response();
        Box::pin(async move { response })
    }
}

pub fn symbol(raw: &str) -> Symbol {
    Symbol::parse(raw).expect("valid symbol")
}

pub fn stock(raw: &str, name: &str, price: f64) -> Stock {
    Stock::new(symbol(raw), name, price, 0.0, 0.0).expect("valid stock")
}

/// Single-quote response in the upstream's bare-object shape.
pub fn single_quote(name: &str, raw_symbol: &str, price: &str, change: &str, percent: &str) -> String {
    format!(
        r#"{{"query":{{"count":1,"results":{{"quote":{{"Name":"{name}","symbol":"{raw_symbol}","LastTradePriceOnly":"{price}","Change":"{change}","ChangeinPercent":"{percent}"}}}}}}}}"#
    )
}
