use serde::{Deserialize, Serialize};

use crate::Symbol;

/// One candidate returned by a ticker lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub symbol: Symbol,
    pub name: String,
}

impl SearchResult {
    pub fn new(symbol: Symbol, name: impl Into<String>) -> Self {
        Self {
            symbol,
            name: name.into(),
        }
    }
}
