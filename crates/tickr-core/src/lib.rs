//! # Tickr Core
//!
//! Data-refresh core for the tickr watch-list app: polls a finance quote
//! service on a fixed interval, keeps the user's deduplicated watch list
//! current, and raises one-shot alerts when a price crosses a user-set
//! threshold.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`alert`] | Threshold evaluation (high wins, fire once, then clear) |
//! | [`config`] | Endpoints, polling interval, timeouts |
//! | [`domain`] | `Stock`, `SearchResult`, `AlertEvent`, `Symbol` |
//! | [`error`] | Validation, fetch, record and config errors |
//! | [`events`] | Typed broadcast of watch-list and alert notifications |
//! | [`http_client`] | Transport abstraction and reqwest implementation |
//! | [`quote`] | Batched quote fetcher and response parser |
//! | [`scheduler`] | Interval-driven refresh loop with in-flight guard |
//! | [`search`] | Single-term ticker lookup |
//! | [`watch_list`] | Watch list store and its shared handle |
//!
//! ## Data Flow
//!
//! ```text
//! RefreshScheduler ──tick──▶ QuoteFetcher ──HTTP──▶ quote service
//!        │                        │
//!        │                  Vec<Stock>
//!        ▼                        ▼
//!    EventBus ◀──notify── WatchListHandle::merge_updates ──▶ alert::evaluate
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tickr_core::{EventBus, QuoteFetcher, RefreshScheduler, TickrConfig, WatchListHandle, WatchEvent};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TickrConfig::from_env()?;
//!     let watch_list = WatchListHandle::new(EventBus::new(config.event_capacity));
//!     let mut events = watch_list.events().subscribe();
//!
//!     let scheduler = RefreshScheduler::new(&config, QuoteFetcher::from_config(&config), watch_list)?;
//!     let _loop = scheduler.start();
//!
//!     while let Ok(event) = events.recv().await {
//!         if let WatchEvent::AlertTriggered(alert) = event {
//!             println!("{alert}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod alert;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod http_client;
pub mod quote;
pub mod scheduler;
pub mod search;
pub mod watch_list;

// Configuration
pub use config::{TickrConfig, MIN_REFRESH_INTERVAL};

// Domain models
pub use domain::{
    round_to_places, AlertEvent, AlertKind, SearchResult, Stock, Symbol, UtcDateTime,
};

// Error types
pub use error::{ConfigError, FetchError, RecordError, ValidationError};

// Notifications
pub use events::{EventBus, WatchEvent};

// HTTP client types
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};

// Services
pub use quote::QuoteFetcher;
pub use scheduler::{RefreshScheduler, SchedulerHandle, SchedulerState, TickOutcome};
pub use search::SymbolSearchClient;
pub use watch_list::{WatchList, WatchListHandle};
