//! Periodic fetch, merge, and notify loop.
//!
//! At most one fetch is in flight at any time: a tick that finds the flag
//! set returns [`TickOutcome::Skipped`]. The flag is held by a drop guard,
//! so success, failure and panic all clear it. A failed refresh changes
//! nothing and the loop simply tries again after the interval.
//!
//! Pausing does not stop the loop. Fetched prices are still merged, but
//! the resulting notifications are swallowed rather than queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::events::{EventBus, WatchEvent};
use crate::{AlertEvent, ConfigError, FetchError, QuoteFetcher, TickrConfig, WatchListHandle};

/// Observable scheduler state. `Paused` wins over `InFlight`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    InFlight,
    Paused,
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Another fetch was already in flight.
    Skipped,
    /// Quotes were fetched and merged.
    Refreshed { quotes: usize, alerts: usize },
    /// The fetch failed; the watch list is untouched.
    Failed(FetchError),
}

#[derive(Clone)]
pub struct RefreshScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    fetcher: QuoteFetcher,
    watch_list: WatchListHandle,
    events: EventBus,
    interval: Duration,
    in_flight: AtomicBool,
    paused: AtomicBool,
    looping: AtomicBool,
}

impl RefreshScheduler {
    /// Builds a scheduler over `watch_list`, publishing on its event bus.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` fails validation, including an
    /// interval below [`crate::MIN_REFRESH_INTERVAL`].
    pub fn new(
        config: &TickrConfig,
        fetcher: QuoteFetcher,
        watch_list: WatchListHandle,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let events = watch_list.events().clone();

        Ok(Self {
            inner: Arc::new(SchedulerInner {
                fetcher,
                watch_list,
                events,
                interval: config.refresh_interval(),
                in_flight: AtomicBool::new(false),
                paused: AtomicBool::new(false),
                looping: AtomicBool::new(false),
            }),
        })
    }

    /// Runs one fetch/merge/notify cycle now.
    ///
    /// Timed ticks and manual refreshes share the same in-flight guard.
    pub async fn tick(&self) -> TickOutcome {
        self.inner.tick().await
    }

    /// Manual refresh trigger, e.g. pull-to-refresh.
    pub async fn refresh_now(&self) -> TickOutcome {
        self.tick().await
    }

    /// Spawns the timed loop on the current tokio runtime.
    ///
    /// The loop ticks immediately, then once per interval after each tick
    /// completes. It holds only a weak reference, so dropping every
    /// `RefreshScheduler` ends it too.
    ///
    /// Returns `None` while an earlier loop is still running; a scheduler
    /// never polls on two cadences at once.
    pub fn start(&self) -> Option<SchedulerHandle> {
        if self
            .inner
            .looping
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("refresh loop already running; start ignored");
            return None;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(run_loop(
            Arc::downgrade(&self.inner),
            self.inner.interval,
            stop_rx,
        ));

        Some(SchedulerHandle {
            stop: stop_tx,
            task,
        })
    }

    pub fn is_running(&self) -> bool {
        self.inner.looping.load(Ordering::Acquire)
    }

    pub fn pause(&self) {
        self.inner.paused.store(true, Ordering::Release);
    }

    /// Only notifications from ticks finishing after this call are delivered.
    pub fn resume(&self) {
        self.inner.paused.store(false, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.inner.paused.load(Ordering::Acquire)
    }

    pub fn is_in_flight(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    pub fn state(&self) -> SchedulerState {
        if self.is_paused() {
            SchedulerState::Paused
        } else if self.is_in_flight() {
            SchedulerState::InFlight
        } else {
            SchedulerState::Idle
        }
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    pub fn watch_list(&self) -> &WatchListHandle {
        &self.inner.watch_list
    }
}

impl SchedulerInner {
    async fn tick(&self) -> TickOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::debug!("refresh already in flight; tick skipped");
            return TickOutcome::Skipped;
        };

        let symbols = self.watch_list.symbols();
        if symbols.is_empty() {
            return TickOutcome::Refreshed {
                quotes: 0,
                alerts: 0,
            };
        }

        match self.fetcher.refresh(&symbols).await {
            Ok(updates) if updates.is_empty() => {
                tracing::debug!(requested = symbols.len(), "no usable quotes; nothing to announce");
                TickOutcome::Refreshed {
                    quotes: 0,
                    alerts: 0,
                }
            }
            Ok(updates) => {
                let alerts = self.watch_list.merge_updates(&updates);
                let outcome = TickOutcome::Refreshed {
                    quotes: updates.len(),
                    alerts: alerts.len(),
                };
                tracing::debug!(quotes = updates.len(), alerts = alerts.len(), "watch list refreshed");
                self.notify(alerts);
                outcome
            }
            Err(error) => {
                tracing::warn!(%error, code = error.code(), "quote refresh failed; retrying next interval");
                TickOutcome::Failed(error)
            }
        }
    }

    fn notify(&self, alerts: Vec<AlertEvent>) {
        if self.paused.load(Ordering::Acquire) {
            tracing::debug!(alerts = alerts.len(), "paused; refresh notifications swallowed");
            return;
        }

        self.events.publish(WatchEvent::WatchListChanged);
        for alert in alerts {
            tracing::info!(symbol = %alert.symbol, kind = %alert.kind, price = alert.triggered_price, "price alert triggered");
            self.events.publish(WatchEvent::AlertTriggered(alert));
        }
    }
}

async fn run_loop(
    scheduler: Weak<SchedulerInner>,
    interval: Duration,
    mut stop: watch::Receiver<bool>,
) {
    let _registration = LoopRegistration {
        scheduler: scheduler.clone(),
    };

    loop {
        if *stop.borrow() {
            break;
        }

        let Some(inner) = scheduler.upgrade() else {
            break;
        };
        inner.tick().await;
        drop(inner);

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = stop.changed() => break,
        }
    }
    tracing::debug!("refresh loop stopped");
}

/// Control handle for a running refresh loop.
///
/// Stopping (or dropping the handle) prevents future ticks; a fetch that is
/// already in flight still completes and is merged.
#[derive(Debug)]
pub struct SchedulerHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the loop and waits for it to exit.
    pub async fn join(self) {
        self.stop();
        let _ = self.task.await;
    }
}

/// Marks the scheduler as loop-free again however the loop task ends.
struct LoopRegistration {
    scheduler: Weak<SchedulerInner>,
}

impl Drop for LoopRegistration {
    fn drop(&mut self) {
        if let Some(inner) = self.scheduler.upgrade() {
            inner.looping.store(false, Ordering::Release);
        }
    }
}

struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
