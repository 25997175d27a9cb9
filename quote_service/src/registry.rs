//! Per-symbol polling subscriptions.
//!
//! The registry keeps one poller thread per subscribed symbol. A poller wakes up
//! on a `crossbeam_channel::tick`, asks its [`QuoteFeed`] for a quote and hands it
//! to every listener registered for the symbol. Listeners for the same symbol share
//! one poller.
//!
//! Lifecycle:
//! - The first `subscribe` for a symbol starts its poller.
//! - Every `subscribe` returns a [`Subscription`]; consuming it with
//!   [`Subscription::unsubscribe`] or dropping it removes that listener only.
//! - When the last listener of a symbol goes away the poller is told to stop and
//!   the symbol leaves the registry. A tick already in progress finishes first.
//!   `unsubscribe` and `shutdown` wait for the poller thread to exit; `Drop` only
//!   signals it, so dropping a subscription never blocks on a running listener.
//!
//! Fan-out runs on a snapshot of the listener set taken outside the lock, so a
//! listener may subscribe or unsubscribe from inside its callback. A panicking
//! listener is logged and skipped; the others still get the quote.
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, bounded, select, tick};
use log::{debug, error, info};
use quote_common::Quote;

use crate::sync::lock;

/// Callback receiving quote updates.
pub type Listener = Arc<dyn Fn(&Quote) + Send + Sync>;

/// Produces the quote a poller fans out on each tick.
pub type QuoteFeed = Arc<dyn Fn(&str) -> Quote + Send + Sync>;

type ListenerSet = Arc<Mutex<BTreeMap<u64, Listener>>>;

struct Poller {
    listeners: ListenerSet,
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    fn start(symbol: &str, feed: QuoteFeed, period: Duration, id: u64, listener: Listener) -> Self {
        let listeners: ListenerSet = Arc::new(Mutex::new(BTreeMap::from([(id, listener)])));
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let thread_listeners = Arc::clone(&listeners);
        let thread_symbol = symbol.to_string();
        let handle = thread::spawn(move || {
            poll_loop(&thread_symbol, &feed, &thread_listeners, period, stop_rx);
        });

        Poller {
            listeners,
            stop_tx,
            handle: Some(handle),
        }
    }

    fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn stop(mut self, symbol: &str, join: bool) {
        let _ = self.stop_tx.send(());
        let Some(handle) = self.handle.take() else {
            return;
        };
        if !join {
            debug!("Poller for {} signalled, not joined", symbol);
            return;
        }
        // a listener may drop the last subscription from the poller thread itself
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            error!("Poller thread for {} panicked", symbol);
        }
    }
}

fn poll_loop(
    symbol: &str,
    feed: &QuoteFeed,
    listeners: &Mutex<BTreeMap<u64, Listener>>,
    period: Duration,
    stop_rx: Receiver<()>,
) {
    debug!("Poller for {} started, period {:?}", symbol, period);
    let ticker = tick(period);
    loop {
        select! {
            recv(stop_rx) -> _ => break,
            recv(ticker) -> _ => {
                let quote = feed(symbol);
                fan_out(symbol, &quote, listeners);
            }
        }
    }
    debug!("Poller for {} stopped", symbol);
}

fn fan_out(symbol: &str, quote: &Quote, listeners: &Mutex<BTreeMap<u64, Listener>>) {
    let snapshot: Vec<(u64, Listener)> = lock(listeners)
        .iter()
        .map(|(id, listener)| (*id, Arc::clone(listener)))
        .collect();

    for (id, listener) in snapshot {
        if panic::catch_unwind(AssertUnwindSafe(|| listener(quote))).is_err() {
            error!("Listener {} for {} panicked; continuing fan-out", id, symbol);
        }
    }
}

struct RegistryInner {
    pollers: Mutex<HashMap<String, Poller>>,
    next_id: AtomicU64,
    feed: QuoteFeed,
    period: Duration,
}

impl RegistryInner {
    fn release(&self, symbol: &str, id: u64, join: bool) {
        let stopped = {
            let mut pollers = lock(&self.pollers);
            let Some(poller) = pollers.get(symbol) else {
                return;
            };
            let now_empty = {
                let mut listeners = lock(&poller.listeners);
                listeners.remove(&id);
                listeners.is_empty()
            };
            if now_empty { pollers.remove(symbol) } else { None }
        };

        if let Some(poller) = stopped {
            poller.stop(symbol, join);
            info!("Stopped polling {}", symbol);
        }
    }
}

/// Registry of per-symbol pollers. Cloning shares the same registry.
#[derive(Clone)]
pub struct SubscriptionRegistry {
    inner: Arc<RegistryInner>,
}

impl SubscriptionRegistry {
    /// Registry polling `feed` every `period`.
    pub fn new(feed: QuoteFeed, period: Duration) -> Self {
        SubscriptionRegistry {
            inner: Arc::new(RegistryInner {
                pollers: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                feed,
                period,
            }),
        }
    }

    /// Polling period.
    pub fn period(&self) -> Duration {
        self.inner.period
    }

    /// Register `listener` for `symbol`, starting its poller if needed.
    pub fn subscribe<F>(&self, symbol: &str, listener: F) -> Subscription
    where
        F: Fn(&Quote) + Send + Sync + 'static,
    {
        let symbol = symbol.trim().to_ascii_uppercase();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let listener: Listener = Arc::new(listener);

        let mut pollers = lock(&self.inner.pollers);
        match pollers.entry(symbol.clone()) {
            Entry::Occupied(entry) => {
                lock(&entry.get().listeners).insert(id, listener);
                debug!("Listener {} joined poller for {}", id, symbol);
            }
            Entry::Vacant(entry) => {
                let feed = Arc::clone(&self.inner.feed);
                entry.insert(Poller::start(&symbol, feed, self.inner.period, id, listener));
                info!("Started polling {} every {:?}", symbol, self.inner.period);
            }
        }

        Subscription {
            registry: Arc::downgrade(&self.inner),
            symbol,
            id,
            active: true,
        }
    }

    /// Symbols with a poller, sorted.
    pub fn active_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = lock(&self.inner.pollers).keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Listeners currently registered for `symbol`.
    pub fn listener_count(&self, symbol: &str) -> usize {
        lock(&self.inner.pollers)
            .get(&symbol.trim().to_ascii_uppercase())
            .map_or(0, |poller| lock(&poller.listeners).len())
    }

    /// Whether a poller thread is running for `symbol`.
    pub fn is_polling(&self, symbol: &str) -> bool {
        lock(&self.inner.pollers)
            .get(&symbol.trim().to_ascii_uppercase())
            .is_some_and(Poller::is_running)
    }

    /// Stop every poller. Outstanding subscriptions become inert.
    pub fn shutdown(&self) {
        let drained: Vec<(String, Poller)> = lock(&self.inner.pollers).drain().collect();
        for (symbol, poller) in drained {
            poller.stop(&symbol, true);
        }
        info!("Subscription registry shut down");
    }
}

/// Handle of one listener registration.
///
/// Dropping it unsubscribes without waiting for the poller thread to exit.
/// [`Subscription::unsubscribe`] also waits, so it must not be called while
/// holding a lock that a listener of the same symbol takes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    registry: Weak<RegistryInner>,
    symbol: String,
    id: u64,
    active: bool,
}

impl Subscription {
    /// Symbol this subscription listens to.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Remove this listener; if it was the last one, stop the poller and wait for
    /// its thread to exit.
    pub fn unsubscribe(mut self) {
        self.release(true);
    }

    fn release(&mut self, join: bool) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(registry) = self.registry.upgrade() {
            registry.release(&self.symbol, self.id, join);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release(false);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("symbol", &self.symbol)
            .field("id", &self.id)
            .field("active", &self.active)
            .finish()
    }
}
