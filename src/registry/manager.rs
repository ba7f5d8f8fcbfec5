//! Membership table and message fan-out.

use crate::cancel::CancelToken;
use crate::error::{RegistryError, Result};
use crossbeam_channel::{select, Sender};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

use super::types::{DeliveryMode, Member, RegistryConfig, SubscriptionId};

/// Live subscriptions of one client, keyed by subscription id.
type ClientSubscriptions<M> = HashMap<SubscriptionId, Subscription<M>>;

/// Internal subscription state.
struct Subscription<M> {
    token: CancelToken,
    sink: Sender<M>,
}

impl<M> Clone for Subscription<M> {
    fn clone(&self) -> Self {
        Self {
            token: self.token.clone(),
            sink: self.sink.clone(),
        }
    }
}

/// Outcome of one delivery attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Delivery {
    Delivered,
    /// The subscription was cancelled before the sink accepted.
    Cancelled,
    /// The receiving side of the sink is gone.
    Disconnected,
}

impl<M: Clone> Subscription<M> {
    /// Race the sink against cancellation. Blocks until one side wins.
    fn deliver(&self, msg: &M) -> Delivery {
        // select! picks randomly among ready arms; cancellation has to win
        if self.token.is_cancelled() {
            return Delivery::Cancelled;
        }

        select! {
            recv(self.token.done()) -> _ => Delivery::Cancelled,
            send(&self.sink, msg.clone()) -> res => match res {
                Ok(()) => Delivery::Delivered,
                Err(_) => Delivery::Disconnected,
            },
        }
    }
}

/// Per-call delivery counts, for logging.
#[derive(Debug, Default)]
struct DeliveryStats {
    delivered: usize,
    cancelled: usize,
    disconnected: usize,
}

impl DeliveryStats {
    fn record(&mut self, client_id: &str, id: SubscriptionId, outcome: Delivery) {
        trace!(client_id, subscription = %id, ?outcome, "delivery attempt");
        match outcome {
            Delivery::Delivered => self.delivered += 1,
            Delivery::Cancelled => self.cancelled += 1,
            Delivery::Disconnected => self.disconnected += 1,
        }
    }
}

struct Inner<M> {
    /// Client id -> live subscriptions. Never holds an empty set.
    clients: Mutex<HashMap<String, ClientSubscriptions<M>>>,
    /// Counter for generating subscription IDs.
    next_id: AtomicU64,
    config: RegistryConfig,
}

/// Concurrent fan-out registry.
///
/// Callers [`join`](Registry::join) a client group and stay registered until
/// their cancellation signal fires. Publishers deliver to listed groups with
/// [`send`](Registry::send) or to every group but a blacklist with
/// [`broadcast`](Registry::broadcast).
///
/// Cloning is cheap; clones share the same membership table.
pub struct Registry<M> {
    inner: Arc<Inner<M>>,
}

impl<M> Clone for Registry<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M> Registry<M> {
    /// Create an empty registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with a custom configuration.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                clients: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                config,
            }),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    /// Register `member` and block until its cancellation signal fires,
    /// then deregister it.
    ///
    /// Fails with [`RegistryError::InvalidArgument`] without registering
    /// anything when the member has no signal or no sink. There is no
    /// timeout: the call returns only once the signal fires.
    pub fn join<T>(&self, member: &T) -> Result<()>
    where
        T: Member<M> + ?Sized,
    {
        let token = member
            .cancel_token()
            .ok_or(RegistryError::InvalidArgument("a cancellation token is required"))?
            .clone();
        let sink = member
            .sink()
            .ok_or(RegistryError::InvalidArgument("a sink is required"))?
            .clone();
        let client_id = member.client_id();

        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::SeqCst));
        let subscription = Subscription {
            token: token.clone(),
            sink,
        };

        self.inner
            .clients
            .lock()
            .entry(client_id.to_string())
            .or_default()
            .insert(id, subscription);
        debug!(client_id, subscription = %id, "joined");

        token.wait();

        self.leave(client_id, id);
        debug!(client_id, subscription = %id, "left");

        Ok(())
    }

    fn leave(&self, client_id: &str, id: SubscriptionId) {
        let mut clients = self.inner.clients.lock();
        if let Some(subs) = clients.get_mut(client_id) {
            subs.remove(&id);
            if subs.is_empty() {
                clients.remove(client_id);
            }
        }
    }

    // --- Introspection ---

    /// Number of client ids with at least one live subscription.
    pub fn client_count(&self) -> usize {
        self.inner.clients.lock().len()
    }

    /// Total number of live subscriptions across all clients.
    pub fn subscription_count(&self) -> usize {
        self.inner.clients.lock().values().map(HashMap::len).sum()
    }

    /// Number of live subscriptions under `client_id`.
    pub fn subscriptions_for(&self, client_id: &str) -> usize {
        self.inner
            .clients
            .lock()
            .get(client_id)
            .map_or(0, HashMap::len)
    }

    pub fn contains_client(&self, client_id: &str) -> bool {
        self.inner.clients.lock().contains_key(client_id)
    }

    /// Client ids currently present, in no particular order.
    pub fn client_ids(&self) -> Vec<String> {
        self.inner.clients.lock().keys().cloned().collect()
    }
}

impl<M: Clone + Send> Registry<M> {
    /// Deliver `msg` to every live subscription of each listed client.
    ///
    /// Unknown ids are skipped and an empty list is a no-op. A client listed
    /// more than once still receives the message once per subscription.
    pub fn send<S: AsRef<str>>(&self, msg: &M, client_ids: &[S]) {
        if client_ids.is_empty() {
            return;
        }

        let targets: HashSet<&str> = client_ids.iter().map(|id| id.as_ref()).collect();
        self.dispatch("send", msg, &Targets::Only(targets));
    }

    /// Deliver `msg` to every live subscription of every client except the
    /// blacklisted ones.
    ///
    /// The target set is taken from the table as it is when the guard is
    /// acquired, so clients that joined after the blacklist was built are
    /// included.
    pub fn broadcast<S: AsRef<str>>(&self, msg: &M, blacklist: &[S]) {
        let excluded: HashSet<&str> = blacklist.iter().map(|id| id.as_ref()).collect();
        self.dispatch("broadcast", msg, &Targets::AllExcept(excluded));
    }

    /// Internal delivery helper. Attempts delivery to every subscription of
    /// every client selected by `targets`.
    fn dispatch(&self, op: &'static str, msg: &M, targets: &Targets<'_>) {
        let mut stats = DeliveryStats::default();

        match self.inner.config.delivery_mode {
            DeliveryMode::Locked => {
                let clients = self.inner.clients.lock();
                targets.visit(&clients, |client_id, subs| {
                    for (id, sub) in subs {
                        stats.record(client_id, *id, sub.deliver(msg));
                    }
                });
            }
            DeliveryMode::Snapshot => {
                let mut snapshot: Vec<(String, SubscriptionId, Subscription<M>)> = Vec::new();
                {
                    let clients = self.inner.clients.lock();
                    targets.visit(&clients, |client_id, subs| {
                        snapshot.extend(
                            subs.iter()
                                .map(|(id, sub)| (client_id.to_string(), *id, sub.clone())),
                        );
                    });
                }

                for (client_id, id, sub) in &snapshot {
                    stats.record(client_id, *id, sub.deliver(msg));
                }
            }
        }

        debug!(
            op,
            delivered = stats.delivered,
            cancelled = stats.cancelled,
            disconnected = stats.disconnected,
            "dispatch complete"
        );
    }
}

/// Which clients a delivery reaches.
enum Targets<'a> {
    /// Listed clients, looked up one by one.
    Only(HashSet<&'a str>),
    /// Every client in the table except these.
    AllExcept(HashSet<&'a str>),
}

impl Targets<'_> {
    /// Call `f` for each selected client present in `clients`.
    fn visit<M, F>(&self, clients: &HashMap<String, ClientSubscriptions<M>>, mut f: F)
    where
        F: FnMut(&str, &ClientSubscriptions<M>),
    {
        match self {
            Targets::Only(ids) => {
                for client_id in ids {
                    if let Some(subs) = clients.get(*client_id) {
                        f(*client_id, subs);
                    }
                }
            }
            Targets::AllExcept(excluded) => {
                for (client_id, subs) in clients {
                    if !excluded.contains(client_id.as_str()) {
                        f(client_id.as_str(), subs);
                    }
                }
            }
        }
    }
}

impl<M> Default for Registry<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> fmt::Debug for Registry<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("clients", &self.client_count())
            .field("subscriptions", &self.subscription_count())
            .field("config", &self.inner.config)
            .finish()
    }
}
