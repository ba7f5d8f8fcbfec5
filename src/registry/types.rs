//! Registry types: subscription identity, join inputs and configuration.

use crate::cancel::CancelToken;
use crossbeam_channel::Sender;
use std::fmt;

/// Identifier of one subscription, unique among all subscriptions a
/// registry ever creates. Used only to locate the entry for removal.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Anything that can join a registry: a cancellation signal, a sink and
/// the client group it belongs to.
///
/// Implement this on a connection type to join with it directly, or use
/// [`JoinOptions`].
pub trait Member<M> {
    /// Signal marking the end of interest.
    fn cancel_token(&self) -> Option<&CancelToken>;

    /// Where delivered messages go.
    fn sink(&self) -> Option<&Sender<M>>;

    /// Client group this member joins.
    fn client_id(&self) -> &str;
}

/// Plain join inputs.
#[derive(Clone, Debug)]
pub struct JoinOptions<M> {
    pub token: Option<CancelToken>,
    pub sink: Option<Sender<M>>,
    pub client_id: String,
}

impl<M> JoinOptions<M> {
    /// Options for `client_id` with neither signal nor sink set.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            token: None,
            sink: None,
            client_id: client_id.into(),
        }
    }

    pub fn with_token(mut self, token: CancelToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_sink(mut self, sink: Sender<M>) -> Self {
        self.sink = Some(sink);
        self
    }
}

impl<M> Member<M> for JoinOptions<M> {
    fn cancel_token(&self) -> Option<&CancelToken> {
        self.token.as_ref()
    }

    fn sink(&self) -> Option<&Sender<M>> {
        self.sink.as_ref()
    }

    fn client_id(&self) -> &str {
        &self.client_id
    }
}

/// How deliveries interact with the membership guard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Hold the guard for the whole delivery, blocking sinks included.
    /// A stalled sink stalls every other registry operation until it
    /// accepts or its subscription is cancelled.
    #[default]
    Locked,
    /// Copy the target subscriptions under the guard, release it, then
    /// deliver. Joins and leaves proceed while a delivery is blocked.
    Snapshot,
}

/// Registry configuration.
#[derive(Clone, Debug, Default)]
pub struct RegistryConfig {
    /// Guard policy during Send/Broadcast.
    /// Default: Locked
    pub delivery_mode: DeliveryMode,
}
