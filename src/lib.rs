//! # Fanout
//!
//! A concurrent fan-out registry: callers register interest in a named client
//! group, and publishers deliver messages to one, many, or all registered
//! listeners for that group.
//!
//! ## Core Concepts
//!
//! - **Client id**: string key grouping any number of subscriptions
//! - **Subscription**: a cancellation signal, a sink and a client id, live
//!   for the duration of one `join` call
//! - **Sink**: a `crossbeam_channel::Sender` owned by the subscriber
//! - **Cancellation**: a fire-once [`CancelSource`] marking end of interest
//!
//! ## Example
//!
//! ```ignore
//! use fanout::{CancelSource, JoinOptions, Registry};
//!
//! let registry: Registry<String> = Registry::new();
//! let source = CancelSource::new();
//! let (tx, rx) = crossbeam_channel::unbounded();
//!
//! let r = registry.clone();
//! let member = JoinOptions::new("c1").with_token(source.token()).with_sink(tx);
//! let joined = std::thread::spawn(move || r.join(&member));
//!
//! registry.broadcast(&"hello".to_string(), &["c2"]);
//! source.cancel();
//! joined.join().unwrap()?;
//! ```

pub mod cancel;
pub mod error;
pub mod registry;

// Re-exports
pub use cancel::{CancelSource, CancelToken};
pub use error::{RegistryError, Result};
pub use registry::{DeliveryMode, JoinOptions, Member, Registry, RegistryConfig, SubscriptionId};
