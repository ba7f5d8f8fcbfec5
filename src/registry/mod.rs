//! Client-group registry with targeted and exclusionary delivery.
//!
//! Subscribers join a named client group and stay registered for as long as
//! their cancellation signal has not fired. Publishers fan a message out to:
//! - listed client groups (`send`)
//! - every group except a blacklist (`broadcast`)
//!
//! Each delivery races the subscriber's sink against its cancellation
//! signal, so a subscriber that is leaving never blocks a publisher.
//!
//! # Example
//!
//! ```ignore
//! let registry = Registry::new();
//! let source = CancelSource::new();
//! let (tx, rx) = crossbeam_channel::unbounded();
//!
//! let member = JoinOptions::new("c1").with_token(source.token()).with_sink(tx);
//! let r = registry.clone();
//! std::thread::spawn(move || r.join(&member));
//!
//! registry.send(&"hello", &["c1"]);
//! assert_eq!(rx.recv()?, "hello");
//!
//! source.cancel();
//! ```

mod manager;
mod types;

pub use manager::Registry;
pub use types::{DeliveryMode, JoinOptions, Member, RegistryConfig, SubscriptionId};
