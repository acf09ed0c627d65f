//! Progress notification hub.
//!
//! Each task id has at most one live subscriber. A newly attached subscriber
//! replaces the previous one (last attach wins, no broadcast). Events
//! published while nobody is attached are held in a bounded replay queue
//! and flushed, in order, to the next subscriber.

mod config;
mod hub;
mod transport;
mod types;

pub use config::HubConfig;
pub use hub::ProgressHub;
pub use transport::{ChannelTransport, Transport, TransportError};
pub use types::{ProgressEvent, Severity, SubscriptionId};
