//! # byond-topic-client
//!
//! Client library for BYOND world topics.
//!
//! This crate provides:
//! - One-shot TCP sessions: connect, send one topic, read one reply, close
//! - Two reply read strategies (declared length and read-until-silent)
//! - Reply type checking against the caller's expectation
//! - Async and blocking high-level APIs
//! - Layered configuration (defaults, YAML file, environment)

pub mod address;
pub mod blocking;
pub mod client;
pub mod config;
pub mod error;
pub mod message;
pub mod read;
pub mod reconcile;
pub mod session;

pub use address::ServerAddress;
pub use client::Client;
pub use config::{ClientConfig, ConfigError};
pub use error::ClientError;
pub use message::OutboundMessage;
pub use read::ReadStrategy;
pub use session::{SessionConfig, SessionState, TransportSession};

pub use byond_topic_protocol::{ResponseKind, WireResponse};
