//! Structured application logging with an AI-assisted fault-analysis
//! side-channel.
//!
//! A severity-filtered [`logger::Logger`] builds an OTEL-shaped
//! [`event::LogEvent`], hands it to an asynchronous [`publisher::Publisher`],
//! and, for exception-bearing records, fires off a [`analyzer::FaultAnalyzer`]
//! that deduplicates by exception fingerprint, calls a [`chat::ChatClient`]
//! through a [`resilience::ResilientHttp`] pipeline, and caches the result in
//! a [`cache::TwoTierCache`].

pub mod analyzer;
pub mod cache;
pub mod chat;
pub mod error;
pub mod event;
pub mod fingerprint;
pub mod logger;
pub mod publisher;
pub mod resilience;
pub mod serializer;
pub mod settings;

pub use error::{Error, Result};
pub use event::{LogEvent, LogLevel, SerializedException};
pub use logger::{Logger, LoggerFactory, LoggerProvider};
pub use settings::Settings;
