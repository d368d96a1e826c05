//! # Cafelog Core Library
//!
//! Cafelog is a lightweight, in-memory, Kafka-inspired message broker.
//! Producers append records to named topics partitioned into ordered logs,
//! consumers fetch ranges of records by offset, and consumer groups persist
//! their next-to-read offsets. The broker speaks a small length-prefixed
//! binary framing protocol carrying JSON payloads over TCP.
//!
//! ## Architecture Overview
//!
//! - [`protocol`] - Wire framing codec and JSON request/response payloads
//! - [`storage`] - Append-only partition logs with offset assignment
//! - [`topic_manager`] - Topic registry with fixed partition vectors
//! - [`offsets`] - Consumer-group offset storage
//! - [`broker`] - TCP server and request handling
//! - [`metrics`] - Prometheus counters and gauges
//! - [`http_server`] - Liveness and metrics scrape endpoint
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cafelog::{BrokerConfig, BrokerServer};
//!
//! #[tokio::main]
//! async fn main() -> cafelog::Result<()> {
//!     let config = BrokerConfig {
//!         port: 7070,
//!         ..Default::default()
//!     };
//!
//!     let server = BrokerServer::new(config)?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! All broker state is held in memory and lost on restart; persistence,
//! replication, and authentication are out of scope for this iteration.

pub mod broker;
pub mod config;
pub mod http_server;
pub mod metrics;
pub mod offsets;
pub mod protocol;
pub mod storage;
pub mod topic_manager;

pub use broker::{BrokerServer, MessageHandler};
pub use config::BrokerConfig;
pub use http_server::HttpOpsServer;
pub use metrics::BrokerMetrics;
pub use offsets::OffsetStore;
pub use storage::{PartitionLog, Record};
pub use topic_manager::{Topic, TopicManager};

use thiserror::Error;

/// Cafelog error types.
///
/// Covers the fatal conditions that can abort a broker task: transport
/// failures, payload serialization failures, and invalid configuration.
/// Logical per-request failures are not represented here - they travel as
/// error frames on the wire (see [`broker::handler`]) and never terminate
/// the process.
#[derive(Debug, Error)]
pub enum CafelogError {
    /// Socket and transport failures.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization and parsing failures.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Wire protocol violations.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Configuration validation failures.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metrics registration or encoding failures.
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Result type alias used throughout the cafelog codebase.
pub type Result<T> = std::result::Result<T, CafelogError>;
