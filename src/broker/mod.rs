//! Broker: request handling and the TCP connection server.

pub mod handler;
pub mod server;

pub use handler::MessageHandler;
pub use server::BrokerServer;
