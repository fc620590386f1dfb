pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod executor;
pub mod heartbeat;
pub mod identity;
pub mod messages;
