//! Async (tokio) implementations of the `powerctl` protocols.

pub mod rpc;

pub use rpc::{Connection, Server};
