//! # The powerctld RPC API - Implementation

mod buttons;
mod chassis;
mod debug;
mod host;
mod info;
mod os;
pub mod session;
mod settings;

use crate::app::Daemon;
use crate::rpc::route::Router;
use powerctl_sdk::{rpc::Request, Error};
use powerfx::prelude::*;
use std::sync::Arc;

pub fn root_router() -> Router {
    Router::new()
        .nest("host", host::router())
        .nest("chassis", chassis::router())
        .nest("os", os::router())
        .nest("buttons", buttons::router())
        .nest("settings", settings::router())
        .nest("info", info::router())
        .nest("debug", debug::router())
}

/// Represents to an RPC method.
pub(super) type Method = fn(Arc<Daemon>, Request) -> MethodFuture;

/// Represents to the future type of an RPC method.
pub type MethodFuture = BoxFuture<'static, Result<ciborium::Value, Error>>;

/// Serializes a method's return value.
fn ok<T: serde::Serialize>(value: &T) -> Result<ciborium::Value, Error> {
    ciborium::Value::serialized(value).map_err(|err| Error::internal(err.to_string()))
}

/// The unit return value.
fn null() -> Result<ciborium::Value, Error> {
    Ok(ciborium::Value::Null)
}
