//! APIs that provide information about the daemon.

use super::{ok, MethodFuture};
use crate::app::Daemon;
use crate::rpc::route::Router;
use powerctl_sdk::rpc::Request;
use serde::Serialize;
use std::sync::Arc;

pub fn router() -> Router {
    Router::new().route("version", version).route("query", query)
}

#[derive(Debug, Serialize)]
struct QueryDaemon {
    version: &'static str,
    boot_timestamp: i64,
}

fn version(_app: Arc<Daemon>, _req: Request) -> MethodFuture {
    Box::pin(async { ok(&env!("CARGO_PKG_VERSION")) })
}

fn query(app: Arc<Daemon>, _req: Request) -> MethodFuture {
    Box::pin(async move {
        ok(&QueryDaemon {
            version: env!("CARGO_PKG_VERSION"),
            boot_timestamp: app.boot_timestamp,
        })
    })
}
