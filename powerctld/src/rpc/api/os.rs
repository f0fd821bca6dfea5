//! APIs of the operating system status object.

use super::{ok, MethodFuture};
use crate::app::Daemon;
use crate::rpc::route::Router;
use powerctl_sdk::rpc::Request;
use std::sync::Arc;

pub fn router() -> Router {
    Router::new().route("query", query)
}

fn query(app: Arc<Daemon>, _req: Request) -> MethodFuture {
    Box::pin(async move { ok(&app.surface.query_os()) })
}
