//! Debugging APIs.

use super::{ok, MethodFuture};
use crate::app::Daemon;
use crate::rpc::route::Router;
use powerctl_sdk::rpc::Request;
use std::sync::Arc;

pub fn router() -> Router {
    Router::new().route("power_state", power_state)
}

/// Reports the raw sequencer state, not its coarse projection.
fn power_state(app: Arc<Daemon>, _req: Request) -> MethodFuture {
    Box::pin(async move { ok(&format!("{:?}", app.power.query().await?)) })
}
