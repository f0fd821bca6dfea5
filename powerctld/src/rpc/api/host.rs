//! APIs of the host state object.

use super::{null, ok, MethodFuture};
use crate::app::Daemon;
use crate::rpc::route::Router;
use powerctl_sdk::rpc::Request;
use powerctl_sdk::state::HostTransition;
use std::sync::Arc;

pub fn router() -> Router {
    Router::new()
        .route("query", query)
        .route("request_transition", request_transition)
}

fn query(app: Arc<Daemon>, _req: Request) -> MethodFuture {
    Box::pin(async move { ok(&app.surface.query_host()) })
}

fn request_transition(app: Arc<Daemon>, req: Request) -> MethodFuture {
    Box::pin(async move {
        let target: String = req.extract_params()?;
        let transition: HostTransition = target.parse()?;
        app.power.request(transition.into()).await?;
        app.surface.set_requested_host_transition(transition);
        null()
    })
}
