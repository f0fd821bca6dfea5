//! APIs of the chassis state object.

use super::{null, ok, MethodFuture};
use crate::app::Daemon;
use crate::rpc::route::Router;
use powerctl_sdk::rpc::Request;
use powerctl_sdk::state::ChassisTransition;
use std::sync::Arc;

pub fn router() -> Router {
    Router::new()
        .route("query", query)
        .route("request_transition", request_transition)
}

fn query(app: Arc<Daemon>, _req: Request) -> MethodFuture {
    Box::pin(async move { ok(&app.surface.query_chassis()) })
}

fn request_transition(app: Arc<Daemon>, req: Request) -> MethodFuture {
    Box::pin(async move {
        let target: String = req.extract_params()?;
        let transition: ChassisTransition = target.parse()?;
        app.power.request(transition.into()).await?;
        app.surface.set_requested_power_transition(transition);
        null()
    })
}
