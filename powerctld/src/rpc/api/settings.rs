//! APIs of the power restore settings.

use super::{null, ok, MethodFuture};
use crate::app::Daemon;
use crate::rpc::route::Router;
use powerctl_sdk::rpc::Request;
use powerctl_sdk::state::RestorePolicy;
use std::sync::Arc;

pub fn router() -> Router {
    Router::new().route("query", query).route("set", set)
}

fn query(app: Arc<Daemon>, _req: Request) -> MethodFuture {
    Box::pin(async move { ok(&app.surface.query_settings()) })
}

fn set(app: Arc<Daemon>, req: Request) -> MethodFuture {
    Box::pin(async move {
        let (policy, delay): (Option<String>, Option<u16>) = req.extract_params()?;
        let policy = match policy {
            Some(s) => Some(s.parse::<RestorePolicy>()?),
            None => None,
        };
        if let Some(policy) = policy {
            app.surface.set_restore_policy(policy);
        }
        if let Some(delay) = delay {
            app.surface.set_restore_delay(delay);
        }
        null()
    })
}
