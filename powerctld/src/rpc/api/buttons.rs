//! APIs of the front-panel button objects.

use super::{null, ok, MethodFuture};
use crate::app::Daemon;
use crate::rpc::route::Router;
use powerctl_sdk::rpc::Request;
use powerctl_sdk::state::ButtonId;
use powerctl_sdk::Error;
use std::sync::Arc;

pub fn router() -> Router {
    Router::new()
        .route("query", query)
        .route("set_mask", set_mask)
}

fn query(app: Arc<Daemon>, req: Request) -> MethodFuture {
    Box::pin(async move {
        let name: String = req.extract_params()?;
        let id: ButtonId = name.parse()?;
        ok(&app.surface.query_button(id))
    })
}

fn set_mask(app: Arc<Daemon>, req: Request) -> MethodFuture {
    Box::pin(async move {
        let (name, masked): (String, bool) = req.extract_params()?;
        let id: ButtonId = name.parse()?;
        if id == ButtonId::Id {
            return Err(Error::unsupported("the id button cannot be masked"));
        }
        app.power.set_button_mask(id, masked).await?;
        null()
    })
}
