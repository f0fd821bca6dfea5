//! # The powerctld RPC surface

pub mod api;
pub mod route;

use crate::app::Daemon;
use powerctl_sdk::rpc::{Request, Response};
use powerctl_sdk::Error;
use std::path::PathBuf;
use std::sync::Arc;

/// The RPC context: the routed method table.
#[derive(Debug)]
pub struct Context {
    router: route::Router,
}
impl Context {
    /// Creates a new `Context` instance.
    pub fn new() -> Self {
        Self {
            router: api::root_router(),
        }
    }

    /// Invokes a method by the given request.
    pub async fn invoke(&self, app: Arc<Daemon>, req: Request) -> Response {
        match self.router.get_method(&req.method) {
            Some(method) => Response::new(method(app, req).await),
            None => Response::Err(Error::NoSuchMethod),
        }
    }
}
impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

/// Represents to an RPC server.
#[derive(Debug)]
pub struct Server {
    path: PathBuf,
    server: powerctl_sdk::nonblocking::Server,
}
impl Server {
    /// Creates a new [`Server`] instance.
    pub async fn with_path<P: Into<PathBuf>>(path: P) -> anyhow::Result<Self> {
        let path = path.into();
        let server = powerctl_sdk::nonblocking::Server::new(&path)?;
        powerfx::fs::set_permission(&path, powerfx::fs::Permission::Socket).await?;

        Ok(Self { path, server })
    }

    /// Forces to create a new [`Server`] instance, replacing a stale socket.
    pub async fn with_path_force<P: Into<PathBuf>>(path: P) -> anyhow::Result<Self> {
        let path = path.into();
        _ = tokio::fs::remove_file(&path).await;

        Self::with_path(path).await
    }

    /// Starts the server task.
    pub fn start(self, app: Arc<Daemon>) {
        tokio::spawn(self.run(app));
    }

    /// Runs the server in place.
    async fn run(self, app: Arc<Daemon>) {
        tracing::debug!("listening on `{}`", self.path.display());
        loop {
            match self.server.accept().await {
                Ok(conn) => Session::new(app.clone(), conn).start(),
                Err(err) => tracing::warn!("failed to accept connection: {}", err),
            }
        }
    }
}

/// Represents to an RPC session.
#[derive(Debug)]
pub struct Session {
    app: Arc<Daemon>,
    conn: powerctl_sdk::nonblocking::Connection,
}
impl Session {
    /// Constructs a new [`Session`] instance with connection `conn`.
    fn new(app: Arc<Daemon>, conn: powerctl_sdk::nonblocking::Connection) -> Self {
        Self { app, conn }
    }

    /// Starts the session task.
    fn start(self) {
        tokio::spawn(async move {
            _ = self.run().await;
        });
    }

    /// Runs the session in place.
    async fn run(mut self) -> anyhow::Result<()> {
        loop {
            let req = self.conn.recv_req().await?;
            if req.method.is_empty() {
                // An undecodable datagram; echo the prepared error back.
                let resp = req
                    .extract_params::<Response>()
                    .unwrap_or(Response::Err(Error::NoSuchMethod));
                self.conn.send(&resp).await?;
                continue;
            }
            if req.method == "session.subscribe" {
                api::session::subscribe(self).await;
                return Ok(());
            }
            let resp = self.app.rpc.invoke(self.app.clone(), req).await;
            self.conn.send(&resp).await?;
        }
    }
}
