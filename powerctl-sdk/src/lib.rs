//! # The `powerctl` SDK
//! Shared surface types and the wire protocol used to talk to `powerctld`:
//! the state and transition vocabularies published on the external surface,
//! the datagram framing, and an async client connection.

pub mod error;
pub mod nonblocking;
pub mod rpc;
pub mod state;

pub use error::ApiError as Error;

use rpc::Request;
use serde::{de::DeserializeOwned, ser::Serialize};
use std::{
    ops::{Deref, DerefMut},
    path::{Path, PathBuf},
    sync::OnceLock,
};

/// Returns the default path of `powerctld`'s control socket.
///
/// If the environment variable `POWERCTL_SOCK` is present its value is used,
/// otherwise the socket lives in the default runtime directory.
pub fn socket_path() -> &'static Path {
    static SOCKET_PATH: OnceLock<PathBuf> = OnceLock::new();

    SOCKET_PATH.get_or_init(|| {
        std::env::var("POWERCTL_SOCK")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/run/powerctl/powerctld.sock"))
    })
}

/// A high-level wrapper of a connection to `powerctld`.
#[derive(Debug)]
pub struct Connection {
    underlying: nonblocking::rpc::Connection,
}
impl Connection {
    /// Connects to the specified socket path.
    pub async fn connect<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        Ok(Self {
            underlying: nonblocking::rpc::Connection::connect(path).await?,
        })
    }

    /// Invokes an RPC method.
    pub async fn invoke<P: Serialize, T: DeserializeOwned>(
        &mut self,
        method: &str,
        params: P,
    ) -> anyhow::Result<Result<T, Error>> {
        self.underlying
            .send(&Request::new(method, params))
            .await
            .map_err(|err| anyhow::anyhow!("cannot send request to powerctld: {err}"))?;
        Ok(self
            .underlying
            .recv::<rpc::Response>()
            .await
            .map_err(|err| anyhow::anyhow!("cannot receive response from powerctld: {err}"))?
            .into_result())
    }
}
impl Deref for Connection {
    type Target = nonblocking::rpc::Connection;

    fn deref(&self) -> &Self::Target {
        &self.underlying
    }
}
impl DerefMut for Connection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.underlying
    }
}
