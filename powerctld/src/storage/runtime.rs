//! Represents to powerctld's runtime directory.

use std::path::PathBuf;

/// Main navigator of powerctld's runtime directory.
#[derive(Debug)]
pub struct Runtime {
    base_dir: PathBuf,
}
impl Runtime {
    /// Creates a new [`Runtime`] instance.
    pub async fn new(base_dir: PathBuf) -> Self {
        tokio::fs::create_dir_all(&base_dir).await.ok();

        Self { base_dir }
    }

    /// Locks powerctld data.
    pub async fn lock(&self) -> std::io::Result<powerfx::fs::Lock> {
        powerfx::fs::Lock::new(self.base_dir.join("powerctld.lock")).await
    }

    /// Creates the RPC server, replacing any stale socket.
    pub async fn rpc_server(&self) -> anyhow::Result<crate::rpc::Server> {
        crate::rpc::Server::with_path_force(self.base_dir.join("powerctld.sock")).await
    }
}
