//! # Powerctld storage

mod power_drop;
mod runtime;

pub use power_drop::PowerDropStore;
pub use runtime::Runtime;

use std::path::PathBuf;

/// Main navigator of powerctld's storage.
#[derive(Debug)]
pub struct Storage {
    pub runtime: Runtime,
    pub power_drop: PowerDropStore,
}
impl Storage {
    /// Creates a new [`Storage`] instance rooted at the given directories.
    pub async fn new(state_dir: PathBuf, runtime_dir: PathBuf) -> Self {
        Self {
            runtime: Runtime::new(runtime_dir).await,
            power_drop: PowerDropStore::new(state_dir).await,
        }
    }
}
