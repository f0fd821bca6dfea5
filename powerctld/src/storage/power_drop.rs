//! The persistent power-drop record.

use std::path::PathBuf;

/// Records whether the last observed power transition was an unexpected loss
/// of the power supply's power-good signal.
///
/// The record is a single `Yes`/`No` token in `<state-dir>/power-drop`. Write
/// failures are logged and otherwise ignored; a transition must not fail
/// because the flash is unhappy.
#[derive(Debug, Clone)]
pub struct PowerDropStore {
    path: PathBuf,
}
impl PowerDropStore {
    /// Opens the store under `state_dir`, creating the directory and the file
    /// (with value `No`) if missing.
    pub async fn new(state_dir: PathBuf) -> Self {
        let path = state_dir.join("power-drop");
        if let Err(err) = tokio::fs::create_dir_all(&state_dir).await {
            tracing::warn!("cannot create state directory `{}`: {}", state_dir.display(), err);
        }
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            if let Err(err) = tokio::fs::write(&path, "No").await {
                tracing::warn!("cannot initialize `{}`: {}", path.display(), err);
            }
        }

        Self { path }
    }

    /// Marks the last transition as an unexpected power drop.
    pub async fn store(&self) {
        self.write("Yes").await;
    }

    /// Clears the power-drop record.
    pub async fn clear(&self) {
        self.write("No").await;
    }

    /// Returns whether an unexpected power drop is recorded.
    pub async fn read(&self) -> bool {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content.lines().next() == Some("Yes"),
            Err(err) => {
                tracing::warn!("cannot read `{}`: {}", self.path.display(), err);
                false
            }
        }
    }

    async fn write(&self, token: &str) {
        if let Err(err) = tokio::fs::write(&self.path, token).await {
            tracing::warn!("cannot write `{}`: {}", self.path.display(), err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trip() {
        let dir = PathBuf::from("/tmp/.powerctld-test-power-drop");
        _ = tokio::fs::remove_dir_all(&dir).await;

        let store = PowerDropStore::new(dir.clone()).await;
        assert!(!store.read().await);
        assert_eq!(
            tokio::fs::read_to_string(dir.join("power-drop")).await.unwrap(),
            "No"
        );

        store.store().await;
        assert!(store.read().await);
        store.clear().await;
        assert!(!store.read().await);

        // Reopening must not clobber an existing record.
        store.store().await;
        let store = PowerDropStore::new(dir.clone()).await;
        assert!(store.read().await);

        _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
