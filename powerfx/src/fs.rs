//! Filesystem utilities.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Represents to a file permission.
#[derive(Debug, Clone, Copy)]
pub enum Permission {
    /// Permissions for socket files.
    ///
    /// The control socket carries power transition requests, so it should only
    /// be accessed by the owning user.
    Socket,

    /// Permissions for lock files.
    ///
    /// Lock files should always be read, but never written.
    Lock,
}
impl Permission {
    fn mode(self) -> u32 {
        match self {
            Self::Socket => 0o600,
            Self::Lock => 0o444,
        }
    }
}

pub async fn set_permission<P: AsRef<Path>>(path: P, perm: Permission) -> std::io::Result<()> {
    tokio::fs::set_permissions(path.as_ref(), std::fs::Permissions::from_mode(perm.mode())).await
}

/// Represents to a lock file.
#[derive(Debug)]
pub struct Lock {
    holder: Option<std::fs::File>,
    path: PathBuf,
}
impl Lock {
    /// Creates an owned [`Lock`] instance for specified path.
    pub async fn new(path: PathBuf) -> std::io::Result<Self> {
        let mut options = tokio::fs::File::options();
        options.write(true).create_new(true);

        let mut holder = options.open(&path).await?;
        holder
            .write_all(std::process::id().to_string().as_bytes())
            .await?;
        _ = set_permission(&path, Permission::Lock).await;

        Ok(Self {
            holder: Some(holder.into_std().await),
            path,
        })
    }
}
impl Drop for Lock {
    fn drop(&mut self) {
        drop(self.holder.take());
        _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    #[tokio::test]
    async fn lock() {
        let path = std::path::Path::new("/tmp/.powerfx-fs.test.lock");
        _ = tokio::fs::remove_file(path).await;
        let lock = crate::fs::Lock::new(path.into()).await.unwrap();
        assert_eq!(
            tokio::fs::read_to_string(path).await.unwrap(),
            std::process::id().to_string()
        );
        assert!(crate::fs::Lock::new(path.into()).await.is_err());
        drop(lock);
        assert!(!path.exists());
    }
}
