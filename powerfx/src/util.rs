//! Extension to the standard library.

use std::{future::Future, pin::Pin};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// An extension for the standard [`Result`] type to support logging.
pub trait ResultExt<T> {
    /// Returns the contained `Ok` value; on `Err`, logs `why` together with
    /// the error and exits the process with a non-zero status.
    fn unwrap_log(self, why: &str) -> T;
}
impl<T, E> ResultExt<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn unwrap_log(self, why: &str) -> T {
        match self {
            Ok(val) => val,
            Err(err) => {
                tracing::error!(target: "console", "{}: {}", why, err);
                std::process::exit(1);
            }
        }
    }
}
