//! The `PowerFX` prelude.

pub use crate::util::{BoxFuture, ResultExt as _};
