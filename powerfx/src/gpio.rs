//! GPIO line access.
//!
//! The daemon talks to lines through the [`GpioBackend`] trait so that the
//! power sequencing logic can run against the in-memory [`sim`] backend in
//! tests. On real hardware the [`SysfsGpio`] backend drives the kernel's
//! sysfs GPIO interface.

pub mod sim;
mod sysfs;

pub use sysfs::SysfsGpio;

use async_trait::async_trait;
use tokio::sync::mpsc;

/// A named GPIO line together with its controller offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub name: &'static str,
    pub pin: u32,
}

/// An edge observed on an input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

/// An owned output line.
///
/// The line stays configured as an output, driven to the last written value,
/// for as long as the handle lives; dropping the handle releases the line.
pub trait OutputHandle: Send + Sync {
    /// Drives the line to `value` (`0` or `1`).
    fn set(&self, value: u8) -> std::io::Result<()>;
}

/// A source of line events and sink of line values.
#[async_trait]
pub trait GpioBackend: Send + Sync + 'static {
    /// Configures `line` as an input and returns its current level.
    async fn request_input(&self, line: Line) -> std::io::Result<u8>;

    /// Reads the current level of a previously requested input line.
    async fn read(&self, line: Line) -> std::io::Result<u8>;

    /// Configures `line` as an output driven to `value` and returns an owned
    /// handle to it.
    async fn request_output(&self, line: Line, value: u8)
        -> std::io::Result<Box<dyn OutputHandle>>;

    /// Subscribes to both-edge events on an input line.
    async fn subscribe(&self, line: Line) -> std::io::Result<mpsc::UnboundedReceiver<Edge>>;
}
