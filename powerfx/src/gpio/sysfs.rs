//! GPIO lines over the kernel sysfs interface.

use super::{Edge, GpioBackend, Line, OutputHandle};
use async_trait::async_trait;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;
use tokio::io::unix::AsyncFd;
use tokio::io::Interest;
use tokio::sync::mpsc;

/// GPIO backend driving `/sys/class/gpio`.
#[derive(Debug)]
pub struct SysfsGpio {
    root: PathBuf,
}
impl SysfsGpio {
    /// Creates a backend rooted at the standard sysfs GPIO class directory.
    pub fn new() -> Self {
        Self::with_root("/sys/class/gpio")
    }

    /// Creates a backend rooted at `root`.
    pub fn with_root<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    fn pin_dir(&self, line: Line) -> PathBuf {
        self.root.join(format!("gpio{}", line.pin))
    }

    async fn export(&self, line: Line) -> std::io::Result<()> {
        match tokio::fs::write(self.root.join("export"), line.pin.to_string()).await {
            Ok(()) => Ok(()),
            // Already exported.
            Err(err) if err.raw_os_error() == Some(libc::EBUSY) => Ok(()),
            Err(err) => Err(err),
        }
    }

    async fn write_attr(&self, line: Line, attr: &str, value: &str) -> std::io::Result<()> {
        tokio::fs::write(self.pin_dir(line).join(attr), value).await
    }

    async fn read_value(&self, line: Line) -> std::io::Result<u8> {
        let raw = tokio::fs::read(self.pin_dir(line).join("value")).await?;
        Ok(parse_level(&raw))
    }
}
impl Default for SysfsGpio {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GpioBackend for SysfsGpio {
    async fn request_input(&self, line: Line) -> std::io::Result<u8> {
        self.export(line).await?;
        self.write_attr(line, "direction", "in").await?;
        self.read_value(line).await
    }

    async fn read(&self, line: Line) -> std::io::Result<u8> {
        self.read_value(line).await
    }

    async fn request_output(
        &self,
        line: Line,
        value: u8,
    ) -> std::io::Result<Box<dyn OutputHandle>> {
        self.export(line).await?;
        // "high"/"low" configures the direction and the initial level in one
        // write, without a glitch through the other level.
        let initial = if value == 0 { "low" } else { "high" };
        self.write_attr(line, "direction", initial).await?;

        Ok(Box::new(SysfsOutput {
            value_path: self.pin_dir(line).join("value"),
            direction_path: self.pin_dir(line).join("direction"),
        }))
    }

    async fn subscribe(&self, line: Line) -> std::io::Result<mpsc::UnboundedReceiver<Edge>> {
        self.export(line).await?;
        self.write_attr(line, "direction", "in").await?;
        self.write_attr(line, "edge", "both").await?;

        let file = std::fs::File::open(self.pin_dir(line).join("value"))?;
        // The first poll on a freshly opened value fd reports a pending
        // priority event; read once to consume it and learn the idle level.
        let mut last = read_level(&file)?;

        let afd = AsyncFd::with_interest(file, Interest::PRIORITY)?;
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            loop {
                let mut guard = match afd.ready(Interest::PRIORITY).await {
                    Ok(guard) => guard,
                    Err(err) => {
                        tracing::warn!("lost edge events on `{}`: {}", line.name, err);
                        break;
                    }
                };
                match read_level(guard.get_inner()) {
                    Ok(level) => {
                        if level != last {
                            let edge = if level == 0 { Edge::Falling } else { Edge::Rising };
                            last = level;
                            if tx.send(edge).is_err() {
                                break;
                            }
                        }
                    }
                    Err(err) => {
                        tracing::warn!("failed to read `{}`: {}", line.name, err);
                    }
                }
                guard.clear_ready();
            }
        });

        Ok(rx)
    }
}

#[derive(Debug)]
struct SysfsOutput {
    value_path: PathBuf,
    direction_path: PathBuf,
}
impl OutputHandle for SysfsOutput {
    fn set(&self, value: u8) -> std::io::Result<()> {
        std::fs::write(&self.value_path, if value == 0 { "0" } else { "1" })
    }
}
impl Drop for SysfsOutput {
    fn drop(&mut self) {
        // Releasing an output returns the line to a high-impedance input so
        // the board pulls take over.
        _ = std::fs::write(&self.direction_path, "in");
    }
}

fn read_level(mut file: &std::fs::File) -> std::io::Result<u8> {
    file.seek(SeekFrom::Start(0))?;
    let mut buf = [0u8; 8];
    let n = file.read(&mut buf)?;
    Ok(parse_level(&buf[..n]))
}

fn parse_level(raw: &[u8]) -> u8 {
    match raw.first() {
        Some(b'0') => 0,
        _ => 1,
    }
}
