//! An in-memory GPIO backend.
//!
//! Lines behave like idealized hardware: inputs hold whatever level the test
//! last injected with [`SimGpio::set_level`], outputs record every value
//! driven onto them so assertions can replay the pulse history.

use super::{Edge, GpioBackend, Line, OutputHandle};
use ahash::AHashMap;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Debug, Default)]
struct Inner {
    levels: AHashMap<&'static str, u8>,
    watchers: AHashMap<&'static str, Vec<mpsc::UnboundedSender<Edge>>>,
    drives: AHashMap<&'static str, Vec<u8>>,
    requested_outputs: AHashMap<&'static str, usize>,
    fail_outputs: Vec<&'static str>,
}

/// An in-memory [`GpioBackend`].
#[derive(Debug, Default)]
pub struct SimGpio {
    inner: Arc<Mutex<Inner>>,
}
impl SimGpio {
    pub fn new() -> Arc<Self> {
        Arc::default()
    }

    /// Presets the level of an input line without emitting an edge.
    pub fn preset(&self, line: Line, value: u8) {
        self.inner.lock().unwrap().levels.insert(line.name, value);
    }

    /// Sets the level of an input line, emitting an edge to subscribers if it
    /// changed.
    pub fn set_level(&self, line: Line, value: u8) {
        let mut inner = self.inner.lock().unwrap();
        let old = inner.levels.insert(line.name, value).unwrap_or(1);
        if old == value {
            return;
        }
        let edge = if value == 0 { Edge::Falling } else { Edge::Rising };
        if let Some(watchers) = inner.watchers.get_mut(line.name) {
            watchers.retain(|tx| tx.send(edge).is_ok());
        }
    }

    /// Returns the values driven onto `line` since the start of the test, in
    /// order.
    pub fn drives(&self, line: Line) -> Vec<u8> {
        self.inner
            .lock()
            .unwrap()
            .drives
            .get(line.name)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the current level of `line`.
    pub fn level(&self, line: Line) -> u8 {
        *self.inner.lock().unwrap().levels.get(line.name).unwrap_or(&1)
    }

    /// Returns how many times `line` was requested as an output.
    pub fn output_requests(&self, line: Line) -> usize {
        *self
            .inner
            .lock()
            .unwrap()
            .requested_outputs
            .get(line.name)
            .unwrap_or(&0)
    }

    /// Makes every future output request for `line` fail with `EIO`.
    pub fn fail_output(&self, line: Line) {
        self.inner.lock().unwrap().fail_outputs.push(line.name);
    }
}

#[async_trait]
impl GpioBackend for SimGpio {
    async fn request_input(&self, line: Line) -> std::io::Result<u8> {
        Ok(self.level(line))
    }

    async fn read(&self, line: Line) -> std::io::Result<u8> {
        Ok(self.level(line))
    }

    async fn request_output(
        &self,
        line: Line,
        value: u8,
    ) -> std::io::Result<Box<dyn OutputHandle>> {
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.fail_outputs.contains(&line.name) {
                return Err(std::io::Error::from_raw_os_error(libc::EIO));
            }
            *inner.requested_outputs.entry(line.name).or_default() += 1;
        }
        let handle = SimOutput {
            inner: self.inner.clone(),
            line,
        };
        handle.set(value)?;
        Ok(Box::new(handle))
    }

    async fn subscribe(&self, line: Line) -> std::io::Result<mpsc::UnboundedReceiver<Edge>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .lock()
            .unwrap()
            .watchers
            .entry(line.name)
            .or_default()
            .push(tx);
        Ok(rx)
    }
}

#[derive(Debug)]
struct SimOutput {
    inner: Arc<Mutex<Inner>>,
    line: Line,
}
impl OutputHandle for SimOutput {
    fn set(&self, value: u8) -> std::io::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.drives.entry(self.line.name).or_default().push(value);
        inner.levels.insert(self.line.name, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn edges_reach_subscribers() {
        const LINE: Line = Line {
            name: "TEST_IN",
            pin: 0,
        };
        let gpio = SimGpio::new();
        gpio.preset(LINE, 1);
        let mut rx = gpio.subscribe(LINE).await.unwrap();
        gpio.set_level(LINE, 0);
        gpio.set_level(LINE, 0);
        gpio.set_level(LINE, 1);
        assert_eq!(rx.recv().await, Some(Edge::Falling));
        assert_eq!(rx.recv().await, Some(Edge::Rising));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn outputs_record_drives() {
        const LINE: Line = Line {
            name: "TEST_OUT",
            pin: 1,
        };
        let gpio = SimGpio::new();
        let handle = gpio.request_output(LINE, 1).await.unwrap();
        handle.set(0).unwrap();
        handle.set(1).unwrap();
        assert_eq!(gpio.drives(LINE), vec![1, 0, 1]);
        assert_eq!(gpio.output_requests(LINE), 1);
    }
}
