//! Named GPIO lines of the platform and the output drive path.

use ahash::AHashMap;
use powerfx::gpio::{GpioBackend, Line, OutputHandle};
use std::sync::Arc;

pub const PS_PWROK: Line = Line {
    name: "PS_PWROK",
    pin: 219,
};
pub const SIO_POWER_GOOD: Line = Line {
    name: "SIO_POWER_GOOD",
    pin: 201,
};
pub const SIO_ONCONTROL: Line = Line {
    name: "SIO_ONCONTROL",
    pin: 202,
};
pub const SIO_S5: Line = Line {
    name: "SIO_S5",
    pin: 203,
};
pub const POWER_BUTTON: Line = Line {
    name: "POWER_BUTTON",
    pin: 34,
};
pub const RESET_BUTTON: Line = Line {
    name: "RESET_BUTTON",
    pin: 32,
};
pub const NMI_BUTTON: Line = Line {
    name: "NMI_BUTTON",
    pin: 37,
};
pub const ID_BUTTON: Line = Line {
    name: "ID_BUTTON",
    pin: 218,
};
pub const POST_COMPLETE: Line = Line {
    name: "POST_COMPLETE",
    pin: 215,
};
pub const POWER_OUT: Line = Line {
    name: "POWER_OUT",
    pin: 35,
};
pub const RESET_OUT: Line = Line {
    name: "RESET_OUT",
    pin: 33,
};

/// Input lines the platform must provide; missing any of them at startup is
/// fatal.
pub const INPUT_LINES: [Line; 9] = [
    PS_PWROK,
    SIO_POWER_GOOD,
    SIO_ONCONTROL,
    SIO_S5,
    POWER_BUTTON,
    RESET_BUTTON,
    NMI_BUTTON,
    ID_BUTTON,
    POST_COMPLETE,
];

/// Routes output drives through the right line owner.
///
/// Output lines are requested on demand and released once their pulse ends.
/// While a button mask holds a line, drives go through the mask's handle and
/// the mask keeps holding the line (at the inactive level) after the pulse is
/// released.
pub struct GpioAdapter {
    backend: Arc<dyn GpioBackend>,
    masks: AHashMap<&'static str, Box<dyn OutputHandle>>,
    active: AHashMap<&'static str, Box<dyn OutputHandle>>,
}
impl GpioAdapter {
    pub fn new(backend: Arc<dyn GpioBackend>) -> Self {
        Self {
            backend,
            masks: AHashMap::new(),
            active: AHashMap::new(),
        }
    }

    /// Drives `line` to `value`, acquiring the line if nothing holds it yet.
    pub async fn drive(&mut self, line: Line, value: u8) -> std::io::Result<()> {
        if let Some(handle) = self.masks.get(line.name) {
            return handle.set(value);
        }
        if let Some(handle) = self.active.get(line.name) {
            return handle.set(value);
        }
        let handle = self.backend.request_output(line, value).await?;
        self.active.insert(line.name, handle);
        Ok(())
    }

    /// Releases `line` unless a mask holds it.
    pub fn release(&mut self, line: Line) {
        self.active.remove(line.name);
    }

    /// Takes or drops the mask hold on `line`. Holding drives the line to its
    /// inactive level (logical high) for the lifetime of the mask.
    pub async fn set_mask(&mut self, line: Line, masked: bool) -> std::io::Result<()> {
        if masked {
            if self.masks.contains_key(line.name) {
                return Ok(());
            }
            let handle = match self.active.remove(line.name) {
                Some(handle) => {
                    handle.set(1)?;
                    handle
                }
                None => self.backend.request_output(line, 1).await?,
            };
            self.masks.insert(line.name, handle);
        } else {
            self.masks.remove(line.name);
        }
        Ok(())
    }

    pub fn is_masked(&self, line: Line) -> bool {
        self.masks.contains_key(line.name)
    }
}
