//! The power restore flow after an AC loss.
//!
//! Runs once per process, and only when the SIO latched a power failure for
//! this boot. The configured policy and delay are read from the surface; if
//! they have not been published yet the flow waits for their first
//! publication and then proceeds with defaults for whatever is still missing.

use super::Manager;
use crate::surface::Surface;
use powerctl_sdk::state::{RestorePolicy, Signal, RESTORE_IFACE};
use std::sync::Arc;
use std::time::Duration;

/// Boot-loader time already spent before the system clock started counting.
const UBOOT_SECS: u64 = 20;

pub(crate) fn start(surface: Arc<Surface>, power: Manager) {
    tokio::spawn(run(surface, power));
}

async fn run(surface: Arc<Surface>, power: Manager) {
    let (policy, delay) = resolve(&surface).await;

    // The configured delay counts from mains arrival; the boot loader and our
    // own startup already consumed part of it.
    let elapsed = UBOOT_SECS + powerfx::time::uptime().as_secs();
    let remaining = Duration::from_secs(u64::from(delay).saturating_sub(elapsed));

    power.arm_restore(policy, remaining);
}

async fn resolve(surface: &Surface) -> (RestorePolicy, u16) {
    // Subscribe before the first read so a publication cannot slip between
    // the two.
    let mut signals = surface.subscribe();

    if let (Some(policy), Some(delay)) = surface.restore_settings() {
        return (policy, delay);
    }

    loop {
        match signals.recv().await {
            Ok(Signal::PropertyChanged(change)) if change.interface == RESTORE_IFACE => break,
            Ok(_) => continue,
            Err(async_broadcast::RecvError::Overflowed(_)) => continue,
            Err(async_broadcast::RecvError::Closed) => break,
        }
    }

    let (policy, delay) = surface.restore_settings();
    (
        policy.unwrap_or(RestorePolicy::AlwaysOff),
        delay.unwrap_or(0),
    )
}
