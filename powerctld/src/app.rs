//! The powerctld application.
//!
//! The daemon is one owned object threaded through handlers by reference;
//! there are no component-wide globals.

use crate::{env, lifetime, power, rpc, storage, surface};
use powerfx::gpio::GpioBackend;
use powerfx::i2c::I2cMaster;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};

/// An instance of the powerctld app.
#[derive(Debug)]
pub struct Daemon {
    /// The storage manager.
    pub storage: storage::Storage,

    /// The external surface's property cache and signal bus.
    pub surface: Arc<surface::Surface>,

    /// The RPC context.
    pub rpc: rpc::Context,

    /// The lifetime manager of the `powerctld` process.
    pub lifetime: lifetime::System,

    /// A handle to the power sequencer.
    pub power: power::Manager,

    /// Timestamp generated on creation of the struct.
    pub boot_timestamp: i64,
}
impl Daemon {
    /// Initializes the app: storage, the surface, the power sequencer and,
    /// on an AC-loss boot, the power restore flow.
    pub async fn init(
        cmdline: &env::Cmdline,
        backend: Arc<dyn GpioBackend>,
        i2c: Arc<dyn I2cMaster>,
        ac_boot: bool,
    ) -> anyhow::Result<Arc<Self>> {
        let storage = storage::Storage::new(
            cmdline.state_dir.clone(),
            cmdline.runtime_dir.clone(),
        )
        .await;
        let surface = Arc::new(surface::Surface::new());

        let power = power::Manager::start(power::Options {
            backend,
            i2c,
            surface: surface.clone(),
            power_drop: storage.power_drop.clone(),
            ac_boot,
        })
        .await?;
        // Make sure the initial projections are applied before the surface
        // starts answering.
        power.settle().await;

        if ac_boot {
            power::restore::start(surface.clone(), power.clone());
        }

        Ok(Arc::new(Self {
            storage,
            surface,
            rpc: rpc::Context::new(),
            lifetime: lifetime::System::new(),
            power,
            boot_timestamp: powerfx::time::timestamp_ms(),
        }))
    }

    /// Registers process signal hooks associated to this instance.
    pub fn listen_signals(self: &Arc<Self>) {
        for kind in [SignalKind::interrupt(), SignalKind::terminate()] {
            let app = self.clone();
            tokio::spawn(async move {
                let Ok(mut stream) = signal(kind) else {
                    return;
                };
                stream.recv().await;
                app.lifetime.exit(0);
            });
        }
    }
}
