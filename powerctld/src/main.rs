//! # powerctld

mod app;
mod env;
mod events;
mod lifetime;
mod power;
mod rpc;
mod storage;
mod surface;

use powerfx::prelude::*;
use std::sync::Arc;

/// Entrypoint of the program.
#[tokio::main]
async fn main() {
    let cmdline = env::Cmdline::parse();
    powerfx::log::Builder::new()
        .name("powerctld")
        .quiet(cmdline.quiet)
        .verbose(cmdline.verbose)
        .color(!cmdline.no_color)
        .init();

    let backend = Arc::new(powerfx::gpio::SysfsGpio::new());
    let i2c = Arc::new(powerfx::i2c::DevI2c);
    let ac_boot = powerfx::sio::is_ac_boot();

    let app = app::Daemon::init(&cmdline, backend, i2c, ac_boot)
        .await
        .unwrap_log("failed to initialize powerctld");
    let _lock = app
        .storage
        .runtime
        .lock()
        .await
        .unwrap_log("failed to lock `powerctld.lock`");
    app.storage
        .runtime
        .rpc_server()
        .await
        .unwrap_log("failed to create powerctld rpc socket")
        .start(app.clone());
    app.listen_signals();

    let mut lifetime = app.lifetime.subscribe();
    if let Ok(event) = lifetime.recv().await {
        drop(_lock);
        event.handle();
    }
}
