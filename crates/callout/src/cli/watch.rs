//! `callout watch`: hands the API's engine to a controller and runs the file
//! watcher until SIGINT or SIGTERM. The signal stops the loop through a
//! [`StopHandle`], so edits still waiting out the debounce interval are synced
//! before the process exits. Setup notices go to stderr.

use super::render::render_notice;
use super::setup::OutputMode;
use calloutapp::init::CalloutContext;
use calloutapp::watch::{StopHandle, VaultWatcher};
use console::style;
use std::thread;

pub fn run(ctx: CalloutContext, output: OutputMode) -> anyhow::Result<()> {
    let CalloutContext { api, config, root } = ctx;
    let watcher = VaultWatcher::start(&root)?;
    spawn_signal_listener(watcher.stop_handle())?;

    if output == OutputMode::Text {
        eprintln!(
            "Watching {} for {} callouts. Press Ctrl-C to stop.",
            style(root.display()).cyan(),
            config.tracked_types().join(", ")
        );
    }

    let mut controller = api.into_controller();
    watcher.run(&mut controller, |notice| match render_notice(notice, output) {
        Ok(line) => eprintln!("{}", line),
        Err(error) => tracing::warn!(%error, "could not render notice"),
    });
    Ok(())
}

/// Waits for a termination signal on a small runtime of its own, then stops the loop.
fn spawn_signal_listener(stop: StopHandle) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    thread::Builder::new()
        .name("callout-signals".into())
        .spawn(move || {
            match runtime.block_on(terminated()) {
                Ok(()) => tracing::info!("termination signal received"),
                Err(error) => {
                    tracing::warn!(%error, "signal handling failed");
                    return;
                }
            }
            stop.stop();
        })?;
    Ok(())
}

#[cfg(unix)]
async fn terminated() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => {},
        _ = sigint.recv() => {},
    }
    Ok(())
}

#[cfg(not(unix))]
async fn terminated() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
