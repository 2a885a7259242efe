//! Screen Printer: background process entry point.
//!
//! This is the process shell that wires together:
//! - Configuration (config.rs)
//! - The capture-advance loop (printer/)
//! - The command/event channel to the UI over stdio (ipc/)

pub mod capture;
pub mod config;
pub mod document;
pub mod geometry;
pub mod input;
pub mod ipc;
pub mod printer;
pub mod viewer;

use config::Config;
use ipc::Dispatcher;
use printer::{Collaborators, Printer};
use tokio::io::BufReader;
use tokio::sync::mpsc;

/// Entry point, called by the binary.
///
/// Reads commands as JSON lines on stdin and writes events as JSON lines on
/// stdout until stdin closes.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = Config::from_env()?;
    log::info!(
        "Screen Printer starting up — output {}, click failure policy {:?}",
        config.output_path.display(),
        config.on_click_failure
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve_stdio(config))?;

    log::info!("Screen Printer shut down");
    Ok(())
}

async fn serve_stdio(config: Config) -> std::io::Result<()> {
    let (event_tx, event_rx) = ipc::channel();
    let (command_tx, command_rx) = mpsc::unbounded_channel();

    let printer = Printer::new(
        config.print_settings(),
        Collaborators::system(config.open_viewer),
        event_tx.clone(),
    );
    let dispatcher = Dispatcher::new(printer, event_tx)
        .report_rejected_starts(config.report_rejected_starts);

    let writer = tokio::spawn(ipc::write_events(tokio::io::stdout(), event_rx));
    let reader = tokio::spawn(ipc::read_commands(
        BufReader::new(tokio::io::stdin()),
        command_tx,
    ));

    // Returns once the reader drops its sender and any run has wound down.
    // Dropping the dispatcher (and the printer inside it) closes the event
    // channel, which lets the writer drain and exit.
    dispatcher.serve(command_rx).await;

    match reader.await {
        Ok(result) => result?,
        Err(e) => log::error!("[IPC] Reader task failed: {}", e),
    }
    match writer.await {
        Ok(result) => result?,
        Err(e) => log::error!("[IPC] Writer task failed: {}", e),
    }
    Ok(())
}
