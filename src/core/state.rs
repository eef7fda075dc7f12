//! Process lifecycle state.
//!
//! Only shutdown coordination lives here; preview state is owned by the
//! `Preview` context and never stored in a global.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tiny_http::Server;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// The running command polls `is_shutdown()` and stops by itself
static GRACEFUL: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Shutdown signal sender for the background task runtime
static SHUTDOWN_TX: OnceLock<crossbeam::channel::Sender<()>> = OnceLock::new();

/// Exit status of a process ended by Ctrl+C.
const INTERRUPTED: i32 = 130;

/// What a Ctrl+C press should do.
#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    /// Raise the flag and let the command wind down.
    Graceful,
    /// Exit right away.
    Exit,
}

fn classify(graceful: bool, repeated: bool) -> Interrupt {
    if graceful && !repeated {
        Interrupt::Graceful
    } else {
        Interrupt::Exit
    }
}

/// Setup the global Ctrl+C handler. Call once at program start
///
/// Commands that opted in with [`enable_graceful_shutdown`] (or registered
/// a server) get one graceful Ctrl+C; a second press, or a press during any
/// other command, exits immediately.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        let repeated = SHUTDOWN.swap(true, Ordering::SeqCst);

        if classify(GRACEFUL.load(Ordering::SeqCst), repeated) == Interrupt::Exit {
            std::process::exit(INTERRUPTED);
        }

        if let Some(tx) = SHUTDOWN_TX.get() {
            let _ = tx.send(());
        }

        if let Some(server) = SERVER.get() {
            crate::log!("serve"; "shutting down...");
            server.unblock();
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Let the current command handle Ctrl+C by polling [`is_shutdown`].
pub fn enable_graceful_shutdown() {
    GRACEFUL.store(true, Ordering::SeqCst);
}

/// Register the HTTP server for graceful shutdown
///
/// Call this after binding the server, before entering the request loop
pub fn register_server(server: Arc<Server>, shutdown_tx: crossbeam::channel::Sender<()>) {
    let _ = SERVER.set(server);
    let _ = SHUTDOWN_TX.set(shutdown_tx);
    enable_graceful_shutdown();
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
