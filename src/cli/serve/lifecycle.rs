//! Server lifecycle management.

use crate::{log, preview::Preview};
use anyhow::{Result, anyhow};
use crossbeam::channel::Receiver;
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};
use tiny_http::Server;

/// Bind to exactly `interface:port`.
///
/// Producers find the server through the configured port, so a port that is
/// already taken is an error rather than a reason to pick another one.
/// Returns the address actually bound (differs only for port 0).
pub fn bind(interface: IpAddr, port: u16) -> Result<(Server, SocketAddr)> {
    let requested = SocketAddr::new(interface, port);
    let server = Server::http(requested).map_err(|e| {
        anyhow!("Failed to bind {requested}: {e} (is another preview server running on port {port}?)")
    })?;

    let addr = server.server_addr().to_ip().unwrap_or(requested);
    Ok((server, addr))
}

/// Spawn the liveness monitor on its own runtime thread.
pub fn spawn_monitor(preview: Arc<Preview>, shutdown_rx: Receiver<()>) -> Option<JoinHandle<()>> {
    let rt = match tokio::runtime::Builder::new_current_thread().enable_time().build() {
        Ok(rt) => rt,
        Err(e) => {
            log!("error"; "failed to create monitor runtime: {}", e);
            return None;
        }
    };

    Some(thread::spawn(move || {
        rt.block_on(crate::preview::monitor::run(preview, shutdown_rx));
    }))
}

/// Wait for the monitor to stop (max 2 seconds).
pub fn wait_for_shutdown(handle: Option<JoinHandle<()>>) {
    let Some(handle) = handle else { return };

    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_bind_reports_actual_port() {
        let (_server, addr) = bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).unwrap();
        assert_ne!(addr.port(), 0);
    }

    #[test]
    fn test_bind_taken_port_fails() {
        let localhost = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let (_first, addr) = bind(localhost, 0).unwrap();

        let err = bind(localhost, addr.port()).err().expect("binding a taken port should fail");
        assert!(err.to_string().contains(&addr.port().to_string()));
    }

    #[test]
    fn test_monitor_stops_on_signal() {
        let temp = tempfile::TempDir::new().unwrap();
        let preview = Arc::new(Preview::new(crate::preview::PreviewSettings::new(
            temp.path().to_path_buf(),
        )));
        let (tx, rx) = crossbeam::channel::unbounded();
        let handle = spawn_monitor(preview, rx);
        assert!(handle.is_some());

        tx.send(()).unwrap();
        let handle = handle.unwrap();
        for _ in 0..40 {
            if handle.is_finished() {
                break;
            }
            thread::sleep(Duration::from_millis(50));
        }
        assert!(handle.is_finished());
    }
}
