//! `GET /events`: server-sent event stream.
//!
//! The response head is written by hand and the raw connection is handed
//! to the [`Broadcaster`](crate::preview::Broadcaster). From then on the
//! request thread is free; the connection's writer thread unsubscribes it
//! as soon as a write fails, whether for an event or an idle comment.

use std::io::Write;

use anyhow::Result;
use tiny_http::Request;

use crate::preview::{Preview, SubscriberId};
use crate::utils::mime::types::EVENT_STREAM;

/// Response head of an event stream.
fn stream_head() -> String {
    format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: {EVENT_STREAM}\r\n\
         Cache-Control: no-cache\r\n\
         Connection: keep-alive\r\n\
         X-Accel-Buffering: no\r\n\
         \r\n"
    )
}

/// Take over the connection and subscribe it to reload events.
pub fn subscribe(request: Request, preview: &Preview) -> Result<SubscriberId> {
    let remote = request.remote_addr().copied();
    let mut writer = request.into_writer();
    writer.write_all(stream_head().as_bytes())?;
    writer.flush()?;

    let id = preview.broadcaster().subscribe(writer);
    if let Some(addr) = remote {
        crate::debug!("events"; "{} subscribed", addr);
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::broadcast::tests::wait_until;
    use crate::preview::{PreviewSettings, ReloadEvent};
    use std::io::{BufRead, BufReader};
    use std::net::TcpStream;
    use std::sync::Arc;
    use std::time::Duration;
    use tiny_http::Server;

    #[test]
    fn test_stream_head_is_well_formed() {
        let head = stream_head();
        assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(head.contains("Content-Type: text/event-stream\r\n"));
        assert!(head.contains("Cache-Control: no-cache\r\n"));
        assert!(head.contains("Connection: keep-alive\r\n"));
        assert!(head.ends_with("\r\n\r\n"));
        assert_eq!(head.matches("\r\n\r\n").count(), 1);
    }

    /// Serve one `/events` request from a real server; return the client side.
    fn connect(preview: &Arc<Preview>) -> BufReader<TcpStream> {
        let server = Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();

        let preview = Arc::clone(preview);
        std::thread::spawn(move || {
            let request = server.recv().unwrap();
            subscribe(request, &preview).unwrap();
            // Keep the server alive while the stream is open.
            std::thread::sleep(Duration::from_secs(5));
        });

        let mut client = TcpStream::connect(("127.0.0.1", port)).unwrap();
        client
            .write_all(b"GET /events HTTP/1.1\r\nHost: localhost\r\nAccept: text/event-stream\r\n\r\n")
            .unwrap();

        let mut reader = BufReader::new(client);
        let mut line = String::new();
        loop {
            line.clear();
            reader.read_line(&mut line).unwrap();
            if line == "\r\n" {
                break;
            }
        }
        reader
    }

    fn fast_preview() -> (tempfile::TempDir, Arc<Preview>) {
        let temp = tempfile::TempDir::new().unwrap();
        let mut settings = PreviewSettings::new(temp.path().to_path_buf());
        settings.idle_check = Duration::from_millis(20);
        (temp, Arc::new(Preview::new(settings)))
    }

    #[test]
    fn test_stream_delivers_update() {
        let (_temp, preview) = fast_preview();
        let mut reader = connect(&preview);
        assert!(wait_until(|| preview.broadcaster().len() == 1));

        preview.refresh();
        let mut line = String::new();
        loop {
            line.clear();
            reader.read_line(&mut line).unwrap();
            if line.starts_with("data:") {
                break;
            }
        }
        assert_eq!(line, format!("data: {}\n", ReloadEvent::Update.as_str()));
    }

    #[test]
    fn test_closed_stream_is_unsubscribed_without_events() {
        let (_temp, preview) = fast_preview();
        let reader = connect(&preview);
        assert!(wait_until(|| preview.broadcaster().len() == 1));

        drop(reader);
        assert!(wait_until(|| preview.broadcaster().is_empty()));
    }
}
