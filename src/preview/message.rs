//! Server-sent event protocol.
//!
//! The wire format is deliberately minimal: every event is a single
//! `data:` line carrying one of two payloads.
//!
//! ```text
//! data: update\n\n    entry changed, client re-fetches
//! data: ping\n\n      keepalive, also used to detect dead connections
//! :\n\n                comment, written by idle connections
//! ```

/// Comment frame; `EventSource` ignores it, a closed socket rejects it.
pub const IDLE_FRAME: &str = ":\n\n";

/// Event pushed to every subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadEvent {
    Update,
    Ping,
}

impl ReloadEvent {
    /// Literal payload of the event.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Ping => "ping",
        }
    }

    /// Full event-stream frame, terminated by a blank line.
    pub const fn frame(self) -> &'static str {
        match self {
            Self::Update => "data: update\n\n",
            Self::Ping => "data: ping\n\n",
        }
    }
}
