//! Configuration section definitions.
//!
//! Each module corresponds to a section in `preview.toml`:
//!
//! | Module     | TOML Section   | Purpose                               |
//! |------------|----------------|---------------------------------------|
//! | `serve`    | `[serve]`      | Interface, port, docs root, workers   |
//! | `liveness` | `[liveness]`   | Heartbeat timeout and intervals       |
//! | `events`   | `[events]`     | Keepalive and change coalescing       |

mod events;
mod liveness;
mod serve;

pub use events::EventsConfig;
pub use liveness::LivenessConfig;
pub use serve::ServeConfig;
