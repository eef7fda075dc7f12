//! Request routing.
//!
//! | Method     | Path                 | Route              |
//! |------------|----------------------|--------------------|
//! | GET, HEAD  | `/`                  | `Index`            |
//! | GET, HEAD  | `/scripts/preview.js`| `Script`           |
//! | GET, HEAD  | `/styles/preview.css`| `Style`            |
//! | GET, HEAD  | `/docs/*`            | `Docs(rest)`       |
//! | POST       | `/register-filename` | `RegisterFilename` |
//! | GET        | `/pointer`           | `Pointer`          |
//! | GET        | `/entry`             | `Entry`            |
//! | POST       | `/heartbeat`         | `Heartbeat`        |
//! | GET        | `/events`            | `Events`           |
//! | POST       | `/refresh`           | `Refresh`          |

use tiny_http::Method;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Index,
    Script,
    Style,
    /// Raw (still percent-encoded) path below `/docs/`.
    Docs(String),
    RegisterFilename,
    Pointer,
    Entry,
    Heartbeat,
    Events,
    Refresh,
}

/// Outcome of matching a request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMatch {
    Found(Route),
    /// Path exists but not for this method; carries the `Allow` value.
    MethodNotAllowed(&'static str),
    NotFound,
}

const READ: &str = "GET, HEAD";
const GET: &str = "GET";
const POST: &str = "POST";

impl Route {
    /// Match `method` and `url` (query string ignored).
    pub fn parse(method: &Method, url: &str) -> RouteMatch {
        let path = url.split(['?', '#']).next().unwrap_or_default();

        let (route, allow) = match path {
            "/" | "/index.html" => (Self::Index, READ),
            "/scripts/preview.js" => (Self::Script, READ),
            "/styles/preview.css" => (Self::Style, READ),
            "/register-filename" => (Self::RegisterFilename, POST),
            "/pointer" => (Self::Pointer, GET),
            "/entry" => (Self::Entry, GET),
            "/heartbeat" => (Self::Heartbeat, POST),
            "/events" => (Self::Events, GET),
            "/refresh" => (Self::Refresh, POST),
            _ => match path.strip_prefix("/docs/") {
                Some(rest) => (Self::Docs(rest.to_string()), READ),
                None => return RouteMatch::NotFound,
            },
        };

        let allowed = match allow {
            READ => matches!(method, Method::Get | Method::Head),
            GET => *method == Method::Get,
            _ => *method == Method::Post,
        };

        if allowed {
            RouteMatch::Found(route)
        } else {
            RouteMatch::MethodNotAllowed(allow)
        }
    }
}
