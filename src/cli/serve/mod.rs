//! Preview server.
//!
//! A [`BoundServer`] owns the listening socket and the shared [`Preview`]
//! context. Requests are dispatched on a rayon pool; the liveness monitor
//! runs on a separate tokio runtime thread until shutdown.

mod api;
mod events;
mod lifecycle;
mod path;
mod response;
mod route;

use crate::{
    config::PreviewConfig,
    debug,
    embed::serve::{INDEX_HTML, IndexVars, PREVIEW_CSS, PREVIEW_JS, PreviewJsVars},
    log,
    preview::{Preview, PreviewSettings},
    utils::mime::types::{CSS, HTML, JAVASCRIPT},
};
use anyhow::Result;
use crossbeam::channel;
use route::{Route, RouteMatch};
use std::sync::Arc;
use tiny_http::{Request, Server};

/// Title of the preview page.
const PAGE_TITLE: &str = "Diary Preview";

/// Delay before the browser reopens a dropped event stream.
const RECONNECT_MS: u64 = 2000;

/// Bound server ready to accept requests.
pub struct BoundServer {
    server: Arc<Server>,
    shutdown_rx: channel::Receiver<()>,
    preview: Arc<Preview>,
    workers: usize,
}

/// Bind the HTTP server without starting the request loop.
pub fn bind_server(config: &PreviewConfig) -> Result<BoundServer> {
    let (server, addr) = lifecycle::bind(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    crate::core::register_server(Arc::clone(&server), shutdown_tx);

    let preview = Arc::new(Preview::new(PreviewSettings::from_config(config)));
    if !preview.docs_root().is_dir() {
        log!("serve"; "docs directory {} does not exist yet", preview.docs_root().display());
    }

    log!("serve"; "http://{}", addr);
    debug!("serve"; "docs root {}", preview.docs_root().display());

    Ok(BoundServer {
        server,
        shutdown_rx,
        preview,
        workers: config.serve.workers,
    })
}

impl BoundServer {
    /// Start the request loop (blocking) until Ctrl+C.
    pub fn run(self) -> Result<()> {
        let monitor = lifecycle::spawn_monitor(Arc::clone(&self.preview), self.shutdown_rx);

        let state = Arc::new(ServeState::new(Arc::clone(&self.preview)));
        let result = run_request_loop(&self.server, &state, self.workers);

        self.preview.shutdown();
        lifecycle::wait_for_shutdown(monitor);
        result
    }
}

/// Per-server data shared by request handlers.
struct ServeState {
    preview: Arc<Preview>,
    index_html: String,
    preview_js: String,
}

impl ServeState {
    fn new(preview: Arc<Preview>) -> Self {
        Self {
            preview,
            index_html: INDEX_HTML.render(&IndexVars {
                page_title: PAGE_TITLE,
            }),
            preview_js: PREVIEW_JS.render(&PreviewJsVars {
                reconnect_ms: RECONNECT_MS,
            }),
        }
    }
}

fn run_request_loop(server: &Server, state: &Arc<ServeState>, workers: usize) -> Result<()> {
    // Event streams hand their socket to the broadcaster and return,
    // so a small pool is enough.
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("serve-{i}"))
        .build()?;

    for request in server.incoming_requests() {
        let state = Arc::clone(state);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &state) {
                log!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request.
fn handle_request(mut request: Request, state: &ServeState) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    let route = match Route::parse(request.method(), request.url()) {
        RouteMatch::Found(route) => route,
        RouteMatch::MethodNotAllowed(allow) => {
            return response::respond_method_not_allowed(request, allow);
        }
        RouteMatch::NotFound => return response::respond_not_found(request),
    };

    debug!("serve"; "{} {}", request.method(), request.url());
    let preview = &state.preview;

    match route {
        Route::Index => response::respond_static(request, HTML, &state.index_html),
        Route::Script => response::respond_static(request, JAVASCRIPT, &state.preview_js),
        Route::Style => response::respond_static(request, CSS, PREVIEW_CSS),
        Route::Docs(rest) => match path::resolve_path(&rest, preview.docs_root()) {
            Some(file) => response::respond_file(request, &file),
            None => response::respond_not_found(request),
        },
        Route::RegisterFilename => {
            let result = api::read_body(&mut request).and_then(|body| api::register(preview, &body));
            response::send_result(request, result)
        }
        Route::Pointer => response::send_json(request, 200, &api::pointer(preview)),
        Route::Entry => response::send_result(request, api::entry(preview)),
        Route::Heartbeat => response::send_result(request, api::heartbeat(preview)),
        Route::Events => events::subscribe(request, preview).map(|_| ()),
        Route::Refresh => response::send_json(request, 200, &api::refresh(preview)),
    }
}
