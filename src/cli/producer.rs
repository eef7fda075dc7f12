//! Producer commands: the editor side of a preview session.
//!
//! `attach` registers an entry and keeps it alive with heartbeats;
//! `refresh` and `pointer` are one-shot requests against a running server.
//! `edit` opens the entry in the user's editor and refreshes afterwards.

use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use serde_json::{Value, json};

use crate::config::PreviewConfig;
use crate::core::{ENTRY_FILE, Pointer, enable_graceful_shutdown, expand, is_shutdown, today};
use crate::logger::{status_error, status_success, status_warning};
use crate::{debug, log};

/// Per-request timeout of the HTTP client.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// How often `attach` wakes up to look for Ctrl+C between heartbeats.
const SLEEP_STEP: Duration = Duration::from_millis(200);

/// Editor used when neither `$VISUAL` nor `$EDITOR` is set.
const FALLBACK_EDITOR: &str = "vim";

/// Server answer to an API call.
#[derive(Debug)]
pub enum Reply {
    /// 2xx with its JSON body.
    Accepted(Value),
    /// Non-2xx with the server's error message.
    Rejected { status: u16, message: String },
}

impl Reply {
    fn message(&self) -> String {
        match self {
            Self::Accepted(body) => body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("ok")
                .to_string(),
            Self::Rejected { status, message } => format!("{status}: {message}"),
        }
    }
}

/// Blocking client for the preview API.
pub struct PreviewClient {
    base: String,
    agent: ureq::Agent,
}

impl PreviewClient {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn register(&self, pointer: &Pointer) -> Result<Reply> {
        self.post("/register-filename", Some(json!({ "filename": pointer })))
    }

    pub fn heartbeat(&self) -> Result<Reply> {
        self.post("/heartbeat", None)
    }

    pub fn refresh(&self) -> Result<Reply> {
        self.post("/refresh", None)
    }

    /// Pointer currently registered with the server.
    pub fn pointer(&self) -> Result<Option<String>> {
        let url = format!("{}/pointer", self.base);
        let reply = into_reply(self.agent.get(&url).call())
            .with_context(|| format!("GET {url}"))?;

        match reply {
            Reply::Accepted(body) => Ok(body
                .get("pointer")
                .and_then(Value::as_str)
                .map(str::to_string)),
            Reply::Rejected { status, message } => bail!("GET {url} failed ({status}): {message}"),
        }
    }

    fn post(&self, path: &str, body: Option<Value>) -> Result<Reply> {
        let url = format!("{}{}", self.base, path);
        let request = self.agent.post(&url);
        let response = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        };
        into_reply(response).with_context(|| format!("POST {url}"))
    }
}

/// Split HTTP status failures (answered) from transport failures (not).
fn into_reply(response: Result<ureq::Response, ureq::Error>) -> Result<Reply> {
    match response {
        Ok(response) => {
            let body = response.into_json::<Value>().unwrap_or(Value::Null);
            Ok(Reply::Accepted(body))
        }
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_json::<Value>().unwrap_or(Value::Null);
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("request failed")
                .to_string();
            Ok(Reply::Rejected { status, message })
        }
        Err(ureq::Error::Transport(e)) => Err(anyhow::anyhow!("{e}")),
    }
}

/// Base URL from `--url`, or the `[serve]` section.
fn base_url(config: &PreviewConfig, url: Option<&str>) -> String {
    url.map_or_else(|| config.server_url(), str::to_string)
}

/// Resolve a pointer expression (`$NOW`, `$NOW-1`, ...) into a pointer.
pub fn resolve_pointer(expr: &str) -> Result<Pointer> {
    let expanded = expand(expr, today());
    Pointer::parse(&expanded).map_err(|e| anyhow::anyhow!("invalid pointer `{expanded}`: {e}"))
}

// ============================================================================
// attach
// ============================================================================

/// Register `pointer_expr` and heartbeat until Ctrl+C.
pub fn attach(config: &PreviewConfig, pointer_expr: &str, url: Option<&str>) -> Result<()> {
    let pointer = resolve_pointer(pointer_expr)?;
    let client = PreviewClient::new(&base_url(config, url));
    let interval = Duration::from_millis(config.liveness.heartbeat_interval_ms);

    let entry = pointer.entry_path(&config.docs_root());
    if !entry.is_file() {
        status_warning(&format!(
            "{} has no {} yet (run `new {}` to create it)",
            pointer, ENTRY_FILE, pointer
        ));
    }

    enable_graceful_shutdown();
    let mut registered = register_once(&client, &pointer);
    log!("attach"; "{} -> {}, heartbeat every {}ms", pointer, client.base(), interval.as_millis());

    while sleep_until_next(interval, is_shutdown) {
        if !registered {
            registered = register_once(&client, &pointer);
            continue;
        }

        match client.heartbeat() {
            Ok(Reply::Accepted(_)) => debug!("attach"; "heartbeat"),
            Ok(Reply::Rejected { status: 400, .. }) => {
                // The server lost the registration (restarted).
                status_warning("server forgot the entry, registering again");
                registered = register_once(&client, &pointer);
            }
            Ok(reply) => status_error("heartbeat rejected", &reply.message()),
            Err(e) => status_error("heartbeat failed", &format!("{e:#}")),
        }
    }

    log!("attach"; "detached from {}", pointer);
    Ok(())
}

/// Try to register once; report the outcome.
fn register_once(client: &PreviewClient, pointer: &Pointer) -> bool {
    match client.register(pointer) {
        Ok(reply @ Reply::Accepted(_)) => {
            status_success(&format!("{}: {}", pointer, reply.message()));
            true
        }
        Ok(reply) => {
            status_error("register rejected", &reply.message());
            false
        }
        Err(e) => {
            status_error("server unreachable", &format!("{e:#}"));
            false
        }
    }
}

/// Sleep for `interval`. Returns `false` as soon as `stop` says so.
fn sleep_until_next(interval: Duration, stop: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + interval;
    loop {
        if stop() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep(SLEEP_STEP.min(deadline - now));
    }
}

// ============================================================================
// one-shot commands
// ============================================================================

/// Optionally re-register, then heartbeat and push an update to every page.
pub fn refresh_command(
    config: &PreviewConfig,
    pointer_expr: Option<&str>,
    url: Option<&str>,
) -> Result<()> {
    let client = PreviewClient::new(&base_url(config, url));

    if let Some(expr) = pointer_expr {
        let pointer = resolve_pointer(expr)?;
        expect_accepted(client.register(&pointer)?, "register")?;
    }

    if let Reply::Rejected { status, message } = client.heartbeat()? {
        status_warning(&format!("heartbeat rejected ({status}): {message}"));
    }

    match client.refresh()? {
        Reply::Accepted(body) => {
            let clients = body.get("clients").and_then(Value::as_u64).unwrap_or(0);
            status_success(&format!("refresh sent to {clients} clients"));
            Ok(())
        }
        rejected => expect_accepted(rejected, "refresh").map(|_| ()),
    }
}

/// Print the server's current pointer.
pub fn pointer_command(config: &PreviewConfig, url: Option<&str>) -> Result<()> {
    let client = PreviewClient::new(&base_url(config, url));
    match client.pointer()? {
        Some(pointer) => println!("{pointer}"),
        None => status_warning("no entry registered"),
    }
    Ok(())
}

/// Open the entry in `$VISUAL`/`$EDITOR`, then push an update.
///
/// The refresh is best effort: editing works without a running server.
pub fn edit_command(config: &PreviewConfig, pointer_expr: &str, url: Option<&str>) -> Result<()> {
    let pointer = resolve_pointer(pointer_expr)?;
    let entry = pointer.entry_path(&config.docs_root());
    if !entry.is_file() {
        bail!("{} has no {} (run `new {}` first)", pointer, ENTRY_FILE, pointer);
    }

    let editor = editor_command(
        std::env::var("VISUAL").ok().as_deref(),
        std::env::var("EDITOR").ok().as_deref(),
    );
    let (program, args) = editor
        .split_first()
        .context("editor command is empty")?;

    debug!("edit"; "{} {}", editor.join(" "), entry.display());
    let status = Command::new(program)
        .args(args)
        .arg(&entry)
        .status()
        .with_context(|| format!("Failed to execute `{program}`"))?;
    if !status.success() {
        bail!("Command `{program}` failed: {status}");
    }

    let client = PreviewClient::new(&base_url(config, url));
    match client.refresh() {
        Ok(Reply::Accepted(_)) => status_success(&format!("{pointer} saved, preview refreshed")),
        Ok(reply) => status_warning(&format!("refresh rejected: {}", reply.message())),
        Err(_) => status_warning(&format!("no preview server at {}", client.base())),
    }
    Ok(())
}

/// Editor program and its arguments, from `$VISUAL`, then `$EDITOR`.
fn editor_command(visual: Option<&str>, editor: Option<&str>) -> Vec<String> {
    [visual, editor]
        .into_iter()
        .flatten()
        .map(|cmd| cmd.split_whitespace().map(str::to_string).collect::<Vec<_>>())
        .find(|words| !words.is_empty())
        .unwrap_or_else(|| vec![FALLBACK_EDITOR.to_string()])
}

fn expect_accepted(reply: Reply, what: &str) -> Result<Value> {
    match reply {
        Reply::Accepted(body) => Ok(body),
        Reply::Rejected { status, message } => bail!("{what} failed ({status}): {message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_base_url_prefers_flag() {
        let config = test_parse_config("[serve]\nport = 9100\n");
        assert_eq!(base_url(&config, None), "http://127.0.0.1:9100");
        assert_eq!(base_url(&config, Some("http://box:1")), "http://box:1");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        assert_eq!(PreviewClient::new("http://h:1/").base(), "http://h:1");
    }

    #[test]
    fn test_resolve_pointer() {
        assert_eq!(resolve_pointer("2024-05-05").unwrap().as_str(), "2024-05-05");
        assert_eq!(resolve_pointer("$NOW").unwrap().as_str(), expand("$NOW", today()));
        assert!(resolve_pointer("../x").is_err());
        assert!(resolve_pointer("  ").is_err());
    }

    #[test]
    fn test_reply_message() {
        let ok = Reply::Accepted(json!({ "message": "Heartbeat received" }));
        assert_eq!(ok.message(), "Heartbeat received");
        let bad = Reply::Rejected {
            status: 400,
            message: "No filename registered".into(),
        };
        assert_eq!(bad.message(), "400: No filename registered");
    }

    #[test]
    fn test_sleep_stops_on_request() {
        let started = Instant::now();
        assert!(!sleep_until_next(Duration::from_secs(60), || true));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_sleep_runs_full_interval() {
        let started = Instant::now();
        assert!(sleep_until_next(Duration::from_millis(30), || false));
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_sleep_notices_stop_between_steps() {
        let started = Instant::now();
        let stop_at = started + Duration::from_millis(50);
        assert!(!sleep_until_next(Duration::from_secs(60), || Instant::now() >= stop_at));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_editor_command_precedence() {
        assert_eq!(editor_command(Some("code -w"), Some("nano")), ["code", "-w"]);
        assert_eq!(editor_command(None, Some("nano")), ["nano"]);
        assert_eq!(editor_command(Some("  "), Some("nano")), ["nano"]);
        assert_eq!(editor_command(None, None), [FALLBACK_EDITOR]);
    }

    #[test]
    fn test_edit_requires_existing_entry() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut config = test_parse_config("");
        config.serve.docs = temp.path().to_path_buf();

        let err = edit_command(&config, "2024-01-01", None).unwrap_err();
        assert!(err.to_string().contains("2024-01-01"));
    }

    #[test]
    fn test_unreachable_server_is_transport_error() {
        // Port 9 on localhost is closed in test environments.
        let client = PreviewClient::new("http://127.0.0.1:9");
        assert!(client.heartbeat().is_err());
    }
}
