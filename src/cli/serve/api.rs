//! JSON endpoints of the preview server.
//!
//! Handlers take the preview context and the request body and return the
//! response body or a typed failure; [`super::response::send_result`] turns
//! either into HTTP.

use std::io::Read;

use serde_json::{Value, json};
use tiny_http::Request;

use crate::core::PreviewError;
use crate::preview::Preview;

/// Largest accepted request body.
const MAX_BODY: u64 = 64 * 1024;

/// Read a request body, refusing oversized ones.
pub fn read_body(request: &mut Request) -> Result<Vec<u8>, PreviewError> {
    read_body_from(request.as_reader())
}

fn read_body_from(reader: impl Read) -> Result<Vec<u8>, PreviewError> {
    let mut body = Vec::new();
    reader
        .take(MAX_BODY + 1)
        .read_to_end(&mut body)
        .map_err(|e| PreviewError::Internal(format!("Failed to read request body: {e}")))?;

    if body.len() as u64 > MAX_BODY {
        return Err(PreviewError::InvalidInput("Request body too large".into()));
    }
    Ok(body)
}

/// `POST /register-filename` with `{"filename": "<pointer>"}`.
pub fn register(preview: &Preview, body: &[u8]) -> Result<Value, PreviewError> {
    let filename = filename_field(body)?;
    preview.liveness().register(filename.as_deref())?;
    Ok(json!({ "message": "Filename registered successfully" }))
}

/// Extract `filename` from a JSON body. Absent body or field is `None`.
fn filename_field(body: &[u8]) -> Result<Option<String>, PreviewError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| PreviewError::InvalidInput(format!("Request body is not valid JSON: {e}")))?;

    match value.get("filename") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(PreviewError::InvalidInput("Filename must be a string".into())),
    }
}

/// `GET /pointer`.
pub fn pointer(preview: &Preview) -> Value {
    json!({ "pointer": preview.liveness().current_pointer() })
}

/// `GET /entry`.
pub fn entry(preview: &Preview) -> Result<Value, PreviewError> {
    preview.resolve_entry().map(|doc| doc.to_json())
}

/// `POST /heartbeat`.
pub fn heartbeat(preview: &Preview) -> Result<Value, PreviewError> {
    preview.liveness().heartbeat()?;
    Ok(json!({ "message": "Heartbeat received" }))
}

/// `POST /refresh`.
pub fn refresh(preview: &Preview) -> Value {
    let clients = preview.refresh();
    json!({ "message": "Refresh sent to all clients", "clients": clients })
}
