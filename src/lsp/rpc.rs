//! JSON-RPC 2.0 message framing over stdio.
//!
//! Implements only the subset of the protocol the quill server needs, so the
//! binary does not pull in `lsp-server` / `lsp-types`.

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
}

#[derive(Clone, Debug)]
pub struct Request {
    pub id: RequestId,
    pub method: String,
    /// Carried for the JSON-RPC data model; no supported request reads params.
    #[allow(dead_code)]
    pub params: Value,
}

#[derive(Clone, Debug)]
pub struct Notification {
    pub method: String,
    pub params: Value,
}

/// A decoded client-to-server message. Responses to server-initiated requests
/// carry no method; we never send such requests, so their payload is dropped.
#[derive(Clone, Debug)]
pub enum IncomingMessage {
    Request(Request),
    Notification(Notification),
    Response,
}

pub fn send_notification<T: Serialize>(
    writer: &mut impl Write,
    method: &str,
    params: &T,
) -> Result<(), String> {
    let params = serde_json::to_value(params)
        .map_err(|err| format!("failed to serialise notification params: {err}"))?;
    write_message(
        writer,
        &json!({ "jsonrpc": "2.0", "method": method, "params": params }),
    )
}

pub fn send_response(writer: &mut impl Write, id: RequestId, result: Value) -> Result<(), String> {
    write_message(
        writer,
        &json!({ "jsonrpc": "2.0", "id": id, "result": result }),
    )
}

pub fn send_error_response(
    writer: &mut impl Write,
    id: RequestId,
    code: i32,
    message: String,
) -> Result<(), String> {
    write_message(
        writer,
        &json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": code, "message": message },
        }),
    )
}

/// Read one framed message. Returns `None` on a clean end of stream.
pub fn read_message(reader: &mut impl BufRead) -> Result<Option<IncomingMessage>, String> {
    let Some(body) = read_frame(reader)? else {
        return Ok(None);
    };

    let value: Value =
        serde_json::from_slice(&body).map_err(|err| format!("invalid JSON-RPC body: {err}"))?;
    let obj = value
        .as_object()
        .ok_or_else(|| "JSON-RPC message must be an object".to_string())?;

    let method = obj
        .get("method")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned);
    let params = obj.get("params").cloned().unwrap_or(Value::Null);

    match (method, obj.get("id")) {
        (Some(method), Some(id)) => {
            let id: RequestId = serde_json::from_value(id.clone())
                .map_err(|err| format!("invalid JSON-RPC request id: {err}"))?;
            Ok(Some(IncomingMessage::Request(Request {
                id,
                method,
                params,
            })))
        }
        (Some(method), None) => Ok(Some(IncomingMessage::Notification(Notification {
            method,
            params,
        }))),
        (None, Some(_)) => Ok(Some(IncomingMessage::Response)),
        (None, None) => Err("JSON-RPC message missing both method and id".to_string()),
    }
}

fn read_frame(reader: &mut impl BufRead) -> Result<Option<Vec<u8>>, String> {
    let mut content_length: Option<usize> = None;
    loop {
        let mut line = String::new();
        let read = reader
            .read_line(&mut line)
            .map_err(|err| format!("failed to read LSP header line: {err}"))?;
        if read == 0 {
            return Ok(None);
        }
        if line == "\r\n" {
            break;
        }

        // Header names are case-insensitive; Content-Type is ignored.
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if let Some((name, value)) = trimmed.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                let parsed: usize = value
                    .trim()
                    .parse()
                    .map_err(|err| format!("invalid Content-Length value: {err}"))?;
                content_length = Some(parsed);
            }
        }
    }

    let len = content_length.ok_or_else(|| "missing Content-Length header".to_string())?;
    let mut body = vec![0u8; len];
    reader
        .read_exact(&mut body)
        .map_err(|err| format!("failed to read LSP body: {err}"))?;
    Ok(Some(body))
}

fn write_message(writer: &mut impl Write, message: &Value) -> Result<(), String> {
    let body =
        serde_json::to_vec(message).map_err(|err| format!("failed to serialise JSON: {err}"))?;
    write!(writer, "Content-Length: {}\r\n\r\n", body.len())
        .map_err(|err| format!("failed to write LSP header: {err}"))?;
    writer
        .write_all(&body)
        .map_err(|err| format!("failed to write LSP body: {err}"))?;
    writer
        .flush()
        .map_err(|err| format!("failed to flush LSP output: {err}"))?;
    Ok(())
}
