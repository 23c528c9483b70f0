//! Language server for quill: document sync plus published diagnostics.
//!
//! Speaks JSON-RPC 2.0 over stdio. Documents are synchronised in full; every
//! open or edit re-runs the in-memory check pipeline and publishes the
//! resulting diagnostics. Positions on the wire are UTF-16 code units, per the
//! protocol.

use std::collections::HashMap;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

mod rpc;
mod types;

use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use self::rpc::{IncomingMessage, Notification as RpcNotification, Request as RpcRequest};
use self::types::{
    Diagnostic as LspDiagnostic, DiagnosticRelatedInformation, DidChangeTextDocumentParams,
    DidCloseTextDocumentParams, DidOpenTextDocumentParams, InitializeResult, Location,
    NumberOrString, Position, PublishDiagnosticsParams, Range, SYNC_FULL, ServerCapabilities,
    ServerInfo, Uri,
};
use crate::diagnostics::{Diagnostic, FileCache, FileId, Severity, Span};
use crate::driver::{CheckReport, Driver};
use crate::error::Result;

const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;

struct Document {
    text: String,
    version: i32,
}

impl Document {
    fn apply_change(&mut self, params: &DidChangeTextDocumentParams) {
        self.version = params.text_document.version;
        for change in &params.content_changes {
            // Full sync is the only advertised mode, so a change carries the
            // complete replacement text. Range-scoped edits are skipped rather
            // than risk corrupting the buffer.
            if change.range.is_none() {
                self.text = change.text.clone();
            }
        }
    }
}

#[derive(Default)]
struct DocumentStore {
    documents: HashMap<Uri, Document>,
}

impl DocumentStore {
    fn open(&mut self, uri: Uri, text: String, version: i32) {
        self.documents.insert(uri, Document { text, version });
    }

    fn close(&mut self, uri: &Uri) {
        self.documents.remove(uri);
    }

    fn update(&mut self, uri: &Uri, params: &DidChangeTextDocumentParams) {
        if let Some(document) = self.documents.get_mut(uri) {
            document.apply_change(params);
        }
    }

    fn version(&self, uri: &Uri) -> Option<i32> {
        self.documents.get(uri).map(|document| document.version)
    }

    fn diagnostics(&self, driver: &Driver, uri: &Uri) -> Option<Vec<LspDiagnostic>> {
        let document = self.documents.get(uri)?;
        let report = driver.check_source(uri_path(uri), document.text.clone());
        let CheckReport { diagnostics, files } = report;
        Some(convert_diagnostics(diagnostics, &files))
    }
}

fn uri_path(uri: &Uri) -> PathBuf {
    uri_to_file_path(uri).unwrap_or_else(|| PathBuf::from(uri.as_str()))
}

fn uri_to_file_path(uri: &Uri) -> Option<PathBuf> {
    let parsed = Url::parse(uri.as_str()).ok()?;
    parsed.to_file_path().ok()
}

fn file_path_to_uri(path: &Path) -> Option<Uri> {
    let url = Url::from_file_path(path).ok()?;
    Some(url.to_string())
}

/// Convert a rendered diagnostic list for publication. Note diagnostics
/// annotate the error or warning they follow, so they are folded into that
/// parent as related information instead of being published on their own.
fn convert_diagnostics(diagnostics: Vec<Diagnostic>, files: &FileCache) -> Vec<LspDiagnostic> {
    let mut converted: Vec<LspDiagnostic> = Vec::new();
    for diagnostic in diagnostics {
        if diagnostic.severity == Severity::Note {
            if let Some(parent) = converted.last_mut() {
                if let Some(related) = related_information(&diagnostic, files) {
                    parent.related_information.push(related);
                    continue;
                }
            }
        }
        converted.push(convert_diagnostic(diagnostic, files));
    }
    converted
}

fn convert_diagnostic(diagnostic: Diagnostic, files: &FileCache) -> LspDiagnostic {
    let primary_span = diagnostic.primary_label.as_ref().map(|label| label.span);
    let range = primary_span
        .and_then(|span| span_to_range(span, files))
        .unwrap_or_else(empty_range);

    let mut related_information = Vec::new();
    for label in &diagnostic.secondary_labels {
        if let Some(range) = span_to_range(label.span, files) {
            if let Some(uri) = uri_for_file(label.span.file_id, files) {
                related_information.push(DiagnosticRelatedInformation {
                    location: Location::new(uri, range),
                    message: label.message.clone(),
                });
            }
        }
    }
    // Inline notes carry no span of their own; anchor them at the primary
    // range so clients can still surface them next to the diagnostic.
    if let Some(span) = primary_span {
        if let Some(range) = span_to_range(span, files) {
            if let Some(uri) = uri_for_file(span.file_id, files) {
                for note in &diagnostic.notes {
                    related_information.push(DiagnosticRelatedInformation {
                        location: Location::new(uri.clone(), range),
                        message: note.clone(),
                    });
                }
            }
        }
    }

    LspDiagnostic {
        range,
        severity: Some(severity_to_lsp(diagnostic.severity)),
        code: diagnostic
            .code
            .map(|code| NumberOrString::String(code.code)),
        source: Some(String::from("quill")),
        message: diagnostic.message,
        related_information,
    }
}

fn related_information(
    diagnostic: &Diagnostic,
    files: &FileCache,
) -> Option<DiagnosticRelatedInformation> {
    let span = diagnostic.primary_label.as_ref()?.span;
    let range = span_to_range(span, files)?;
    let uri = uri_for_file(span.file_id, files)?;
    Some(DiagnosticRelatedInformation {
        location: Location::new(uri, range),
        message: diagnostic.message.clone(),
    })
}

fn uri_for_file(file_id: FileId, files: &FileCache) -> Option<Uri> {
    files.path(file_id).and_then(file_path_to_uri)
}

fn span_to_range(span: Span, files: &FileCache) -> Option<Range> {
    Some(Range {
        start: position_at(span.file_id, span.start, files)?,
        end: position_at(span.file_id, span.end, files)?,
    })
}

/// Map a byte offset to an LSP position, counting the line prefix in UTF-16
/// code units.
fn position_at(file_id: FileId, offset: usize, files: &FileCache) -> Option<Position> {
    let file = files.get(file_id)?;
    let line_col = file.line_col(offset)?;
    let (line_start, _) = file.line_bounds(line_col.line)?;
    let prefix = file.source.get(line_start..offset)?;
    let character = prefix.chars().map(char::len_utf16).sum::<usize>();
    Some(Position::new(
        u32::try_from(line_col.line.saturating_sub(1)).unwrap_or(u32::MAX),
        u32::try_from(character).unwrap_or(u32::MAX),
    ))
}

fn empty_range() -> Range {
    Range::new(Position::new(0, 0), Position::new(0, 0))
}

fn severity_to_lsp(severity: Severity) -> i32 {
    match severity {
        Severity::Error => 1,
        Severity::Warning => 2,
        Severity::Help => 3,
        Severity::Note => 4,
    }
}

fn parse_params<T>(value: Value) -> Option<T>
where
    T: DeserializeOwned,
{
    serde_json::from_value(value).ok()
}

fn publish_diagnostics(
    writer: &mut impl Write,
    uri: &Uri,
    version: Option<i32>,
    diagnostics: Vec<LspDiagnostic>,
) -> std::result::Result<(), String> {
    let params = PublishDiagnosticsParams {
        uri: uri.clone(),
        diagnostics,
        version,
    };
    rpc::send_notification(writer, types::methods::PUBLISH_DIAGNOSTICS, &params)
}

fn handle_request(
    writer: &mut impl Write,
    request: RpcRequest,
) -> std::result::Result<bool, String> {
    match request.method.as_str() {
        types::methods::SHUTDOWN => {
            rpc::send_response(writer, request.id, Value::Null)?;
            Ok(true)
        }
        _ => {
            rpc::send_error_response(
                writer,
                request.id,
                METHOD_NOT_FOUND,
                format!("unsupported request: {}", request.method),
            )?;
            Ok(false)
        }
    }
}

fn handle_notification(
    writer: &mut impl Write,
    store: &mut DocumentStore,
    driver: &Driver,
    notification: RpcNotification,
) -> std::result::Result<bool, String> {
    match notification.method.as_str() {
        types::methods::DID_OPEN => {
            if let Some(params) = parse_params::<DidOpenTextDocumentParams>(notification.params) {
                let uri = params.text_document.uri;
                store.open(
                    uri.clone(),
                    params.text_document.text,
                    params.text_document.version,
                );
                if let Some(diagnostics) = store.diagnostics(driver, &uri) {
                    publish_diagnostics(writer, &uri, store.version(&uri), diagnostics)?;
                }
            }
            Ok(false)
        }
        types::methods::DID_CHANGE => {
            if let Some(params) = parse_params::<DidChangeTextDocumentParams>(notification.params) {
                let uri = params.text_document.uri.clone();
                store.update(&uri, &params);
                if let Some(diagnostics) = store.diagnostics(driver, &uri) {
                    publish_diagnostics(writer, &uri, store.version(&uri), diagnostics)?;
                }
            }
            Ok(false)
        }
        types::methods::DID_CLOSE => {
            if let Some(params) = parse_params::<DidCloseTextDocumentParams>(notification.params) {
                store.close(&params.text_document.uri);
                publish_diagnostics(writer, &params.text_document.uri, None, Vec::new())?;
            }
            Ok(false)
        }
        types::methods::EXIT => Ok(true),
        _ => Ok(false),
    }
}

/// Run the language server over stdio until the client disconnects or
/// completes the shutdown/exit handshake.
///
/// # Errors
/// Returns an error when a message cannot be framed, read, or written.
pub fn run_stdio(driver: &Driver) -> Result<()> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut reader = BufReader::new(stdin.lock());
    let mut writer = BufWriter::new(stdout.lock());

    // Handshake: answer the first initialize request with our capabilities;
    // anything else before that is a protocol error on the client's side.
    loop {
        match rpc::read_message(&mut reader)? {
            Some(IncomingMessage::Request(request))
                if request.method == types::methods::INITIALIZE =>
            {
                let init_value = serde_json::to_value(capabilities())
                    .map_err(|err| format!("failed to serialise capabilities: {err}"))?;
                rpc::send_response(&mut writer, request.id, init_value)?;
                break;
            }
            Some(IncomingMessage::Request(request)) => {
                rpc::send_error_response(
                    &mut writer,
                    request.id,
                    METHOD_NOT_FOUND,
                    format!("unsupported request before initialize: {}", request.method),
                )?;
            }
            Some(IncomingMessage::Notification(_) | IncomingMessage::Response) => {}
            None => return Ok(()),
        }
    }

    let mut store = DocumentStore::default();
    let mut shutdown_requested = false;

    // The server stays up after `shutdown` until the matching `exit`
    // notification arrives; in between, new requests are refused.
    while let Some(message) = rpc::read_message(&mut reader)? {
        match message {
            IncomingMessage::Request(request) => {
                if shutdown_requested {
                    rpc::send_error_response(
                        &mut writer,
                        request.id,
                        INVALID_REQUEST,
                        "server is shutting down".to_string(),
                    )?;
                } else {
                    shutdown_requested = handle_request(&mut writer, request)?;
                }
            }
            IncomingMessage::Notification(notification) => {
                if handle_notification(&mut writer, &mut store, driver, notification)? {
                    break;
                }
            }
            IncomingMessage::Response => {}
        }
    }

    Ok(())
}

/// Capabilities advertised during the initialize handshake.
#[must_use]
pub fn capabilities() -> InitializeResult {
    InitializeResult {
        capabilities: ServerCapabilities {
            text_document_sync: Some(SYNC_FULL),
        },
        server_info: Some(ServerInfo {
            name: String::from("quill-lsp"),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }),
    }
}
