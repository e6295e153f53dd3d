//! Wire message serde types and request parameter builders.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::LspError;

/// Methods understood by this client. Anything the backend sends outside
/// this set is logged and ignored.
pub(crate) const PUBLISH_DIAGNOSTICS: &str = "textDocument/publishDiagnostics";
pub(crate) const LOG_MESSAGE: &str = "window/logMessage";

#[derive(Debug, Serialize)]
pub(crate) struct Request {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl Request {
    pub fn new(id: u64, method: &str, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.to_string(),
            params,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Notification {
    pub jsonrpc: &'static str,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl Notification {
    pub fn new(method: &str, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.to_string(),
            params,
        }
    }
}

/// A decoded inbound frame, classified by shape.
///
/// Presence of an `id` plus `result`/`error` makes a reply; an `id` plus
/// `method` is a server-initiated request; `method` alone is a notification.
#[derive(Debug)]
pub(crate) enum Incoming {
    Reply {
        id: u64,
        result: Option<serde_json::Value>,
        error: Option<ResponseError>,
    },
    ServerRequest {
        id: serde_json::Value,
        method: String,
    },
    Notification {
        method: String,
        params: Option<serde_json::Value>,
    },
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseError {
    #[serde(default)]
    pub code: i64,
    pub message: String,
}

pub(crate) fn classify(frame: &serde_json::Value) -> Option<Incoming> {
    let id = frame.get("id");
    let method = frame
        .get("method")
        .and_then(|m| m.as_str())
        .map(String::from);

    match (id, method) {
        (Some(id_val), None) => Some(Incoming::Reply {
            id: id_val.as_u64()?,
            result: frame.get("result").cloned(),
            error: frame
                .get("error")
                .and_then(|e| serde_json::from_value(e.clone()).ok()),
        }),
        (Some(id_val), Some(method)) => Some(Incoming::ServerRequest {
            id: id_val.clone(),
            method,
        }),
        (None, Some(method)) => Some(Incoming::Notification {
            method,
            params: frame.get("params").cloned(),
        }),
        (None, None) => None,
    }
}

/// Unsolicited server notifications this client recognizes.
///
/// A closed set with an explicit default arm: unknown methods are carried
/// as [`ServerNotice::Unknown`] and logged by the dispatcher, never fatal.
#[derive(Debug)]
pub(crate) enum ServerNotice {
    PublishDiagnostics(PublishDiagnosticsParams),
    LogMessage { message: String },
    Unknown { method: String },
}

impl ServerNotice {
    pub fn from_wire(method: &str, params: Option<serde_json::Value>) -> Self {
        match method {
            PUBLISH_DIAGNOSTICS => match params.map(serde_json::from_value) {
                Some(Ok(p)) => Self::PublishDiagnostics(p),
                _ => Self::Unknown {
                    method: method.to_string(),
                },
            },
            LOG_MESSAGE => {
                let message = params
                    .as_ref()
                    .and_then(|p| p.get("message"))
                    .and_then(|m| m.as_str())
                    .unwrap_or_default()
                    .to_string();
                Self::LogMessage { message }
            }
            _ => Self::Unknown {
                method: method.to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PublishDiagnosticsParams {
    pub uri: String,
    pub diagnostics: Vec<serde_json::Value>,
}

/// `initialize` params: declares the client's supported feature surface so
/// the backend tailors its responses (edit formats, refactor-kind filters).
/// Static configuration, not negotiated per call.
pub(crate) fn initialize_params(root_uri: &str, root_path: &Path) -> serde_json::Value {
    serde_json::json!({
        "processId": std::process::id(),
        "rootUri": root_uri,
        "rootPath": root_path.display().to_string(),
        "capabilities": {
            "workspace": {
                "applyEdit": true,
                "workspaceEdit": {
                    "documentChanges": true,
                    "resourceOperations": ["create", "rename", "delete"]
                },
                "didChangeConfiguration": { "dynamicRegistration": false }
            },
            "textDocument": {
                "synchronization": {
                    "dynamicRegistration": false,
                    "willSave": false,
                    "willSaveWaitUntil": false,
                    "didSave": true
                },
                "hover": { "dynamicRegistration": false },
                "definition": { "dynamicRegistration": false },
                "references": { "dynamicRegistration": false },
                "rename": { "dynamicRegistration": false },
                "codeAction": {
                    "dynamicRegistration": false,
                    "codeActionLiteralSupport": {
                        "codeActionKind": {
                            "valueSet": [
                                "quickfix",
                                "refactor",
                                "refactor.extract",
                                "refactor.inline",
                                "refactor.rewrite"
                            ]
                        }
                    }
                }
            }
        },
        "workspaceFolders": [{
            "uri": root_uri,
            "name": "workspace"
        }],
        "initializationOptions": {}
    })
}

pub(crate) fn did_open_params(uri: &str, language_id: &str, version: i32, text: &str) -> serde_json::Value {
    serde_json::json!({
        "textDocument": {
            "uri": uri,
            "languageId": language_id,
            "version": version,
            "text": text
        }
    })
}

pub(crate) fn did_change_params(uri: &str, version: i32, text: &str) -> serde_json::Value {
    serde_json::json!({
        "textDocument": {
            "uri": uri,
            "version": version
        },
        "contentChanges": [{
            "text": text
        }]
    })
}

pub(crate) fn did_close_params(uri: &str) -> serde_json::Value {
    serde_json::json!({
        "textDocument": { "uri": uri }
    })
}

pub(crate) fn position_params(uri: &str, line: u32, character: u32) -> serde_json::Value {
    serde_json::json!({
        "textDocument": { "uri": uri },
        "position": { "line": line, "character": character }
    })
}

pub(crate) fn path_to_file_uri(path: &Path) -> Result<url::Url, LspError> {
    url::Url::from_file_path(path).map_err(|()| LspError::PathToUri {
        path: path.to_path_buf(),
    })
}

/// Convert a `file://` URI to a filesystem path.
///
/// `Url::to_file_path` handles the Windows drive-letter escaping quirk
/// (`file:///C:/...` parses to `C:\...`).
pub(crate) fn file_uri_to_path(uri: &str) -> Option<PathBuf> {
    url::Url::parse(uri)
        .ok()
        .filter(|u| u.scheme() == "file")
        .and_then(|u| u.to_file_path().ok())
}
