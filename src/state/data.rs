/// Shared data structures for the application state
///
/// These structs represent the JSON exchanged with the gallery server
/// and the data model that flows between the HTTP layer and the UI layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque session token handed out by `/generate`
///
/// The server currently uses a timestamp string, but nothing on this side
/// depends on its shape, so any JSON scalar is accepted and echoed back as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(serde_json::Value);

#[cfg(test)]
impl SessionId {
    pub fn new(value: impl Into<serde_json::Value>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            serde_json::Value::String(s) => f.write_str(s),
            other => write!(f, "{}", other),
        }
    }
}

/// Represents a single image returned by a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    /// Filename only (e.g., "Image_1.jpg"), unique within a session
    pub filename: String,
    /// Where to fetch the image from, usually server-relative
    pub url: String,
}

/// Body of `POST /generate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub query: String,
    pub limit: u32,
}

/// Raw body of a `/generate` response
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub images: Vec<ImageDescriptor>,
}

/// A successful search, as handed to the controller
#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    pub message: String,
    pub session_id: Option<SessionId>,
    pub images: Vec<ImageDescriptor>,
}

/// Body of `POST /download-selected`
///
/// `session_id` is serialized as `null` when no search has succeeded yet;
/// the server decides what to do with that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub session_id: Option<SessionId>,
    pub images: Vec<String>,
}

/// Raw body of a `/download-selected` response
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub zip_file: Option<String>,
}

/// The server has built an archive and named it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReady {
    pub message: String,
    pub zip_file: String,
}

/// Body of responses that only carry an outcome (`/cleanup`)
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Treat an empty message the same as a missing one
pub fn non_empty(message: Option<String>) -> Option<String> {
    message.filter(|m| !m.trim().is_empty())
}
