use std::fmt;
use std::path::PathBuf;

/// Identifies one entry of a batch upload; assigned by the caller.
pub type TaskId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Uploading,
    Parsing,
    Indexing,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadProgress {
    pub task_id: TaskId,
    pub stage: UploadStage,
    pub remote_doc_id: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub doc_id: String,
    pub filename: String,
    pub status: Option<String>,
    pub num_chunks: Option<u64>,
}

/// Normalised region box, fractions of the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxRecord {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundingRecord {
    /// 0-indexed.
    pub page: u32,
    pub bbox: Option<BoxRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRecord {
    /// Backend chunk id, or the decimal position when the backend has none.
    pub key: String,
    /// Plain text; markup has already been stripped.
    pub text: String,
    pub chunk_type: String,
    pub grounding: Option<GroundingRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHitRecord {
    pub doc_id: String,
    pub chunk_key: String,
    pub page: u32,
    pub chunk_type: String,
    pub text: String,
    pub score: f64,
    pub grounding: Option<GroundingRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurnRecord {
    /// `user` or `assistant`.
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSourceRecord {
    pub doc_id: String,
    pub chunk_key: String,
    pub filename: Option<String>,
    pub page: u32,
    pub chunk_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatAnswerRecord {
    pub answer: String,
    pub sources: Vec<ChatSourceRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    DocumentsListed(Result<Vec<DocumentRecord>, ApiError>),
    ChunksLoaded {
        doc_id: String,
        ticket: u64,
        result: Result<Vec<ChunkRecord>, ApiError>,
    },
    DocumentCached {
        doc_id: String,
        result: Result<PathBuf, ApiError>,
    },
    Uploaded(Result<DocumentRecord, ApiError>),
    UploadProgress(UploadProgress),
    SearchFinished(Result<Vec<SearchHitRecord>, ApiError>),
    ChatFinished(Result<ChatAnswerRecord, ApiError>),
    Extracted {
        doc_id: String,
        result: Result<String, ApiError>,
    },
    Validated {
        doc_id: String,
        result: Result<String, ApiError>,
    },
    Deleted {
        doc_id: String,
        result: Result<(), ApiError>,
    },
}

/// A failed backend call. `message` is the server's `detail` when it sent one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Decode,
    Network,
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Io => write!(f, "io error"),
        }
    }
}
