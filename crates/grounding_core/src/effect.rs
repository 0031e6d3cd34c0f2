use std::path::PathBuf;

use crate::{BatchSummary, ChatTurn, ChunkIndex, LoadTicket, TaskId};

/// One file of an upload wave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub task_id: TaskId,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    LoadDocuments,
    LoadChunks { doc_id: String, ticket: LoadTicket },
    FetchDocument { doc_id: String },
    /// Pages must be laid out again at `scale` and re-measured.
    RelayoutPages { scale: f64 },
    /// Smooth-scroll the page canvas. Fire-and-forget.
    ScrollViewport { top_px: f64 },
    /// Centre the card of `index` in the chunk list. Fire-and-forget.
    ScrollListToChunk { index: ChunkIndex },
    CapturePointer,
    ReleasePointer,
    UploadFile { path: PathBuf },
    UploadWave { requests: Vec<UploadRequest> },
    BatchCompleted(BatchSummary),
    Search { query: String, n_results: usize },
    Chat { question: String, history: Vec<ChatTurn> },
    Extract { doc_id: String },
    Validate { doc_id: String, payload: String },
    DeleteDocument { doc_id: String },
}
