use std::path::PathBuf;

use crate::{
    Chunk, ChunkIndex, ChatAnswer, ContainerSpan, Document, LoadTicket, PageLayout, SearchHit,
    SelectedFile, TaskId, TaskUpdate,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Refresh the document list.
    DocumentsRequested,
    DocumentsLoaded(Result<Vec<Document>, String>),
    /// User picked a document from the list.
    DocumentSelected { doc_id: String },
    /// Chunk fetch finished for the load identified by `ticket`.
    ChunksLoaded {
        doc_id: String,
        ticket: LoadTicket,
        result: Result<Vec<Chunk>, String>,
    },
    /// Document bytes are available to the page renderer.
    DocumentCached {
        doc_id: String,
        result: Result<PathBuf, String>,
    },
    /// Renderer finished laying out the pages of the active document.
    PageLayoutMeasured(PageLayout),

    /// Click on a chunk card or on its overlay box.
    ChunkClicked(ChunkIndex),
    ChunkHoverStarted(ChunkIndex),
    ChunkHoverEnded,
    ZoomInClicked,
    ZoomOutClicked,

    DividerDragStarted,
    DividerDragMoved { pointer_x: f64, container: ContainerSpan },
    DividerDragEnded,
    /// Pointer capture lost without a pointer-up (cancel, window blur).
    DividerDragCancelled,
    /// The viewer is going away; every scoped resource must be released.
    ViewerClosed,

    /// Single-file upload from the sidebar.
    UploadRequested { path: PathBuf },
    UploadCompleted(Result<Document, String>),

    BatchOpened,
    BatchFilesSelected(Vec<SelectedFile>),
    BatchTaskRemoved(TaskId),
    BatchStartClicked,
    BatchTaskUpdated { task_id: TaskId, update: TaskUpdate },
    BatchClosed,

    SearchSubmitted(String),
    SearchCompleted(Result<Vec<SearchHit>, String>),
    SearchCleared,
    /// Activate the n-th search result.
    SearchResultActivated(usize),

    ChatSubmitted(String),
    ChatAnswered(Result<ChatAnswer, String>),
    /// Activate a source cited by the chat message at `message`.
    ChatSourceActivated { message: usize, source: usize },

    ExtractRequested,
    ExtractCompleted {
        doc_id: String,
        result: Result<String, String>,
    },
    /// Save the reviewed form payload (JSON text) for the active document.
    SaveRequested { payload: String },
    SaveCompleted {
        doc_id: String,
        result: Result<String, String>,
    },

    DeleteRequested { doc_id: String },
    DeleteCompleted {
        doc_id: String,
        result: Result<(), String>,
    },

    ErrorDismissed,
    /// UI/render tick to coalesce rendering.
    Tick,
    NoOp,
}
