//! Grounding core: pure state machine for synchronised document review.
//!
//! Everything here is deterministic and free of IO. The embedding app feeds
//! [`Msg`]s into [`update`] and executes the returned [`Effect`]s.
mod batch;
mod chunk;
mod chunk_store;
mod effect;
mod error;
mod msg;
mod navigation;
mod search;
mod selection;
mod split;
mod state;
mod update;
mod view_model;
pub mod viewport;

pub use batch::{
    is_pdf, BatchQueue, BatchStats, BatchSummary, SelectedFile, TaskId, TaskStatus, TaskUpdate,
    UploadTask, WaveAdvance, DEFAULT_UPLOAD_CONCURRENCY,
};
pub use chunk::{BoundingBox, Chunk, ChunkIndex, Grounding};
pub use chunk_store::{ChunkStore, LoadTicket};
pub use effect::{Effect, UploadRequest};
pub use error::{ErrorKind, UiError};
pub use msg::Msg;
pub use navigation::{display_name_hint, NavigationOutcome, NavigationTarget, Navigator};
pub use search::{
    ChatAnswer, ChatMessage, ChatRole, ChatSource, ChatTurn, SearchHit, CHAT_FAILURE_REPLY,
    CHAT_GREETING, CHAT_HISTORY_WINDOW, DEFAULT_SEARCH_RESULTS,
};
pub use selection::{SelectionChange, SelectionState};
pub use split::{ContainerSpan, SplitState, MAX_LEFT_PERCENT, MIN_LEFT_PERCENT};
pub use state::{AppState, CoreSettings, Document};
pub use update::update;
pub use view_model::{
    format_file_size, ActiveDocumentView, AppViewModel, BatchView, ChunkCardView, DocumentRow,
    OverlayView, ReviewView, SearchResultView, SearchView, UploadTaskView,
};
pub use viewport::{
    list_scroll_target, page_scroll_target, ListContainer, ListElement, PageLayout, ScrollAnchor,
    ViewportSync, MAX_SCALE, MIN_SCALE,
};
