//! Grounding engine: backend client, upload waves and the local document cache.
mod client;
mod decode;
mod engine;
mod filename;
mod persist;
mod sanitize;
mod types;
mod upload;

pub use client::{Backend, ClientSettings, ReqwestBackend, DEFAULT_BASE_URL};
pub use engine::{EngineCommand, EngineError, EngineHandle, EngineSettings};
pub use filename::cache_filename;
pub use persist::{ensure_cache_dir, AtomicFileWriter, DocumentCache, PersistError};
pub use sanitize::sanitize_markup;
pub use types::{
    ApiError, BoxRecord, ChatAnswerRecord, ChatSourceRecord, ChatTurnRecord, ChunkRecord,
    DocumentRecord, EngineEvent, FailureKind, GroundingRecord, SearchHitRecord, TaskId,
    UploadProgress, UploadStage,
};
pub use upload::{run_wave, ChannelProgressSink, ProgressSink, UploadSettings};
