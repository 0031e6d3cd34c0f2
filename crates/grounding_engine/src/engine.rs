use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_debug, engine_warn};

use crate::client::{Backend, ClientSettings, ReqwestBackend};
use crate::persist::{DocumentCache, PersistError};
use crate::upload::{run_wave, ChannelProgressSink, UploadSettings};
use crate::{ApiError, ChatTurnRecord, EngineEvent, FailureKind, TaskId};

/// IO work requested by the app.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    ListDocuments,
    LoadChunks { doc_id: String, ticket: u64 },
    /// Download the document and write it to the local cache.
    FetchDocument { doc_id: String },
    Upload { path: PathBuf },
    UploadWave { tasks: Vec<(TaskId, PathBuf)> },
    Search { query: String, n_results: usize },
    Chat { question: String, history: Vec<ChatTurnRecord> },
    Extract { doc_id: String },
    /// `payload` is JSON text.
    Validate { doc_id: String, payload: String },
    Delete { doc_id: String },
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub client: ClientSettings,
    pub upload: UploadSettings,
    pub cache_dir: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("backend client: {0}")]
    Client(#[from] ApiError),
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

struct EngineContext {
    backend: Arc<dyn Backend>,
    upload: UploadSettings,
    cache: DocumentCache,
}

/// Runs backend calls on a background runtime; results come back as events.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings) -> Result<Self, EngineError> {
        let backend = Arc::new(ReqwestBackend::new(settings.client)?);
        Self::with_backend(backend, settings.upload, settings.cache_dir)
    }

    pub fn with_backend(
        backend: Arc<dyn Backend>,
        upload: UploadSettings,
        cache_dir: PathBuf,
    ) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("grounding-engine")
            .build()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let context = Arc::new(EngineContext {
            backend,
            upload,
            cache: DocumentCache::new(cache_dir),
        });

        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                let context = context.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(&context, command, event_tx).await;
                });
            }
            engine_debug!("engine command channel closed");
        });

        Ok(Self { cmd_tx, event_rx })
    }

    /// Queue a command. Returns `false` once the engine thread is gone.
    pub fn send(&self, command: EngineCommand) -> bool {
        self.cmd_tx.send(command).is_ok()
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

async fn handle_command(
    context: &EngineContext,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let backend = context.backend.as_ref();
    let event = match command {
        EngineCommand::ListDocuments => EngineEvent::DocumentsListed(backend.list_documents().await),
        EngineCommand::LoadChunks { doc_id, ticket } => {
            let result = backend.load_chunks(&doc_id).await;
            EngineEvent::ChunksLoaded {
                doc_id,
                ticket,
                result,
            }
        }
        EngineCommand::FetchDocument { doc_id } => {
            let result = fetch_into_cache(context, &doc_id).await;
            EngineEvent::DocumentCached { doc_id, result }
        }
        EngineCommand::Upload { path } => EngineEvent::Uploaded(backend.upload(&path).await),
        EngineCommand::UploadWave { tasks } => {
            let sink = ChannelProgressSink::new(event_tx);
            run_wave(backend, tasks, &context.upload, &sink).await;
            return;
        }
        EngineCommand::Search { query, n_results } => {
            EngineEvent::SearchFinished(backend.search(&query, n_results).await)
        }
        EngineCommand::Chat { question, history } => {
            EngineEvent::ChatFinished(backend.chat(&question, &history).await)
        }
        EngineCommand::Extract { doc_id } => {
            let result = backend.extract(&doc_id).await;
            EngineEvent::Extracted { doc_id, result }
        }
        EngineCommand::Validate { doc_id, payload } => {
            let result = match serde_json::from_str::<serde_json::Value>(&payload) {
                Ok(value) => backend.validate(&doc_id, &value).await,
                Err(err) => Err(ApiError::new(
                    FailureKind::Decode,
                    format!("review data is not valid JSON: {err}"),
                )),
            };
            EngineEvent::Validated { doc_id, result }
        }
        EngineCommand::Delete { doc_id } => {
            let result = backend.delete(&doc_id).await;
            if result.is_ok() {
                if let Err(err) = context.cache.remove(&doc_id) {
                    engine_warn!("failed to drop cached copy of {}: {}", doc_id, err);
                }
            }
            EngineEvent::Deleted { doc_id, result }
        }
    };
    let _ = event_tx.send(event);
}

async fn fetch_into_cache(context: &EngineContext, doc_id: &str) -> Result<PathBuf, ApiError> {
    let bytes = context.backend.fetch_document(doc_id).await?;
    let cache = context.cache.clone();
    let doc_id = doc_id.to_string();
    tokio::task::spawn_blocking(move || cache.store(&doc_id, &bytes))
        .await
        .map_err(|err| ApiError::new(FailureKind::Io, err.to_string()))?
        .map_err(persist_failure)
}

fn persist_failure(err: PersistError) -> ApiError {
    ApiError::new(FailureKind::Io, err.to_string())
}
