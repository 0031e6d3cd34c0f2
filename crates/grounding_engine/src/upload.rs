use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use futures_util::future::join_all;

use crate::client::Backend;
use crate::{EngineEvent, TaskId, UploadProgress, UploadStage};

/// Dwell times between the status reports that follow a finished upload.
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub parse_dwell: Duration,
    pub index_dwell: Duration,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            parse_dwell: Duration::from_millis(1000),
            index_dwell: Duration::from_millis(2000),
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Upload every file of one wave concurrently and report each task's stages.
///
/// A failed upload reports `Error` for its own task only; the rest of the wave
/// carries on. Returns once every task has reported a terminal stage.
pub async fn run_wave(
    backend: &dyn Backend,
    tasks: Vec<(TaskId, PathBuf)>,
    settings: &UploadSettings,
    sink: &dyn ProgressSink,
) {
    engine_info!("uploading wave of {} file(s)", tasks.len());
    let uploads = tasks
        .into_iter()
        .map(|(task_id, path)| upload_one(backend, task_id, path, settings, sink));
    join_all(uploads).await;
}

async fn upload_one(
    backend: &dyn Backend,
    task_id: TaskId,
    path: PathBuf,
    settings: &UploadSettings,
    sink: &dyn ProgressSink,
) {
    report(sink, task_id, UploadStage::Uploading, None, None);
    match backend.upload(&path).await {
        Ok(document) => {
            let doc_id = Some(document.doc_id);
            report(sink, task_id, UploadStage::Parsing, doc_id.clone(), None);
            tokio::time::sleep(settings.parse_dwell).await;
            report(sink, task_id, UploadStage::Indexing, doc_id.clone(), None);
            tokio::time::sleep(settings.index_dwell).await;
            report(sink, task_id, UploadStage::Success, doc_id, None);
        }
        Err(err) => {
            engine_warn!("upload of {} failed: {}", path.display(), err);
            report(sink, task_id, UploadStage::Error, None, Some(err.message));
        }
    }
}

fn report(
    sink: &dyn ProgressSink,
    task_id: TaskId,
    stage: UploadStage,
    remote_doc_id: Option<String>,
    error: Option<String>,
) {
    sink.emit(EngineEvent::UploadProgress(UploadProgress {
        task_id,
        stage,
        remote_doc_id,
        error,
    }));
}
