//! Multi-file upload queue processed in bounded waves.

use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};

pub type TaskId = u64;

pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Uploading,
    Parsing,
    Indexing,
    Success,
    Error,
}

impl TaskStatus {
    /// Indicative progress for the status; not a measure of backend work.
    /// `None` for [`TaskStatus::Error`], which carries no progress of its own.
    pub fn progress(self) -> Option<u8> {
        match self {
            TaskStatus::Pending => Some(0),
            TaskStatus::Uploading => Some(10),
            TaskStatus::Parsing => Some(40),
            TaskStatus::Indexing => Some(70),
            TaskStatus::Success => Some(100),
            TaskStatus::Error => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Error)
    }

    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            TaskStatus::Uploading | TaskStatus::Parsing | TaskStatus::Indexing
        )
    }

    fn rank(self) -> u8 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::Uploading => 1,
            TaskStatus::Parsing => 2,
            TaskStatus::Indexing => 3,
            TaskStatus::Success | TaskStatus::Error => 4,
        }
    }
}

/// A file picked by the user, before it becomes a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    pub id: TaskId,
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
    pub status: TaskStatus,
    pub progress: u8,
    pub error: Option<String>,
    pub remote_doc_id: Option<String>,
}

/// Status report for one task, as produced by the uploader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskUpdate {
    pub status: TaskStatus,
    pub remote_doc_id: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchStats {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub success: usize,
    pub error: usize,
}

/// Reported once every queued task of a run is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub success_count: usize,
}

/// What the queue wants next after a task settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaveAdvance {
    Next(Vec<TaskId>),
    Finished(BatchSummary),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct BatchRun {
    queued: VecDeque<TaskId>,
    wave: Vec<TaskId>,
}

/// Owns every task of the batch dialog.
///
/// A run snapshots the pending tasks, then releases them in waves of at most
/// `concurrency`; the next wave starts only after every member of the current
/// wave is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchQueue {
    tasks: BTreeMap<TaskId, UploadTask>,
    next_id: TaskId,
    concurrency: usize,
    run: Option<BatchRun>,
    last_summary: Option<BatchSummary>,
}

impl Default for BatchQueue {
    fn default() -> Self {
        Self::with_concurrency(DEFAULT_UPLOAD_CONCURRENCY)
    }
}

impl BatchQueue {
    pub fn with_concurrency(concurrency: usize) -> Self {
        Self {
            tasks: BTreeMap::new(),
            next_id: 0,
            concurrency: concurrency.max(1),
            run: None,
            last_summary: None,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    pub fn tasks(&self) -> impl Iterator<Item = &UploadTask> {
        self.tasks.values()
    }

    pub fn task(&self, id: TaskId) -> Option<&UploadTask> {
        self.tasks.get(&id)
    }

    pub fn current_wave(&self) -> &[TaskId] {
        self.run.as_ref().map_or(&[], |run| run.wave.as_slice())
    }

    pub fn last_summary(&self) -> Option<BatchSummary> {
        self.last_summary
    }

    /// Queue PDF files as pending tasks. Returns `(added, skipped)`; nothing is
    /// added while a run is in progress.
    pub fn add_files(&mut self, files: Vec<SelectedFile>) -> (usize, usize) {
        if self.is_running() {
            return (0, files.len());
        }
        let mut added = 0;
        let mut skipped = 0;
        for file in files {
            if !is_pdf(&file.path) {
                skipped += 1;
                continue;
            }
            self.next_id += 1;
            let id = self.next_id;
            let name = file
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.path.display().to_string());
            self.tasks.insert(
                id,
                UploadTask {
                    id,
                    path: file.path,
                    name,
                    size_bytes: file.size_bytes,
                    status: TaskStatus::Pending,
                    progress: 0,
                    error: None,
                    remote_doc_id: None,
                },
            );
            added += 1;
        }
        (added, skipped)
    }

    /// Remove a task. Only pending tasks outside a run can be removed.
    pub fn remove(&mut self, id: TaskId) -> bool {
        if self.is_running() {
            return false;
        }
        match self.tasks.get(&id) {
            Some(task) if task.status == TaskStatus::Pending => {
                self.tasks.remove(&id);
                true
            }
            _ => false,
        }
    }

    /// Start a run over the currently pending tasks and return the first wave.
    pub fn start(&mut self) -> Option<Vec<TaskId>> {
        if self.is_running() {
            return None;
        }
        let queued: VecDeque<TaskId> = self
            .tasks
            .values()
            .filter(|task| task.status == TaskStatus::Pending)
            .map(|task| task.id)
            .collect();
        if queued.is_empty() {
            return None;
        }
        self.last_summary = None;
        let mut run = BatchRun {
            queued,
            wave: Vec::new(),
        };
        run.wave = next_wave(&mut run.queued, &self.tasks, self.concurrency);
        let wave = run.wave.clone();
        self.run = Some(run);
        Some(wave)
    }

    /// Apply an uploader report. Only members of the current wave move, and
    /// only forward; terminal tasks never change again.
    pub fn apply(&mut self, id: TaskId, update: TaskUpdate) -> bool {
        let in_wave = self
            .run
            .as_ref()
            .is_some_and(|run| run.wave.contains(&id));
        if !in_wave {
            return false;
        }
        let Some(task) = self.tasks.get_mut(&id) else {
            return false;
        };
        if task.status.is_terminal() || update.status.rank() <= task.status.rank() {
            return false;
        }
        task.status = update.status;
        if update.status == TaskStatus::Error {
            task.error = Some(
                update
                    .error
                    .unwrap_or_else(|| "Upload failed".to_string()),
            );
        }
        if let Some(progress) = update.status.progress() {
            task.progress = task.progress.max(progress);
        }
        if update.remote_doc_id.is_some() {
            task.remote_doc_id = update.remote_doc_id;
        }
        true
    }

    /// Move to the next wave or finish, once the current wave has settled.
    pub fn advance(&mut self) -> Option<WaveAdvance> {
        let run = self.run.as_mut()?;
        let settled = run.wave.iter().all(|id| {
            self.tasks
                .get(id)
                .map_or(true, |task| task.status.is_terminal())
        });
        if !settled {
            return None;
        }
        let wave = next_wave(&mut run.queued, &self.tasks, self.concurrency);
        if !wave.is_empty() {
            run.wave = wave.clone();
            return Some(WaveAdvance::Next(wave));
        }
        self.run = None;
        let summary = BatchSummary {
            total: self.tasks.len(),
            success_count: self
                .tasks
                .values()
                .filter(|task| task.status == TaskStatus::Success)
                .count(),
        };
        self.last_summary = Some(summary);
        Some(WaveAdvance::Finished(summary))
    }

    pub fn stats(&self) -> BatchStats {
        let mut stats = BatchStats {
            total: self.tasks.len(),
            ..BatchStats::default()
        };
        for task in self.tasks.values() {
            match task.status {
                TaskStatus::Pending => stats.pending += 1,
                TaskStatus::Uploading | TaskStatus::Parsing | TaskStatus::Indexing => {
                    stats.processing += 1
                }
                TaskStatus::Success => stats.success += 1,
                TaskStatus::Error => stats.error += 1,
            }
        }
        stats
    }

    /// Drop every task; late reports for them are ignored afterwards.
    pub fn clear(&mut self) {
        self.tasks.clear();
        self.run = None;
        self.last_summary = None;
    }
}

fn next_wave(
    queued: &mut VecDeque<TaskId>,
    tasks: &BTreeMap<TaskId, UploadTask>,
    concurrency: usize,
) -> Vec<TaskId> {
    let mut wave = Vec::with_capacity(concurrency);
    while wave.len() < concurrency {
        let Some(id) = queued.pop_front() else {
            break;
        };
        if tasks
            .get(&id)
            .is_some_and(|task| task.status == TaskStatus::Pending)
        {
            wave.push(id);
        }
    }
    wave
}

pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}
