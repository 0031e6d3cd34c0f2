use std::path::PathBuf;
use std::sync::Once;

use grounding_core::{
    update, AppState, BatchSummary, Effect, Msg, SelectedFile, TaskId, TaskStatus, TaskUpdate,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn selected(names: &[&str]) -> Vec<SelectedFile> {
    names
        .iter()
        .map(|name| SelectedFile {
            path: PathBuf::from(format!("/incoming/{name}")),
            size_bytes: 2048,
        })
        .collect()
}

fn wave_ids(effects: &[Effect]) -> Vec<TaskId> {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::UploadWave { requests } => {
                Some(requests.iter().map(|r| r.task_id).collect())
            }
            _ => None,
        })
        .unwrap_or_default()
}

fn report(state: AppState, task_id: TaskId, status: TaskStatus) -> (AppState, Vec<Effect>) {
    let update_msg = TaskUpdate {
        status,
        remote_doc_id: (status == TaskStatus::Success).then(|| format!("remote-{task_id}")),
        error: (status == TaskStatus::Error).then(|| "Unsupported file".to_string()),
    };
    update(
        state,
        Msg::BatchTaskUpdated {
            task_id,
            update: update_msg,
        },
    )
}

fn queued_batch(names: &[&str]) -> AppState {
    let (state, _) = update(AppState::new(), Msg::BatchOpened);
    let (state, _) = update(state, Msg::BatchFilesSelected(selected(names)));
    state
}

#[test]
fn five_tasks_run_in_two_waves() {
    init_logging();
    let state = queued_batch(&["a.pdf", "b.pdf", "c.pdf", "d.pdf", "e.pdf"]);

    let (state, effects) = update(state, Msg::BatchStartClicked);
    let first = wave_ids(&effects);
    assert_eq!(first.len(), 3);
    assert_eq!(state.view().batch.expect("batch view").stats.pending, 2);

    // Two members done is not enough to release the next wave.
    let (state, effects) = report(state, first[0], TaskStatus::Uploading);
    assert!(effects.is_empty());
    let (state, effects) = report(state, first[0], TaskStatus::Success);
    assert!(effects.is_empty());
    let (state, effects) = report(state, first[1], TaskStatus::Error);
    assert!(effects.is_empty());
    let (state, effects) = report(state, first[2], TaskStatus::Indexing);
    assert!(effects.is_empty());

    let (state, effects) = report(state, first[2], TaskStatus::Success);
    let second = wave_ids(&effects);
    assert_eq!(second.len(), 2);
    assert!(second.iter().all(|id| !first.contains(id)));

    let (state, effects) = report(state, second[0], TaskStatus::Success);
    assert!(effects.is_empty());
    let (state, effects) = report(state, second[1], TaskStatus::Error);
    assert_eq!(
        effects,
        vec![
            Effect::BatchCompleted(BatchSummary {
                total: 5,
                success_count: 3
            }),
            Effect::LoadDocuments,
        ]
    );

    let batch = state.view().batch.expect("batch view");
    assert!(!batch.running);
    assert_eq!(batch.stats.success + batch.stats.error, 5);
    assert_eq!(batch.stats.error, 2);
    let failed = batch
        .tasks
        .iter()
        .find(|task| task.id == first[1])
        .expect("failed task");
    assert_eq!(failed.status_text, "Unsupported file");
}

#[test]
fn wave_members_never_exceed_concurrency() {
    init_logging();
    let state = queued_batch(&["1.pdf", "2.pdf", "3.pdf", "4.pdf", "5.pdf", "6.pdf", "7.pdf"]);
    let (mut state, effects) = update(state, Msg::BatchStartClicked);
    let mut wave = wave_ids(&effects);
    let mut waves = 0;

    while !wave.is_empty() {
        waves += 1;
        assert!(wave.len() <= 3);
        let in_flight = state.view().batch.expect("batch view").stats.processing;
        assert!(in_flight <= 3);
        let mut next = Vec::new();
        for id in &wave {
            let (s, effects) = report(state, *id, TaskStatus::Success);
            state = s;
            next = wave_ids(&effects);
        }
        wave = next;
    }

    assert_eq!(waves, 3);
    assert_eq!(
        state.batch().last_summary(),
        Some(BatchSummary {
            total: 7,
            success_count: 7
        })
    );
}

#[test]
fn late_and_backward_reports_are_ignored() {
    init_logging();
    let state = queued_batch(&["a.pdf", "b.pdf", "c.pdf", "d.pdf"]);
    let (state, effects) = update(state, Msg::BatchStartClicked);
    let first = wave_ids(&effects);

    let (state, _) = report(state, first[0], TaskStatus::Parsing);
    let (mut state, _) = report(state, first[0], TaskStatus::Uploading);
    let task = state.batch().task(first[0]).expect("task");
    assert_eq!(task.status, TaskStatus::Parsing);
    assert_eq!(task.progress, 40);

    // Task 4 is queued for the second wave; reports for it are not accepted yet.
    state.consume_dirty();
    let (mut state, effects) = report(state, 4, TaskStatus::Success);
    assert!(effects.is_empty());
    assert!(!state.consume_dirty());
    assert_eq!(
        state.batch().task(4).expect("task").status,
        TaskStatus::Pending
    );

    let (state, _) = report(state, first[1], TaskStatus::Error);
    let (state, _) = report(state, first[1], TaskStatus::Success);
    assert_eq!(
        state.batch().task(first[1]).expect("task").status,
        TaskStatus::Error
    );
}

#[test]
fn non_pdf_files_are_skipped_and_queue_is_frozen_while_running() {
    init_logging();
    let state = queued_batch(&["a.pdf", "notes.txt", "B.PDF"]);
    let view = state.view().batch.expect("batch view");
    assert_eq!(view.stats.total, 2);
    assert!(view.tasks.iter().all(|task| task.status_text == "Ready to upload"));
    assert!(view.tasks.iter().all(|task| task.removable));
    assert_eq!(view.tasks[0].size_label, "2.0 KB");

    let (state, _) = update(state, Msg::BatchStartClicked);
    let (state, _) = update(state, Msg::BatchFilesSelected(selected(&["late.pdf"])));
    let (state, _) = update(state, Msg::BatchTaskRemoved(1));
    let view = state.view().batch.expect("batch view");
    assert_eq!(view.stats.total, 2);
    assert!(view.running);
    assert!(view.tasks.iter().all(|task| !task.removable));

    // A second start while running does nothing.
    let (_state, effects) = update(state, Msg::BatchStartClicked);
    assert!(effects.is_empty());
}

#[test]
fn removing_a_pending_task_before_start() {
    init_logging();
    let state = queued_batch(&["a.pdf", "b.pdf"]);
    let (state, _) = update(state, Msg::BatchTaskRemoved(1));
    let (state, effects) = update(state, Msg::BatchStartClicked);
    assert_eq!(wave_ids(&effects), vec![2]);

    let (state, effects) = report(state, 2, TaskStatus::Success);
    assert_eq!(
        effects[0],
        Effect::BatchCompleted(BatchSummary {
            total: 1,
            success_count: 1
        })
    );

    let (state, _) = update(state, Msg::BatchClosed);
    assert!(state.view().batch.is_none());
    assert_eq!(state.batch().stats().total, 0);
}

#[test]
fn start_with_nothing_pending_is_a_noop() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::BatchOpened);
    let (_state, effects) = update(state, Msg::BatchStartClicked);
    assert!(effects.is_empty());
}
