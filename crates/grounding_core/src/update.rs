use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::DocumentsRequested => vec![Effect::LoadDocuments],
        Msg::DocumentsLoaded(result) => {
            state.set_documents(result);
            Vec::new()
        }
        Msg::DocumentSelected { doc_id } => state.select_document(doc_id),
        Msg::ChunksLoaded {
            doc_id,
            ticket,
            result,
        } => state.apply_chunks(doc_id, ticket, result),
        Msg::DocumentCached { doc_id, result } => state.apply_document_cached(doc_id, result),
        Msg::PageLayoutMeasured(layout) => state.apply_layout(layout),

        Msg::ChunkClicked(index) => state.click_chunk(index),
        Msg::ChunkHoverStarted(index) => {
            state.hover_chunk(index);
            Vec::new()
        }
        Msg::ChunkHoverEnded => {
            state.unhover_chunk();
            Vec::new()
        }
        Msg::ZoomInClicked => state.zoom(true),
        Msg::ZoomOutClicked => state.zoom(false),

        Msg::DividerDragStarted => state.begin_drag(),
        Msg::DividerDragMoved {
            pointer_x,
            container,
        } => {
            state.drag_to(pointer_x, container);
            Vec::new()
        }
        Msg::DividerDragEnded | Msg::DividerDragCancelled => state.end_drag(),
        Msg::ViewerClosed => state.close_viewer(),

        Msg::UploadRequested { path } => state.request_upload(path),
        Msg::UploadCompleted(result) => state.apply_upload(result),

        Msg::BatchOpened => {
            state.open_batch();
            Vec::new()
        }
        Msg::BatchFilesSelected(files) => {
            state.add_batch_files(files);
            Vec::new()
        }
        Msg::BatchTaskRemoved(task_id) => {
            state.remove_batch_task(task_id);
            Vec::new()
        }
        Msg::BatchStartClicked => state.start_batch(),
        Msg::BatchTaskUpdated { task_id, update } => state.apply_task_update(task_id, update),
        Msg::BatchClosed => {
            state.close_batch();
            Vec::new()
        }

        Msg::SearchSubmitted(query) => state.submit_search(query),
        Msg::SearchCompleted(result) => {
            state.apply_search(result);
            Vec::new()
        }
        Msg::SearchCleared => {
            state.clear_search();
            Vec::new()
        }
        Msg::SearchResultActivated(position) => state.activate_search_hit(position),

        Msg::ChatSubmitted(question) => state.submit_chat(question),
        Msg::ChatAnswered(result) => {
            state.apply_chat(result);
            Vec::new()
        }
        Msg::ChatSourceActivated { message, source } => {
            state.activate_chat_source(message, source)
        }

        Msg::ExtractRequested => state.request_extract(),
        Msg::ExtractCompleted { doc_id, result } => {
            state.apply_extract(doc_id, result);
            Vec::new()
        }
        Msg::SaveRequested { payload } => state.request_save(payload),
        Msg::SaveCompleted { doc_id, result } => {
            state.apply_save(doc_id, result);
            Vec::new()
        }

        Msg::DeleteRequested { doc_id } => vec![Effect::DeleteDocument { doc_id }],
        Msg::DeleteCompleted { doc_id, result } => state.apply_delete(doc_id, result),

        Msg::ErrorDismissed => {
            state.dismiss_error();
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
